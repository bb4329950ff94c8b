//! Short random identifier generation.
//!
//! Shared snippets are addressed by an opaque identifier that ends up in a
//! URL, so identifiers are drawn from the URL-safe alphabet
//! `A-Z a-z 0-9 _ -` (64 symbols, 6 bits per character).

use rand::Rng;

/// URL-safe alphabet used for identifiers.
pub const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Length of a share identifier (60 bits of entropy).
pub const SHARE_ID_LEN: usize = 10;

/// Identifier generation and validation utilities.
pub struct Identifier;

impl Identifier {
    /// Generate a random identifier of `len` characters.
    pub fn random(len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }

    /// Generate a share identifier.
    pub fn share() -> String {
        Self::random(SHARE_ID_LEN)
    }

    /// Check that every character of `id` belongs to the identifier alphabet.
    ///
    /// An empty string is not a valid identifier.
    pub fn is_well_formed(id: &str) -> bool {
        !id.is_empty() && id.bytes().all(|b| ALPHABET.contains(&b))
    }
}
