//! CLI integration tests.
//!
//! These tests exercise the CLI commands end-to-end against the built binary.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn snipfmt(home: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_snipfmt"));
    command
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("SNIPFMT_DATA_DIR", home.join("data"))
        .env_remove("EDGE_CONFIG")
        .env_remove("EDGE_CONFIG_ID")
        .env_remove("VERCEL_API_TOKEN")
        .env_remove("SNIPFMT_BACKEND")
        .env_remove("RUST_LOG");
    command
}

fn run(home: &Path, args: &[&str]) -> Output {
    snipfmt(home)
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_version_command() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["version"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains(&format!("snipfmt {}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = stdout(&output);
    for command in ["serve", "share", "fetch", "format", "watch", "history"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn test_history_commit_undo_redo() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("main.go");

    std::fs::write(&file, "package main\n").unwrap();
    let output = run(home.path(), &["history", "commit", file.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout(&output), "package main\n");

    std::fs::write(&file, "package main\n\nfunc main() {}\n").unwrap();
    run(home.path(), &["history", "commit", file.to_str().unwrap()]);

    let output = run(home.path(), &["history", "undo"]);
    assert_eq!(stdout(&output), "package main\n");

    let output = run(home.path(), &["history", "redo"]);
    assert_eq!(stdout(&output), "package main\n\nfunc main() {}\n");

    // Redo at the end stays put
    let output = run(home.path(), &["history", "redo"]);
    assert_eq!(stdout(&output), "package main\n\nfunc main() {}\n");
}

#[test]
fn test_history_commit_from_stdin_and_clear() {
    let home = tempfile::tempdir().unwrap();

    let mut child = snipfmt(home.path())
        .args(["history", "commit"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"package stdin")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output), "package stdin\n");

    let output = run(home.path(), &["history", "clear"]);
    assert_eq!(stdout(&output), "\n");

    let output = run(home.path(), &["history", "show"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Version 3 of 3"));
    assert!(stderr.contains("undo: yes"));
}

#[test]
fn test_fetch_without_server_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = snipfmt(home.path())
        .env("SNIPFMT_SERVER_URL", "http://127.0.0.1:9")
        .args(["fetch", "abcdefghij"])
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[test]
fn test_serve_refuses_incomplete_hosted_config() {
    let home = tempfile::tempdir().unwrap();
    let output = snipfmt(home.path())
        .env("SNIPFMT_BACKEND", "edge-config")
        .env("EDGE_CONFIG", "https://edge-config.vercel.com/ecfg_abc?token=t")
        .args(["serve", "--address", "127.0.0.1:0"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("EDGE_CONFIG_ID"), "{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_edit_starts_history_from_snippet() {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/share"))
        .and(query_param("id", "abcdefghij"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "code": "package shared\n" })),
        )
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let root = home.path().to_path_buf();
    let url = server.uri();
    let fetch = move |args: &'static [&'static str]| {
        let root = root.clone();
        let url = url.clone();
        tokio::task::spawn_blocking(move || {
            snipfmt(&root)
                .env("SNIPFMT_SERVER_URL", url)
                .args(args)
                .output()
                .unwrap()
        })
    };

    let output = fetch(&["fetch", "--edit", "abcdefghij"]).await.unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout(&output), "package shared\n");

    let output = run(home.path(), &["history", "show"]);
    assert_eq!(stdout(&output), "package shared\n");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Version 1 of 1"));

    // A second fetch leaves the history alone once it has edits
    let file = home.path().join("main.go");
    std::fs::write(&file, "package edited\n").unwrap();
    run(home.path(), &["history", "commit", file.to_str().unwrap()]);

    let output = fetch(&["fetch", "--edit", "abcdefghij"]).await.unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("left unchanged"));

    let output = run(home.path(), &["history", "show"]);
    assert_eq!(stdout(&output), "package edited\n");
}
