use assert_cmd::Command;
use predicates::prelude::*;

/// Command with a clean credential environment, run outside the repo so no `.env` is picked up
fn scout() -> Command {
    let mut cmd = Command::cargo_bin("scout").unwrap();
    cmd.current_dir(std::env::temp_dir())
        .env_remove("GOOGLE_API_KEY")
        .env_remove("GOOGLE_GENAI_USE_VERTEXAI")
        .env("RUST_LOG", "info");
    cmd
}

#[test]
fn test_help_lists_flags() {
    scout()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--host"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("30001"));
}

#[test]
fn test_missing_api_key_exits_1() {
    scout()
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "GOOGLE_API_KEY environment variable not set and GOOGLE_GENAI_USE_VERTEXAI is not TRUE.",
        ))
        .stderr(predicate::str::contains("listening").not());
}

#[test]
fn test_vertex_flag_must_be_exact() {
    scout()
        .env("GOOGLE_GENAI_USE_VERTEXAI", "yes")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("GOOGLE_API_KEY environment variable not set"));
}

#[test]
fn test_bind_failure_exits_1() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    scout()
        .env("GOOGLE_API_KEY", "test-key")
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Search Planner Agent"))
        .stderr(predicate::str::contains("An error occurred during server startup"));
}

#[test]
fn test_unknown_agent_rejected() {
    scout()
        .args(["--agent", "weather"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("weather"));
}
