//! Cassette replay integration tests. Zero network I/O.
//!
//! All tests set `IMAGECAST_REPLAY` to a cassette file so that the binary
//! never contacts a live API endpoint.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd(work: &Path) -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("imagecast");
    cmd.env_clear()
        .env("IMAGECAST_CONFIG", work.join("missing.toml"))
        .env("PROVIDER_OPENAI_API_KEY", "sk-test")
        .env("PROVIDER_OPENAI_API_URL", "https://api.openai.com/v1")
        .env("PROVIDER_OPENAI_MODEL", "gpt-image-1")
        .env("PROVIDER_OPENROUTER_API_KEY", "or-test")
        .env("PROVIDER_OPENROUTER_API_URL", "https://openrouter.ai/api/v1")
        .env("PROVIDER_OPENROUTER_MODEL", "google/gemini-2.5-flash-image-preview")
        .env("PROVIDER_GEMINI_API_KEY", "g-test")
        .env("PROVIDER_GEMINI_API_URL", "https://generativelanguage.googleapis.com/v1beta")
        .env("PROVIDER_GEMINI_MODEL", "gemini-2.0-flash-exp-image-generation")
        .current_dir(work);
    cmd
}

/// Absolute path to a cassette in `test_fixtures`.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_fixtures").join(name)
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn openai_prompt_saves_one_png() {
    let work = tempfile::tempdir().unwrap();
    let output = cmd(work.path())
        .env("IMAGECAST_REPLAY", fixture("openai_cat.cassette.yaml"))
        .args(["--provider", "openai", "--dir", "renders", "a cat"])
        .assert()
        .success()
        .get_output()
        .clone();

    let manifest = stdout_json(&output);
    assert_eq!(manifest["provider"], "openai");
    assert_eq!(manifest["model"], "gpt-image-1");
    let images = manifest["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["source"], "b64");
    assert_eq!(images[0]["mimeType"], "image/png");
    assert_eq!(images[0]["index"], 0);

    let path = PathBuf::from(images[0]["path"].as_str().unwrap());
    assert!(path.starts_with(work.path().join("renders")));
    assert_eq!(path.extension().unwrap(), "png");
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("image-"), "default filename should use the prefix, got {name}");

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(images[0]["sizeBytes"], bytes.len());
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1, 1));
}

#[test]
fn second_run_with_same_filename_gets_suffix() {
    let work = tempfile::tempdir().unwrap();
    for _ in 0..2 {
        cmd(work.path())
            .env("IMAGECAST_REPLAY", fixture("openai_cat.cassette.yaml"))
            .args(["--provider", "openai", "--filename", "cat", "a cat"])
            .assert()
            .success();
    }
    assert!(work.path().join("cat.png").exists());
    assert!(work.path().join("cat-1.png").exists());
}

#[test]
fn error_policy_refuses_to_clobber() {
    let work = tempfile::tempdir().unwrap();
    std::fs::write(work.path().join("cat.png"), b"keep me").unwrap();

    cmd(work.path())
        .env("IMAGECAST_REPLAY", fixture("openai_cat.cassette.yaml"))
        .args(["--provider", "openai", "--filename", "cat", "--overwrite", "error", "a cat"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("SAVE_ERROR"))
        .stdout(predicate::str::contains("File already exists"));
    assert_eq!(std::fs::read(work.path().join("cat.png")).unwrap(), b"keep me");
}

#[test]
fn openrouter_markdown_and_remote_url_are_both_saved() {
    let work = tempfile::tempdir().unwrap();
    let output = cmd(work.path())
        .env("IMAGECAST_REPLAY", fixture("openrouter_url.cassette.yaml"))
        .args(["--provider", "openrouter", "--filename", "take", "two takes on a lighthouse"])
        .assert()
        .success()
        .get_output()
        .clone();

    let manifest = stdout_json(&output);
    let images = manifest["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["source"], "b64");
    assert_eq!(images[1]["source"], "url");
    assert_eq!(images[1]["mimeType"], "image/jpeg");
    assert!(images[0]["path"].as_str().unwrap().ends_with("take.png"));
    assert!(images[1]["path"].as_str().unwrap().ends_with("take-02.jpg"));
}

#[test]
fn request_file_drives_the_call() {
    let work = tempfile::tempdir().unwrap();
    std::fs::write(
        work.path().join("request.json"),
        r#"{
            "provider": "openrouter",
            "messages": [
                {"role": "system", "content": "You draw lighthouses."},
                {"role": "user", "content": "two takes please"}
            ],
            "output": {"dir": "out", "filename": "take"},
            "params": {"temperature": 0.7}
        }"#,
    )
    .unwrap();

    cmd(work.path())
        .env("IMAGECAST_REPLAY", fixture("openrouter_url.cassette.yaml"))
        .args(["--request", "request.json"])
        .assert()
        .success();
    assert!(work.path().join("out/take.png").exists());
    assert!(work.path().join("out/take-02.jpg").exists());
}

#[test]
fn text_only_reply_is_a_provider_error() {
    let work = tempfile::tempdir().unwrap();
    let output = cmd(work.path())
        .env("IMAGECAST_REPLAY", fixture("gemini_text_only.cassette.yaml"))
        .args(["--provider", "gemini", "a cat"])
        .assert()
        .failure()
        .get_output()
        .clone();

    let result = stdout_json(&output);
    assert_eq!(result["code"], "PROVIDER_ERROR");
    let error = result["error"].as_str().unwrap();
    assert!(error.starts_with("Gemini response contained no image data"));
    assert!(error.contains("I can't generate that image."));
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[test]
fn cassette_without_download_fails_cleanly() {
    let work = tempfile::tempdir().unwrap();
    let cassette = work.path().join("no_download.cassette.yaml");
    std::fs::write(
        &cassette,
        r#"
name: no-download
recorded_at: "2026-02-01T00:20:00Z"
commit: test
interactions:
  - seq: 0
    port: http_transport
    method: send
    input: {}
    output:
      Ok:
        status: 200
        body:
          choices:
            - message:
                role: assistant
                content: "![x](https://cdn.example.com/x.png)"
"#,
    )
    .unwrap();

    cmd(work.path())
        .env("IMAGECAST_REPLAY", &cassette)
        .args(["--provider", "openrouter", "--dir", "out", "a cat"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("no interactions recorded for http_transport::download"));
    assert!(!work.path().join("out").exists());
}

#[test]
fn exhausted_cassette_fails_cleanly() {
    let work = tempfile::tempdir().unwrap();
    let cassette = work.path().join("empty.cassette.yaml");
    std::fs::write(&cassette, "name: empty\nrecorded_at: \"2026-02-01T00:30:00Z\"\ncommit: test\ninteractions: []\n").unwrap();

    cmd(work.path())
        .env("IMAGECAST_REPLAY", &cassette)
        .args(["--provider", "openai", "a cat"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("no interactions recorded for http_transport::send"));
}

#[test]
fn missing_cassette_is_reported() {
    let work = tempfile::tempdir().unwrap();
    cmd(work.path())
        .env("IMAGECAST_REPLAY", work.path().join("nope.cassette.yaml"))
        .args(["--provider", "openai", "a cat"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed to read cassette file"));
}
