//! End-to-end tests of the built executables.

use std::path::Path;
use std::process::{Command, Output};

use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use rstest::rstest;

const KOKORO_SNAPSHOT: &str = "hub/models--onnx-community--Kokoro-82M-v1.0-ONNX/snapshots/0123abcd";

fn run(bin: &str, args: &[&str], hf_home: Option<&Path>, temp: &TempDir) -> Output {
    let mut cmd = Command::new(bin);
    cmd.args(args)
        .env_remove("HF_HOME")
        .env_remove("HF_TOKEN")
        .env_remove("ORT_DYLIB_PATH")
        .env_remove("RUST_LOG")
        .env_remove("AUDIOGEN_LOG")
        .env("AUDIOGEN_CONFIG", temp.path().join("no-config.toml"));
    if let Some(home) = hf_home {
        cmd.env("HF_HOME", home);
    }
    cmd.output().expect("failed to run binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn tts_check_reports_missing_for_empty_cache() {
    let temp = TempDir::new().unwrap();
    let output = run(env!("CARGO_BIN_EXE_tts-check-model"), &[], Some(temp.path()), &temp);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "missing\n");
}

#[test]
fn tts_check_reports_installed_for_populated_snapshot() {
    let temp = TempDir::new().unwrap();
    temp.child(KOKORO_SNAPSHOT)
        .child("config.json")
        .write_str("{}")
        .unwrap();
    let output = run(env!("CARGO_BIN_EXE_tts-check-model"), &[], Some(temp.path()), &temp);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "installed\n");
}

#[test]
fn tts_check_empty_snapshot_is_missing() {
    let temp = TempDir::new().unwrap();
    temp.child(KOKORO_SNAPSHOT).create_dir_all().unwrap();
    let output = run(
        env!("CARGO_BIN_EXE_tts-check-model"),
        &["--model", "kokoro"],
        Some(temp.path()),
        &temp,
    );
    assert_eq!(stdout(&output), "missing\n");
}

#[test]
fn tts_check_without_hf_home_is_missing() {
    let temp = TempDir::new().unwrap();
    let output = run(env!("CARGO_BIN_EXE_tts-check-model"), &[], None, &temp);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "missing\n");
}

#[test]
fn tts_check_rejects_music_model() {
    let temp = TempDir::new().unwrap();
    let output = run(
        env!("CARGO_BIN_EXE_tts-check-model"),
        &["--model", "acestep"],
        Some(temp.path()),
        &temp,
    );
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn tts_download_requires_hf_home() {
    let temp = TempDir::new().unwrap();
    let output = run(env!("CARGO_BIN_EXE_tts-download-model"), &[], None, &temp);
    assert_eq!(output.status.code(), Some(1));
    assert!(predicate::str::contains("Error: HF_HOME env var not set").eval(&stderr(&output)));
    assert!(stdout(&output).is_empty());
}

#[test]
fn tts_generate_without_model_fails() {
    let temp = TempDir::new().unwrap();
    let out = temp.child("speech.wav");
    let output = run(
        env!("CARGO_BIN_EXE_tts-generate"),
        &["--text", "Hello there", "--output", out.path().to_str().unwrap()],
        Some(temp.path()),
        &temp,
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(predicate::str::contains("not installed").eval(&stderr(&output)));
    out.assert(predicate::path::missing());
}

#[rstest]
#[case::slow(&["--speed", "0.1"], "Speed must be between")]
#[case::hot(&["--temperature", "3.0"], "Temperature must be in")]
#[case::blank(&["--voice", "  "], "Voice cannot be empty")]
fn tts_generate_validates_before_loading(#[case] extra: &[&str], #[case] message: &str) {
    let temp = TempDir::new().unwrap();
    let mut args = vec!["--text", "Hello", "--output", "never.wav"];
    args.extend_from_slice(extra);
    let output = run(env!("CARGO_BIN_EXE_tts-generate"), &args, None, &temp);
    assert_eq!(output.status.code(), Some(1));
    assert!(predicate::str::contains(message).eval(&stderr(&output)));
}

#[test]
fn tts_generate_missing_flags_is_usage_error() {
    let temp = TempDir::new().unwrap();
    let output = run(env!("CARGO_BIN_EXE_tts-generate"), &["--text", "Hi"], None, &temp);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn music_check_tracks_marker_directory() {
    let temp = TempDir::new().unwrap();
    let checkpoints = temp.child("checkpoints");
    let dir = checkpoints.path().to_str().unwrap();

    let output = run(
        env!("CARGO_BIN_EXE_music-check-model"),
        &["--checkpoints-dir", dir],
        None,
        &temp,
    );
    assert!(output.status.success());
    assert_eq!(stdout(&output), "missing\n");

    checkpoints
        .child("acestep-v15-turbo/config.json")
        .write_str("{}")
        .unwrap();
    let output = run(
        env!("CARGO_BIN_EXE_music-check-model"),
        &["--checkpoints-dir", dir],
        None,
        &temp,
    );
    assert_eq!(stdout(&output), "installed\n");
}

#[test]
fn music_check_requires_checkpoints_dir() {
    let temp = TempDir::new().unwrap();
    let output = run(env!("CARGO_BIN_EXE_music-check-model"), &[], None, &temp);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn music_generate_without_checkpoints_fails() {
    let temp = TempDir::new().unwrap();
    let out = temp.child("song.wav");
    let output = run(
        env!("CARGO_BIN_EXE_music-generate"),
        &[
            "--genre",
            "lofi hip hop",
            "--output",
            out.path().to_str().unwrap(),
            "--project-root",
            temp.path().to_str().unwrap(),
        ],
        None,
        &temp,
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(predicate::str::contains("music-download-model").eval(&stderr(&output)));
    out.assert(predicate::path::missing());
}

#[test]
fn music_generate_rejects_short_duration() {
    let temp = TempDir::new().unwrap();
    let output = run(
        env!("CARGO_BIN_EXE_music-generate"),
        &["--genre", "jazz", "--duration", "5", "--output", "x.wav"],
        None,
        &temp,
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(predicate::str::contains("Duration must be between 10 and 600").eval(&stderr(&output)));
}
