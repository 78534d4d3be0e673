use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::error::Error;
use std::fs;
use tempfile::tempdir;

// Helper function to get the path to the compiled binary
fn framescope_cmd() -> Command {
    Command::cargo_bin("framescope").expect("Failed to find framescope binary")
}

#[test]
fn test_help_lists_subcommands() -> Result<(), Box<dyn Error>> {
    framescope_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("analyze"))
        .stdout(contains("probe"));
    Ok(())
}

#[test]
fn test_missing_subcommand_fails() -> Result<(), Box<dyn Error>> {
    framescope_cmd().assert().failure();
    Ok(())
}

#[test]
fn test_analyze_missing_settings_file() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let settings = dir.path().join("does_not_exist.json");

    framescope_cmd()
        .arg("analyze")
        .arg(&settings)
        .arg("--no-progress")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Error:"));
    Ok(())
}

#[test]
fn test_analyze_invalid_json() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let settings = dir.path().join("settings.json");
    fs::write(&settings, "{ this is not json")?;

    framescope_cmd()
        .arg("analyze")
        .arg(&settings)
        .arg("--no-progress")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Error:"));
    Ok(())
}

#[test]
fn test_analyze_missing_video() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let settings = dir.path().join("settings.json");
    let video = dir.path().join("missing.mp4");
    let document = format!(
        r#"{{"video_path": {:?}, "blur": true, "exposure": false, "entropy": false, "motion": false}}"#,
        video.to_string_lossy()
    );
    fs::write(&settings, document)?;

    framescope_cmd()
        .arg("analyze")
        .arg(&settings)
        .arg("--no-progress")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("missing.mp4"));

    // Nothing is written when the video cannot be opened
    assert!(!dir.path().join("missing_meta").exists());
    Ok(())
}

#[test]
fn test_analyze_rejects_small_batch_size() -> Result<(), Box<dyn Error>> {
    framescope_cmd()
        .args(["analyze", "settings.json", "--batch-size", "1"])
        .assert()
        .failure()
        .code(2);
    Ok(())
}

#[test]
fn test_probe_nonexistent_file() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;

    framescope_cmd()
        .arg("probe")
        .arg(dir.path().join("nothing_here.mkv"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("nothing_here.mkv"));
    Ok(())
}

#[test]
fn test_verbose_logs_settings_loading() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let settings = dir.path().join("settings.json");
    let video = dir.path().join("missing.mp4");
    let document = format!(r#"{{"video_path": {:?}, "motion": true}}"#, video.to_string_lossy());
    fs::write(&settings, document)?;

    framescope_cmd()
        .env_remove("RUST_LOG")
        .arg("-v")
        .arg("analyze")
        .arg(&settings)
        .arg("--no-progress")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Reading settings from"));
    Ok(())
}

#[test]
fn test_debug_flag_in_settings_enables_debug_logging() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let settings = dir.path().join("settings.json");
    // Exists, but is not a decodable video
    let video = dir.path().join("clip.mp4");
    fs::write(&video, "not a video")?;
    let document = format!(
        r#"{{"video_path": {:?}, "motion": true, "debug": "yes"}}"#,
        video.to_string_lossy()
    );
    fs::write(&settings, document)?;

    framescope_cmd()
        .env_remove("RUST_LOG")
        .arg("analyze")
        .arg(&settings)
        .arg("--no-progress")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Settings: StreamConfig"))
        .stderr(contains("debug: true"));
    Ok(())
}

#[test]
fn test_settings_dump_hidden_without_debug() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let settings = dir.path().join("settings.json");
    let video = dir.path().join("clip.mp4");
    fs::write(&video, "not a video")?;
    let document = format!(r#"{{"video_path": {:?}, "motion": true}}"#, video.to_string_lossy());
    fs::write(&settings, document)?;

    framescope_cmd()
        .env_remove("RUST_LOG")
        .arg("analyze")
        .arg(&settings)
        .arg("--no-progress")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Settings: StreamConfig").not());
    Ok(())
}
