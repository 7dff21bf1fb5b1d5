//! Exit-code and log behaviour of the `litton7` binary for runs that never load a model.

use std::path::Path;
use std::process::{Command, Output};

fn litton7(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_litton7"))
        .args(args)
        .current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn missing_model_exits_with_one() {
    let home = tempfile::tempdir().unwrap();
    let out = litton7(home.path(), &[".", "--model", "/nonexistent/path"]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("/nonexistent/path, does not exist"));
    // Nothing was collected.
    assert!(!String::from_utf8_lossy(&out.stdout).contains("Collecting images"));
}

#[test]
fn model_directory_is_not_a_file() {
    let home = tempfile::tempdir().unwrap();
    let model_dir = home.path().join("model");
    std::fs::create_dir(&model_dir).unwrap();

    let out = litton7(home.path(), &[".", "-m", model_dir.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("is not a file"));
}

#[test]
fn invalid_device_exits_with_one() {
    let home = tempfile::tempdir().unwrap();
    let model = home.path().join("model.onnx");
    std::fs::write(&model, b"not really a model").unwrap();

    let out = litton7(
        home.path(),
        &[".", "-m", model.to_str().unwrap(), "--device", "tpu"],
    );
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("--device must be one of"));
}

#[test]
fn no_images_is_a_successful_run() {
    let home = tempfile::tempdir().unwrap();
    let model = home.path().join("model.onnx");
    std::fs::write(&model, b"not really a model").unwrap();
    let photos = home.path().join("photos");
    std::fs::create_dir(&photos).unwrap();
    std::fs::write(photos.join("readme.txt"), b"no pictures here").unwrap();

    let out = litton7(
        home.path(),
        &[
            photos.to_str().unwrap(),
            "-m",
            model.to_str().unwrap(),
            "-d",
            "cpu",
            "-b",
            "-3",
        ],
    );

    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Collecting images..."));
    assert!(stdout.contains("No image found, abort."));
    assert!(!stdout.contains("Loading model"));
}

#[test]
fn unloadable_model_exits_with_two_and_writes_traceback() {
    let home = tempfile::tempdir().unwrap();
    let model = home.path().join("model.onnx");
    std::fs::write(&model, b"not really a model").unwrap();
    let photo = home.path().join("lake.png");
    image::DynamicImage::new_rgb8(32, 24).save(&photo).unwrap();

    let out = litton7(
        home.path(),
        &[photo.to_str().unwrap(), "-m", model.to_str().unwrap(), "-d", "cpu"],
    );

    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Could not load model"));
    assert!(home.path().join("litton7-traceback.log").is_file());
}

#[test]
fn log_file_starts_with_bom() {
    let home = tempfile::tempdir().unwrap();
    let model = home.path().join("model.onnx");
    std::fs::write(&model, b"stub").unwrap();
    let log = home.path().join("run.log");

    let out = litton7(
        home.path(),
        &[
            "missing-target",
            "-m",
            model.to_str().unwrap(),
            "--log",
            log.to_str().unwrap(),
        ],
    );

    assert_eq!(out.status.code(), Some(0));
    let bytes = std::fs::read(&log).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    assert!(String::from_utf8_lossy(&bytes).contains("missing-target"));
}

#[test]
fn corrupt_image_is_warned_about_once() {
    let home = tempfile::tempdir().unwrap();
    let model = home.path().join("model.onnx");
    std::fs::write(&model, b"stub").unwrap();
    let photos = home.path().join("photos");
    std::fs::create_dir(&photos).unwrap();
    for name in ["hills.png", "coast.png"] {
        image::DynamicImage::new_rgb8(32, 24)
            .save(photos.join(name))
            .unwrap();
    }
    std::fs::write(photos.join("broken.jpg"), b"\x00\x01 garbage, not a jpeg").unwrap();
    let log = home.path().join("run.log");

    let out = litton7(
        home.path(),
        &[
            photos.to_str().unwrap(),
            "-m",
            model.to_str().unwrap(),
            "-d",
            "cpu",
            "--log",
            log.to_str().unwrap(),
        ],
    );

    assert_eq!(out.status.code(), Some(2));
    let log = std::fs::read_to_string(&log).unwrap();
    let warnings: Vec<&str> = log.lines().filter(|l| l.contains("skip entry")).collect();
    assert_eq!(warnings.len(), 1, "{log}");
    assert!(warnings[0].contains("broken.jpg"));
}
