use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn write_frames(dir: &Path, n: usize) {
    for i in 0..n {
        image::RgbImage::from_fn(64, 64, |x, y| image::Rgb([(100 + x / 4 + y / 4) as u8; 3]))
            .save(dir.join(format!("frame_{i:03}.png")))
            .unwrap();
    }
}

fn write_config(path: &Path) {
    std::fs::write(
        path,
        r#"{
            "roi": {
                "width": 32,
                "height": 32,
                "frame_corners": [[8, 8], [39, 8], [8, 39], [39, 39]]
            },
            "preprocess": { "median_kernel": 3 }
        }"#,
    )
    .unwrap();
}

#[test]
fn writes_one_report_per_frame_after_the_baseline() {
    let tmp = tempfile::tempdir().unwrap();
    let frames = tmp.path().join("frames");
    std::fs::create_dir(&frames).unwrap();
    write_frames(&frames, 4);
    let config = tmp.path().join("config.json");
    write_config(&config);
    let output = tmp.path().join("reports.jsonl");

    Command::cargo_bin("roadspeed")
        .unwrap()
        .arg(&frames)
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .args(["--log-level", "warn"])
        .assert()
        .success();

    let text = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    for (i, line) in lines.iter().enumerate() {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(v["frame_index"], i as u64);
        assert_eq!(v["tracks"], serde_json::json!([]));
    }
}

#[test]
fn print_config_shows_defaults() {
    Command::cargo_bin("roadspeed")
        .unwrap()
        .arg("--print-config")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""threshold": 164"#))
        .stdout(predicate::str::contains(r#""median_kernel": 11"#));
}

#[test]
fn missing_directory_fails() {
    let tmp = tempfile::tempdir().unwrap();
    Command::cargo_bin("roadspeed")
        .unwrap()
        .arg(tmp.path().join("nope"))
        .assert()
        .failure();
}

#[test]
fn empty_directory_has_no_baseline() {
    let tmp = tempfile::tempdir().unwrap();
    Command::cargo_bin("roadspeed")
        .unwrap()
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no baseline"));
}
