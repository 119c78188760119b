use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use genre_features::config::AppConfig;
use genre_features::testing::{scratch_dir, sine_wave, white_noise, write_wav_i16};
use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_genre_cli"))
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout utf8");
    serde_json::from_str(&stdout).expect("stdout is JSON")
}

/// One second tracks, four segments of 11 frames, 40 mel bands
fn write_small_config(path: &Path) {
    let mut config = AppConfig::default();
    config.features.track_duration_s = 1;
    config.features.num_segments = 4;
    config.features.n_mels = 40;
    config.inference.clip_seconds = 1;
    config.inference.target_frames = Some(11);
    config.dataset.workers = 2;
    fs::write(path, serde_json::to_string(&config).unwrap()).unwrap();
}

fn class_signal(class: &str, index: usize) -> Vec<f32> {
    match class {
        "blues" => sine_wave(22_050, 220.0 + index as f32 * 5.0, 22_050, 0.4),
        "classical" => sine_wave(22_050, 2_640.0 + index as f32 * 20.0, 22_050, 0.4),
        _ => white_noise(22_050, 0.4, index as u64 + 1),
    }
}

fn write_tree(root: &Path) {
    for class in ["blues", "classical", "unknown"] {
        let dir = root.join(class);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..2 {
            let path = dir.join(format!("{class}.{i:05}.wav"));
            write_wav_i16(&path, &class_signal(class, i), 22_050, 1).unwrap();
        }
    }
}

#[test]
fn build_inspect_train_predict() {
    let root = scratch_dir("genre-cli").unwrap();
    let config = root.join("config.json");
    write_small_config(&config);
    let tree = root.join("genres");
    write_tree(&tree);
    let corpus = root.join("data.json");
    let model = root.join("model.json");

    let report = stdout_json(
        &cli()
            .arg("--config")
            .arg(&config)
            .arg("build-dataset")
            .arg("--root")
            .arg(&tree)
            .arg("--output")
            .arg(&corpus)
            .output()
            .expect("build-dataset"),
    );
    assert_eq!(report["segments_accepted"], 24);
    assert_eq!(report["files_processed"], 6);

    let summary = stdout_json(
        &cli()
            .args(["inspect", "--corpus"])
            .arg(&corpus)
            .output()
            .expect("inspect"),
    );
    assert_eq!(summary["samples"], 24);
    assert_eq!(summary["frames"], 11);
    assert_eq!(summary["mel_width"], 40);

    let trained = stdout_json(
        &cli()
            .args(["train-baseline", "--corpus"])
            .arg(&corpus)
            .arg("--output")
            .arg(&model)
            .output()
            .expect("train-baseline"),
    );
    assert!(model.exists());
    assert_eq!(trained["labels"][1], "classical");
    let total: u64 = ["train_samples", "validation_samples", "test_samples"]
        .iter()
        .map(|key| trained[*key].as_u64().unwrap())
        .sum();
    assert_eq!(total, 24);

    let clip = root.join("clip.wav");
    write_wav_i16(&clip, &sine_wave(22_050, 2_650.0, 22_050, 0.4), 22_050, 1).unwrap();
    let prediction = stdout_json(
        &cli()
            .arg("--config")
            .arg(&config)
            .arg("predict")
            .arg("--model")
            .arg(&model)
            .arg("--input")
            .arg(&clip)
            .output()
            .expect("predict"),
    );
    assert_eq!(prediction["percentages"].as_array().unwrap().len(), 3);
    assert!(prediction["label"].is_string());

    let _ = fs::remove_dir_all(root);
}

#[test]
fn extract_reports_default_shape() {
    let root = scratch_dir("genre-cli-extract").unwrap();
    let clip = root.join("clip.wav");
    write_wav_i16(&clip, &sine_wave(22_050, 440.0, 5 * 22_050, 0.4), 22_050, 1).unwrap();

    let report = stdout_json(
        &cli()
            .args(["extract", "--input"])
            .arg(&clip)
            .output()
            .expect("extract"),
    );
    assert_eq!(report["shape"], serde_json::json!([1, 130, 141]));
    assert!(report.get("frames").is_none());

    let _ = fs::remove_dir_all(root);
}

#[test]
fn predict_without_model_fails() {
    let root = scratch_dir("genre-cli-nomodel").unwrap();
    let clip = root.join("clip.wav");
    write_wav_i16(&clip, &sine_wave(22_050, 440.0, 22_050, 0.4), 22_050, 1).unwrap();

    let output = cli()
        .args(["predict", "--input"])
        .arg(&clip)
        .output()
        .expect("predict");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no model given"), "stderr: {stderr}");

    let _ = fs::remove_dir_all(root);
}
