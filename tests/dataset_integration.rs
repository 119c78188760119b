//! End-to-end dataset build over a synthetic GTZAN-style tree
//!
//! Three class directories with 30 second tracks at the default pipeline
//! settings: every track yields ten accepted (130, 13) / (130, 128) segments.

use std::fs;
use std::path::Path;

use genre_features::config::AppConfig;
use genre_features::dataset::{Corpus, DatasetBuilder, DatasetSplits, SplitConfig};
use genre_features::inference::{CentroidClassifier, GenreClassifier};
use genre_features::testing::{scratch_dir, sine_wave, white_noise, write_wav_i16};

const SR: u32 = 22_050;
const TRACK: usize = 30 * SR as usize;

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.dataset.expected_labels = vec![
        "blues".to_string(),
        "classical".to_string(),
        "unknown".to_string(),
    ];
    config.dataset.workers = 2;
    config
}

fn write_tree(root: &Path) {
    for name in ["blues", "classical", "unknown"] {
        fs::create_dir_all(root.join(name)).unwrap();
    }
    write_wav_i16(&root.join("blues/blues.00000.wav"), &sine_wave(SR, 196.0, TRACK, 0.5), SR, 1).unwrap();
    write_wav_i16(
        &root.join("classical/classical.00000.wav"),
        &sine_wave(SR, 1_760.0, TRACK, 0.4),
        SR,
        1,
    )
    .unwrap();
    write_wav_i16(&root.join("unknown/noise.00000.wav"), &white_noise(TRACK, 0.3, 11), SR, 1).unwrap();
}

#[test]
fn test_full_tracks_yield_ten_segments_each() {
    let root = scratch_dir("genre-e2e").unwrap();
    write_tree(&root);

    let builder = DatasetBuilder::new(&config()).unwrap();
    let (corpus, report) = builder.build(&root).unwrap();

    assert_eq!(report.files_total, 3);
    assert_eq!(report.files_processed, 3);
    assert_eq!(report.segments_accepted, 30);
    assert_eq!(report.segments_rejected, 0);
    assert!(report.skipped.is_empty());
    assert!(report.classes.iter().all(|c| c.accepted_segments == 10));

    assert_eq!(corpus.len(), 30);
    assert_eq!(corpus.mapping.index_of("classical"), Some(1));
    assert_eq!(corpus.labels.iter().filter(|&&l| l == 1).count(), 10);
    for (mfcc, mel) in corpus.mfcc.iter().zip(&corpus.mel_spectrogram) {
        assert_eq!(mfcc.len(), 130);
        assert!(mfcc.iter().all(|row| row.len() == 13));
        assert_eq!(mel.len(), 130);
        assert!(mel.iter().all(|row| row.len() == 128));
    }

    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_corpus_file_roundtrip_and_corrupt_file_skipped() {
    let root = scratch_dir("genre-e2e-file").unwrap();
    write_tree(&root);
    fs::write(root.join("blues/broken.wav"), b"RIFF not really a wave").unwrap();
    let output = root.join("data.json");

    let builder = DatasetBuilder::new(&config()).unwrap();
    let report = builder.build_to_file(&root, &output).unwrap();
    assert_eq!(report.files_total, 4);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].path.ends_with("broken.wav"));
    assert_eq!(report.segments_accepted, 30);

    let loaded = Corpus::load(&output).unwrap();
    let summary = loaded.summary();
    assert_eq!(summary.samples, 30);
    assert_eq!(summary.frames, Some(130));
    assert_eq!(summary.mfcc_width, Some(13));
    assert_eq!(summary.mel_width, Some(128));
    assert!(summary.classes.iter().all(|c| c.samples == 10));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_resampled_track_matches_segment_count() {
    let root = scratch_dir("genre-e2e-resample").unwrap();
    for name in ["blues", "classical", "unknown"] {
        fs::create_dir_all(root.join(name)).unwrap();
        let samples = sine_wave(44_100, 440.0, 30 * 44_100, 0.4);
        write_wav_i16(&root.join(name).join("track.wav"), &samples, 44_100, 1).unwrap();
    }

    let (corpus, report) = DatasetBuilder::new(&config()).unwrap().build(&root).unwrap();
    assert_eq!(report.segments_accepted, 30);
    assert_eq!(corpus.len(), 30);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_baseline_trains_on_stratified_split() {
    let root = scratch_dir("genre-e2e-train").unwrap();
    write_tree(&root);

    let (corpus, _) = DatasetBuilder::new(&config()).unwrap().build(&root).unwrap();
    let splits = DatasetSplits::stratified(&corpus.labels, &SplitConfig::default());
    assert_eq!(
        splits.train.len() + splits.validation.len() + splits.test.len(),
        30
    );

    let train = corpus.select(&splits.train).training_set().unwrap();
    let model = CentroidClassifier::fit(&train).unwrap();
    assert_eq!(model.input_shape(), Some((130, 141)));

    let test = corpus.select(&splits.test).training_set().unwrap();
    // Low sine, high sine and noise are trivially separable
    assert_eq!(model.accuracy(&test).unwrap(), 1.0);

    let _ = fs::remove_dir_all(root);
}
