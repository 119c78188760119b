// DatasetBuilder - labeled directory tree to Corpus
//
// Layout expected under the root:
//   root/<class>/<track>.wav
// Class directories are visited in sorted order and become the label mapping.
// Files are decoded and featurized on a pool of scoped worker threads; each
// worker reports (job index, outcome) over a channel and a single coordinator
// appends outcomes to the corpus strictly in job order. The corpus is
// therefore identical for any worker count.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use serde::Serialize;

use super::corpus::Corpus;
use super::labels::{LabelMapping, LabelRegistry};
use crate::analysis::{AlignedWindow, FeaturePipeline, Segmenter, WindowOutcome};
use crate::audio::AudioLoader;
use crate::config::AppConfig;
use crate::error::{log_dataset_error, log_feature_error, DatasetError, ErrorCode};

/// One audio file queued for processing
#[derive(Debug, Clone)]
struct FileJob {
    path: PathBuf,
    label: usize,
}

/// Per-file result produced by a worker
#[derive(Debug)]
enum FileOutcome {
    Processed {
        /// (segment index, aligned matrices) for accepted segments
        accepted: Vec<(usize, AlignedWindow)>,
        rejected: usize,
        empty: usize,
    },
    Skipped(DatasetError),
}

/// File that could not be decoded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub code: i32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassReport {
    pub label: usize,
    pub name: String,
    pub files: usize,
    pub accepted_segments: usize,
}

/// Counters describing one build
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    pub files_total: usize,
    pub files_processed: usize,
    pub segments_accepted: usize,
    /// Segments whose frame count failed the shape gate
    pub segments_rejected: usize,
    /// Segments with no source samples left (short files)
    pub segments_empty: usize,
    pub classes: Vec<ClassReport>,
    pub skipped: Vec<SkippedFile>,
}

/// Walks a labeled directory tree and accumulates a `Corpus`
pub struct DatasetBuilder {
    pipeline: FeaturePipeline,
    segmenter: Segmenter,
    loader: AudioLoader,
    registry: LabelRegistry,
    extensions: Vec<String>,
    workers: usize,
}

impl DatasetBuilder {
    pub fn new(config: &AppConfig) -> Result<Self, DatasetError> {
        let (pipeline, segmenter) = FeaturePipeline::for_dataset(&config.features)?;
        Ok(Self {
            pipeline,
            segmenter,
            loader: AudioLoader::new(config.features.sample_rate),
            registry: LabelRegistry::new(config.dataset.expected_labels.clone()),
            extensions: config
                .dataset
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            workers: config.dataset.resolved_workers(),
        })
    }

    /// Override the worker count (minimum 1)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    /// Build a corpus from `root`
    ///
    /// # Errors
    /// Only tree-level problems are fatal: unreadable root, no class
    /// directories, or a label outside the configured enumeration. Individual
    /// files that fail to decode are skipped and listed in the report.
    pub fn build(&self, root: &Path) -> Result<(Corpus, BuildReport), DatasetError> {
        let mut classes = class_directories(root)?;
        let names: Vec<String> = classes.iter().map(|(name, _)| name.clone()).collect();
        let mapping = self.registry.resolve(&names)?;
        // Process classes in label order so ids match report positions
        classes.sort_by_key(|(name, _)| mapping.index_of(name).unwrap_or(usize::MAX));

        let mut jobs = Vec::new();
        let mut report = BuildReport::default();
        for (label, (name, dir)) in classes.iter().enumerate() {
            let files = self.audio_files(dir)?;
            tracing::info!(
                "[DatasetBuilder] Processing class '{}' (label {}, {} files)",
                name,
                label,
                files.len()
            );
            report.classes.push(ClassReport {
                label,
                name: name.clone(),
                files: files.len(),
                accepted_segments: 0,
            });
            jobs.extend(files.into_iter().map(|path| FileJob { path, label }));
        }
        report.files_total = jobs.len();

        let mut corpus = Corpus::new(mapping);
        self.run_jobs(&jobs, |job, outcome| {
            self.collect(job, outcome, &mut corpus, &mut report);
        });

        tracing::info!(
            "[DatasetBuilder] Built corpus: {} segments from {} files ({} skipped, {} rejected segments)",
            report.segments_accepted,
            report.files_processed,
            report.skipped.len(),
            report.segments_rejected
        );

        Ok((corpus, report))
    }

    /// Build a corpus and write it to `output`
    pub fn build_to_file(&self, root: &Path, output: &Path) -> Result<BuildReport, DatasetError> {
        let (corpus, report) = self.build(root)?;
        corpus.save(output)?;
        Ok(report)
    }

    /// Featurize every job on the worker pool, handing outcomes to `sink` in job order
    fn run_jobs<F>(&self, jobs: &[FileJob], mut sink: F)
    where
        F: FnMut(&FileJob, FileOutcome),
    {
        let workers = self.workers.min(jobs.len()).max(1);
        let next_job = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, FileOutcome)>();

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next_job = &next_job;
                scope.spawn(move || loop {
                    let index = next_job.fetch_add(1, Ordering::SeqCst);
                    let Some(job) = jobs.get(index) else {
                        break;
                    };
                    if tx.send((index, self.process_file(job))).is_err() {
                        break;
                    }
                });
            }
            drop(tx);

            let mut pending = BTreeMap::new();
            let mut next = 0;
            for (index, outcome) in rx {
                pending.insert(index, outcome);
                while let Some(outcome) = pending.remove(&next) {
                    sink(&jobs[next], outcome);
                    next += 1;
                }
            }
        });
    }

    fn process_file(&self, job: &FileJob) -> FileOutcome {
        let clip = match self.loader.load_path(&job.path) {
            Ok(clip) => clip,
            Err(err) => return FileOutcome::Skipped(err.into()),
        };

        let mut accepted = Vec::new();
        let mut rejected = 0;
        let mut empty = 0;
        for segment in 0..self.segmenter.num_segments() {
            let samples = self.segmenter.slice(&clip.samples, segment);
            if samples.is_empty() {
                empty += 1;
                continue;
            }

            match self.pipeline.process(samples) {
                Ok(WindowOutcome::Accepted(window)) => accepted.push((segment, window)),
                Ok(WindowOutcome::Rejected { .. }) => rejected += 1,
                Err(err) => {
                    log_feature_error(&err, &format!("{} segment {}", job.path.display(), segment + 1));
                    rejected += 1;
                }
            }
        }

        FileOutcome::Processed {
            accepted,
            rejected,
            empty,
        }
    }

    fn collect(
        &self,
        job: &FileJob,
        outcome: FileOutcome,
        corpus: &mut Corpus,
        report: &mut BuildReport,
    ) {
        match outcome {
            FileOutcome::Processed {
                accepted,
                rejected,
                empty,
            } => {
                report.files_processed += 1;
                report.segments_rejected += rejected;
                report.segments_empty += empty;
                report.segments_accepted += accepted.len();
                if let Some(class) = report.classes.get_mut(job.label) {
                    class.accepted_segments += accepted.len();
                }
                for (segment, window) in &accepted {
                    corpus.push(job.label, window);
                    tracing::debug!("{}, segment:{}", job.path.display(), segment + 1);
                }
            }
            FileOutcome::Skipped(err) => {
                log_dataset_error(&err, &format!("skipping {}", job.path.display()));
                report.skipped.push(SkippedFile {
                    path: job.path.display().to_string(),
                    code: err.code(),
                    reason: err.message(),
                });
            }
        }
    }

    fn audio_files(&self, dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
        let entries = std::fs::read_dir(dir).map_err(|e| io_error(dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io_error(dir, e))?.path();
            if path.is_file() && self.accepts(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }
}

/// Immediate subdirectories of `root`, sorted by name
fn class_directories(root: &Path) -> Result<Vec<(String, PathBuf)>, DatasetError> {
    let entries = std::fs::read_dir(root).map_err(|e| io_error(root, e))?;
    let mut classes = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| io_error(root, e))?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if !name.starts_with('.') {
                classes.push((name.to_string(), path.clone()));
            }
        }
    }
    classes.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(classes)
}

/// Mapping a build over `root` would produce, without decoding any audio
pub fn discover_labels(root: &Path, registry: &LabelRegistry) -> Result<LabelMapping, DatasetError> {
    let names: Vec<String> = class_directories(root)?
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    registry.resolve(&names)
}

fn io_error(path: &Path, err: std::io::Error) -> DatasetError {
    DatasetError::Io {
        path: path.display().to_string(),
        details: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureConfig;
    use crate::testing::{scratch_dir, sine_wave, white_noise, write_wav_i16};

    /// Small geometry so tests stay fast: 1 s tracks, 4 segments of 5512
    /// samples, ceil(5512 / 512) = 11 frames per segment
    fn small_config() -> AppConfig {
        AppConfig {
            features: FeatureConfig {
                track_duration_s: 1,
                num_segments: 4,
                n_mels: 40,
                ..FeatureConfig::default()
            },
            ..AppConfig::default()
        }
    }

    fn write_tree(root: &Path) {
        for (class, freq) in [("blues", 220.0f32), ("classical", 880.0), ("unknown", 3_000.0)] {
            let dir = root.join(class);
            std::fs::create_dir_all(&dir).unwrap();
            for i in 0..2 {
                let signal = sine_wave(22_050, freq * (1.0 + i as f32 * 0.1), 22_050, 0.4);
                write_wav_i16(&dir.join(format!("{}{}.wav", class, i)), &signal, 22_050, 1).unwrap();
            }
        }
    }

    #[test]
    fn test_small_tree_labels_and_counts() {
        let root = scratch_dir("genre-builder").unwrap();
        write_tree(&root);

        let builder = DatasetBuilder::new(&small_config()).unwrap();
        assert_eq!(builder.segmenter().expected_frames(), 11);
        let (corpus, report) = builder.build(&root).unwrap();

        assert_eq!(corpus.mapping.names(), ["blues", "classical", "unknown"]);
        assert_eq!(corpus.len(), 3 * 2 * 4);
        assert_eq!(report.segments_accepted, 24);
        assert_eq!(report.files_processed, 6);
        assert!(report.skipped.is_empty());
        assert_eq!(&corpus.labels[8..16], &[1; 8]);
        assert_eq!(corpus.mfcc[0].len(), 11);
        assert_eq!(corpus.mfcc[0][0].len(), 13);
        assert_eq!(corpus.mel_spectrogram[0][0].len(), 40);
        corpus.validate().unwrap();
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_worker_count_does_not_change_output() {
        let root = scratch_dir("genre-builder").unwrap();
        write_tree(&root);

        let serial = DatasetBuilder::new(&small_config())
            .unwrap()
            .with_workers(1)
            .build(&root)
            .unwrap();
        let parallel = DatasetBuilder::new(&small_config())
            .unwrap()
            .with_workers(4)
            .build(&root)
            .unwrap();
        assert_eq!(serial, parallel);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_corrupt_and_short_files() {
        let root = scratch_dir("genre-builder").unwrap();
        write_tree(&root);
        std::fs::write(root.join("blues").join("broken.wav"), b"RIFF nonsense").unwrap();
        // 1.6 segments of audio: one accepted, one rejected, two empty
        write_wav_i16(
            &root.join("classical").join("short.wav"),
            &white_noise(9_000, 0.3, 4),
            22_050,
            1,
        )
        .unwrap();

        let (corpus, report) = DatasetBuilder::new(&small_config())
            .unwrap()
            .build(&root)
            .unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("broken.wav"));
        assert_eq!(report.files_processed, 7);
        assert_eq!(report.segments_accepted, 25);
        assert_eq!(report.segments_rejected, 1);
        assert_eq!(report.segments_empty, 2);
        assert_eq!(corpus.len(), 25);
        assert_eq!(report.classes[1].accepted_segments, 9);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_unexpected_directory_rejected() {
        let root = scratch_dir("genre-builder").unwrap();
        write_tree(&root);
        std::fs::create_dir_all(root.join("jazz")).unwrap();

        let mut config = small_config();
        config.dataset.expected_labels = vec![
            "blues".to_string(),
            "classical".to_string(),
            "unknown".to_string(),
        ];
        let err = DatasetBuilder::new(&config).unwrap().build(&root).unwrap_err();
        assert_eq!(
            err,
            DatasetError::UnexpectedLabel {
                label: "jazz".into()
            }
        );
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_configured_label_order_drives_ids() {
        let root = scratch_dir("genre-builder").unwrap();
        write_tree(&root);

        let mut config = small_config();
        config.dataset.expected_labels = vec![
            "unknown".to_string(),
            "blues".to_string(),
            "classical".to_string(),
        ];
        let (corpus, report) = DatasetBuilder::new(&config).unwrap().build(&root).unwrap();

        assert_eq!(corpus.mapping.names(), config.dataset.expected_labels.as_slice());
        assert_eq!(report.classes[0].name, "unknown");
        assert_eq!(report.classes[0].label, 0);
        assert_eq!(report.classes[2].name, "classical");
        // unknown files come first, then blues, then classical
        assert_eq!(&corpus.labels[..8], &[0; 8]);
        assert_eq!(&corpus.labels[16..], &[2; 8]);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_zero_track_duration_is_config_error() {
        let mut config = small_config();
        config.features.track_duration_s = 0;
        match DatasetBuilder::new(&config) {
            Err(DatasetError::InvalidConfig { details }) => {
                assert!(details.contains("track_duration_s"), "{}", details)
            }
            other => panic!("Expected InvalidConfig, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let builder = DatasetBuilder::new(&small_config()).unwrap();
        assert!(matches!(
            builder.build(Path::new("/no/such/dataset/root")),
            Err(DatasetError::Io { .. })
        ));
    }

    #[test]
    fn test_non_audio_files_ignored() {
        let root = scratch_dir("genre-builder").unwrap();
        write_tree(&root);
        std::fs::write(root.join("blues").join("notes.txt"), "liner notes").unwrap();
        std::fs::write(root.join("README"), "top-level file").unwrap();

        let mapping = discover_labels(&root, &LabelRegistry::default()).unwrap();
        assert_eq!(mapping.len(), 3);
        let (_, report) = DatasetBuilder::new(&small_config())
            .unwrap()
            .build(&root)
            .unwrap();
        assert_eq!(report.files_total, 6);
        let _ = std::fs::remove_dir_all(root);
    }
}
