use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use genre_features::config::AppConfig;
use genre_features::dataset::{Corpus, DatasetBuilder, DatasetSplits, SplitConfig};
use genre_features::inference::{CentroidClassifier, InferencePipeline};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "genre_cli",
    about = "Feature extraction, dataset building and genre inference"
)]
struct Cli {
    /// JSON configuration file (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Walk a labeled directory tree and write the feature corpus
    BuildDataset {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        workers: Option<usize>,
        /// Write the build report here instead of stdout
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print class counts and tensor shape of a saved corpus
    Inspect {
        #[arg(long)]
        corpus: PathBuf,
    },
    /// Extract the inference tensor for one audio file
    Extract {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Fit the centroid baseline on a stratified split of a corpus
    TrainBaseline {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Classify one audio file with a saved model
    Predict {
        #[arg(long)]
        model: Option<PathBuf>,
        #[arg(long)]
        input: PathBuf,
    },
    /// Serve predictions over HTTP until Ctrl-C
    Serve {
        #[arg(long)]
        model: Option<PathBuf>,
        #[arg(long)]
        bind: Option<String>,
    },
}

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref());
    config.validate().context("invalid configuration")?;

    match cli.command {
        Commands::BuildDataset {
            root,
            output,
            workers,
            report,
        } => run_build(&config, root, output, workers, report)?,
        Commands::Inspect { corpus } => run_inspect(corpus)?,
        Commands::Extract { input, output } => run_extract(&config, input, output)?,
        Commands::TrainBaseline {
            corpus,
            output,
            seed,
        } => run_train(corpus, output, seed)?,
        Commands::Predict { model, input } => run_predict(&config, model, input)?,
        Commands::Serve { model, bind } => run_serve(config, model, bind)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn run_build(
    config: &AppConfig,
    root: PathBuf,
    output: PathBuf,
    workers: Option<usize>,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let mut builder = DatasetBuilder::new(config).context("configuring dataset builder")?;
    if let Some(workers) = workers {
        builder = builder.with_workers(workers);
    }

    let report = builder
        .build_to_file(&root, &output)
        .with_context(|| format!("building dataset from {}", root.display()))?;
    emit_json(&report, report_path.as_deref())
}

fn run_inspect(path: PathBuf) -> Result<()> {
    let corpus = Corpus::load(&path).with_context(|| format!("loading {}", path.display()))?;
    emit_json(&corpus.summary(), None)
}

fn run_extract(config: &AppConfig, input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let pipeline = InferencePipeline::new(config).context("building inference pipeline")?;
    let batch = pipeline
        .prepare_path(&input)
        .with_context(|| format!("extracting features from {}", input.display()))?;

    let item = batch.item(0);
    let report = ExtractReport {
        input: input.display().to_string(),
        shape: batch.shape(),
        n_mfcc: config.features.n_mfcc,
        n_mels: config.features.n_mels,
        frames: output.as_ref().map(|_| item.rows().into_iter().map(|r| r.to_vec()).collect()),
    };

    match output {
        Some(path) => {
            let json = serde_json::to_string(&report)?;
            fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            println!("{:?}", report.shape);
            Ok(())
        }
        None => emit_json(&report, None),
    }
}

fn run_train(corpus_path: PathBuf, output: PathBuf, seed: Option<u64>) -> Result<()> {
    let corpus = Corpus::load(&corpus_path)
        .with_context(|| format!("loading {}", corpus_path.display()))?;

    let mut split = SplitConfig::default();
    if let Some(seed) = seed {
        split.seed = seed;
    }
    let splits = DatasetSplits::stratified(&corpus.labels, &split);

    let train = corpus.select(&splits.train).training_set()?;
    let model = CentroidClassifier::fit(&train).context("fitting centroid baseline")?;

    let train_accuracy = model.accuracy(&train)?;
    let validation_accuracy = held_out_accuracy(&model, &corpus, &splits.validation)?;
    let test_accuracy = held_out_accuracy(&model, &corpus, &splits.test)?;

    model
        .save(&output)
        .with_context(|| format!("writing {}", output.display()))?;

    let report = TrainReport {
        model: output.display().to_string(),
        labels: model.labels.clone(),
        train_samples: splits.train.len(),
        validation_samples: splits.validation.len(),
        test_samples: splits.test.len(),
        train_accuracy,
        validation_accuracy,
        test_accuracy,
    };
    emit_json(&report, None)
}

fn held_out_accuracy(
    model: &CentroidClassifier,
    corpus: &Corpus,
    indices: &[usize],
) -> Result<Option<f32>> {
    if indices.is_empty() {
        return Ok(None);
    }
    let set = corpus.select(indices).training_set()?;
    Ok(Some(model.accuracy(&set)?))
}

fn run_predict(config: &AppConfig, model: Option<PathBuf>, input: PathBuf) -> Result<()> {
    let model_path = model
        .or_else(|| config.serving.model_path.clone())
        .ok_or_else(|| anyhow!("no model given (use --model or serving.model_path)"))?;

    let model = CentroidClassifier::load(&model_path)
        .with_context(|| format!("loading model {}", model_path.display()))?;
    let pipeline = InferencePipeline::new(config).context("building inference pipeline")?;
    let prediction = pipeline
        .classify_path(&model, &input)
        .with_context(|| format!("classifying {}", input.display()))?;

    emit_json(&prediction, None)
}

#[cfg(feature = "http")]
fn run_serve(mut config: AppConfig, model: Option<PathBuf>, bind: Option<String>) -> Result<()> {
    use genre_features::inference::ModelHandle;

    if let Some(bind) = bind {
        config.serving.bind_addr = bind;
    }
    let handle = match model.or_else(|| config.serving.model_path.clone()) {
        Some(path) => ModelHandle::from_path(path),
        None => ModelHandle::unavailable(),
    };
    genre_features::http::serve_blocking(&config, handle)
}

#[cfg(not(feature = "http"))]
fn run_serve(_config: AppConfig, _model: Option<PathBuf>, _bind: Option<String>) -> Result<()> {
    Err(anyhow!("genre_cli was built without the `http` feature"))
}

fn emit_json<T: Serialize>(value: &T, output_path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    if let Some(path) = output_path {
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

#[derive(Serialize)]
struct ExtractReport {
    input: String,
    shape: (usize, usize, usize),
    n_mfcc: usize,
    n_mels: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    frames: Option<Vec<Vec<f32>>>,
}

#[derive(Serialize)]
struct TrainReport {
    model: String,
    labels: Vec<String>,
    train_samples: usize,
    validation_samples: usize,
    test_samples: usize,
    train_accuracy: f32,
    validation_accuracy: Option<f32>,
    test_accuracy: Option<f32>,
}
