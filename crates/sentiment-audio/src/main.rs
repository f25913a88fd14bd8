//! audio-sentiment - command line front end
//!
//! ## Commands
//!
//! - `convert <file.arff | dir>`: attribute-relation file(s) to table + matrix
//! - `predict`: per-sample model outputs, optionally written as CSV
//! - `evaluate`: loss/accuracy against the labels artifact
//! - `summary`: model inputs and outputs
//!
//! Settings come from `--config` (YAML, default `./audio-sentiment.yaml`),
//! then command line flags. A file named with `--config` must be valid.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use sentiment_audio::classifier::{AudioClassifier, ModelLocation, PredictionSet};
use sentiment_audio::config::AppConfig;
use sentiment_core::arff;

/// Sentiment classification from precomputed audio embeddings
#[derive(Parser)]
#[command(name = "audio-sentiment")]
#[command(version)]
#[command(about = "Convert ARFF feature files and run pre-trained audio sentiment models")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an .arff file (or every .arff file in a directory) to CSV
    Convert {
        /// Input file or directory
        path: PathBuf,
        /// Column to drop before numeric reduction (repeatable)
        #[arg(long = "exclude")]
        exclude: Vec<String>,
    },
    /// Predict every sample in the data source
    Predict {
        #[command(flatten)]
        classifier: ClassifierArgs,
        /// Write predictions as CSV instead of printing them
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate the model against the labels artifact
    Evaluate {
        #[command(flatten)]
        classifier: ClassifierArgs,
    },
    /// Print the model's inputs and outputs
    Summary {
        #[command(flatten)]
        classifier: ClassifierArgs,
    },
}

/// Flags overriding the `classifier` section of the config file
#[derive(Args)]
struct ClassifierArgs {
    /// Embeddings directory or zip archive
    #[arg(long)]
    data: Option<PathBuf>,
    /// Model path or http(s) URL
    #[arg(long)]
    model: Option<ModelLocation>,
    /// Treat the data source as a zip archive
    #[arg(long)]
    archive: bool,
    /// Labels are available: allow evaluation
    #[arg(long)]
    evaluate_mode: bool,
    /// Samples per inference batch
    #[arg(long)]
    batch_size: Option<usize>,
    /// Return this named model output instead of the default
    #[arg(long)]
    layer: Option<String>,
    /// Labels artifact (relative to the staged data directory)
    #[arg(long)]
    labels: Option<PathBuf>,
    /// Model download cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

impl ClassifierArgs {
    fn apply(self, config: &mut AppConfig) {
        let classifier = &mut config.classifier;
        if let Some(data) = self.data {
            classifier.source_is_archive = data
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("zip"));
            classifier.data_source = data;
        }
        if self.archive {
            classifier.source_is_archive = true;
        }
        if let Some(model) = self.model {
            classifier.model = model;
        }
        if self.evaluate_mode {
            classifier.test_mode = false;
        }
        if let Some(batch_size) = self.batch_size {
            classifier.batch_size = batch_size;
        }
        if self.layer.is_some() {
            classifier.intermediate_layer = self.layer;
        }
        if self.labels.is_some() {
            classifier.label_path = self.labels;
        }
        if self.cache_dir.is_some() {
            classifier.cache_dir = self.cache_dir;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();

    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Convert { path, exclude } => {
            if !exclude.is_empty() {
                config.converter.excluded_columns = exclude;
            }
            run_convert(&path, &config)
        }
        Commands::Predict { classifier, output } => {
            classifier.apply(&mut config);
            let predictions = AudioClassifier::new(config.classifier)?.predict()?;
            match output {
                Some(path) => write_predictions(&predictions, &path),
                None => {
                    print_predictions(&predictions);
                    Ok(())
                }
            }
        }
        Commands::Evaluate { classifier } => {
            classifier.apply(&mut config);
            match AudioClassifier::new(config.classifier)?.evaluate()? {
                Some(score) => println!("{}", score),
                None => println!("Evaluation cannot be done in test-mode (pass --evaluate-mode)"),
            }
            Ok(())
        }
        Commands::Summary { classifier } => {
            classifier.apply(&mut config);
            let summary = AudioClassifier::new(config.classifier)?.summary()?;
            println!("{}", summary);
            Ok(())
        }
    }
}

fn run_convert(path: &std::path::Path, config: &AppConfig) -> Result<()> {
    if path.is_dir() {
        let results = arff::convert_dir(path, &config.converter)
            .with_context(|| format!("Failed to convert files in {:?}", path))?;
        for (input, matrix) in &results {
            println!("{}: {} rows x {} columns", input.display(), matrix.nrows(), matrix.ncols());
        }
        println!("Converted {} file(s)", results.len());
    } else {
        let matrix = arff::convert_with(path, &config.converter)
            .with_context(|| format!("Failed to convert {:?}", path))?;
        println!(
            "{} -> {}: {} rows x {} columns",
            path.display(),
            config.converter.table_path(path).display(),
            matrix.nrows(),
            matrix.ncols()
        );
    }
    Ok(())
}

fn print_predictions(predictions: &PredictionSet) {
    for (id, row) in predictions.iter() {
        let values: Vec<String> = row.iter().map(|v| format!("{:.4}", v)).collect();
        println!("{}\t{}", id, values.join("\t"));
    }
}

fn write_predictions(predictions: &PredictionSet, path: &std::path::Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {:?}", path))?;

    let mut header = vec!["id".to_string()];
    header.extend((0..predictions.scores.ncols()).map(|i| format!("output_{}", i)));
    writer.write_record(&header)?;

    for (id, row) in predictions.iter() {
        let mut record = vec![id.to_string()];
        record.extend(row.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;

    log::info!("Wrote {} predictions to {:?}", predictions.len(), path);
    Ok(())
}
