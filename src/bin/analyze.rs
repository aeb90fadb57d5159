//! consistory CLI binary.
//!
//! Analyzes a single (novel, backstory) pair, or a whole batch described by
//! a YAML file, and writes the resulting reports to the output directory.
//!
//! # Environment Variables
//!
//! - `CONSISTORY_CONFIG` — optional path to a YAML config override
//! - `OPENAI_API_KEY` — if set, the advisory oracle is attached
//! - `OPENAI_MODEL` / `OPENAI_BASE_URL` — oracle overrides
//! - `RUST_LOG` — tracing filter (default: "info")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin analyze -- novel.txt backstory.txt [output_dir]
//! cargo run --bin analyze -- --batch pairs.yaml [output_dir]
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use consistory::oracle::{OpenAiOracle, OpenAiOracleConfig};
use consistory::pipeline::{Analyzer, BatchItem};
use consistory::report::{render_batch_csv, save_dossier};
use consistory::AnalyzerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,consistory=debug".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        bail!(
            "usage: analyze <novel.txt> <backstory.txt> [output_dir]\n       \
             analyze --batch <pairs.yaml> [output_dir]"
        );
    }

    let analyzer = build_analyzer()?;

    if args[0] == "--batch" {
        let Some(batch_path) = args.get(1) else {
            bail!("--batch requires a YAML file of pairs");
        };
        let output_dir = PathBuf::from(args.get(2).map(String::as_str).unwrap_or("results"));
        run_batch(&analyzer, Path::new(batch_path), &output_dir).await
    } else {
        if args.len() < 2 {
            bail!("usage: analyze <novel.txt> <backstory.txt> [output_dir]");
        }
        let output_dir = PathBuf::from(args.get(2).map(String::as_str).unwrap_or("results"));
        run_single(&analyzer, Path::new(&args[0]), Path::new(&args[1]), &output_dir).await
    }
}

fn build_analyzer() -> Result<Analyzer> {
    let config = match std::env::var("CONSISTORY_CONFIG") {
        Ok(path) => {
            let yaml = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config override {}", path))?;
            AnalyzerConfig::from_yaml(&yaml).context("parsing config override")?
        }
        Err(_) => AnalyzerConfig::default(),
    };

    let mut analyzer = Analyzer::new(config);
    if std::env::var("OPENAI_API_KEY").is_ok() {
        tracing::info!("advisory oracle enabled");
        let oracle = OpenAiOracle::new(OpenAiOracleConfig::from_env());
        analyzer = analyzer.with_oracle(Arc::new(oracle));
    }
    Ok(analyzer)
}

async fn run_single(
    analyzer: &Analyzer,
    novel_path: &Path,
    backstory_path: &Path,
    output_dir: &Path,
) -> Result<()> {
    let novel_text = tokio::fs::read_to_string(novel_path)
        .await
        .with_context(|| format!("reading novel {}", novel_path.display()))?;
    let backstory_text = tokio::fs::read_to_string(backstory_path)
        .await
        .with_context(|| format!("reading backstory {}", backstory_path.display()))?;

    let outcome = analyzer.analyze(&novel_text, &backstory_text, None).await;
    tracing::info!(
        prediction = outcome.prediction,
        method = ?outcome.method,
        "analysis complete: {}",
        outcome.rationale
    );

    let (json_path, md_path) = save_dossier(&outcome.dossier, output_dir)?;
    println!("prediction: {}", outcome.prediction);
    println!("rationale:  {}", outcome.rationale);
    println!("dossier:    {} / {}", json_path.display(), md_path.display());
    Ok(())
}

async fn run_batch(analyzer: &Analyzer, batch_path: &Path, output_dir: &Path) -> Result<()> {
    let yaml = std::fs::read_to_string(batch_path)
        .with_context(|| format!("reading batch file {}", batch_path.display()))?;
    let items: Vec<BatchItem> = serde_yaml::from_str(&yaml).context("parsing batch file")?;
    tracing::info!("loaded {} pairs", items.len());

    let records = analyzer.analyze_batch(&items).await;

    std::fs::create_dir_all(output_dir)?;
    let csv_path = output_dir.join("results.csv");
    std::fs::write(&csv_path, render_batch_csv(&records))?;

    let consistent = records.iter().filter(|r| r.prediction == 1).count();
    println!("processed {} pairs", records.len());
    println!("consistent: {}, contradictory: {}", consistent, records.len() - consistent);
    println!("results: {}", csv_path.display());
    Ok(())
}
