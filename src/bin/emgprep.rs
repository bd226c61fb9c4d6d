use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use emgprep::{import_subjects, rms, PipelineConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "emgprep", about = "Load, filter and standardize raw EMG recordings")]
struct Args {
    /// Directory holding S<id>E<label>.mat files, their event tables and the registry
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Subject id to load (repeatable)
    #[arg(long = "subject", required = true)]
    subjects: Vec<u32>,

    /// JSON pipeline configuration (defaults apply to absent fields)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip filtering and standardization
    #[arg(long)]
    raw: bool,

    /// Filter but do not standardize
    #[arg(long)]
    no_standardize: bool,

    /// Start of the rest window (s)
    #[arg(long)]
    rest_start: Option<f64>,

    /// End of the rest window (s)
    #[arg(long)]
    rest_end: Option<f64>,

    /// Print per-channel RMS of this repetition (1-based)
    #[arg(long)]
    repetition: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if args.raw {
        cfg.filter.enabled = false;
        cfg.standardize = false;
    }
    if args.no_standardize {
        cfg.standardize = false;
    }
    if let Some(a) = args.rest_start {
        cfg.rest_window.0 = a;
    }
    if let Some(b) = args.rest_end {
        cfg.rest_window.1 = b;
    }

    let results = import_subjects(&args.data_dir, &args.subjects, &cfg)
        .with_context(|| format!("scanning {}", args.data_dir.display()))?;

    let mut failed = 0;
    for (id, result) in &results {
        let out = match result {
            Ok(out) => out,
            Err(err) => {
                error!(subject = id, kind = ?err.kind(), "{err}");
                failed += 1;
                continue;
            }
        };
        println!(
            "subject {id}: {} ch × {} samples @ {} Hz, {} repetitions",
            out.signal.nrows(),
            out.signal.ncols(),
            out.sampling_rate,
            out.n_repetitions()
        );

        if let Some(rep) = args.repetition {
            let rep = rep.checked_sub(1).context("repetitions are numbered from 1")?;
            let channels: Vec<usize> = (0..out.signal.nrows()).collect();
            let slice = out.repetition(rep, &channels)?;
            if slice.ncols() == 0 {
                println!("  rep {}: empty (start == end)", rep + 1);
                continue;
            }
            for (ch, row) in slice.rows().into_iter().enumerate() {
                if let Some(r) = rms(row) {
                    println!("  rep {} ch {:>2}: rms {r:.4}", rep + 1, ch + 1);
                }
            }
        }
    }

    info!(loaded = results.len() - failed, failed, "done");
    if failed > 0 {
        bail!("{failed} of {} subjects failed", results.len());
    }
    Ok(())
}
