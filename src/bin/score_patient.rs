//! Score one patient record against a model artifact.
//!
//! Usage:
//!   score_patient <model.json> <patient.json> [--config <policy.json>]
//!
//! Prints the recommendation bundle as JSON on stdout. Logs go to stderr by
//! default; set `GLYCORISK_LOG_MODE=file` to send them to `GLYCORISK_LOG_FILE`
//! instead. Exits with status 2 when the patient record is rejected.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use glycorisk::adapters::sanitize::SanitizingMakeWriter;
use glycorisk::adapters::LogisticAdapter;
use glycorisk::{InferenceService, RawInput, ScreeningConfig};

struct Args {
    model: PathBuf,
    patient: PathBuf,
    config: Option<PathBuf>,
}

fn print_usage() {
    eprintln!("Usage: score_patient <model.json> <patient.json> [--config <policy.json>]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  GLYCORISK_LOG_MODE   stderr (default) or file");
    eprintln!("  GLYCORISK_LOG_FILE   log path when GLYCORISK_LOG_MODE=file");
    eprintln!("  RUST_LOG             log filter (default: info)");
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut config = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config requires a path")?;
                config = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("unknown option {other}"),
            other => positional.push(PathBuf::from(other)),
        }
    }

    if positional.len() != 2 {
        print_usage();
        bail!("expected a model path and a patient path");
    }
    let patient = positional.pop().context("missing patient path")?;
    let model = positional.pop().context("missing model path")?;

    Ok(Args {
        model,
        patient,
        config,
    })
}

fn read_patient(path: &Path) -> Result<RawInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read patient record {}", path.display()))?;
    serde_json::from_str(&content).context("Patient record must be a flat JSON object")
}

const DEFAULT_LOG_MODE: &str = "stderr";

fn logs_to_file(mode: &str) -> bool {
    mode.trim().eq_ignore_ascii_case("file")
}

fn main() -> Result<()> {
    let log_mode =
        std::env::var("GLYCORISK_LOG_MODE").unwrap_or_else(|_| DEFAULT_LOG_MODE.to_string());

    let (writer, guard) = if logs_to_file(&log_mode) {
        let log_file = std::env::var("GLYCORISK_LOG_FILE")
            .unwrap_or_else(|_| "glycorisk.log".to_string());

        if let Some(parent) = Path::new(&log_file).parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => ScreeningConfig::from_file(path)
            .with_context(|| format!("Failed to load policy {}", path.display()))?,
        None => ScreeningConfig::default(),
    };

    let model = Arc::new(LogisticAdapter::new());
    model
        .load_model(&args.model)
        .with_context(|| format!("Failed to load model {}", args.model.display()))?;

    let service = InferenceService::new(model, config)?;
    let patient = read_patient(&args.patient)?;

    let bundle = match service.run_inference(&patient) {
        Ok(bundle) => bundle,
        Err(e) if e.is_user_correctable() => {
            eprintln!("{e}");
            drop(guard);
            std::process::exit(2);
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", serde_json::to_string_pretty(&bundle)?);
    Ok(())
}
