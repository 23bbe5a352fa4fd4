//! Triage command-line entrypoint.
//!
//! `triage "<complaint>" ...` prints one JSON result per argument. With no text
//! arguments it reads complaints from stdin, one per line. Put `--` before
//! complaint text that itself starts with `--`.

use std::sync::Arc;

use mimalloc::MiMalloc;
use tokio::io::{AsyncBufReadExt, BufReader};

use triage::config::TriageConfig;
use triage::encoder::{TextEncoder, device_label};
use triage::pipeline::Predictor;
use triage::service::PredictionService;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const DEMO_COMPLAINTS: [&str; 5] = [
    "My credit card was charged twice for the same purchase",
    "I can't log into my account, forgot password",
    "The mobile app keeps crashing when I try to upload photos",
    "Someone used my account without permission",
    "I need help with a refund for my recent order",
];

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    show_categories: bool,
    demo: bool,
    texts: Vec<String>,
}

impl CliArgs {
    /// Unknown `--flags` are rejected. Everything after a bare `--` is complaint text.
    fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--categories" => parsed.show_categories = true,
                "--demo" => parsed.demo = true,
                "--" => {
                    parsed.texts.extend(args.by_ref());
                    break;
                }
                flag if flag.starts_with("--") => {
                    anyhow::bail!("unknown flag '{}' (use '--' before text starting with '--')", flag)
                }
                _ => parsed.texts.push(arg),
            }
        }

        Ok(parsed)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let CliArgs {
        show_categories,
        demo,
        texts,
    } = CliArgs::parse(std::env::args().skip(1))?;

    let config = TriageConfig::from_env()?;
    config.validate()?;

    tracing::info!(
        models_dir = %config.models_dir.display(),
        encoder_path = %config.encoder_path.display(),
        device = %config.device,
        "Triage starting"
    );

    let predictor = Predictor::load(&config)?;
    let categories = predictor.available_categories();
    tracing::info!(
        device = device_label(predictor.encoder().device()),
        embedding_dim = predictor.encoder().embedding_dim(),
        departments = ?categories.departments,
        priorities = ?categories.priorities,
        "Predictor ready"
    );

    let service = PredictionService::new(Arc::new(predictor)).with_timeout(config.predict_timeout);

    if show_categories {
        println!("{}", serde_json::to_string(service.available_categories())?);
        return Ok(());
    }

    if demo {
        for complaint in DEMO_COMPLAINTS {
            let result = service.predict(complaint).await;
            tracing::info!(
                complaint,
                department = %result.department,
                priority = %result.priority,
                success = result.success,
                "Demo prediction"
            );
        }
        return Ok(());
    }

    if !texts.is_empty() {
        for text in texts {
            let result = service.predict(text).await;
            println!("{}", serde_json::to_string(&result)?);
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let result = service.predict(line).await;
        println!("{}", serde_json::to_string(&result)?);
    }

    tracing::info!("Triage finished");
    Ok(())
}
