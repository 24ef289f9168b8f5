//! # ACL expansion driver
//!
//! ```text
//! aclx-expand <model.json> [config.json]
//! ```
//!
//! Loads and validates the security model, expands every selected user
//! against every selected list with the reference evaluator, and prints the
//! result as JSON on stdout. Logs go to stderr.
//!
//! ## Configuration
//!
//! Environment variables (override the config file):
//! - `ACLX_USER_NAME`, `ACLX_FIRST_NAME`, `ACLX_LAST_NAME` - user filter
//! - `ACLX_PARALLEL` - expand user chunks concurrently (default: false)
//! - `ACLX_CHUNK_SIZE` - users per chunk (default: 64)
//! - `ACLX_OUTPUT` - `tree` or `flat` (default: tree)
//! - `RUST_LOG` - log level (default: info)

use aclx_core::{AclEvaluator, SecurityModel};
use aclx_expansion::{AclExpander, ExpanderConfig, OutputFormat};
use anyhow::{bail, Context};
use std::io::Write;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(model_path) = args.next() else {
        bail!("usage: aclx-expand <model.json> [config.json]");
    };
    let config_path = args.next();

    info!("Starting aclx-expand v{}", aclx_expansion::VERSION);

    let model = SecurityModel::from_path(&model_path)
        .with_context(|| format!("loading model from {}", model_path))?;

    let config = match &config_path {
        Some(path) => ExpanderConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path))?,
        None => ExpanderConfig::default(),
    }
    .with_env_overrides()
    .context("applying environment overrides")?;

    info!(
        users = model.users().len(),
        acls = model.acls().len(),
        parallel = config.parallel,
        output = ?config.output,
        "Model loaded"
    );

    let evaluator = AclEvaluator::new();
    let expander = AclExpander::new(&model, &evaluator, config)?;
    let (entries, _stats) = expander.run()?;

    let json = match expander.config().output {
        OutputFormat::Flat => serde_json::to_string_pretty(&expander.sort_distinct(entries))?,
        OutputFormat::Tree => serde_json::to_string_pretty(&expander.build_tree(&entries))?,
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json)?;
    Ok(())
}
