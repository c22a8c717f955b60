//! Spatial verification service.
//!
//! Scores one experiment against one observation dataset for one case
//! study: per init time, every lead time overlapping the case window is
//! verified with FSS and SAL and appended to the persisted score records.
//! Already-scored lead times are reused, so re-running after new forecast
//! files arrive only does the new work.

mod config;
mod provider;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use verif_common::{lead_time_range, parse_init_time, VerifKey};
use verif_session::VerificationSession;
use verif_store::RecordStore;

use config::VerifierConfig;
use provider::DirectoryProvider;

#[derive(Parser, Debug)]
#[command(name = "verifier")]
#[command(about = "FSS/SAL verification of forecast fields against observations")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/verifier.yaml")]
    config: String,

    /// Verify a single init time (default: all configured)
    #[arg(long)]
    init: Option<String>,

    /// Discard existing records and rescore everything
    #[arg(long)]
    replace: bool,

    /// Score lead times in parallel
    #[arg(long)]
    parallel: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = VerifierConfig::load(args.config.as_ref())?;
    info!(
        obs = %config.obs_dataset,
        case = %config.case.name,
        experiment = %config.experiment.name,
        variable = %config.variable.name,
        "loaded configuration"
    );

    let case_start = parse_init_time(&config.case.start)?;
    let case_end = parse_init_time(&config.case.end)?;
    let store = RecordStore::new(&config.paths.records_dir);

    for (init_label, horizon_label) in &config.experiment.inits {
        if let Some(only) = &args.init {
            if only != init_label {
                continue;
            }
        }

        let init = parse_init_time(init_label)?;
        let horizon = parse_init_time(horizon_label)?;
        let mut leads = lead_time_range(case_start, case_end, init, horizon);
        if leads.is_empty() {
            warn!(init = %init_label, "forecast does not overlap the case window");
            continue;
        }

        let provider = DirectoryProvider::new(
            &config.paths.data_dir,
            &config.obs_dataset,
            &config.case.name,
            &config.experiment.name,
            init,
        );
        let available = provider.available_lead_times();
        let before = leads.len();
        leads.retain(|lead| available.contains(lead));
        if leads.len() < before {
            warn!(
                init = %init_label,
                missing = before - leads.len(),
                "prediction files not yet regridded for some lead times"
            );
        }

        let key = VerifKey::new(
            config.obs_dataset.clone(),
            config.case.name.clone(),
            config.experiment.name.clone(),
            init_label.clone(),
        );
        let session = VerificationSession::new(key, config.variable.clone(), store.clone())
            .context("session setup")?
            .with_parallel(args.parallel || config.parallel);

        let outcome = session
            .verify(&provider, &leads, args.replace)
            .with_context(|| format!("verification failed for init {}", init_label))?;
        info!(
            init = %init_label,
            scored = outcome.scored.len(),
            reused = outcome.reused.len(),
            skipped = outcome.skipped.len(),
            "init time done"
        );
    }

    Ok(())
}
