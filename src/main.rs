//! TEAMBALANCE — fair team generator
//!
//! Entry point. Loads configuration, initialises structured logging,
//! reads the roster, searches for the fairest team splits on a blocking
//! worker (cancellable with Ctrl+C or the configured timeout), and prints
//! the ranked options.

use anyhow::{Context, Result};
use tracing::{info, warn};
use uuid::Uuid;

use teambalance::config::{self, OutputFormat};
use teambalance::engine::{Balancer, CancelToken};
use teambalance::report::{self, BalanceReport};
use teambalance::source::roster::RosterFile;
use teambalance::source::ParticipantSource;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = config::AppConfig::load_default()?;

    init_logging();

    let run_id = Uuid::new_v4();
    info!(
        %run_id,
        num_teams = cfg.balancer.num_teams,
        top_k = cfg.balancer.top_k,
        roster = %cfg.roster.path.display(),
        "TEAMBALANCE starting"
    );

    // -- Participants ----------------------------------------------------

    let source = RosterFile::new(cfg.roster.path.clone());
    let participants = source.fetch_participants().await?;
    info!(%run_id, source = source.name(), count = participants.len(), "Participants loaded");

    // -- Search ----------------------------------------------------------

    let cancel = match cfg.balancer.timeout() {
        Some(timeout) => CancelToken::with_timeout(timeout),
        None => CancelToken::new(),
    };

    let balancer = Balancer::new(cfg.balancer.limits());
    let (num_teams, top_k) = (cfg.balancer.num_teams, cfg.balancer.top_k);
    let participant_count = participants.len();

    let worker_cancel = cancel.clone();
    let mut worker = tokio::task::spawn_blocking(move || {
        balancer.balance(&participants, num_teams, top_k, &worker_cancel)
    });

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let joined = tokio::select! {
        res = &mut worker => res,
        _ = &mut shutdown => {
            warn!(%run_id, "Shutdown signal received, cancelling search");
            cancel.cancel();
            worker.await
        }
    };
    let matches = joined.context("Balancer worker panicked")??;

    // -- Output ----------------------------------------------------------

    match cfg.output.format {
        OutputFormat::Text => print!("{}", report::render_text(&matches)),
        OutputFormat::Json => {
            let report = BalanceReport::new(&matches, participant_count, num_teams);
            println!("{}", report::render_json(&report)?);
        }
    }

    info!(%run_id, options = matches.len(), "TEAMBALANCE finished");
    Ok(())
}

/// Initialise the `tracing` subscriber. Logs go to stderr so stdout only
/// carries the report.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("teambalance=info"));

    let json_logging = std::env::var("TEAMBALANCE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
