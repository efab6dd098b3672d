use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tracing::info;
use uiot_core::{init_tracing, load_config};
use uiot_sim::{RollingHistory, RoundScheduler};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing("uiot-sim")?;
    let cfg = load_config()?;
    info!(?cfg, "config loaded");

    let mut history = RollingHistory::new(cfg.history_len);
    if let Some(dir) = &cfg.artifacts_dir {
        history = history.with_artifacts_dir(dir);
    }
    let rounds = cfg.rounds;
    let scheduler = RoundScheduler::new(cfg, Arc::new(history));

    tokio::select! {
        res = scheduler.run_many(rounds) => {
            for r in res? {
                info!(
                    round_id = r.round_id,
                    generated = r.generated,
                    emergencies = r.emergencies,
                    lost = r.channel_losses,
                    unroutable = r.routing_drops,
                    batches = r.batches_collected,
                    "round_summary"
                );
            }
        }
        _ = signal::ctrl_c() => {
            info!("simulation stopped");
        }
    }
    Ok(())
}
