//! Bit The Market Server
//!
//! Runs the market scheduler and walks a demo user through the provably-fair
//! bet lifecycle: provision, bet, rotate, verify.

use std::collections::BTreeMap;
use std::sync::Arc;
use anyhow::Context;
use rust_decimal_macros::dec;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bitmarket::{
    TICK_RATE_HZ, VERSION,
    casino::GameMode,
    config::EngineConfig,
    fairness::verify_bet,
    market::Asset,
    server::{Platform, Scheduler, UserId},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = EngineConfig::from_env().context("Invalid engine configuration")?;

    info!("Bit The Market Server v{}", VERSION);
    info!("Tick Rate: {} Hz ({:?} interval)", TICK_RATE_HZ, config.tick_interval);
    if config.diagnostics_enabled {
        warn!("Diagnostics enabled: next-roll peeks disclose unrevealed server seeds");
    }

    let platform = Arc::new(Platform::new(config));

    let scheduler = Scheduler::new(platform.clone());
    let shutdown = scheduler.shutdown_handle();
    let scheduler_handle = scheduler.spawn();

    demo_session(&platform).await?;

    info!("Press Ctrl+C to stop");
    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl+C")?;

    let _ = shutdown.send(());
    let ticks = scheduler_handle.await.context("Scheduler task failed")?;
    info!(ticks, "Shut down cleanly");

    Ok(())
}

/// Demo: a handful of bets, then a rotation and an independent check of each.
async fn demo_session(platform: &Platform) -> anyhow::Result<()> {
    info!("=== Starting Demo Session ===");

    let user = UserId::random();
    let opening = BTreeMap::from([(Asset::Bc, dec!(100)), (Asset::Usdt, dec!(100))]);
    let fairness = platform.provision(user, None, opening).await?;
    info!("User {} committed to server seed {}", user, fairness.hashed_server_seed);

    let bets = [
        (dec!(5), Asset::Bc, GameMode::Classic { win_chance: dec!(50) }),
        (dec!(2), Asset::Bc, GameMode::Classic { win_chance: dec!(10) }),
        (dec!(10), Asset::Usdt, GameMode::Ultimate { range_min: dec!(2500), range_max: dec!(7500) }),
        (dec!(1), Asset::Usdt, GameMode::Ultimate { range_min: dec!(0), range_max: dec!(9000) }),
    ];

    for (stake, currency, mode) in bets {
        let receipt = platform.place_bet(user, stake, currency, mode).await?;
        info!(
            "Nonce {}: rolled {} -> {:?} x{:.4}, profit {} {}, balance {}",
            receipt.record.nonce,
            receipt.roll,
            receipt.outcome,
            receipt.multiplier,
            receipt.profit,
            currency,
            receipt.new_balance,
        );
    }

    let history = platform.bet_history(user).await?;
    let rotation = platform.rotate_seed(user, None).await?;
    info!("Disclosed server seed {}", rotation.previous_server_seed);

    for record in &history {
        verify_bet(record, &rotation.previous_server_seed)
            .with_context(|| format!("Bet {} failed verification", record.id))?;
    }
    info!("All {} bets verified against the disclosed seed", history.len());

    let probability = platform.dynamic_probability().await;
    info!(
        "Market bias {:.4} ({:?}), BTC {:.8}",
        probability.reported_bias,
        probability.state.phase,
        platform.prices().await.get(&Asset::Btc).copied().unwrap_or_default(),
    );

    info!("=== Demo Session Complete ===");
    Ok(())
}
