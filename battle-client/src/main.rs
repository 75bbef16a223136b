use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use tracing::info;

use archmage_client::config::ClientConfig;
use archmage_client::{backend, hud, logging, vision};
use archmage_core::BossBattlePlugin;

fn main() -> anyhow::Result<()> {
    logging::init();
    let config = ClientConfig::from_env();
    info!(
        backend = %config.backend_url,
        frame_ms = config.frame_ms,
        seed = config.battle.rng_seed,
        "starting archmage battle client"
    );

    let bridge = backend::spawn(config.backend_url.clone())?;

    let feed = match &config.hand_feed {
        Some(path) => {
            info!(path = %path.display(), "replaying hand feed");
            Some(vision::spawn_replay(path)?)
        }
        None => None,
    };

    let exit = App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_millis(
            config.frame_ms,
        ))))
        .add_plugins(BossBattlePlugin::new(config.battle.clone()))
        .insert_resource(bridge)
        .insert_resource(vision::HandFeed::new(feed))
        .init_resource::<vision::HandTracker>()
        .init_resource::<hud::SummaryState>()
        .add_systems(
            PreUpdate,
            (backend::pump_backend, vision::ingest_hand_frames),
        )
        .add_systems(
            PostUpdate,
            (
                backend::forward_notifications,
                hud::hud_vitals,
                hud::hud_banners,
                hud::hud_combat,
                hud::hud_sprites,
                hud::game_over_summary,
            ),
        )
        .run();

    if let AppExit::Error(code) = exit {
        anyhow::bail!("battle client exited with error code {code}");
    }
    Ok(())
}
