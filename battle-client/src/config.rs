//! Environment-driven client configuration.

use std::path::PathBuf;

use archmage_core::config::BattleConfig;

const DEFAULT_BACKEND_URL: &str = "http://localhost:5001";
const DEFAULT_FRAME_MS: u64 = 16;

/// Driver settings, assembled from environment variables
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the gesture backend (`BACKEND_URL`)
    pub backend_url: String,
    /// Frame cadence in milliseconds (`FRAME_MS`)
    pub frame_ms: u64,
    /// Optional NDJSON hand-landmark replay file (`HAND_FEED`)
    pub hand_feed: Option<PathBuf>,
    /// Core battle tunables; `BATTLE_SEED` overrides the session seed
    pub battle: BattleConfig,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let backend_url =
            std::env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
        let frame_ms = std::env::var("FRAME_MS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_FRAME_MS);
        let hand_feed = std::env::var("HAND_FEED").ok().map(PathBuf::from);

        let mut battle = BattleConfig::default();
        if let Some(seed) = std::env::var("BATTLE_SEED")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
        {
            battle.rng_seed = seed;
        }

        Self {
            backend_url,
            frame_ms,
            hand_feed,
            battle,
        }
    }
}
