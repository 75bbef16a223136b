//! Backend wire contract.
//!
//! The gesture backend is an external oracle speaking JSON over HTTP. This
//! module owns the request/response DTOs and the best-effort notification
//! seam; it never performs I/O itself. The driver bridges these types onto
//! a real transport.
//!
//! Missing or unknown fields never fail a frame: everything defaults
//! (`event` → NONE, `cooldown`/`combo` → 0, unknown strings → `Unknown`).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Poll endpoint, called once per frame
pub const GET_COMMAND: &str = "/get_command";
/// One-shot stats endpoint, queried at game over
pub const GET_SPELL_STATS: &str = "/get_spell_stats";

/// Action string returned by the backend each poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    #[default]
    None,
    Fireball,
    IceShard,
    Lightning,
    ExplosionCombo,
    HealingLightCombo,
    LightningStrikeCombo,
    ChallengeSuccess,
    InsufficientMana,
    Cooldown,
    /// Forward-compatible catch-all; treated as a no-op
    #[serde(other)]
    Unknown,
}

/// Battle event modifier accompanying a command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    #[default]
    None,
    Weakfire,
    Weakice,
    ExplosionChallenge,
    HealLightChallenge,
    #[serde(other)]
    Unknown,
}

impl EventKind {
    /// Banner text shown while the event is active
    pub fn banner(&self) -> &'static str {
        match self {
            EventKind::None => "---",
            EventKind::Weakfire => "Boss is weak to FIRE!",
            EventKind::Weakice => "Boss is weak to ICE!",
            EventKind::ExplosionChallenge => "Perform the EXPLOSION COMBO!",
            EventKind::HealLightChallenge => "Perform the HEALING LIGHT COMBO!",
            EventKind::Unknown => "???",
        }
    }
}

/// `GET /get_command` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub command: CommandKind,
    #[serde(default)]
    pub event: EventKind,
    #[serde(default)]
    pub cooldown: f32,
    #[serde(default)]
    pub combo: u32,
    #[serde(default)]
    pub gesture: String,
    /// Authoritative mana push; absent on older backend builds
    #[serde(default)]
    pub mana: Option<i32>,
    #[serde(default)]
    pub max_mana: Option<i32>,
}

/// `GET /get_spell_stats` response, displayed on the game-over summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpellStats {
    #[serde(default)]
    pub favorite_spell_display: String,
    #[serde(default)]
    pub favorite_spell_count: u32,
}

/// Fire-and-forget client → backend notification.
///
/// These are best-effort bookkeeping: never awaited by gameplay, never
/// retried, failures logged and swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Latest classified hand gesture (wire name, e.g. "FIST")
    Gesture(String),
    /// Optimistic mana pickup, mirrored so server-side counters keep up
    AddMana(i32),
    /// The client zeroed its combo after taking damage
    ResetCombo,
}

impl Notification {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Notification::Gesture(_) => "/set_gesture",
            Notification::AddMana(_) => "/add_mana",
            Notification::ResetCombo => "/reset_combo",
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Notification::Gesture(gesture) => json!({ "gesture": gesture }),
            Notification::AddMana(amount) => json!({ "amount": amount }),
            Notification::ResetCombo => json!({}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_response_full_round_trip() {
        let raw = r#"{
            "command": "FIREBALL",
            "event": "WEAKFIRE",
            "cooldown": 1.5,
            "combo": 4,
            "gesture": "FIST",
            "mana": 80,
            "max_mana": 100
        }"#;
        let resp: CommandResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.command, CommandKind::Fireball);
        assert_eq!(resp.event, EventKind::Weakfire);
        assert_eq!(resp.combo, 4);
        assert_eq!(resp.mana, Some(80));
    }

    #[test]
    fn missing_fields_default_instead_of_failing() {
        let resp: CommandResponse = serde_json::from_str(r#"{"command": "ICE_SHARD"}"#).unwrap();
        assert_eq!(resp.command, CommandKind::IceShard);
        assert_eq!(resp.event, EventKind::None);
        assert_eq!(resp.cooldown, 0.0);
        assert_eq!(resp.combo, 0);
        assert_eq!(resp.mana, None);
    }

    #[test]
    fn unknown_strings_map_to_unknown_variants() {
        let resp: CommandResponse =
            serde_json::from_str(r#"{"command": "METEOR_SWARM", "event": "SOLAR_FLARE"}"#).unwrap();
        assert_eq!(resp.command, CommandKind::Unknown);
        assert_eq!(resp.event, EventKind::Unknown);
    }

    #[test]
    fn notification_endpoints_and_bodies() {
        let n = Notification::AddMana(20);
        assert_eq!(n.endpoint(), "/add_mana");
        assert_eq!(n.body(), json!({ "amount": 20 }));

        let n = Notification::Gesture("OPEN_PALM".to_string());
        assert_eq!(n.endpoint(), "/set_gesture");
        assert_eq!(n.body(), json!({ "gesture": "OPEN_PALM" }));

        assert_eq!(Notification::ResetCombo.body(), json!({}));
    }
}
