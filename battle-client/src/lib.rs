//! Archmage Battle - Client Driver Library
//!
//! Shell around the battle core: the backend HTTP bridge, the log HUD, the
//! hand-landmark feed and the environment-driven configuration. The binary
//! in `main.rs` wires these into a headless Bevy app.

pub mod backend;
pub mod config;
pub mod hud;
pub mod logging;
pub mod vision;
