//! Runtime battle session state.
//!
//! One `GameSession` owns both combatants' vitals, the mana pool, the combo
//! tracker, the derived boss phase and the match outcome. Health is only
//! ever mutated through the clamped write path, which also runs the
//! downstream checks in a fixed order: clamp -> display -> combo-reset
//! (player damage only) -> end-of-game/phase checks.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::config::BattleConfig;
use crate::phase::BossPhase;

/// Settle delay between the player hitting 0 and the defeat report
const DEFEAT_REPORT_DELAY: f32 = 0.1;

/// Which combatant a vitals/damage event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Combatant {
    Player,
    Boss,
}

/// Match result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Victory,
    Defeat,
}

/// Clamped health pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    current: i32,
    max: i32,
}

impl Vitals {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    /// Clamp `value` into `[0, max]` and store it; returns the stored value
    pub fn set(&mut self, value: i32) -> i32 {
        self.current = value.clamp(0, self.max);
        self.current
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn ratio(&self) -> f32 {
        self.current as f32 / self.max as f32
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }
}

/// Clamped mana pool. Server pushes are authoritative; pickup rewards are
/// optimistic local gains mirrored to the backend best-effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaPool {
    current: i32,
    max: i32,
}

impl ManaPool {
    pub fn new(current: i32, max: i32) -> Self {
        Self {
            current: current.clamp(0, max),
            max,
        }
    }

    /// Authoritative server push (may also move the cap)
    pub fn sync(&mut self, current: i32, max: i32) {
        self.max = max;
        self.current = current.clamp(0, max);
    }

    /// Optimistic local delta (collectible pickup)
    pub fn gain(&mut self, amount: i32) -> i32 {
        self.current = (self.current + amount).clamp(0, self.max);
        self.current
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn max(&self) -> i32 {
        self.max
    }
}

/// Consecutive-success counter with the one-poll-cycle client-wins override.
///
/// The server value normally wins on every poll; when the client zeroes the
/// combo locally (player took damage) the next single server value is
/// discarded so a stale count cannot clobber the reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComboTracker {
    count: u32,
    highest: u32,
    just_reset: bool,
}

impl ComboTracker {
    /// Optimistic bump on a successful spell resolution
    pub fn increment(&mut self) {
        self.count += 1;
        self.highest = self.highest.max(self.count);
    }

    /// Client-initiated reset; returns true when there was a combo to drop
    pub fn reset_local(&mut self) -> bool {
        if self.count == 0 {
            return false;
        }
        self.count = 0;
        self.just_reset = true;
        true
    }

    /// Server-reported count, subject to the one-cycle override
    pub fn sync_from_server(&mut self, server_count: u32) {
        if self.just_reset {
            self.just_reset = false;
            return;
        }
        self.count = server_count;
        self.highest = self.highest.max(self.count);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn highest(&self) -> u32 {
        self.highest
    }

    pub fn just_reset(&self) -> bool {
        self.just_reset
    }
}

/// Side effects of a health write, resolved by the orchestrating system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEffect {
    /// Player damage zeroed a nonzero combo; backend must be told
    ComboReset,
    /// Boss health crossed a phase boundary
    PhaseShift(BossPhase),
    /// Boss health reached zero while running (finisher entry point)
    BossDown,
    /// Player health reached zero; defeat is pending
    PlayerDown,
}

/// Internal carrier for [`SessionEffect`]s between systems
#[derive(Event, Debug, Clone, Copy)]
pub struct SessionFx(pub SessionEffect);

// Display-facing events (the headless stand-ins for DOM updates)

#[derive(Event, Debug, Clone, Copy)]
pub struct VitalsChanged {
    pub target: Combatant,
    pub current: i32,
    pub max: i32,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct ManaChanged {
    pub current: i32,
    pub max: i32,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct ComboChanged {
    pub count: u32,
    pub highest: u32,
}

/// Floating combat number
#[derive(Event, Debug, Clone, Copy)]
pub struct DamageNumber {
    pub target: Combatant,
    pub amount: i32,
    pub healing: bool,
    /// Damage halved because the boss was mid-attack
    pub resisted: bool,
}

/// Final outcome report; fired exactly once per match
#[derive(Event, Debug, Clone, Copy)]
pub struct GameOutcome {
    pub victory: bool,
}

/// The whole in-memory battle state
#[derive(Resource)]
pub struct GameSession {
    pub player: Vitals,
    pub boss: Vitals,
    pub mana: ManaPool,
    pub combo: ComboTracker,
    phase: BossPhase,
    running: bool,
    outcome: Option<Outcome>,
    defeat_delay: Option<Timer>,
    elapsed: f32,
    last_attack_check: f32,
    rng: Xoshiro256PlusPlus,
}

impl GameSession {
    pub fn new(config: &BattleConfig) -> Self {
        Self {
            player: Vitals::new(config.max_player_health),
            boss: Vitals::new(config.max_boss_health),
            mana: ManaPool::new(config.starting_mana, config.max_mana),
            combo: ComboTracker::default(),
            phase: BossPhase::Normal,
            running: true,
            outcome: None,
            defeat_delay: None,
            elapsed: 0.0,
            last_attack_check: 0.0,
            rng: Xoshiro256PlusPlus::seed_from_u64(config.rng_seed),
        }
    }

    /// Restore the session to its opening state (replay)
    pub fn reset(&mut self, config: &BattleConfig) {
        *self = Self::new(config);
    }

    /// Clamped player-health write with the full downstream check chain
    pub fn set_player_health(&mut self, value: i32) -> Vec<SessionEffect> {
        let old = self.player.current();
        let new = self.player.set(value);
        let mut effects = Vec::new();
        if new < old && self.combo.reset_local() {
            effects.push(SessionEffect::ComboReset);
        }
        self.check_game_end(&mut effects);
        effects
    }

    /// Clamped boss-health write; re-derives the phase on every call
    pub fn set_boss_health(&mut self, value: i32) -> Vec<SessionEffect> {
        self.boss.set(value);
        let mut effects = Vec::new();
        let derived = BossPhase::for_ratio(self.boss.ratio());
        if derived != self.phase {
            self.phase = derived;
            effects.push(SessionEffect::PhaseShift(derived));
        }
        self.check_game_end(&mut effects);
        effects
    }

    fn check_game_end(&mut self, effects: &mut Vec<SessionEffect>) {
        if !self.running {
            return;
        }
        if self.player.is_depleted() {
            self.running = false;
            self.outcome = Some(Outcome::Defeat);
            self.defeat_delay = Some(Timer::from_seconds(DEFEAT_REPORT_DELAY, TimerMode::Once));
            effects.push(SessionEffect::PlayerDown);
        } else if self.boss.is_depleted() {
            effects.push(SessionEffect::BossDown);
        }
    }

    /// Claim the victory outcome. Returns false when an outcome (defeat
    /// included) already exists, so defeat pre-empts a pending finisher.
    pub fn report_victory(&mut self) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.outcome = Some(Outcome::Victory);
        self.running = false;
        true
    }

    /// Advance the battle clock; returns `Some(Defeat)` the tick the
    /// settle delay elapses
    pub fn tick(&mut self, delta: std::time::Duration) -> Option<Outcome> {
        if self.running {
            self.elapsed += delta.as_secs_f32();
        }
        if let Some(timer) = self.defeat_delay.as_mut() {
            if timer.tick(delta).just_finished() {
                self.defeat_delay = None;
                return Some(Outcome::Defeat);
            }
        }
        None
    }

    /// Time-gate for the autonomous boss-attack roll
    pub fn attack_check_due(&mut self, interval: f32) -> bool {
        if self.elapsed - self.last_attack_check < interval {
            return false;
        }
        self.last_attack_check = self.elapsed;
        true
    }

    pub fn phase(&self) -> BossPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Seconds since the session started
    pub fn duration(&self) -> f32 {
        self.elapsed
    }

    pub fn rng_mut(&mut self) -> &mut Xoshiro256PlusPlus {
        &mut self.rng
    }
}

/// Player-health write helper: sends the display event and forwards effects
pub fn write_player_health(
    session: &mut GameSession,
    value: i32,
    fx: &mut EventWriter<SessionFx>,
    vitals: &mut EventWriter<VitalsChanged>,
) {
    let effects = session.set_player_health(value);
    vitals.send(VitalsChanged {
        target: Combatant::Player,
        current: session.player.current(),
        max: session.player.max(),
    });
    for effect in effects {
        fx.send(SessionFx(effect));
    }
}

/// Boss-health write helper: sends the display event and forwards effects
pub fn write_boss_health(
    session: &mut GameSession,
    value: i32,
    fx: &mut EventWriter<SessionFx>,
    vitals: &mut EventWriter<VitalsChanged>,
) {
    let effects = session.set_boss_health(value);
    vitals.send(VitalsChanged {
        target: Combatant::Boss,
        current: session.boss.current(),
        max: session.boss.max(),
    });
    for effect in effects {
        fx.send(SessionFx(effect));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn session() -> GameSession {
        GameSession::new(&BattleConfig::default())
    }

    #[test]
    fn health_writes_clamp_both_ends() {
        let mut s = session();
        s.set_player_health(9_999);
        assert_eq!(s.player.current(), 250);
        s.set_player_health(-50);
        assert_eq!(s.player.current(), 0);
        let mut s = session();
        s.set_boss_health(i32::MIN);
        assert_eq!(s.boss.current(), 0);
    }

    #[test]
    fn player_damage_resets_nonzero_combo_and_flags_it() {
        let mut s = session();
        s.combo.increment();
        s.combo.increment();
        let effects = s.set_player_health(200);
        assert!(effects.contains(&SessionEffect::ComboReset));
        assert_eq!(s.combo.count(), 0);
        assert!(s.combo.just_reset());
        // highest survives the reset
        assert_eq!(s.combo.highest(), 2);
    }

    #[test]
    fn heal_does_not_touch_the_combo() {
        let mut s = session();
        s.set_player_health(200);
        s.combo.increment();
        let effects = s.set_player_health(225);
        assert!(effects.is_empty());
        assert_eq!(s.combo.count(), 1);
    }

    #[test]
    fn damage_with_zero_combo_does_not_flag_a_reset() {
        let mut s = session();
        let effects = s.set_player_health(200);
        assert!(effects.is_empty());
        assert!(!s.combo.just_reset());
    }

    #[test]
    fn combo_override_lasts_exactly_one_sync() {
        let mut s = session();
        s.combo.increment();
        s.set_player_health(200);
        // First server value after the local reset is discarded
        s.combo.sync_from_server(7);
        assert_eq!(s.combo.count(), 0);
        // The next one wins again
        s.combo.sync_from_server(7);
        assert_eq!(s.combo.count(), 7);
        assert_eq!(s.combo.highest(), 7);
    }

    #[test]
    fn boss_write_derives_phase_once_per_crossing() {
        let mut s = session();
        let effects = s.set_boss_health(130); // 65% of 200
        assert!(effects.contains(&SessionEffect::PhaseShift(BossPhase::Enraged)));
        // Still inside the band: no second transition
        let effects = s.set_boss_health(100);
        assert!(effects.is_empty());
        let effects = s.set_boss_health(66); // 33%
        assert!(effects.contains(&SessionEffect::PhaseShift(BossPhase::FinalForm)));
    }

    #[test]
    fn boss_heal_can_move_the_phase_back_up() {
        let mut s = session();
        s.set_boss_health(60);
        assert_eq!(s.phase(), BossPhase::FinalForm);
        let effects = s.set_boss_health(180);
        assert!(effects.contains(&SessionEffect::PhaseShift(BossPhase::Normal)));
    }

    #[test]
    fn boss_at_zero_raises_boss_down_but_keeps_running() {
        let mut s = session();
        let effects = s.set_boss_health(0);
        assert!(effects.contains(&SessionEffect::BossDown));
        assert!(s.is_running());
        assert_eq!(s.outcome(), None);
    }

    #[test]
    fn player_at_zero_stops_the_game_and_schedules_defeat() {
        let mut s = session();
        let effects = s.set_player_health(0);
        assert!(effects.contains(&SessionEffect::PlayerDown));
        assert!(!s.is_running());
        assert_eq!(s.outcome(), Some(Outcome::Defeat));
        // Settle delay: nothing on the first 50ms, report on the next
        assert_eq!(s.tick(Duration::from_millis(50)), None);
        assert_eq!(s.tick(Duration::from_millis(60)), Some(Outcome::Defeat));
        // ... and never again
        assert_eq!(s.tick(Duration::from_millis(200)), None);
    }

    #[test]
    fn defeat_pre_empts_victory() {
        let mut s = session();
        s.set_player_health(0);
        assert!(!s.report_victory());
        assert_eq!(s.outcome(), Some(Outcome::Defeat));
    }

    #[test]
    fn victory_reports_once() {
        let mut s = session();
        s.set_boss_health(0);
        assert!(s.report_victory());
        assert!(!s.report_victory());
        assert!(!s.is_running());
    }

    #[test]
    fn attack_gate_opens_every_interval() {
        let mut s = session();
        assert!(!s.attack_check_due(1.5));
        s.tick(Duration::from_millis(800));
        assert!(!s.attack_check_due(1.5));
        s.tick(Duration::from_millis(800));
        assert!(s.attack_check_due(1.5));
        // Gate closes again right after
        assert!(!s.attack_check_due(1.5));
    }

    #[test]
    fn reset_restores_the_opening_state() {
        let config = BattleConfig::default();
        let mut s = GameSession::new(&config);
        s.combo.increment();
        s.set_boss_health(50);
        s.set_player_health(0);
        s.reset(&config);
        assert_eq!(s.player.current(), 250);
        assert_eq!(s.boss.current(), 200);
        assert_eq!(s.combo.count(), 0);
        assert_eq!(s.phase(), BossPhase::Normal);
        assert!(s.is_running());
        assert_eq!(s.outcome(), None);
    }

    #[test]
    fn mana_sync_and_gain_both_clamp() {
        let mut pool = ManaPool::new(100, 100);
        pool.gain(50);
        assert_eq!(pool.current(), 100);
        pool.sync(-20, 120);
        assert_eq!(pool.current(), 0);
        assert_eq!(pool.max(), 120);
        pool.gain(200);
        assert_eq!(pool.current(), 120);
    }

    proptest! {
        #[test]
        fn vitals_invariant_holds_for_any_write(value in i32::MIN..i32::MAX, max in 1..10_000i32) {
            let mut vitals = Vitals::new(max);
            let stored = vitals.set(value);
            prop_assert!(stored >= 0 && stored <= max);
            prop_assert_eq!(stored, vitals.current());
        }

        #[test]
        fn mana_invariant_holds_for_any_gain(start in 0..500i32, amount in i32::MIN / 2..i32::MAX / 2) {
            let mut pool = ManaPool::new(start, 500);
            let stored = pool.gain(amount);
            prop_assert!(stored >= 0 && stored <= 500);
        }
    }
}
