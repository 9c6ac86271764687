//! Market Probability Engine
//!
//! Process-wide hidden bias `p(t)`: the probability that any given price move
//! is upward. Alternates between a bullish and a bearish set-point, holding at
//! each for a random duration and sliding linearly between them.
//!
//! ```text
//!  0.58 ───────┐                     ┌──────────
//!              │ \                 / │
//!              │   \             /   │
//!  0.46        │     ────────────    │
//!      Holding  Transit.  Holding  Transit.
//! ```
//!
//! Time is supplied by the caller in milliseconds on a monotonic clock.

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::rng::DeterministicRng;

/// Bullish set-point.
pub const BULL_BIAS: f64 = 0.58;

/// Bearish set-point.
pub const BEAR_BIAS: f64 = 0.46;

/// Shortest hold or transition, in seconds.
pub const MIN_PHASE_SECS: u32 = 30;

/// Longest hold or transition, in seconds.
pub const MAX_PHASE_SECS: u32 = 45;

/// Reported-bias multiplier of an upward hack.
pub const HACK_UP_MULTIPLIER: f64 = 1.5;

/// Reported-bias multiplier of a downward hack.
pub const HACK_DOWN_MULTIPLIER: f64 = 0.7;

/// Default lifetime of a hack override, in seconds.
pub const DEFAULT_HACK_DURATION_SECS: u64 = 60;

/// Which half of the cycle the engine is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Sitting on a set-point.
    Holding,
    /// Sliding toward the other set-point.
    Transitioning,
}

/// Direction of an admin hack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HackDirection {
    /// Push the market up.
    Up,
    /// Push the market down.
    Down,
}

impl HackDirection {
    /// Multiplier applied to the reported bias.
    pub fn multiplier(self) -> f64 {
        match self {
            HackDirection::Up => HACK_UP_MULTIPLIER,
            HackDirection::Down => HACK_DOWN_MULTIPLIER,
        }
    }
}

/// Time-scoped scaling of the reported bias.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HackOverride {
    /// Factor applied to the underlying bias.
    pub multiplier: f64,
    /// Monotonic time at which the override lapses.
    pub expires_at_ms: u64,
}

impl HackOverride {
    /// Whether the override still applies at `now_ms`.
    pub fn is_active(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at_ms
    }
}

/// Snapshot of the state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbabilityState {
    /// Set-point currently held or being approached.
    pub target_bias: f64,
    /// Underlying bias as of the last advance.
    pub current_bias: f64,
    /// Current phase.
    pub phase: Phase,
    /// When the current phase began.
    pub phase_start_ms: u64,
    /// Length of the hold (only meaningful while holding).
    pub phase_duration_secs: u32,
    /// Bias at the start of the transition.
    pub transition_start: f64,
    /// Bias at the end of the transition.
    pub transition_end: f64,
    /// Length of the transition.
    pub transition_duration_secs: u32,
    /// Seconds into the transition as of the last advance.
    pub transition_elapsed_secs: f64,
}

/// Bias state machine plus the optional admin override.
#[derive(Clone, Debug)]
pub struct ProbabilityEngine {
    state: ProbabilityState,
    hack: Option<HackOverride>,
}

fn draw_duration(rng: &mut DeterministicRng) -> u32 {
    rng.next_int_range(MIN_PHASE_SECS, MAX_PHASE_SECS)
}

fn opposite(set_point: f64) -> f64 {
    if set_point == BULL_BIAS {
        BEAR_BIAS
    } else {
        BULL_BIAS
    }
}

impl ProbabilityEngine {
    /// Start holding at the bullish set-point.
    pub fn new(now_ms: u64, rng: &mut DeterministicRng) -> Self {
        let duration = draw_duration(rng);
        Self {
            state: ProbabilityState {
                target_bias: BULL_BIAS,
                current_bias: BULL_BIAS,
                phase: Phase::Holding,
                phase_start_ms: now_ms,
                phase_duration_secs: duration,
                transition_start: BULL_BIAS,
                transition_end: BULL_BIAS,
                transition_duration_secs: 0,
                transition_elapsed_secs: 0.0,
            },
            hack: None,
        }
    }

    /// Advance the state machine to `now_ms`.
    ///
    /// Phase boundaries are placed at the exact instant they fall due, so a
    /// late call produces the same path as a punctual one. Several boundaries
    /// may be crossed in one call. Returns the underlying bias.
    pub fn advance(&mut self, now_ms: u64, rng: &mut DeterministicRng) -> f64 {
        if let Some(hack) = self.hack {
            if !hack.is_active(now_ms) {
                info!(multiplier = hack.multiplier, "Market hack expired");
                self.hack = None;
            }
        }

        loop {
            let s = &mut self.state;
            match s.phase {
                Phase::Holding => {
                    let ends_at = s.phase_start_ms + u64::from(s.phase_duration_secs) * 1000;
                    if now_ms < ends_at {
                        break;
                    }
                    let from = s.current_bias;
                    let to = opposite(s.target_bias);
                    s.phase = Phase::Transitioning;
                    s.phase_start_ms = ends_at;
                    s.target_bias = to;
                    s.transition_start = from;
                    s.transition_end = to;
                    s.transition_duration_secs = draw_duration(rng);
                    s.transition_elapsed_secs = 0.0;
                }
                Phase::Transitioning => {
                    let ends_at = s.phase_start_ms + u64::from(s.transition_duration_secs) * 1000;
                    if now_ms < ends_at {
                        break;
                    }
                    s.current_bias = s.transition_end;
                    s.transition_elapsed_secs = f64::from(s.transition_duration_secs);
                    s.phase = Phase::Holding;
                    s.phase_start_ms = ends_at;
                    s.phase_duration_secs = draw_duration(rng);
                }
            }
        }

        if self.state.phase == Phase::Transitioning {
            self.state.transition_elapsed_secs =
                now_ms.saturating_sub(self.state.phase_start_ms) as f64 / 1000.0;
        }
        self.state.current_bias = self.underlying_bias_at(now_ms);
        self.state.current_bias
    }

    /// Underlying bias at `now_ms` within the current phase, without
    /// crossing into the next one.
    pub fn underlying_bias_at(&self, now_ms: u64) -> f64 {
        let s = &self.state;
        match s.phase {
            Phase::Holding => s.current_bias,
            Phase::Transitioning => {
                let duration = f64::from(s.transition_duration_secs);
                if duration <= 0.0 {
                    return s.transition_end;
                }
                let elapsed = (now_ms.saturating_sub(s.phase_start_ms) as f64 / 1000.0).min(duration);
                if elapsed >= duration {
                    s.transition_end
                } else {
                    s.transition_start + (s.transition_end - s.transition_start) * elapsed / duration
                }
            }
        }
    }

    /// Bias as seen by the price simulator and by callers: the underlying
    /// bias scaled by any active hack, clamped into `[0, 1]`.
    pub fn reported_bias(&self, now_ms: u64) -> f64 {
        let multiplier = self
            .hack
            .filter(|hack| hack.is_active(now_ms))
            .map_or(1.0, |hack| hack.multiplier);
        (self.underlying_bias_at(now_ms) * multiplier).clamp(0.0, 1.0)
    }

    /// Install a hack override lasting `duration_ms` from `now_ms`.
    ///
    /// Replaces any override already in place.
    pub fn set_hack(&mut self, direction: HackDirection, duration_ms: u64, now_ms: u64) -> HackOverride {
        let hack = HackOverride {
            multiplier: direction.multiplier(),
            expires_at_ms: now_ms.saturating_add(duration_ms),
        };
        self.hack = Some(hack);
        hack
    }

    /// Active override, if any, at `now_ms`.
    pub fn hack(&self, now_ms: u64) -> Option<HackOverride> {
        self.hack.filter(|hack| hack.is_active(now_ms))
    }

    /// Current state snapshot.
    pub fn state(&self) -> &ProbabilityState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP_MS: u64 = 100;

    fn engine() -> (ProbabilityEngine, DeterministicRng) {
        let mut rng = DeterministicRng::new(7);
        let engine = ProbabilityEngine::new(0, &mut rng);
        (engine, rng)
    }

    #[test]
    fn test_starts_holding_bullish() {
        let (engine, _) = engine();
        let state = engine.state();
        assert_eq!(state.phase, Phase::Holding);
        assert_eq!(state.current_bias, BULL_BIAS);
        assert!((MIN_PHASE_SECS..=MAX_PHASE_SECS).contains(&state.phase_duration_secs));
    }

    #[test]
    fn test_holds_until_duration_elapses() {
        let (mut engine, mut rng) = engine();
        let hold_ms = u64::from(engine.state().phase_duration_secs) * 1000;

        assert_eq!(engine.advance(hold_ms - 1, &mut rng), BULL_BIAS);
        assert_eq!(engine.state().phase, Phase::Holding);

        engine.advance(hold_ms, &mut rng);
        assert_eq!(engine.state().phase, Phase::Transitioning);
        assert_eq!(engine.state().target_bias, BEAR_BIAS);
        assert_eq!(engine.state().current_bias, BULL_BIAS);
    }

    #[test]
    fn test_bias_is_continuous() {
        let (mut engine, mut rng) = engine();
        // Steepest slope: 0.12 over 30 s.
        let max_step = (BULL_BIAS - BEAR_BIAS) / f64::from(MIN_PHASE_SECS) * (STEP_MS as f64 / 1000.0);

        let mut previous = engine.advance(0, &mut rng);
        for step in 1..=6000 {
            let bias = engine.advance(step * STEP_MS, &mut rng);
            assert!(
                (bias - previous).abs() <= max_step + 1e-12,
                "jump of {} at step {}",
                (bias - previous).abs(),
                step
            );
            assert!((BEAR_BIAS..=BULL_BIAS).contains(&bias));
            previous = bias;
        }
    }

    #[test]
    fn test_transition_is_monotonic_and_snaps() {
        let (mut engine, mut rng) = engine();
        let hold_ms = u64::from(engine.state().phase_duration_secs) * 1000;
        engine.advance(hold_ms, &mut rng);

        let transit_ms = u64::from(engine.state().transition_duration_secs) * 1000;
        let mut previous = engine.state().current_bias;
        let mut now = hold_ms;
        while now < hold_ms + transit_ms {
            now += STEP_MS;
            let bias = engine.advance(now.min(hold_ms + transit_ms - 1), &mut rng);
            assert!(bias <= previous, "bias rose during a bearish transition");
            previous = bias;
        }

        engine.advance(hold_ms + transit_ms, &mut rng);
        assert_eq!(engine.state().phase, Phase::Holding);
        assert_eq!(engine.state().current_bias, BEAR_BIAS);
        assert_eq!(engine.state().target_bias, BEAR_BIAS);
    }

    #[test]
    fn test_late_advance_crosses_several_phases() {
        let (mut engine, mut rng) = engine();
        // 10 minutes spans many holds and transitions.
        let bias = engine.advance(600_000, &mut rng);
        assert!((BEAR_BIAS..=BULL_BIAS).contains(&bias));
        assert!(engine.state().phase_start_ms <= 600_000);
    }

    #[test]
    fn test_underlying_bias_is_pure() {
        let (mut engine, mut rng) = engine();
        let hold_ms = u64::from(engine.state().phase_duration_secs) * 1000;
        engine.advance(hold_ms, &mut rng);

        let before = engine.state().clone();
        let midway = hold_ms + u64::from(before.transition_duration_secs) * 500;
        let expected = (BULL_BIAS + BEAR_BIAS) / 2.0;
        assert!((engine.underlying_bias_at(midway) - expected).abs() < 1e-9);
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn test_hack_scales_reported_bias_until_expiry() {
        let (mut engine, mut rng) = engine();
        engine.set_hack(HackDirection::Up, 60_000, 1_000);

        let boosted = engine.reported_bias(2_000);
        assert!((boosted - BULL_BIAS * HACK_UP_MULTIPLIER).abs() < 1e-12);
        assert!(engine.hack(60_999).is_some());

        // Underlying process is untouched.
        assert_eq!(engine.underlying_bias_at(2_000), BULL_BIAS);

        assert_eq!(engine.reported_bias(61_000), BULL_BIAS);
        engine.advance(61_000, &mut rng);
        assert!(engine.hack(61_000).is_none());
    }

    #[test]
    fn test_hack_down_and_clamp() {
        let (mut engine, _) = engine();
        engine.set_hack(HackDirection::Down, 60_000, 0);
        assert!((engine.reported_bias(0) - BULL_BIAS * HACK_DOWN_MULTIPLIER).abs() < 1e-12);

        let strong = ProbabilityEngine {
            state: engine.state().clone(),
            hack: Some(HackOverride { multiplier: 3.0, expires_at_ms: 10_000 }),
        };
        assert_eq!(strong.reported_bias(0), 1.0);
    }

    #[test]
    fn test_same_seed_same_path() {
        let (mut a, mut rng_a) = engine();
        let (mut b, mut rng_b) = engine();
        for second in 0..300u64 {
            assert_eq!(a.advance(second * 1000, &mut rng_a), b.advance(second * 1000, &mut rng_b));
        }
    }
}
