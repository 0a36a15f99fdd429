//! Entrance throttling - usage-per-hour ceilings and post-use cooldowns.
//!
//! Pure arithmetic over unix-second timestamps supplied by the caller;
//! nothing here reads a clock. The ceiling counts the entrance's rolling
//! use log inside the trailing hour, so bursts are counted exactly rather
//! than approximated from the latest timestamp alone.

use serde::{Deserialize, Serialize};

use crate::constants::USAGE_WINDOW_SECS;

/// Result of a throttle check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThrottleDecision {
    pub allowed: bool,
    pub denial: Option<ThrottleDenial>,
    /// Seconds until the gate would next allow passage, when denied.
    pub retry_after_secs: Option<i64>,
}

impl ThrottleDecision {
    fn pass() -> Self {
        Self {
            allowed: true,
            denial: None,
            retry_after_secs: None,
        }
    }

    fn deny(denial: ThrottleDenial, retry_after_secs: i64) -> Self {
        Self {
            allowed: false,
            denial: Some(denial),
            retry_after_secs: Some(retry_after_secs),
        }
    }
}

/// Why the throttle refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThrottleDenial {
    /// The trailing-hour use count reached the entrance ceiling.
    LimitExceeded,
    /// The per-use cooldown has not elapsed.
    CooldownActive,
}

/// Uses recorded within the trailing hour. Preview surfaces this number.
pub fn uses_in_window(recent_uses: &[i64], now: i64) -> u32 {
    recent_uses
        .iter()
        .filter(|&&t| t > now - USAGE_WINDOW_SECS)
        .count() as u32
}

/// The use log with aged-out entries dropped. The commit path prunes
/// before appending so the log stays one hour deep.
pub fn prune_window(recent_uses: &[i64], now: i64) -> Vec<i64> {
    recent_uses
        .iter()
        .copied()
        .filter(|&t| t > now - USAGE_WINDOW_SECS)
        .collect()
}

/// Usage ceiling: at most `max_per_hour` uses within the trailing hour.
/// A ceiling of zero means unlimited.
pub fn check_usage(max_per_hour: u32, recent_uses: &[i64], now: i64) -> ThrottleDecision {
    if max_per_hour == 0 {
        return ThrottleDecision::pass();
    }
    let mut in_window = prune_window(recent_uses, now);
    if (in_window.len() as u32) < max_per_hour {
        return ThrottleDecision::pass();
    }
    // The gate frees once enough old entries age out that the window
    // holds fewer than the ceiling.
    in_window.sort_unstable();
    let frees_at = in_window[in_window.len() - max_per_hour as usize] + USAGE_WINDOW_SECS;
    ThrottleDecision::deny(ThrottleDenial::LimitExceeded, frees_at - now)
}

/// Cooldown: the entrance must have rested `cooldown_secs` since it last
/// opened. A cooldown of zero, or an entrance that never opened, passes.
pub fn check_cooldown(cooldown_secs: u32, last_opened: Option<i64>, now: i64) -> ThrottleDecision {
    if cooldown_secs == 0 {
        return ThrottleDecision::pass();
    }
    let Some(last) = last_opened else {
        return ThrottleDecision::pass();
    };
    let ready_at = last + i64::from(cooldown_secs);
    if now < ready_at {
        ThrottleDecision::deny(ThrottleDenial::CooldownActive, ready_at - now)
    } else {
        ThrottleDecision::pass()
    }
}

/// Seconds of cooldown still outstanding, for read-only listings.
pub fn cooldown_remaining(cooldown_secs: u32, last_opened: Option<i64>, now: i64) -> i64 {
    check_cooldown(cooldown_secs, last_opened, now)
        .retry_after_secs
        .unwrap_or(0)
}
