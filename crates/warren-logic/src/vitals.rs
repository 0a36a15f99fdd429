//! Actor stat bookkeeping - energy, productivity, social.
//!
//! A transition charges energy, accrues productivity, and may apply a
//! per-entrance boost payload. The reward accrues uncapped; only boost
//! application clamps the touched stat into `[MIN_STAT, MAX_STAT]`.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_STAT, MIN_STAT};

/// Consumable and accrued stats carried by every actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    pub energy: i32,
    pub productivity: i32,
    pub social: i32,
}

/// Optional boost payload attached to an entrance, applied after a
/// committed traversal. Zero fields leave the stat untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialEffects {
    #[serde(default)]
    pub energy: i32,
    #[serde(default)]
    pub productivity: i32,
    #[serde(default)]
    pub social: i32,
}

/// True if `energy` covers `cost`. Equality passes.
pub fn can_afford(vitals: &Vitals, cost: i32) -> bool {
    vitals.energy >= cost
}

/// Post-traversal settlement: charge the cost, accrue the reward, then
/// apply the boost payload if the entrance carries one.
pub fn settle(vitals: Vitals, cost: i32, reward: i32, effects: Option<&SpecialEffects>) -> Vitals {
    let mut v = vitals;
    v.energy -= cost;
    v.productivity += reward;
    if let Some(fx) = effects {
        if fx.energy != 0 {
            v.energy = boost(v.energy, fx.energy);
        }
        if fx.productivity != 0 {
            v.productivity = boost(v.productivity, fx.productivity);
        }
        if fx.social != 0 {
            v.social = boost(v.social, fx.social);
        }
    }
    v
}

fn boost(stat: i32, amount: i32) -> i32 {
    (stat + amount).clamp(MIN_STAT, MAX_STAT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals(energy: i32, productivity: i32, social: i32) -> Vitals {
        Vitals {
            energy,
            productivity,
            social,
        }
    }

    #[test]
    fn exact_energy_covers_the_cost() {
        assert!(can_afford(&vitals(5, 0, 0), 5));
        assert!(!can_afford(&vitals(4, 0, 0), 5));
        assert!(can_afford(&vitals(0, 0, 0), 0));
    }

    #[test]
    fn settle_charges_cost_and_accrues_reward() {
        let v = settle(vitals(50, 10, 20), 8, 3, None);
        assert_eq!(v.energy, 42);
        assert_eq!(v.productivity, 13);
        assert_eq!(v.social, 20);
    }

    #[test]
    fn reward_accrues_past_the_stat_ceiling() {
        let v = settle(vitals(50, 98, 0), 0, 10, None);
        assert_eq!(v.productivity, 108);
    }

    #[test]
    fn boosts_clamp_at_the_stat_ceiling() {
        let fx = SpecialEffects {
            energy: 30,
            productivity: 0,
            social: 50,
        };
        let v = settle(vitals(90, 40, 80), 5, 0, Some(&fx));
        // 90 - 5 + 30 clamps to 100
        assert_eq!(v.energy, MAX_STAT);
        assert_eq!(v.productivity, 40);
        assert_eq!(v.social, MAX_STAT);
    }

    #[test]
    fn negative_boosts_floor_at_zero() {
        let fx = SpecialEffects {
            energy: -40,
            productivity: 0,
            social: 0,
        };
        let v = settle(vitals(10, 0, 0), 0, 0, Some(&fx));
        assert_eq!(v.energy, MIN_STAT);
    }

    #[test]
    fn zero_effect_fields_leave_stats_alone() {
        // A reward already past the ceiling must survive a no-op boost.
        let fx = SpecialEffects::default();
        let v = settle(vitals(50, 120, 0), 0, 0, Some(&fx));
        assert_eq!(v.productivity, 120);
    }
}
