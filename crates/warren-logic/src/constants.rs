//! Engine constants - entrance facings, activity states, stat bounds.
//!
//! These are simple `u8` constants with no storage dependency.
//! Both the HTTP server and the native harness use these.

pub mod facings {
    pub const NORTH: u8 = 0;
    pub const EAST: u8 = 1;
    pub const SOUTH: u8 = 2;
    pub const WEST: u8 = 3;

    /// True if `face` names one of the four wall facings.
    pub fn is_valid(face: u8) -> bool {
        face <= WEST
    }

    pub fn name(face: u8) -> &'static str {
        match face {
            NORTH => "north",
            EAST => "east",
            SOUTH => "south",
            WEST => "west",
            _ => "unknown",
        }
    }
}

pub mod activity_states {
    pub const IDLE: u8 = 0;
    pub const WORKING: u8 = 1;
    pub const RESTING: u8 = 2;

    pub fn name(activity: u8) -> &'static str {
        match activity {
            IDLE => "idle",
            WORKING => "working",
            RESTING => "resting",
            _ => "unknown",
        }
    }
}

/// Ceiling applied whenever a special-effect boost touches a stat.
pub const MAX_STAT: i32 = 100;

/// Floor for stats adjusted by boosts.
pub const MIN_STAT: i32 = 0;

/// Trailing window for the per-entrance usage ceiling, in seconds.
pub const USAGE_WINDOW_SECS: i64 = 3600;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_validity_covers_all_four_walls() {
        assert!(facings::is_valid(facings::NORTH));
        assert!(facings::is_valid(facings::WEST));
        assert!(!facings::is_valid(4));
        assert!(!facings::is_valid(255));
    }

    #[test]
    fn facing_names_are_stable() {
        assert_eq!(facings::name(facings::NORTH), "north");
        assert_eq!(facings::name(facings::EAST), "east");
        assert_eq!(facings::name(99), "unknown");
    }

    #[test]
    fn activity_names_are_stable() {
        assert_eq!(activity_states::name(activity_states::IDLE), "idle");
        assert_eq!(activity_states::name(activity_states::RESTING), "resting");
        assert_eq!(activity_states::name(7), "unknown");
    }
}
