//! Pure transition rules for Warren.
//!
//! This crate contains every rule the room transition engine enforces,
//! independent of any storage backend, web framework, or runtime. Functions
//! take plain data snapshots and return values, making them unit-testable
//! and portable between the HTTP server and the native harness.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`access`] | Entrance access policy (locks, keys, allow-lists) |
//! | [`constants`] | Entrance facings, activity states, stat bounds (u8 IDs) |
//! | [`graph`] | Connection endpoint resolution, costs, spawn geometry |
//! | [`pipeline`] | The ordered guard chain behind every transition |
//! | [`throttle`] | Usage-per-hour ceilings and post-use cooldowns |
//! | [`vitals`] | Energy, productivity, social stat bookkeeping |
//! | [`worldcheck`] | Structural validation of the room graph |

pub mod access;
pub mod constants;
pub mod graph;
pub mod pipeline;
pub mod throttle;
pub mod vitals;
pub mod worldcheck;

/// Room identifier.
pub type RoomId = u32;
/// Entrance identifier.
pub type EntranceId = u64;
/// Connection identifier.
pub type ConnectionId = u64;
/// Actor identifier, issued by the identity layer.
pub type ActorId = u64;
