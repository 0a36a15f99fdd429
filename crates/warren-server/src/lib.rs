//! Warren server - the room transition engine behind the HTTP surface.
//!
//! `warren-logic` owns the rules; this crate owns the world: durable
//! records, the in-memory store behind the repository seams, the
//! orchestrator that decides and commits transitions, and the axum
//! router in front of it all. The binary in `main.rs` seeds a demo
//! world and serves it.

pub mod engine;
pub mod entities;
pub mod events;
pub mod http;
pub mod inventory;
pub mod memory;
pub mod seed;
pub mod store;
