#![doc = "handoff-core: core logic library for handoff."]

//! This crate holds the two independent pieces of handoff:
//!
//! - a bounded single-producer/single-consumer pipeline ([`channel`], [`pipeline`])
//! - a usage-data aggregation job over a fixed CSV dataset ([`usage`], [`analysis`], [`contract`])
//!
//! The two share nothing but the configuration types in [`config`].
//!
//! # Usage
//! The `handoff` CLI crate depends on this one for all non-trivial logic.

pub mod analysis;
pub mod channel;
pub mod config;
pub mod contract;
pub mod pipeline;
pub mod usage;
