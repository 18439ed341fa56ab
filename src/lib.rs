//! TEAMBALANCE — fair team generator
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod source;
pub mod engine;
pub mod report;

pub use engine::{compute_balanced_partitions, Balancer, BalancerLimits, CancelToken};
pub use types::{BalanceError, Match, Participant, Team};
