//! Client-side orchestration for the VGR staking program.
//!
//! The on-chain program owns all staking state; this crate derives the
//! per-user lock addresses, submits stake/unstake/autocompound calls, mirrors
//! the program's reward-forfeiture arithmetic for reporting, and ships an
//! audit record of every confirmed operation to an external logging sink.

pub mod audit;
pub mod config;
pub mod delivery;
pub mod error;
pub mod forfeiture;
pub mod instructions;
pub mod orchestrator;
pub mod state;
pub mod tier;

pub use config::{load_cfg, ClientConfig};
pub use error::StakeClientError;
