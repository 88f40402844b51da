//! # stars-core
//!
//! Core types shared across all Starline crates:
//! - Entity structs for lists, repositories, membership edges, scores and
//!   ledger entries
//! - Membership planner policy
//! - Deterministic list slug derivation
//! - Cooperative cancellation signal for paginated walks
//! - Cross-cutting error types

pub mod cancel;
pub mod entities;
pub mod errors;
pub mod policy;
pub mod slug;

pub use cancel::CancelSignal;
pub use policy::{FallbackRule, PlannerPolicy};
