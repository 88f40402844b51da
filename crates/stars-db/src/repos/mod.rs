//! Query modules for every catalogue table.
//!
//! Each module adds methods to `Catalogue` via `impl Catalogue` blocks.

pub mod lists;
pub mod membership;
pub mod repos;
pub mod runs;
pub mod scores;
