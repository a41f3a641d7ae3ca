//! Property-based tests for prune planning.
//!
//! Run with: `cargo test --test property`

mod prune_plan;
