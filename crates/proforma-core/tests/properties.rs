//! Property tests for the pro-forma engine.
//!
//! Randomised inputs guard the clamps and conservation rules that the
//! known-answer tests only sample.
//!
//! Run with: `cargo test --test properties`

#[path = "properties/revenue.rs"]
mod revenue;

#[path = "properties/financing.rs"]
mod financing;

#[path = "properties/waterfall.rs"]
mod waterfall;
