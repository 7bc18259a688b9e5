//! paperguess-core — Round loading, scoring, and feedback.
//!
//! This crate defines the data model, the scoring and feedback engine,
//! the retrying round loader, and the game session that ties them together.

pub mod badge;
pub mod error;
pub mod feedback;
pub mod loader;
pub mod mock;
pub mod model;
pub mod scoring;
pub mod session;
pub mod traits;
