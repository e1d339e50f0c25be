//! Adaptive quiz engine.
//!
//! Everything in here is pure and synchronous: randomness is always injected as a
//! `rand::Rng`, and no function touches a store. The services layer owns I/O and the
//! attempt lifecycle (start → present → grade).

pub mod analytics;
pub mod composer;
pub mod difficulty;
pub mod pool;
pub mod scoring;
pub mod sequencer;

/// Upper bound on questions presented in one attempt.
pub const QUESTIONS_PER_ATTEMPT: usize = 15;

/// How many of the newest attempts feed the difficulty estimate.
pub const RECENT_ATTEMPTS_FOR_ADAPTIVE: usize = 3;

pub use composer::{compose, target_size};
pub use difficulty::{classify, recommend_difficulty, TieredPool};
pub use pool::build_pool;
pub use scoring::{grade, GradedAttempt};
pub use sequencer::{sequence, SequencedOrder};
