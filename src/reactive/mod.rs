//! Reactive tracking substrate used by wire handles
//!
//! - [`Scheduler`] - explicit FIFO task queue (microtasks and deduplicated jobs)
//! - [`Reactivity`] - effect runtime with dependency capture
//! - [`ReactiveState`] - tracked JSON object container
//!
//! ```text
//! ReactiveState::get ──track──▶ Reactivity ◀──trigger── ReactiveState::set
//!                                   │
//!                                   ▼ queue_job(effect)
//!                               Scheduler ──flush()──▶ effect re-run
//! ```
mod effect;
mod scheduler;
mod state;

pub use effect::*;
pub use scheduler::*;
pub use state::*;

#[cfg(test)]
mod effect_test;
