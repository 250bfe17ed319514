//! Alert evaluation and dispatch.
//!
//! One evaluation run, driven by [`engine::AlertEvaluator`], refreshes the
//! alerter heartbeat, selects the team's rules whose cooldown has elapsed,
//! matches each rule against the events recorded since it was last
//! evaluated, dispatches matches through the rule's channel and records the
//! outcome as a new event. Every attempted rule has its cooldown advanced,
//! whether or not anything matched or the dispatch succeeded.

pub mod cooldown;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod outcome;
pub mod registrar;
pub mod summary;
