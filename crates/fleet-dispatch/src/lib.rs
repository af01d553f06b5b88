//! Outbound command construction and the order-execution state machine
//! (spec §4.6, §4.7, §4.9).
//!
//! [`synthesizer`] (C6) produces the byte-level shape of every outbound
//! message; [`template_expander`] (C7) resolves a stored order template
//! into a concrete node/edge/action graph; [`executor`] (C9) drives an
//! order from `CREATED` through `SENT`/`FAILED` and handles cancellation.

pub mod error;
pub mod executor;
pub mod synthesizer;
pub mod template_expander;

pub use error::{DispatchError, Result};
pub use executor::{OrderExecutor, OrderPlan};
pub use synthesizer::CommandSynthesizer;
pub use template_expander::{expand_actions, expand_order};
