//! # Fleet Bridge Codec
//!
//! The topic grammar (C1) and the per-robot sequencing allocators (C2).
//!
//! Topic codec and sequence allocation are unrelated in function but both
//! tiny and load-bearing for every other component, so they share this
//! crate the way `torq-codec` bundles wire parsing with protocol constants.

pub mod error;
pub mod sequence;
pub mod topic;
pub mod wire;

pub use error::{DecodeError, TopicError};
pub use sequence::SequenceAllocator;
pub use topic::{Topic, TopicKind};
