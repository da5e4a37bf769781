//! Shaping raw result lists into identity-unique, fully populated documents.

mod reconciler;

pub use reconciler::*;
