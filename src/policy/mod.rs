//! Fallback and suppression policy.

pub mod fallback;
pub mod suppression;

pub use fallback::FallbackMode;
pub use suppression::{ClassifiedFailure, SuppressionPolicy};
