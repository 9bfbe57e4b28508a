//! External analyzer boundary

pub mod trufflehog;

pub use trufflehog::TruffleHog;
