//! Filename pattern filtering

pub mod extensions;

pub use extensions::{ExtensionFilter, DENIED_EXTENSIONS};
