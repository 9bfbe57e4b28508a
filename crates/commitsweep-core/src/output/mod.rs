//! Output generation

pub mod report;

pub use report::FindingsReport;
