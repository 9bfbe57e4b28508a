//! Main coordination logic

pub mod cycle;
pub mod quota;
pub mod scheduler;

pub use cycle::{CyclePhase, CycleRunner, CycleSummary};
pub use quota::QuotaGuard;
pub use scheduler::{HarvestScheduler, OutcomeKind, TaskError, TaskReport};
