//! One-time initialization before the first cycle

use crate::error::{Error, Result};
use crate::scratch::ScratchRoot;
use crate::traits::Analyzer;
use crate::types::HarvestConfig;
use tracing::debug;

/// Prepare directories and confirm the analyzer is runnable.
///
/// Idempotent; safe to call again on an already provisioned workspace.
pub fn prepare<S: Analyzer>(config: &HarvestConfig, analyzer: &S) -> Result<()> {
    config.validate()?;

    ScratchRoot::new(&config.scratch_root)
        .ensure()
        .map_err(|e| {
            Error::Provision(format!(
                "cannot create scratch root {}: {}",
                config.scratch_root.display(),
                e
            ))
        })?;

    if let Some(parent) = config
        .findings_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::Provision(format!(
                "cannot create report directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    analyzer.ensure_available()?;
    debug!(
        scratch = %config.scratch_root.display(),
        findings = %config.findings_path.display(),
        mode = config.mode.as_str(),
        "workspace provisioned"
    );
    Ok(())
}
