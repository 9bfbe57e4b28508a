//! Platform-specific utilities

use std::path::PathBuf;

/// Analyzer executable stem
pub const ANALYZER_NAME: &str = "trufflehog";

/// Platform-aware path utilities with zero allocation where possible
pub struct PathUtil;

impl PathUtil {
    /// Check if path contains any separator
    #[inline]
    pub fn has_separator(path: &str) -> bool {
        path.contains('/') || path.contains('\\')
    }

    /// Split path by any separator (zero-copy iterator)
    #[inline]
    pub fn components(path: &str) -> impl Iterator<Item = &str> {
        path.split(['/', '\\']).filter(|s| !s.is_empty())
    }

    /// Final path component, whichever separator the source used.
    ///
    /// Returns `None` for empty names and for `.`/`..`, which must never
    /// be joined onto a scratch directory.
    #[inline]
    pub fn base_name(path: &str) -> Option<&str> {
        Self::components(path)
            .last()
            .filter(|name| *name != "." && *name != "..")
    }
}

/// Executable file name for the host platform (`trufflehog.exe` on Windows)
pub fn executable_name(stem: &str) -> String {
    format!("{}{}", stem, std::env::consts::EXE_SUFFIX)
}

/// Default analyzer location: `binaries/<name>` relative to the working directory
pub fn default_analyzer_path() -> PathBuf {
    PathBuf::from("binaries").join(executable_name(ANALYZER_NAME))
}

/// Release asset suffix published for the host, e.g. `linux_amd64`
pub fn release_target() -> Option<String> {
    release_target_for(std::env::consts::OS, std::env::consts::ARCH)
}

fn release_target_for(os: &str, arch: &str) -> Option<String> {
    let os = match os {
        "linux" => "linux",
        "macos" => "darwin",
        "windows" => "windows",
        _ => return None,
    };
    let arch = match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        _ => return None,
    };
    Some(format!("{}_{}", os, arch))
}
