//! Binary and media extension deny-list

use crate::error::Result;
use crate::platform::PathUtil;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Extensions never downloaded for scanning
pub const DENIED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tif", "nef", "gif", "bmp", "mp4", "avi", "mov", "wmv", "flv", "mkv",
    "exe", "dll", "so", "bin", "pdf", "zip", "tar", "gz", "7z", "xz",
];

/// Case-insensitive suffix filter over base filenames
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    denied: GlobSet,
}

impl ExtensionFilter {
    /// Filter over the built-in deny-list plus `extra` extensions.
    ///
    /// Extras may be given with or without a leading dot.
    pub fn new(extra: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        let extras = extra
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.'))
            .filter(|ext| !ext.is_empty());

        for ext in DENIED_EXTENSIONS.iter().copied().chain(extras) {
            let glob = GlobBuilder::new(&format!("*.{}", globset::escape(ext)))
                .case_insensitive(true)
                .literal_separator(true)
                .build()?;
            builder.add(glob);
        }

        Ok(Self {
            denied: builder.build()?,
        })
    }

    /// True when the file should be skipped
    #[inline]
    pub fn is_denied(&self, filename: &str) -> bool {
        match PathUtil::base_name(filename) {
            Some(name) => self.denied.is_match(name),
            None => false,
        }
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new(&[]).expect("built-in deny-list compiles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_and_binaries_denied() {
        let filter = ExtensionFilter::default();
        assert!(filter.is_denied("photo.png"));
        assert!(filter.is_denied("assets/img/Logo.PNG"));
        assert!(filter.is_denied("release/app.tar.gz"));
        assert!(filter.is_denied("bin\\tool.exe"));
        assert!(filter.is_denied("lib/libfoo.so"));
    }

    #[test]
    fn test_text_files_kept() {
        let filter = ExtensionFilter::default();
        assert!(!filter.is_denied("notes.txt"));
        assert!(!filter.is_denied(".env"));
        assert!(!filter.is_denied("config/settings.yml"));
        assert!(!filter.is_denied("Makefile"));
        // Suffix match only, not substring
        assert!(!filter.is_denied("png_loader.rs"));
        assert!(!filter.is_denied("gzip.py"));
    }

    #[test]
    fn test_directory_named_like_extension_is_ignored() {
        let filter = ExtensionFilter::default();
        assert!(!filter.is_denied("images.png/readme.md"));
    }

    #[test]
    fn test_extra_extensions() {
        let filter = ExtensionFilter::new(&[".ISO".to_string(), "woff2".to_string(), " ".to_string()])
            .unwrap();
        assert!(filter.is_denied("disk.iso"));
        assert!(filter.is_denied("fonts/inter.woff2"));
        assert!(filter.is_denied("photo.jpeg"));
        assert!(!filter.is_denied("notes.txt"));
    }

    #[test]
    fn test_empty_name_is_kept() {
        let filter = ExtensionFilter::default();
        assert!(!filter.is_denied(""));
    }

    #[test]
    fn test_default_denies_every_builtin_extension() {
        let filter = ExtensionFilter::default();
        for ext in DENIED_EXTENSIONS {
            assert!(filter.is_denied(&format!("file.{}", ext)), "{} not denied", ext);
            let upper = format!("FILE.{}", ext.to_ascii_uppercase());
            assert!(filter.is_denied(&upper), "{} not denied", upper);
        }
    }

    #[test]
    fn test_default_matches_new_without_extras() {
        let a = ExtensionFilter::default();
        let b = ExtensionFilter::new(&[]).unwrap();
        for name in ["a.png", "b.txt", "c.7Z", "d", "e.Mkv"] {
            assert_eq!(a.is_denied(name), b.is_denied(name), "{}", name);
        }
    }
}
