#![no_main]
use commitsweep_core::patterns::ExtensionFilter;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // First line is an extra extension, the rest a filename
        let (extra, filename) = s.split_once('\n').unwrap_or(("", s));
        if let Ok(filter) = ExtensionFilter::new(&[extra.to_string()]) {
            let first = filter.is_denied(filename);
            assert_eq!(first, filter.is_denied(filename));
        }
    }
});
