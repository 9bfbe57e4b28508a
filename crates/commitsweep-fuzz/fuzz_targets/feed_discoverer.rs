#![no_main]
use commitsweep_core::discovery::discover;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        for item in discover(s) {
            // Captured components never carry path separators
            assert!(!item.owner.contains('/'));
            assert!(!item.repo.contains('/'));
            assert!(!item.commit_id.is_empty());
        }
    }
});
