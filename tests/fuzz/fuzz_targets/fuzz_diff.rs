#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let lines = covdelta::diff::parse_diff(s);
        let _ = covdelta::diff::touched_files(&lines);
    }
});
