#![no_main]
use libfuzzer_sys::fuzz_target;

use covdelta::model::ProjectStats;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(touched) = covdelta::changeset::parse_touched_files(s) {
            let _ = covdelta::changeset::attribute(&ProjectStats::default(), &touched);
        }
    }
});
