#![no_main]
use libfuzzer_sys::fuzz_target;

use covdelta::config::IngestOptions;

fuzz_target!(|data: &[u8]| {
    // Ingestion must reject bad input with an error, never a panic.
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = covdelta::ingest::ingest(s, &IngestOptions::with_workspace("/ws"));
    }
});
