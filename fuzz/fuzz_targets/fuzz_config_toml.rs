#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use pathwatch::WatchConfig;

fuzz_target!(|data: &[u8]| {
    let content = String::from_utf8_lossy(data);

    // Errors are fine; panics are not. Diagnostics must render too.
    match WatchConfig::from_toml_str(&content, "fuzz.toml") {
        Ok(config) => {
            let _ = config.to_watch(Path::new("/fuzz"));
        }
        Err(err) => {
            let _ = err.to_string();
        }
    }
});
