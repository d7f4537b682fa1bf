#![no_main]

use std::path::Path;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    pattern: &'a str,
    paths: Vec<&'a str>,
}

fuzz_target!(|input: Input<'_>| {
    // Invalid patterns must be reported, never panic.
    let Ok(mut allow) = pathwatch::glob(input.pattern) else {
        return;
    };

    for path in input.paths {
        let _ = allow(Path::new(path));
    }

    // A pattern always matches itself when it has no metacharacters.
    if !input.pattern.contains(['*', '?', '[', ']']) && !input.pattern.is_empty() {
        assert!(allow(Path::new(input.pattern)), "{:?}", input.pattern);
    }
});
