#![no_main]

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use libfuzzer_sys::fuzz_target;
use pathwatch::combinators::{dedup, from_paths};
use pathwatch::{Context, collect};

fuzz_target!(|input: Vec<(u8, Option<u8>)>| {
    let names: Vec<PathBuf> = input
        .iter()
        .map(|(n, _)| PathBuf::from(format!("p{}", n % 8)))
        .collect();
    let mut sums = input.iter().map(|(_, sum)| *sum).collect::<Vec<_>>().into_iter();

    let mut stream = dedup(move |_: &Path| sums.next().flatten(), from_paths(names.clone()));
    let (got, end) = collect(&mut stream, &Context::background());
    assert!(end.is_ok());

    // Every path passes at least once: the first occurrence is never dropped.
    let first: HashSet<_> = names.iter().collect();
    let passed: HashSet<_> = got.iter().collect();
    assert_eq!(first, passed);
});
