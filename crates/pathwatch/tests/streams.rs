//! Integration tests for stream sources and combinators.
//!
//! These tests compose the public building blocks the way watch policies do
//! and check the observable pull sequence.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use pathwatch::combinators::{dedup, delay, error, filter, from_paths, repeat};
use pathwatch::{BoxStream, Context, DirSnapshot, Stream, WatchError, collect, glob};
use tempfile::tempdir;

// ============================================================================
// Helpers
// ============================================================================

fn paths(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

/// Builds `root/{a.txt, sub/b.rs, sub/deep/c.rs, z.rs}`.
fn nested_tree(root: &Path) {
    fs::create_dir_all(root.join("sub/deep")).unwrap();
    fs::write(root.join("a.txt"), "a").unwrap();
    fs::write(root.join("sub/b.rs"), "b").unwrap();
    fs::write(root.join("sub/deep/c.rs"), "c").unwrap();
    fs::write(root.join("z.rs"), "z").unwrap();
}

// ============================================================================
// Snapshot
// ============================================================================

#[test]
fn test_snapshot_visits_every_path_once() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    nested_tree(root);

    let mut snap = DirSnapshot::new(root);
    let (got, end) = collect(&mut snap, &Context::background());
    assert!(end.is_ok());

    let expected = vec![
        root.to_path_buf(),
        root.join("a.txt"),
        root.join("sub"),
        root.join("sub/b.rs"),
        root.join("sub/deep"),
        root.join("sub/deep/c.rs"),
        root.join("z.rs"),
    ];
    assert_eq!(got, expected);
}

#[test]
fn test_snapshot_survives_tree_deletion_mid_walk() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("tree");
    fs::create_dir(&root).unwrap();
    nested_tree(&root);

    let ctx = Context::background().with_timeout(Duration::from_secs(10));
    let mut snap = DirSnapshot::new(&root);
    assert_eq!(snap.next_path(&ctx).unwrap(), Some(root.clone()));

    fs::remove_dir_all(&root).unwrap();

    let (rest, end) = collect(&mut snap, &ctx);
    assert!(end.is_ok(), "{end:?}");
    assert!(rest.iter().all(|p| p.starts_with(&root)));
}

#[test]
fn test_snapshot_close_mid_walk_then_drop() {
    let dir = tempdir().unwrap();
    nested_tree(dir.path());

    let mut snap = DirSnapshot::new(dir.path());
    let ctx = Context::background();
    snap.next_path(&ctx).unwrap();
    snap.next_path(&ctx).unwrap();
    snap.close().unwrap();
    assert_eq!(snap.next_path(&ctx).unwrap(), None);
    drop(snap);
}

#[test]
fn test_snapshot_cancelled_mid_walk_resumes() {
    let dir = tempdir().unwrap();
    nested_tree(dir.path());

    let mut snap = DirSnapshot::new(dir.path());
    let ctx = Context::background();
    assert_eq!(snap.next_path(&ctx).unwrap(), Some(dir.path().to_path_buf()));

    let (cancelled, cancel) = ctx.with_cancel();
    cancel.cancel();
    assert!(matches!(snap.next_path(&cancelled), Err(WatchError::Cancelled)));

    // Nothing was lost to the cancelled pull.
    let (rest, end) = collect(&mut snap, &ctx);
    assert!(end.is_ok());
    assert_eq!(rest.len(), 6);
    assert_eq!(rest[0], dir.path().join("a.txt"));
}

// ============================================================================
// Composition
// ============================================================================

#[test]
fn test_glob_filter_over_snapshot() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    nested_tree(root);

    let pattern = format!("{}/**/*.rs", root.display());
    let mut stream = filter(glob(&pattern).unwrap(), DirSnapshot::new(root));
    let (got, end) = collect(&mut stream, &Context::background());
    assert!(end.is_ok());
    assert_eq!(
        got,
        vec![
            root.join("sub/b.rs"),
            root.join("sub/deep/c.rs"),
            root.join("z.rs"),
        ]
    );
}

#[test]
fn test_dedup_over_repeat_reports_only_new_paths() {
    let mut pass = 0u32;
    let mut stream = dedup(
        |_: &Path| Some(0u8),
        repeat(move || -> BoxStream {
            pass += 1;
            match pass {
                1 => Box::new(from_paths(["a", "b"])),
                2 => Box::new(from_paths(["a", "c", "b"])),
                _ => Box::new(error(WatchError::other("done"))),
            }
        }),
    );

    let (got, end) = collect(&mut stream, &Context::background());
    assert_eq!(got, paths(&["a", "b", "c"]));
    assert!(matches!(end, Err(WatchError::Other { .. })));
    assert_eq!(stream.cached(), 3);
}

#[test]
fn test_dedup_changed_checksum_passes_again() {
    let mut sums = vec![Some(1), Some(1), Some(2), None, Some(2)].into_iter();
    let mut stream = dedup(
        move |_: &Path| sums.next().flatten(),
        from_paths(["p", "p", "p", "p", "p"]),
    );
    let (got, end) = collect(&mut stream, &Context::background());
    assert!(end.is_ok());
    // p(1) new, p(1) same, p(2) changed, p(None) unknown, p(2) after forget.
    assert_eq!(got, paths(&["p", "p", "p", "p"]));
}

#[test]
fn test_repeat_of_error_fails_immediately() {
    let mut stream = repeat(|| error(WatchError::other("broken source")));
    let err = stream.next_path(&Context::background()).unwrap_err();
    assert!(matches!(err, WatchError::Other { .. }));
}

#[test]
fn test_delay_then_snapshot_waits_first() {
    let dir = tempdir().unwrap();
    let mut stream = delay(Duration::from_millis(100), DirSnapshot::new(dir.path()));

    let started = Instant::now();
    assert_eq!(
        stream.next_path(&Context::background()).unwrap(),
        Some(dir.path().to_path_buf())
    );
    assert!(started.elapsed() >= Duration::from_millis(100));

    // Only the first pull waits.
    let started = Instant::now();
    assert_eq!(stream.next_path(&Context::background()).unwrap(), None);
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[test]
fn test_cancelled_pull_leaves_stream_usable() {
    let mut stream = delay(Duration::from_millis(200), from_paths(["a", "b"]));

    let short = Context::background().with_timeout(Duration::from_millis(20));
    assert!(matches!(
        stream.next_path(&short),
        Err(WatchError::DeadlineExceeded)
    ));

    let (got, end) = collect(&mut stream, &Context::background());
    assert!(end.is_ok());
    assert_eq!(got, paths(&["a", "b"]));
}

#[test]
fn test_close_propagates_through_composition() {
    let dir = tempdir().unwrap();
    nested_tree(dir.path());
    let root = dir.path().to_path_buf();

    let mut stream = dedup(
        pathwatch::combinators::last_modified,
        repeat(move || filter(|_: &Path| true, DirSnapshot::new(&root))),
    );
    let ctx = Context::background();
    assert!(stream.next_path(&ctx).unwrap().is_some());
    stream.close().unwrap();
    stream.close().unwrap();
    assert_eq!(stream.next_path(&ctx).unwrap(), None);
}
