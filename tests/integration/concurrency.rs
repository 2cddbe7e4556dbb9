use crate::integration::support::{commit_files, fs_with_trail, temp_fs};
use arbor::config::TrailConfig;
use arbor::{FsError, Revnum};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn disjoint_transactions_from_one_base_both_commit() {
    let fs = temp_fs();
    let base = commit_files(&fs, &[("shared.txt", b"base")]);

    let left = fs.begin_txn(base).unwrap();
    let right = fs.begin_txn(base).unwrap();
    left.make_file("left.txt").unwrap();
    right.make_file("right.txt").unwrap();
    left.write_file("left.txt", b"L").unwrap();
    right.write_file("right.txt", b"R").unwrap();

    let r_left = left.commit().unwrap();
    let r_right = right.commit().unwrap();
    assert_ne!(r_left, r_right);
    assert_eq!(fs.youngest_rev().unwrap(), Revnum::new(3));

    let from_left = fs.begin_txn(r_left).unwrap();
    assert!(from_left.node_kind("left.txt").unwrap().is_some());
    assert!(from_left.node_kind("right.txt").unwrap().is_none());
    let from_right = fs.begin_txn(r_right).unwrap();
    assert!(from_right.node_kind("right.txt").unwrap().is_some());
    assert!(from_right.node_kind("left.txt").unwrap().is_none());
}

#[test]
fn concurrent_writers_get_distinct_revisions() {
    const THREADS: usize = 4;
    const COMMITS: usize = 5;

    let fs = fs_with_trail(TrailConfig {
        max_attempts: 10_000,
        backoff_ms: 1,
    });
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let fs = fs.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut revs = Vec::new();
                for c in 0..COMMITS {
                    let txn = fs.begin_txn(Revnum::ZERO).unwrap();
                    let path = format!("t{}-c{}", t, c);
                    txn.make_file(&path).unwrap();
                    txn.write_file(&path, path.as_bytes()).unwrap();
                    revs.push(txn.commit().unwrap());
                }
                revs
            })
        })
        .collect();

    let mut all = HashSet::new();
    for handle in handles {
        for rev in handle.join().unwrap() {
            assert!(all.insert(rev), "revision {} handed out twice", rev);
        }
    }
    let youngest = fs.youngest_rev().unwrap();
    assert_eq!(youngest, Revnum::new((THREADS * COMMITS) as u64));
    for n in 1..=youngest.as_u64() {
        assert!(all.contains(&Revnum::new(n)));
        let root = fs.revision_root(Revnum::new(n)).unwrap();
        assert_eq!(root.dir_entries("").unwrap().len(), 1);
    }
    assert!(fs.list_transactions().unwrap().is_empty());
}

#[test]
fn transient_conflicts_are_retried_transparently() {
    let fs = temp_fs();
    let before = fs.trail_stats();
    let value = fs
        .with_trail(|trail| {
            if trail.attempt() < 3 {
                return Err(FsError::TransientConflict);
            }
            Ok(trail.attempt())
        })
        .unwrap();
    assert_eq!(value, 3);
    assert_eq!(fs.trail_stats().retries, before.retries + 2);
}

#[test]
fn persistent_conflicts_surface_a_distinct_error() {
    let fs = fs_with_trail(TrailConfig {
        max_attempts: 3,
        backoff_ms: 0,
    });
    let result: Result<(), FsError> = fs.with_trail(|_| Err(FsError::TransientConflict));
    assert!(matches!(
        result,
        Err(FsError::ConflictLimitExceeded { attempts: 3 })
    ));
}

#[test]
fn deferred_hooks_run_once_after_commit() {
    use std::cell::Cell;
    use std::rc::Rc;

    let fs = temp_fs();
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    fs.with_trail(move |trail| {
        let counter = Rc::clone(&counter);
        trail.on_commit(move || counter.set(counter.get() + 1));
        if trail.attempt() < 2 {
            return Err(FsError::TransientConflict);
        }
        Ok(())
    })
    .unwrap();
    assert_eq!(fired.get(), 1);
}
