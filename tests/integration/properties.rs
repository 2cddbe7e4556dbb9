//! Property tests over random edit sequences.

use crate::integration::support::{snapshot, temp_fs};
use arbor::{Filesystem, Revnum};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Edit {
    MakeDir(usize),
    MakeFile(usize),
    Write(usize, Vec<u8>),
    Delete(usize),
}

const NAMES: [&str; 6] = ["a", "b", "a/c", "a/d", "b/e", "a/c/f"];

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0..NAMES.len()).prop_map(Edit::MakeDir),
        (0..NAMES.len()).prop_map(Edit::MakeFile),
        ((0..NAMES.len()), prop::collection::vec(any::<u8>(), 0..16))
            .prop_map(|(i, bytes)| Edit::Write(i, bytes)),
        (0..NAMES.len()).prop_map(Edit::Delete),
    ]
}

/// Apply edits, ignoring the ones that are invalid for the current tree.
fn apply(fs: &Filesystem, base: Revnum, edits: &[Edit]) -> arbor::Transaction {
    let txn = fs.begin_txn(base).unwrap();
    for edit in edits {
        let _ = match edit {
            Edit::MakeDir(i) => txn.make_dir(NAMES[*i]).map(|_| ()),
            Edit::MakeFile(i) => txn.make_file(NAMES[*i]).map(|_| ()),
            Edit::Write(i, bytes) => txn.write_file(NAMES[*i], bytes),
            Edit::Delete(i) => txn.delete(NAMES[*i]),
        };
    }
    txn
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn older_revisions_are_immutable(
        first in prop::collection::vec(edit(), 1..12),
        second in prop::collection::vec(edit(), 1..12),
    ) {
        let fs = temp_fs();
        let r1 = apply(&fs, Revnum::ZERO, &first).commit().unwrap();
        let before = snapshot(&fs, r1);

        let r2 = apply(&fs, r1, &second).commit().unwrap();
        prop_assert!(r2 > r1);
        prop_assert_eq!(snapshot(&fs, r1), before);
    }

    #[test]
    fn abort_restores_the_node_count(
        first in prop::collection::vec(edit(), 1..12),
        second in prop::collection::vec(edit(), 1..12),
    ) {
        let fs = temp_fs();
        let r1 = apply(&fs, Revnum::ZERO, &first).commit().unwrap();
        let nodes = fs.node_revision_count();

        apply(&fs, r1, &second).abort().unwrap();
        prop_assert_eq!(fs.node_revision_count(), nodes);
        prop_assert_eq!(fs.youngest_rev().unwrap(), r1);
    }

    #[test]
    fn committed_trees_are_fully_immutable(edits in prop::collection::vec(edit(), 1..16)) {
        let fs = temp_fs();
        let rev = apply(&fs, Revnum::ZERO, &edits).commit().unwrap();
        for record in snapshot(&fs, rev).values() {
            prop_assert!(record.is_immutable());
        }
    }
}
