use crate::integration::support::{commit_files, snapshot, temp_fs};
use arbor::store::NodeRevisionStore;
use arbor::{FsError, NodeRevision};

#[test]
fn later_edits_never_change_older_revisions() {
    let fs = temp_fs();
    let r1 = commit_files(&fs, &[("a/b/c.txt", b"one"), ("a/d.txt", b"d"), ("e.txt", b"e")]);
    let before = snapshot(&fs, r1);

    let txn = fs.begin_txn(r1).unwrap();
    txn.write_file("a/b/c.txt", b"two").unwrap();
    txn.delete("e.txt").unwrap();
    txn.make_dir("a/b/f").unwrap();
    txn.set_node_prop("a", "touched", Some("yes")).unwrap();
    let r2 = txn.commit().unwrap();

    assert_eq!(snapshot(&fs, r1), before);
    let old = fs.revision_root(r1).unwrap();
    assert_eq!(old.file_contents("a/b/c.txt").unwrap(), b"one");
    assert_eq!(old.file_contents("e.txt").unwrap(), b"e");
    assert_eq!(old.node_prop("a", "touched").unwrap(), None);

    let new = fs.revision_root(r2).unwrap();
    assert_eq!(new.file_contents("a/b/c.txt").unwrap(), b"two");
    assert_eq!(new.node_kind("e.txt").unwrap(), None);
}

#[test]
fn leaf_commit_shares_untouched_subtrees() {
    let fs = temp_fs();
    let r1 = commit_files(
        &fs,
        &[("src/lib.rs", b"lib"), ("docs/guide.md", b"guide"), ("docs/api/index.md", b"api")],
    );

    let txn = fs.begin_txn(r1).unwrap();
    txn.write_file("src/lib.rs", b"lib v2").unwrap();
    let r2 = txn.commit().unwrap();

    let old = fs.revision_root(r1).unwrap();
    let new = fs.revision_root(r2).unwrap();
    assert_ne!(old.root_id(), new.root_id());
    assert!(old.root_id().is_related(&new.root_id()));
    assert_ne!(old.node_id("src").unwrap(), new.node_id("src").unwrap());
    assert_ne!(old.node_id("src/lib.rs").unwrap(), new.node_id("src/lib.rs").unwrap());

    // Siblings of the edited path are the very same node-revisions.
    assert_eq!(old.node_id("docs").unwrap(), new.node_id("docs").unwrap());
    assert_eq!(old.node_id("docs/api").unwrap(), new.node_id("docs/api").unwrap());
}

#[test]
fn committed_records_reject_writes() {
    let fs = temp_fs();
    let r1 = commit_files(&fs, &[("a.txt", b"a")]);
    let id = fs.revision_root(r1).unwrap().node_id("a.txt").unwrap();

    let overwrite = fs.with_trail(|trail| trail.put_node(&id, &NodeRevision::new_file(None)));
    assert!(matches!(overwrite, Err(FsError::MutabilityViolation(_))));
    let delete = fs.with_trail(|trail| trail.delete_node(&id));
    assert!(matches!(delete, Err(FsError::MutabilityViolation(_))));
    assert!(fs.node_revision(id).unwrap().is_immutable());
}

#[test]
fn blobs_are_shared_between_identical_files() {
    let fs = temp_fs();
    commit_files(&fs, &[("one.txt", b"same"), ("two.txt", b"same")]);
    assert_eq!(fs.blob_count(), 1);
}
