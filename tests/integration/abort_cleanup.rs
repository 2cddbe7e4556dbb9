use crate::integration::support::{commit_files, snapshot, temp_fs};

#[test]
fn abort_of_three_level_path_deletes_exactly_the_mutable_nodes() {
    let fs = temp_fs();
    let r1 = commit_files(
        &fs,
        &[("a/b/c/leaf.txt", b"leaf"), ("a/b/sibling.txt", b"s"), ("a/other/x.txt", b"x")],
    );
    let base = snapshot(&fs, r1);
    let nodes_before = fs.node_revision_count();

    let txn = fs.begin_txn(r1).unwrap();
    txn.write_file("a/b/c/leaf.txt", b"edited").unwrap();
    // root, a, b, c and leaf.txt were copied.
    assert_eq!(fs.node_revision_count(), nodes_before + 5);

    txn.abort().unwrap();
    assert_eq!(fs.node_revision_count(), nodes_before);
    assert_eq!(snapshot(&fs, r1), base);
    for id in base.keys() {
        assert!(fs.node_revision(*id).unwrap().is_immutable());
    }
}

#[test]
fn abort_deletes_new_subtrees_but_not_moved_in_shared_nodes() {
    let fs = temp_fs();
    let r1 = commit_files(&fs, &[("keep/k.txt", b"k")]);
    let nodes_before = fs.node_revision_count();

    let txn = fs.begin_txn(r1).unwrap();
    txn.make_dir("new").unwrap();
    txn.make_dir("new/deeper").unwrap();
    txn.make_file("new/deeper/f.txt").unwrap();
    txn.write_file("new/deeper/f.txt", b"f").unwrap();
    txn.set_node_prop("keep", "p", Some("v")).unwrap();
    assert!(fs.node_revision_count() > nodes_before);

    txn.abort().unwrap();
    assert_eq!(fs.node_revision_count(), nodes_before);
    let root = fs.revision_root(r1).unwrap();
    assert_eq!(root.file_contents("keep/k.txt").unwrap(), b"k");
    assert_eq!(root.node_prop("keep", "p").unwrap(), None);
}

#[test]
fn aborting_one_transaction_leaves_a_sibling_transaction_intact() {
    let fs = temp_fs();
    let r1 = commit_files(&fs, &[("a/f.txt", b"f")]);

    let doomed = fs.begin_txn(r1).unwrap();
    let kept = fs.begin_txn(r1).unwrap();
    doomed.write_file("a/f.txt", b"doomed").unwrap();
    kept.write_file("a/f.txt", b"kept").unwrap();

    doomed.abort().unwrap();
    assert_eq!(kept.file_contents("a/f.txt").unwrap(), b"kept");
    let r2 = kept.commit().unwrap();
    assert_eq!(
        fs.revision_root(r2).unwrap().file_contents("a/f.txt").unwrap(),
        b"kept"
    );
}
