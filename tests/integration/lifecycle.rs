use crate::integration::support::{commit_files, temp_fs};
use arbor::{FsError, NodeKind, NodeId, Revnum};

#[test]
fn begin_then_abort_leaves_store_unchanged() {
    let fs = temp_fs();
    commit_files(&fs, &[("docs/a.txt", b"a"), ("b.txt", b"b")]);
    let nodes = fs.node_revision_count();
    let youngest = fs.youngest_rev().unwrap();

    let txn = fs.begin_txn(youngest).unwrap();
    txn.abort().unwrap();

    assert_eq!(fs.node_revision_count(), nodes);
    assert_eq!(fs.youngest_rev().unwrap(), youngest);
    assert!(fs.list_transactions().unwrap().is_empty());
}

#[test]
fn abort_after_edits_leaves_store_unchanged() {
    let fs = temp_fs();
    commit_files(&fs, &[("docs/a.txt", b"a")]);
    let nodes = fs.node_revision_count();

    let txn = fs.begin_txn(fs.youngest_rev().unwrap()).unwrap();
    txn.write_file("docs/a.txt", b"changed").unwrap();
    txn.make_dir("docs/new").unwrap();
    txn.make_file("docs/new/c.txt").unwrap();
    txn.delete("docs/a.txt").unwrap();
    assert!(fs.node_revision_count() > nodes);

    txn.abort().unwrap();
    assert_eq!(fs.node_revision_count(), nodes);
}

#[test]
fn second_abort_is_not_found() {
    let fs = temp_fs();
    let txn = fs.begin_txn(Revnum::ZERO).unwrap();
    txn.abort().unwrap();
    let err = txn.abort().unwrap_err();
    assert!(matches!(err, FsError::TransactionNotFound(_)));
    assert!(err.is_not_found());
}

#[test]
fn close_and_reopen_resumes_editing() {
    let fs = temp_fs();
    let txn = fs.begin_txn(Revnum::ZERO).unwrap();
    txn.make_file("notes.txt").unwrap();
    let name = txn.name().to_string();
    txn.close();

    assert_eq!(fs.list_transactions().unwrap().len(), 1);
    let txn = fs.open_txn(&name).unwrap();
    txn.write_file("notes.txt", b"resumed").unwrap();
    let rev = txn.commit().unwrap();

    let root = fs.revision_root(rev).unwrap();
    assert_eq!(root.file_contents("notes.txt").unwrap(), b"resumed");
}

#[test]
fn commit_without_edits_reuses_base_root() {
    let fs = temp_fs();
    let txn = fs.begin_txn(Revnum::ZERO).unwrap();
    let rev = txn.commit().unwrap();
    assert_eq!(rev, Revnum::new(1));
    assert_eq!(fs.revision(rev).unwrap().root, NodeId::ROOT);
}

#[test]
fn committed_transaction_is_gone() {
    let fs = temp_fs();
    let txn = fs.begin_txn(Revnum::ZERO).unwrap();
    txn.make_dir("d").unwrap();
    txn.commit().unwrap();

    assert!(matches!(
        fs.open_txn(txn.name().as_str()),
        Err(FsError::TransactionNotFound(_))
    ));
    assert!(matches!(txn.make_dir("e"), Err(FsError::TransactionNotFound(_))));
    assert!(matches!(txn.abort(), Err(FsError::TransactionNotFound(_))));
}

#[test]
fn open_unknown_transaction_fails() {
    let fs = temp_fs();
    assert!(matches!(
        fs.open_txn("zz"),
        Err(FsError::TransactionNotFound(_))
    ));
}

#[test]
fn node_properties_survive_commit() {
    let fs = temp_fs();
    let txn = fs.begin_txn(Revnum::ZERO).unwrap();
    txn.make_file("a").unwrap();
    txn.set_node_prop("a", "svn:eol-style", Some("native")).unwrap();
    txn.set_node_prop("", "root-prop", Some("yes")).unwrap();
    let rev = txn.commit().unwrap();

    let root = fs.revision_root(rev).unwrap();
    assert_eq!(
        root.node_prop("a", "svn:eol-style").unwrap().as_deref(),
        Some("native")
    );
    assert_eq!(root.node_prop("/", "root-prop").unwrap().as_deref(), Some("yes"));
    assert_eq!(root.node_kind("a").unwrap(), Some(NodeKind::File));
}

#[test]
fn transactions_are_listed_in_name_order() {
    let fs = temp_fs();
    let a = fs.begin_txn(Revnum::ZERO).unwrap();
    let b = fs.begin_txn(Revnum::ZERO).unwrap();
    let names = fs.list_transactions().unwrap();
    assert_eq!(names.len(), 2);
    assert!(names.contains(a.name()));
    assert!(names.contains(b.name()));
    assert_ne!(a.name(), b.name());
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}
