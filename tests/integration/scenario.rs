use crate::integration::support::temp_fs;
use arbor::{NodeKind, Revnum};

#[test]
fn create_commit_delete_commit() {
    let fs = temp_fs();
    assert_eq!(fs.youngest_rev().unwrap(), Revnum::ZERO);
    assert!(fs
        .revision_root(Revnum::ZERO)
        .unwrap()
        .dir_entries("/")
        .unwrap()
        .is_empty());

    let t1 = fs.begin_txn(Revnum::ZERO).unwrap();
    t1.make_file("a").unwrap();
    t1.write_file("a", b"hello").unwrap();
    let r1 = t1.commit().unwrap();
    assert_eq!(r1, Revnum::new(1));

    let rev1 = fs.revision_root(r1).unwrap();
    assert_eq!(rev1.node_kind("a").unwrap(), Some(NodeKind::File));
    assert_eq!(rev1.file_contents("a").unwrap(), b"hello");

    let t2 = fs.begin_txn(r1).unwrap();
    t2.delete("a").unwrap();
    let r2 = t2.commit().unwrap();
    assert_eq!(r2, Revnum::new(2));

    assert!(fs
        .revision_root(r1)
        .unwrap()
        .dir_entries("")
        .unwrap()
        .contains_key("a"));
    assert!(!fs
        .revision_root(r2)
        .unwrap()
        .dir_entries("")
        .unwrap()
        .contains_key("a"));
    assert_eq!(fs.youngest_rev().unwrap(), r2);
}
