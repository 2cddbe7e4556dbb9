use crate::integration::support::temp_fs;
use arbor::{FsError, LockToken};
use chrono::{Duration, Utc};

#[test]
fn lock_lifecycle() {
    let fs = temp_fs();
    let locks = fs.locks();

    let lock = locks
        .create_lock("/trunk/README", "ada", Some("docs pass"), None)
        .unwrap();
    assert_eq!(lock.owner, "ada");
    assert!(locks.has_lock("trunk/README").unwrap());
    assert_eq!(locks.lookup_token(&lock.token).unwrap(), "/trunk/README");

    let parsed = LockToken::parse(lock.token.as_str()).unwrap();
    assert_eq!(parsed, lock.token);
    assert_eq!(
        locks.find_lock("/trunk/README", &parsed).unwrap(),
        Some(lock.clone())
    );

    let expires = Utc::now() + Duration::minutes(10);
    let refreshed = locks
        .refresh_lock("/trunk/README", &lock.token, Some(expires))
        .unwrap();
    assert_eq!(refreshed.token, lock.token);
    assert_eq!(locks.get_lock("/trunk/README").unwrap().unwrap().expires, Some(expires));

    locks.remove_lock("/trunk/README", Some(&lock.token)).unwrap();
    assert!(!locks.has_lock("/trunk/README").unwrap());
    assert!(matches!(
        locks.lookup_token(&lock.token),
        Err(FsError::LockNotFound(_))
    ));
}

#[test]
fn second_owner_is_refused_until_expiry() {
    let fs = temp_fs();
    let locks = fs.locks();
    let soon = Utc::now() + Duration::milliseconds(50);
    locks.create_lock("/f", "ada", None, Some(soon)).unwrap();

    assert!(matches!(
        locks.create_lock("/f", "bob", None, None),
        Err(FsError::PathLocked { .. })
    ));

    std::thread::sleep(std::time::Duration::from_millis(80));
    let taken = locks.create_lock("/f", "bob", None, None).unwrap();
    assert_eq!(taken.owner, "bob");
}

#[test]
fn wrong_token_cannot_release() {
    let fs = temp_fs();
    let locks = fs.locks();
    locks.create_lock("/f", "ada", None, None).unwrap();
    let other = locks.create_lock("/g", "bob", None, None).unwrap();

    assert!(matches!(
        locks.remove_lock("/f", Some(&other.token)),
        Err(FsError::LockTokenMismatch(_))
    ));
    assert!(locks.has_lock("/f").unwrap());
    locks.remove_lock("/f", None).unwrap();
    assert!(!locks.has_lock("/f").unwrap());
}

#[test]
fn malformed_tokens_are_rejected() {
    assert!(matches!(
        LockToken::parse("urn:uuid:1234"),
        Err(FsError::InvalidLockToken(_))
    ));
}

#[test]
fn locks_survive_reopen() {
    use arbor::config::{ArborConfig, StorageConfig};
    use arbor::Filesystem;

    let temp = tempfile::tempdir().unwrap();
    let config = ArborConfig {
        storage: StorageConfig::at(temp.path().join("db")),
        ..ArborConfig::default()
    };
    let token = {
        let fs = Filesystem::create(&config).unwrap();
        let lock = fs.locks().create_lock("/f", "ada", None, None).unwrap();
        fs.flush().unwrap();
        lock.token
    };
    let fs = Filesystem::open(&config).unwrap();
    assert_eq!(fs.locks().lookup_token(&token).unwrap(), "/f");
}
