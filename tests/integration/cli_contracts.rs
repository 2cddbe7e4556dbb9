use arbor::config::{ArborConfig, StorageConfig};
use arbor::tooling::cli::{
    CliContext, Commands, LockCommands, RevCommands, RevisionArgs, TxnCommands,
};
use arbor::{FsError, Revnum};
use tempfile::TempDir;

fn context(temp: &TempDir) -> CliContext {
    CliContext::with_config(ArborConfig {
        storage: StorageConfig::at(temp.path().join("store")),
        ..ArborConfig::default()
    })
}

fn import_fixture(temp: &TempDir, cli: &CliContext) {
    let source = temp.path().join("source");
    std::fs::create_dir_all(source.join("docs")).unwrap();
    std::fs::write(source.join("README"), "hello").unwrap();
    std::fs::write(source.join("docs/guide.md"), "guide").unwrap();
    cli.execute(&Commands::Import {
        source,
        prefix: None,
        message: Some("import".to_string()),
    })
    .unwrap();
}

#[test]
fn rev_ls_json_contract_has_required_fields() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);
    cli.execute(&Commands::Init).unwrap();
    import_fixture(&temp, &cli);

    let output = cli
        .execute(&Commands::Rev {
            command: RevCommands::Ls {
                path: "/".to_string(),
                revision: RevisionArgs::default(),
                format: "json".to_string(),
            },
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let entries = parsed.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    for entry in entries {
        assert!(entry.get("name").and_then(|v| v.as_str()).is_some());
        assert!(entry.get("node").and_then(|v| v.as_str()).is_some());
        assert!(entry.get("kind").and_then(|v| v.as_str()).is_some());
    }
    let kind_of = |name: &str| {
        entries
            .iter()
            .find(|entry| entry["name"] == name)
            .map(|entry| entry["kind"].clone())
    };
    assert_eq!(kind_of("README"), Some(serde_json::json!("file")));
    assert_eq!(kind_of("docs"), Some(serde_json::json!("dir")));
}

#[test]
fn rev_cat_reads_old_revisions() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);
    cli.execute(&Commands::Init).unwrap();
    import_fixture(&temp, &cli);

    let cat = |rev: Option<Revnum>| {
        cli.execute(&Commands::Rev {
            command: RevCommands::Cat {
                path: "README".to_string(),
                revision: RevisionArgs { rev, at: None },
            },
        })
    };
    assert_eq!(cat(None).unwrap(), "hello");
    assert_eq!(cat(Some(Revnum::new(1))).unwrap(), "hello");
    assert!(matches!(
        cat(Some(Revnum::ZERO)),
        Err(FsError::PathNotFound(_))
    ));
}

#[test]
fn rev_show_json_contract_has_required_fields() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);
    cli.execute(&Commands::Init).unwrap();
    import_fixture(&temp, &cli);

    let output = cli
        .execute(&Commands::Rev {
            command: RevCommands::Show {
                revision: RevisionArgs::default(),
                format: "json".to_string(),
            },
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["revision"], 1);
    assert!(parsed.get("date").and_then(|v| v.as_str()).is_some());
    assert!(parsed.get("root").and_then(|v| v.as_str()).is_some());
    assert_eq!(parsed["props"]["log"], "import");
}

#[test]
fn txn_list_and_abort() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);
    cli.execute(&Commands::Init).unwrap();

    let name = {
        let fs = cli.filesystem().unwrap();
        let txn = fs.begin_txn(Revnum::ZERO).unwrap();
        txn.make_dir("pending").unwrap();
        txn.name().to_string()
    };

    let listed = cli
        .execute(&Commands::Txn {
            command: TxnCommands::List {
                format: "json".to_string(),
            },
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&listed).unwrap();
    assert_eq!(parsed[0]["name"], name.as_str());

    let aborted = cli
        .execute(&Commands::Txn {
            command: TxnCommands::Abort {
                name: name.clone(),
                yes: true,
            },
        })
        .unwrap();
    assert!(aborted.contains(&name));

    let listed = cli
        .execute(&Commands::Txn {
            command: TxnCommands::List {
                format: "text".to_string(),
            },
        })
        .unwrap();
    assert_eq!(listed, "No live transactions");
}

#[test]
fn lock_show_reports_owner() {
    let temp = TempDir::new().unwrap();
    let cli = context(&temp);
    cli.execute(&Commands::Init).unwrap();
    cli.execute(&Commands::Lock {
        command: LockCommands::Create {
            path: "/docs".to_string(),
            owner: "ada".to_string(),
            comment: Some("restructuring".to_string()),
            ttl: Some(3600),
        },
    })
    .unwrap();

    let output = cli
        .execute(&Commands::Lock {
            command: LockCommands::Show {
                path: "docs".to_string(),
                format: "json".to_string(),
            },
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["owner"], "ada");
    assert!(parsed["token"]
        .as_str()
        .unwrap()
        .starts_with("opaquelocktoken:"));
    assert!(parsed["expires"].is_string());
}
