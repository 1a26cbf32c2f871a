//! Profile service behaviour, run against both storage backends

use std::thread;

use finance_planner::config::{BackendKind, FinancePaths};
use finance_planner::models::{Transaction, TransactionId};
use finance_planner::services::{ProfileService, TransactionPatch};
use finance_planner::storage::Storage;
use finance_planner::ErrorKind;
use tempfile::TempDir;

const BACKENDS: [BackendKind; 2] = [BackendKind::Sqlite, BackendKind::Json];

fn open(backend: BackendKind) -> (TempDir, Storage) {
    let temp_dir = TempDir::new().unwrap();
    let paths = FinancePaths::with_base_dir(temp_dir.path().to_path_buf());
    let storage = Storage::open(&paths, backend).unwrap();
    (temp_dir, storage)
}

#[test]
fn test_end_to_end_rent() {
    for backend in BACKENDS {
        let (_temp, storage) = open(backend);
        let service = ProfileService::new(&storage);

        let alice = service.load_or_create_profile("alice").unwrap();
        assert_eq!(alice.name, "alice");
        assert!(alice.transactions.is_empty(), "{backend}");

        service
            .add_transaction(&alice, Transaction::new("Rent", -80000))
            .unwrap();

        let reloaded = service.load_profile_by_name("alice").unwrap();
        assert_eq!(reloaded.transactions.sum(), -80000, "{backend}");
    }
}

#[test]
fn test_round_trip_keeps_label_amount_and_tags() {
    for backend in BACKENDS {
        let (_temp, storage) = open(backend);
        let service = ProfileService::new(&storage);
        let profile = service.load_or_create_profile("alice").unwrap();

        service
            .add_transaction(
                &profile,
                Transaction::new("Salary", 250000).with_tags(["income", "monthly"]),
            )
            .unwrap();

        let reloaded = service.load_profile_by_name("alice").unwrap();
        let all = reloaded.transactions.all();
        assert_eq!(all.len(), 1, "{backend}");
        assert!(!all[0].id.is_empty());
        assert_eq!(all[0].label, "Salary");
        assert_eq!(all[0].amount, 250000);
        assert_eq!(all[0].tags, vec!["income", "monthly"], "{backend}");
    }
}

#[test]
fn test_update_replaces_tags() {
    for backend in BACKENDS {
        let (_temp, storage) = open(backend);
        let service = ProfileService::new(&storage);
        let profile = service.load_or_create_profile("alice").unwrap();
        let created = service
            .add_transaction(&profile, Transaction::new("Shop", -500).with_tags(["a", "b"]))
            .unwrap();

        let mut updated = created.clone();
        updated.tags = vec!["c".to_string()];
        service.update_transaction(&updated).unwrap();

        assert_eq!(storage.transactions.load_tags(&created.id).unwrap(), vec!["c"]);
        assert_eq!(
            service.load_transaction(&created.id).unwrap().tags,
            vec!["c"],
            "{backend}"
        );
    }
}

#[test]
fn test_unknown_profile() {
    for backend in BACKENDS {
        let (_temp, storage) = open(backend);
        let service = ProfileService::new(&storage);
        let err = service.load_profile_by_name("nobody").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownProfile, "{backend}");
        assert_eq!(err.status_code(), 404);
    }
}

#[test]
fn test_load_or_create_creates_once() {
    for backend in BACKENDS {
        let (_temp, storage) = open(backend);
        let service = ProfileService::new(&storage);

        let first = service.load_or_create_profile("alice").unwrap();
        let second = service.load_or_create_profile("alice").unwrap();
        assert!(first.same_identity(&second), "{backend}");

        // A second create under the same name is refused, so only one exists
        let err = service
            .create_profile(finance_planner::models::Profile::new("alice"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateProfile, "{backend}");
    }
}

#[test]
fn test_concurrent_load_or_create_agrees_on_identity() {
    for backend in BACKENDS {
        let (_temp, storage) = open(backend);

        let profiles: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let storage = &storage;
                    s.spawn(move || {
                        ProfileService::new(storage)
                            .load_or_create_profile("shared")
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for profile in &profiles[1..] {
            assert!(profile.same_identity(&profiles[0]), "{backend}");
        }
    }
}

#[test]
fn test_concurrent_writers_lose_nothing() {
    for backend in BACKENDS {
        let (_temp, storage) = open(backend);
        let profile = ProfileService::new(&storage)
            .load_or_create_profile("busy")
            .unwrap();

        thread::scope(|s| {
            for worker in 0..4i64 {
                let storage = &storage;
                let profile = &profile;
                s.spawn(move || {
                    let service = ProfileService::new(storage);
                    for i in 1..=5i64 {
                        let label = format!("w{}-{}", worker, i);
                        service
                            .add_transaction(profile, Transaction::new(label, i))
                            .unwrap();
                    }
                });
            }
        });

        // 4 workers each adding 1..=5
        assert_eq!(profile.transactions.len(), 20);
        assert_eq!(profile.transactions.sum(), 60);

        let reloaded = ProfileService::new(&storage)
            .load_profile_by_name("busy")
            .unwrap();
        assert_eq!(reloaded.transactions.len(), 20, "{backend}");
        assert_eq!(reloaded.transactions.sum(), 60, "{backend}");
    }
}

#[test]
fn test_validation_precedes_storage() {
    for backend in BACKENDS {
        let (_temp, storage) = open(backend);
        let service = ProfileService::new(&storage);
        let profile = service.load_or_create_profile("alice").unwrap();

        let cases = [
            (Transaction::new("", 100), ErrorKind::InvalidLabel),
            (Transaction::new("Zero", 0), ErrorKind::InvalidAmount),
            (
                Transaction::new("Tagged", 100).with_tags(["ok", ""]),
                ErrorKind::InvalidTag,
            ),
        ];
        for (transaction, kind) in cases {
            let err = service.add_transaction(&profile, transaction).unwrap_err();
            assert_eq!(err.kind(), kind, "{backend}");
        }

        let reloaded = service.load_profile_by_name("alice").unwrap();
        assert!(reloaded.transactions.is_empty(), "{backend}");
    }
}

#[test]
fn test_transaction_for_unknown_profile_is_refused() {
    for backend in BACKENDS {
        let (_temp, storage) = open(backend);
        let service = ProfileService::new(&storage);

        let orphan = Transaction::new("Rent", -80000)
            .for_profile(finance_planner::models::ProfileId::generate());
        let err = service.create_transaction(orphan).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownProfile, "{backend}");
    }
}

#[test]
fn test_patch_unknown_transaction() {
    for backend in BACKENDS {
        let (_temp, storage) = open(backend);
        let service = ProfileService::new(&storage);
        service.load_or_create_profile("alice").unwrap();

        let err = service
            .update_transaction_for_profile(
                "alice",
                &TransactionId::generate(),
                TransactionPatch::default(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownTransaction, "{backend}");
    }
}

#[test]
fn test_backends_agree_on_loaded_profile() {
    let mut snapshots = Vec::new();
    for backend in BACKENDS {
        let (_temp, storage) = open(backend);
        let service = ProfileService::new(&storage);
        let profile = service.load_or_create_profile("alice").unwrap();
        for (label, amount, tags) in [
            ("Salary", 250000, vec!["income"]),
            ("Rent", -80000, vec!["home", "monthly"]),
            ("Coffee", -350, vec![]),
        ] {
            service
                .add_transaction(&profile, Transaction::new(label, amount).with_tags(tags))
                .unwrap();
        }

        let reloaded = service.load_profile_by_name("alice").unwrap();
        let view: Vec<_> = reloaded
            .transactions
            .all()
            .iter()
            .map(|t| (t.label.clone(), t.amount, t.tags.clone()))
            .collect();
        snapshots.push(view);
    }
    assert_eq!(snapshots[0], snapshots[1]);
}
