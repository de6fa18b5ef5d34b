use std::sync::Arc;
use std::thread;

use dynapi::metadata::{DataType, EntityConfiguration, PropertyConfiguration};
use dynapi::repository::{EntityRepository, RepositoryError};

fn entity(name: &str) -> EntityConfiguration {
    EntityConfiguration::builder(name)
        .property(PropertyConfiguration::new("Id", DataType::Int64).primary_key())
        .build()
        .unwrap()
}

fn names(repo: &EntityRepository) -> Vec<String> {
    repo.list().iter().map(|e| e.name().to_string()).collect()
}

#[test]
fn test_starts_empty() {
    let repo = EntityRepository::new();
    assert!(repo.list().is_empty());
    assert_eq!(repo.generation(), 0);
    assert!(repo.get("User").is_none());
}

#[test]
fn test_replace_drops_previous_entities() {
    let repo = EntityRepository::new();
    repo.replace([entity("User"), entity("Order")]).unwrap();
    assert_eq!(names(&repo), ["User", "Order"]);

    repo.replace([entity("Invoice")]).unwrap();
    assert_eq!(names(&repo), ["Invoice"]);
    assert!(repo.get("User").is_none());
    assert_eq!(repo.generation(), 2);
}

#[test]
fn test_failed_replace_keeps_current_snapshot() {
    let repo = EntityRepository::new();
    repo.replace([entity("User")]).unwrap();
    let before = repo.snapshot();

    let err = repo.replace([entity("Order"), entity("Order")]).unwrap_err();
    assert!(matches!(err, RepositoryError::DuplicateEntity(name) if name == "Order"));

    let after = repo.snapshot();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(names(&repo), ["User"]);
}

#[test]
fn test_staged_entities_invisible_until_commit() {
    let repo = EntityRepository::new();
    let mut builder = repo.stage();
    builder.add_or_update(entity("User"));
    assert!(builder.add_or_update(entity("User")));
    builder.add_or_update(entity("Order"));

    assert!(repo.list().is_empty());
    let snapshot = repo.commit(builder).unwrap();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(names(&repo), ["User", "Order"]);
}

#[test]
fn test_pinned_snapshot_survives_reload() {
    let repo = EntityRepository::new();
    repo.replace([entity("User"), entity("Order")]).unwrap();
    let pinned = repo.snapshot();

    repo.replace([entity("Invoice")]).unwrap();

    assert_eq!(pinned.len(), 2);
    assert!(pinned.get("User").is_some());
    assert!(pinned.get("Invoice").is_none());
    assert_eq!(repo.snapshot().generation(), pinned.generation() + 1);
}

#[test]
fn test_fingerprint_tracks_content() {
    let a = EntityRepository::new();
    let b = EntityRepository::new();
    a.replace([entity("User")]).unwrap();
    b.replace([entity("User")]).unwrap();
    assert_eq!(a.snapshot().fingerprint(), b.snapshot().fingerprint());

    b.replace([entity("Order")]).unwrap();
    assert_ne!(a.snapshot().fingerprint(), b.snapshot().fingerprint());
}

#[test]
fn test_resolve_resource_names() {
    let repo = EntityRepository::new();
    repo.replace([entity("User"), entity("OrderLine"), entity("Category")])
        .unwrap();
    let snapshot = repo.snapshot();

    let resolve = |r: &str| snapshot.resolve_resource(r).map(|e| e.name().to_string());
    assert_eq!(resolve("User").as_deref(), Some("User"));
    assert_eq!(resolve("user").as_deref(), Some("User"));
    assert_eq!(resolve("users").as_deref(), Some("User"));
    assert_eq!(resolve("order-lines").as_deref(), Some("OrderLine"));
    assert_eq!(resolve("order_line").as_deref(), Some("OrderLine"));
    assert_eq!(resolve("categories").as_deref(), Some("Category"));
    assert_eq!(resolve("widgets"), None);
}

#[test]
fn test_readers_never_see_mixed_snapshots() {
    let repo = Arc::new(EntityRepository::new());
    let old = ["A1", "A2", "A3"];
    let new = ["B1", "B2"];
    repo.replace(old.map(entity)).unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                for _ in 0..2_000 {
                    let seen = names(&repo);
                    let all_old = seen == old;
                    let all_new = seen == new;
                    assert!(all_old || all_new, "mixed snapshot: {seen:?}");
                }
            })
        })
        .collect();

    for i in 0..200 {
        if i % 2 == 0 {
            repo.replace(new.map(entity)).unwrap();
        } else {
            repo.replace(old.map(entity)).unwrap();
        }
    }

    for reader in readers {
        reader.join().unwrap();
    }
}
