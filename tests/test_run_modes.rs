mod common;

use common::fixtures::{self, AUTHOR_SCHEMA, BOOK_SCHEMA, COLLECTION_SCHEMA, SUPPLIER_SCHEMA};
use common::TestEnvironment;

use catalog_migrate::config::ImageSettings;
use catalog_migrate::destination::{Destination, PageRequest};
use catalog_migrate::observer::ObserverEvent;
use catalog_migrate::payload::ItemPayload;
use catalog_migrate::testing::MemoryDestination;
use catalog_migrate::{EntityKind, RunMode};

fn populated_destination() -> MemoryDestination {
    MemoryDestination::new()
        .with_items(COLLECTION_SCHEMA, 4)
        .with_items(AUTHOR_SCHEMA, 7)
        .with_items(BOOK_SCHEMA, 6)
        .with_items(SUPPLIER_SCHEMA, 2)
        .with_uploads(5)
}

fn is_migration_event(event: &ObserverEvent) -> bool {
    matches!(
        event,
        ObserverEvent::PassStarted { .. }
            | ObserverEvent::RecordMigrated { .. }
            | ObserverEvent::PassCompleted { .. }
    )
}

#[tokio::test]
async fn test_clean_only_tears_down_and_stops() {
    let env = TestEnvironment::new(
        fixtures::catalog(),
        fixtures::registry(&[EntityKind::Author, EntityKind::Book, EntityKind::Collection]),
    )
    .with_destination(populated_destination());

    let outcome = env.run(&["clean", "publish", "test"]).await.unwrap();

    assert_eq!(outcome.mode, RunMode::Clean);
    assert!(outcome.remap.is_none());
    assert!(outcome.seed.is_none());
    assert_eq!(outcome.teardowns.len(), 1);
    assert_eq!(env.count_events(is_migration_event), 0);

    for schema in [COLLECTION_SCHEMA, AUTHOR_SCHEMA, BOOK_SCHEMA] {
        let page = env
            .destination
            .list_items(schema, PageRequest::first(env.page_limit))
            .await
            .unwrap();
        assert!(page.is_empty(), "{} not cleared", schema);
    }
    // supplier is inactive and images are not purged
    assert_eq!(env.destination.item_count(SUPPLIER_SCHEMA), 2);
    assert_eq!(env.destination.upload_count(), 5);
    assert_eq!(outcome.teardowns[0].bypassed, vec![EntityKind::Supplier]);
}

#[tokio::test]
async fn test_clean_purges_images_when_enabled() {
    let env = TestEnvironment::new(fixtures::catalog(), fixtures::all_active())
        .with_destination(populated_destination())
        .with_images(ImageSettings {
            purge: true,
            ..ImageSettings::default()
        });

    let outcome = env.run(&["clean"]).await.unwrap();

    assert_eq!(outcome.teardowns[0].uploads_deleted, 5);
    assert_eq!(outcome.teardowns[0].total_items(), 19);
    assert_eq!(env.destination.upload_count(), 0);
}

#[tokio::test]
async fn test_no_tokens_previews_without_writing() {
    let env = TestEnvironment::new(fixtures::catalog(), fixtures::all_active())
        .with_destination(populated_destination());

    let outcome = env.run(&["verbose", "dry"]).await.unwrap();

    assert_eq!(outcome.mode, RunMode::Preview);
    assert!(outcome.teardowns.is_empty());
    assert_eq!(outcome.remap.unwrap().len(EntityKind::Book), 3);
    assert_eq!(env.destination.item_count(AUTHOR_SCHEMA), 7);
}

#[tokio::test]
async fn test_publish_replaces_destination_content() {
    let env = TestEnvironment::new(fixtures::catalog(), fixtures::all_active())
        .with_destination(populated_destination());

    let outcome = env.run(&["publish"]).await.unwrap();

    assert_eq!(outcome.mode, RunMode::Publish);
    assert_eq!(outcome.teardowns.len(), 1);
    for kind in EntityKind::CREATION_ORDER {
        assert_eq!(
            env.destination.item_count(fixtures::schema_for(kind)),
            fixtures::catalog_count(kind),
            "{} count",
            kind
        );
    }
    // every surviving item is one this run created
    assert_eq!(env.destination.created_payloads(BOOK_SCHEMA).len(), 3);
}

#[tokio::test]
async fn test_test_token_previews_then_seeds() {
    let env = TestEnvironment::new(fixtures::catalog(), fixtures::all_active())
        .with_destination(populated_destination());

    let outcome = env.run(&["test"]).await.unwrap();

    assert_eq!(outcome.mode, RunMode::PreviewThenSeed);
    assert_eq!(outcome.remap.unwrap().len(EntityKind::Author), 3);
    assert_eq!(env.destination.item_count(COLLECTION_SCHEMA), 1);
    assert_eq!(env.destination.item_count(AUTHOR_SCHEMA), 3);
    assert_eq!(env.destination.item_count(BOOK_SCHEMA), 1);
    assert_eq!(env.destination.item_count(SUPPLIER_SCHEMA), 1);
}

#[tokio::test]
async fn test_publish_and_test_leaves_only_fixtures() {
    let env = TestEnvironment::new(fixtures::catalog(), fixtures::all_active())
        .with_destination(populated_destination());

    let outcome = env.run(&["test", "publish"]).await.unwrap();

    assert_eq!(outcome.mode, RunMode::PublishThenSeed);
    assert_eq!(outcome.teardowns.len(), 2);
    // second teardown removed what the migration created
    assert_eq!(
        outcome.teardowns[1].items_deleted.get(&EntityKind::Book),
        Some(&fixtures::catalog_count(EntityKind::Book))
    );

    let seed = outcome.seed.unwrap();
    let authors = seed.authors();
    assert_eq!(authors.len(), 3);

    let books = env.destination.created_payloads(BOOK_SCHEMA);
    assert_eq!(books.len(), 1);
    match &books[0] {
        ItemPayload::Book(book) => {
            assert_eq!(book.title.as_deref(), Some("Libro di prova"));
            assert_eq!(book.authors, vec![authors[0].clone(), authors[2].clone()]);
            assert!(!book.authors.contains(&authors[1]));
        }
        other => panic!("Expected book fixture, got {:?}", other),
    }
}

#[tokio::test]
async fn test_run_banner_lists_recognized_tokens() {
    let env = TestEnvironment::new(fixtures::catalog(), fixtures::all_active());

    env.run(&["publish", "later", "test"]).await.unwrap();

    assert_eq!(
        env.observer.events().first(),
        Some(&ObserverEvent::RunStarted {
            mode: RunMode::PublishThenSeed,
            tokens: vec!["publish", "test"],
        })
    );
}
