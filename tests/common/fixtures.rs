use catalog_migrate::model::{Author, Book, Collection, OwnerType, Supplier};
use catalog_migrate::registry::EntityType;
use catalog_migrate::testing::MemorySource;
use catalog_migrate::{EntityKind, EntityRegistry};

pub const COLLECTION_SCHEMA: &str = "26178";
pub const AUTHOR_SCHEMA: &str = "25936";
pub const BOOK_SCHEMA: &str = "26183";
pub const SUPPLIER_SCHEMA: &str = "26190";

pub fn schema_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Collection => COLLECTION_SCHEMA,
        EntityKind::Author => AUTHOR_SCHEMA,
        EntityKind::Book => BOOK_SCHEMA,
        EntityKind::Supplier => SUPPLIER_SCHEMA,
    }
}

/// Registry with every kind configured and only `active` switched on
pub fn registry(active: &[EntityKind]) -> EntityRegistry {
    EntityRegistry::new(
        EntityKind::CREATION_ORDER
            .iter()
            .map(|kind| EntityType::new(*kind, schema_for(*kind), active.contains(kind))),
    )
}

pub fn all_active() -> EntityRegistry {
    registry(&EntityKind::CREATION_ORDER)
}

pub fn collection(id: i64, name: &str) -> Collection {
    Collection {
        id,
        name: Some(name.to_string()),
        description: Some(format!("{} description", name)),
    }
}

pub fn author(id: i64, first: &str, last: &str) -> Author {
    Author {
        id,
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        ..Author::default()
    }
}

pub fn book(id: i64, title: &str, collection_id: Option<i64>, author_ids: &[i64]) -> Book {
    Book {
        id,
        title: Some(title.to_string()),
        collection_id,
        author_ids: author_ids.to_vec(),
        isbn: Some(format!("978-{}", id)),
        pages: Some(120),
        ..Book::default()
    }
}

pub fn supplier(id: i64, name: &str) -> Supplier {
    Supplier {
        id,
        name: Some(name.to_string()),
        city: Some("Firenze".to_string()),
        published: Some(true),
        ..Supplier::default()
    }
}

/// Small catalog touching every entity type
pub fn catalog() -> MemorySource {
    MemorySource::new()
        .with_collection(collection(1, "Narrativa"))
        .with_collection(collection(2, "Saggistica"))
        .with_author(author(10, "Anna", "Rossi"))
        .with_author(author(11, "Bruno", "Bianchi"))
        .with_author(author(12, "Carla", "Verdi"))
        .with_book(book(5, "Libro", Some(1), &[10, 11]))
        .with_book(book(6, "Secondo", Some(2), &[12]))
        .with_book(book(7, "Orfano", None, &[]))
        .with_supplier(supplier(30, "Distributore Centro"))
        .with_image(OwnerType::Author, 10, 100, "2014/anna.jpg")
        .with_image(OwnerType::Book, 5, 101, "2017/libro.jpg")
        .with_image(OwnerType::Supplier, 30, 102, "2015/logo.png")
}

/// Number of records `catalog()` holds per kind
pub fn catalog_count(kind: EntityKind) -> usize {
    match kind {
        EntityKind::Collection => 2,
        EntityKind::Author => 3,
        EntityKind::Book => 3,
        EntityKind::Supplier => 1,
    }
}
