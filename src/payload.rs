//! Destination payloads, one struct per entity type.
//!
//! Optional fields serialize as `null` so the remote item is created with the
//! field explicitly cleared rather than left at a model default.

use serde::Serialize;

use crate::destination::{AssetRef, DestinationId};
use crate::model::{Author, Book, Collection, Supplier};
use crate::registry::EntityKind;
use crate::remap::RemapTable;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CollectionPayload {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CollectionPayload {
    pub fn from_record(collection: &Collection) -> Self {
        Self {
            name: collection.name.clone(),
            description: collection.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AuthorPayload {
    pub full_name: String,
    pub alias: Option<String>,
    pub biography: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<AssetRef>,
}

impl AuthorPayload {
    pub fn from_record(author: &Author, avatar: Option<AssetRef>) -> Self {
        Self {
            full_name: author.full_name(),
            alias: author.alias.clone(),
            biography: author.biography.clone(),
            country: author.country.clone(),
            avatar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BookPayload {
    pub title: Option<String>,
    pub collection: Option<DestinationId>,
    pub cover: Option<AssetRef>,
    pub authors: Vec<DestinationId>,
    pub description: Option<String>,
    pub review: Option<String>,
    pub isbn: Option<String>,
    pub price: Option<f64>,
    pub discount: Option<f64>,
    pub promo: Option<bool>,
    pub original_title: Option<String>,
    pub original_lang: Option<String>,
    pub translator: Option<String>,
    pub pages: Option<i32>,
    pub stock: Option<i32>,
    pub copyright: Option<String>,
    pub print_year: Option<i32>,
    pub first_print_year: Option<i32>,
    pub reprint: Option<i32>,
    pub cover_designer: Option<String>,
    pub layout_artist: Option<String>,
    pub highlight: Option<bool>,
    pub archive: Option<bool>,
    pub epub_url: Option<String>,
    pub epub_price: Option<f64>,
}

impl BookPayload {
    /// Build the payload for `book`, resolving its collection and authors
    /// through `remap`. An unmapped collection becomes `None`; unmapped
    /// authors are dropped from the list.
    pub fn from_record(book: &Book, remap: &RemapTable, cover: Option<AssetRef>) -> Self {
        let collection = book
            .collection_id
            .and_then(|id| remap.resolve(EntityKind::Collection, id))
            .cloned();

        Self {
            title: book.title.clone(),
            collection,
            cover,
            authors: remap.resolve_all(EntityKind::Author, &book.author_ids),
            description: book.description.clone(),
            review: book.review.clone(),
            isbn: book.isbn.clone(),
            price: book.price,
            discount: book.discount,
            promo: book.promo,
            original_title: book.original_title.clone(),
            original_lang: book.original_lang.clone(),
            translator: book.translator.clone(),
            pages: book.pages,
            stock: book.stock,
            copyright: book.copyright.clone(),
            print_year: book.print_year,
            first_print_year: book.first_print_year,
            reprint: book.reprint,
            cover_designer: book.cover_designer.clone(),
            layout_artist: book.layout_artist.clone(),
            highlight: book.highlight,
            archive: book.archive,
            epub_url: book.epub_url.clone(),
            epub_price: book.epub_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SupplierPayload {
    pub name: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub address: Option<String>,
    pub telephone: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
    pub published: Option<bool>,
    pub logo: Option<AssetRef>,
}

impl SupplierPayload {
    pub fn from_record(supplier: &Supplier, logo: Option<AssetRef>) -> Self {
        Self {
            name: supplier.name.clone(),
            city: supplier.city.clone(),
            region: supplier.region.clone(),
            address: supplier.address.clone(),
            telephone: supplier.telephone.clone(),
            description: supplier.description.clone(),
            url: supplier.url.clone(),
            email: supplier.email.clone(),
            published: supplier.published,
            logo,
        }
    }
}

/// Payload for any entity type, serialized as its bare attribute object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ItemPayload {
    Collection(CollectionPayload),
    Author(AuthorPayload),
    Book(BookPayload),
    Supplier(SupplierPayload),
}

impl ItemPayload {
    pub fn kind(&self) -> EntityKind {
        match self {
            ItemPayload::Collection(_) => EntityKind::Collection,
            ItemPayload::Author(_) => EntityKind::Author,
            ItemPayload::Book(_) => EntityKind::Book,
            ItemPayload::Supplier(_) => EntityKind::Supplier,
        }
    }

    pub fn to_attributes(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
