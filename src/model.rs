//! Records read from the source catalog database.

use std::fmt;

/// Primary key of a source row
pub type SourceId = i64;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    pub id: SourceId,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Author {
    pub id: SourceId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub alias: Option<String>,
    pub biography: Option<String>,
    pub country: Option<String>,
}

impl Author {
    /// Display name published to the destination: trimmed first and last
    /// name joined by a single space.
    pub fn full_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        format!("{} {}", first, last)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Book {
    pub id: SourceId,
    pub title: Option<String>,
    pub collection_id: Option<SourceId>,
    /// Linked authors, in source order
    pub author_ids: Vec<SourceId>,
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

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Supplier {
    pub id: SourceId,
    pub name: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub address: Option<String>,
    pub telephone: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
    pub published: Option<bool>,
}

/// Kind of record an image hangs off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerType {
    Author,
    Book,
    Supplier,
}

impl OwnerType {
    /// Value stored in the gallery table's `imageable_type` column
    pub fn as_str(self) -> &'static str {
        match self {
            OwnerType::Author => "Author",
            OwnerType::Book => "Book",
            OwnerType::Supplier => "Supplier",
        }
    }
}

impl fmt::Display for OwnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gallery image. Points back at its owner by `(owner_type, owner_id)`;
/// owners never hold their images.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub id: SourceId,
    pub owner_type: OwnerType,
    pub owner_id: SourceId,
    pub asset_uid: String,
}
