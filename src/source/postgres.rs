use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio_postgres::types::FromSql;
use tokio_postgres::{Client, Row};
use tracing::debug;

use super::connection::connect_with_url;
use super::SourceStore;
use crate::error::{MigrateError, Result};
use crate::model::{Author, Book, Collection, Image, OwnerType, SourceId, Supplier};

/// Gallery table shared by every image owner
pub const IMAGE_TABLE: &str = "active_admin_gallery_images";

const COLLECTIONS_QUERY: &str = r#"
    SELECT id::int8 AS id, name::text AS name, description::text AS description
    FROM collections
    ORDER BY id
"#;

const AUTHORS_QUERY: &str = r#"
    SELECT id::int8 AS id,
           first_name::text AS first_name,
           last_name::text AS last_name,
           alias::text AS alias,
           biography::text AS biography,
           country::text AS country
    FROM authors
    ORDER BY id
"#;

// Only links to authors that still exist are loaded; a dangling collection
// id comes back NULL.
const BOOKS_QUERY: &str = r#"
    SELECT b.id::int8 AS id,
           b.title::text AS title,
           c.id::int8 AS collection_id,
           ARRAY(
               SELECT ab.author_id::int8
               FROM authors_books ab
               JOIN authors a ON a.id = ab.author_id
               WHERE ab.book_id = b.id
               ORDER BY ab.author_id
           ) AS author_ids,
           b.description::text AS description,
           b.review::text AS review,
           b.isbn::text AS isbn,
           b.price::float8 AS price,
           b.discount::float8 AS discount,
           b.promo::boolean AS promo,
           b.original_title::text AS original_title,
           b.original_lang::text AS original_lang,
           b.translator::text AS translator,
           b.pages::int4 AS pages,
           b.stock::int4 AS stock,
           b.copyright::text AS copyright,
           b.print_year::int4 AS print_year,
           b.first_print_year::int4 AS first_print_year,
           b.reprint::int4 AS reprint,
           b.cover_designer::text AS cover_designer,
           b.pager::text AS layout_artist,
           b.highlight::boolean AS highlight,
           b.archive::boolean AS archive,
           b.epub_url::text AS epub_url,
           b.epub_price::float8 AS epub_price
    FROM books b
    LEFT JOIN collections c ON c.id = b.collection_id
    ORDER BY b.id
"#;

const SUPPLIERS_QUERY: &str = r#"
    SELECT id::int8 AS id,
           name::text AS name,
           city::text AS city,
           region::text AS region,
           address::text AS address,
           telephone::text AS telephone,
           description::text AS description,
           url::text AS url,
           email::text AS email,
           published::boolean AS published
    FROM suppliers
    ORDER BY id
"#;

/// Source store backed by the catalog's PostgreSQL database. The connection
/// is opened on first use, so runs that never read the source never connect.
pub struct PgSource {
    url: String,
    client: OnceCell<Client>,
}

impl PgSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| connect_with_url(&self.url))
            .await
    }

    async fn query(&self, entity: &str, sql: &str) -> Result<Vec<Row>> {
        let rows = self
            .client()
            .await?
            .query(sql, &[])
            .await
            .map_err(|e| MigrateError::source_query(entity, e))?;
        debug!(entity, rows = rows.len(), "Loaded source rows");
        Ok(rows)
    }
}

fn column<'a, T: FromSql<'a>>(row: &'a Row, entity: &str, name: &str) -> Result<T> {
    row.try_get(name)
        .map_err(|e| MigrateError::source_query(format!("{}.{}", entity, name), e))
}

fn collection_from_row(row: &Row) -> Result<Collection> {
    Ok(Collection {
        id: column(row, "collections", "id")?,
        name: column(row, "collections", "name")?,
        description: column(row, "collections", "description")?,
    })
}

fn author_from_row(row: &Row) -> Result<Author> {
    Ok(Author {
        id: column(row, "authors", "id")?,
        first_name: column(row, "authors", "first_name")?,
        last_name: column(row, "authors", "last_name")?,
        alias: column(row, "authors", "alias")?,
        biography: column(row, "authors", "biography")?,
        country: column(row, "authors", "country")?,
    })
}

fn book_from_row(row: &Row) -> Result<Book> {
    let t = "books";
    Ok(Book {
        id: column(row, t, "id")?,
        title: column(row, t, "title")?,
        collection_id: column(row, t, "collection_id")?,
        author_ids: column(row, t, "author_ids")?,
        description: column(row, t, "description")?,
        review: column(row, t, "review")?,
        isbn: column(row, t, "isbn")?,
        price: column(row, t, "price")?,
        discount: column(row, t, "discount")?,
        promo: column(row, t, "promo")?,
        original_title: column(row, t, "original_title")?,
        original_lang: column(row, t, "original_lang")?,
        translator: column(row, t, "translator")?,
        pages: column(row, t, "pages")?,
        stock: column(row, t, "stock")?,
        copyright: column(row, t, "copyright")?,
        print_year: column(row, t, "print_year")?,
        first_print_year: column(row, t, "first_print_year")?,
        reprint: column(row, t, "reprint")?,
        cover_designer: column(row, t, "cover_designer")?,
        layout_artist: column(row, t, "layout_artist")?,
        highlight: column(row, t, "highlight")?,
        archive: column(row, t, "archive")?,
        epub_url: column(row, t, "epub_url")?,
        epub_price: column(row, t, "epub_price")?,
    })
}

fn supplier_from_row(row: &Row) -> Result<Supplier> {
    Ok(Supplier {
        id: column(row, "suppliers", "id")?,
        name: column(row, "suppliers", "name")?,
        city: column(row, "suppliers", "city")?,
        region: column(row, "suppliers", "region")?,
        address: column(row, "suppliers", "address")?,
        telephone: column(row, "suppliers", "telephone")?,
        description: column(row, "suppliers", "description")?,
        url: column(row, "suppliers", "url")?,
        email: column(row, "suppliers", "email")?,
        published: column(row, "suppliers", "published")?,
    })
}

#[async_trait]
impl SourceStore for PgSource {
    async fn collections(&self) -> Result<Vec<Collection>> {
        self.query("collections", COLLECTIONS_QUERY)
            .await?
            .iter()
            .map(collection_from_row)
            .collect()
    }

    async fn authors(&self) -> Result<Vec<Author>> {
        self.query("authors", AUTHORS_QUERY)
            .await?
            .iter()
            .map(author_from_row)
            .collect()
    }

    async fn books(&self) -> Result<Vec<Book>> {
        self.query("books", BOOKS_QUERY)
            .await?
            .iter()
            .map(book_from_row)
            .collect()
    }

    async fn suppliers(&self) -> Result<Vec<Supplier>> {
        self.query("suppliers", SUPPLIERS_QUERY)
            .await?
            .iter()
            .map(supplier_from_row)
            .collect()
    }

    async fn first_image(&self, owner_type: OwnerType, owner_id: SourceId) -> Result<Option<Image>> {
        let sql = format!(
            "SELECT id::int8 AS id, image_uid::text AS image_uid \
             FROM {} \
             WHERE imageable_type = $1 AND imageable_id::int8 = $2 AND image_uid IS NOT NULL \
             ORDER BY id \
             LIMIT 1",
            IMAGE_TABLE
        );

        let row = self
            .client()
            .await?
            .query_opt(sql.as_str(), &[&owner_type.as_str(), &owner_id])
            .await
            .map_err(|e| MigrateError::source_query(IMAGE_TABLE, e))?;

        row.map(|row| {
            Ok(Image {
                id: column(&row, IMAGE_TABLE, "id")?,
                owner_type,
                owner_id,
                asset_uid: column(&row, IMAGE_TABLE, "image_uid")?,
            })
        })
        .transpose()
    }
}
