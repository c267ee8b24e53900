use super::{Catalog, into_models, update_and_refetch};
use crate::error::{QueryResultExt, Result};
use crate::models::{Book, BookId, BookRow, NewBook, date_to_unix};
use crate::schema::DEFAULT_LANGUAGE;
use tracing::instrument;

impl Catalog {
    // =========================================================================
    // Books
    // =========================================================================

    /// Add a book to the catalogue.
    ///
    /// Fails with a uniqueness violation if another book already carries the
    /// same ISBN, and with a foreign-key violation if `author_id` points at
    /// no author. Books without an ISBN never conflict with each other.
    #[instrument(skip_all, fields(title = %book.title))]
    pub async fn create_book(&self, book: &NewBook) -> Result<Book> {
        let row: BookRow = sqlx::query_as(include_str!("../../queries/books/insert.sql"))
            .bind(&book.title)
            .bind(book.isbn.as_deref())
            .bind(book.description.as_deref())
            .bind(book.publication_date.map(date_to_unix))
            .bind(book.page_count.map(i64::from))
            .bind(book.language.as_deref().unwrap_or(DEFAULT_LANGUAGE))
            .bind(book.author_id)
            .fetch_one(&self.pool)
            .await
            .or_raise_query()?;
        let book = Book::try_from(row)?;
        tracing::debug!(id = %book.id, "Created book");
        Ok(book)
    }

    pub async fn get_book(&self, id: BookId) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../../queries/books/get.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise_query()?;
        row.map(Book::try_from).transpose()
    }

    pub async fn get_book_by_isbn(&self, isbn: impl AsRef<str>) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../../queries/books/get_by_isbn.sql"))
            .bind(isbn.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise_query()?;
        row.map(Book::try_from).transpose()
    }

    pub async fn list_books(&self) -> Result<Vec<Book>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../../queries/books/list.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise_query()?;
        into_models(rows)
    }

    /// Write every mutable attribute of `book` back to its row.
    #[instrument(skip_all, fields(id = %book.id))]
    pub async fn update_book(&self, book: &Book) -> Result<Book> {
        let tx = self.begin().await?;
        let update = sqlx::query(include_str!("../../queries/books/update.sql"))
            .bind(book.id)
            .bind(&book.title)
            .bind(book.isbn.as_deref())
            .bind(book.description.as_deref())
            .bind(book.publication_date.map(date_to_unix))
            .bind(book.page_count.map(i64::from))
            .bind(&book.language)
            .bind(book.author_id);
        update_and_refetch::<BookRow, _>(
            tx,
            update,
            include_str!("../../queries/books/get.sql"),
            BookId::ENTITY,
            book.id.0,
        )
        .await
    }

    /// Remove a book together with its ratings, comments and tag links.
    #[instrument(skip(self))]
    pub async fn delete_book(&self, id: BookId) -> Result<bool> {
        let result = sqlx::query(include_str!("../../queries/books/delete.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise_query()?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::debug!("Deleted book");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::models::{AuthorId, BookId, NewBook};
    use crate::repo::fixtures::{catalog, error_kind, jane_doe, sample_book};
    use time::macros::date;

    #[tokio::test]
    async fn test_defaults_are_applied() {
        let (db, catalog) = catalog().await;
        let book = catalog.create_book(&NewBook::new("Untitled Draft")).await.unwrap();
        assert_eq!(book.language, "en");
        assert_eq!(book.isbn, None);
        assert_eq!(book.author_id, None);
        db.close().await;
    }

    #[tokio::test]
    async fn test_create_with_everything() {
        let (db, catalog) = catalog().await;
        let jane = jane_doe(&catalog).await;
        let book = catalog
            .create_book(
                &NewBook::new("Le Titre")
                    .with_isbn("978-2-07-036822-8")
                    .with_description("Roman.")
                    .with_publication_date(date!(1942 - 06 - 01))
                    .with_page_count(185)
                    .with_language("fr")
                    .with_author(jane.id),
            )
            .await
            .unwrap();
        let stored = catalog.get_book_by_isbn("978-2-07-036822-8").await.unwrap().unwrap();
        assert_eq!(stored, book);
        assert_eq!(stored.language, "fr");
        assert_eq!(stored.page_count, Some(185));
        assert_eq!(stored.publication_date, Some(date!(1942 - 06 - 01)));
        db.close().await;
    }

    #[tokio::test]
    async fn test_duplicate_isbn_is_rejected() {
        let (db, catalog) = catalog().await;
        catalog
            .create_book(&NewBook::new("First").with_isbn("0-306-40615-2"))
            .await
            .unwrap();
        let duplicate = catalog
            .create_book(&NewBook::new("Second").with_isbn("0-306-40615-2"))
            .await;
        assert!(matches!(error_kind(duplicate), ErrorKind::UniqueViolation(_)));
        db.close().await;
    }

    #[tokio::test]
    async fn test_many_books_without_isbn() {
        let (db, catalog) = catalog().await;
        for title in ["One", "Two", "Three"] {
            catalog.create_book(&NewBook::new(title)).await.unwrap();
        }
        assert_eq!(catalog.list_books().await.unwrap().len(), 3);
        db.close().await;
    }

    #[tokio::test]
    async fn test_unknown_author_is_rejected() {
        let (db, catalog) = catalog().await;
        let result = catalog
            .create_book(&NewBook::new("Ghostwritten").with_author(AuthorId(404)))
            .await;
        assert!(matches!(error_kind(result), ErrorKind::ForeignKeyViolation(_)));
        db.close().await;
    }

    #[tokio::test]
    async fn test_update_book() {
        let (db, catalog) = catalog().await;
        let jane = jane_doe(&catalog).await;
        let before = sample_book(&catalog, &jane).await;

        let mut changed = before.clone();
        changed.isbn = Some("0-306-40615-2".to_string());
        changed.author_id = None;
        let after = catalog.update_book(&changed).await.unwrap();
        assert_eq!(after.isbn.as_deref(), Some("0-306-40615-2"));
        assert_eq!(after.author_id, None);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
        db.close().await;
    }

    #[tokio::test]
    async fn test_update_missing_book() {
        let (db, catalog) = catalog().await;
        let jane = jane_doe(&catalog).await;
        let mut book = sample_book(&catalog, &jane).await;
        book.id = BookId(404);
        assert_eq!(error_kind(catalog.update_book(&book).await), ErrorKind::NotFound("book", 404));
        db.close().await;
    }
}
