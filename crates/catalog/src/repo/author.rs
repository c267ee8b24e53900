use super::{Catalog, into_models, update_and_refetch};
use crate::error::{QueryResultExt, Result};
use crate::models::{Author, AuthorId, AuthorRow, Book, BookId, BookRow, NewAuthor, date_to_unix};
use tracing::instrument;

impl Catalog {
    // =========================================================================
    // Authors
    // =========================================================================

    #[instrument(skip_all, fields(name = %author.name))]
    pub async fn create_author(&self, author: &NewAuthor) -> Result<Author> {
        let row: AuthorRow = sqlx::query_as(include_str!("../../queries/authors/insert.sql"))
            .bind(&author.name)
            .bind(author.biography.as_deref())
            .bind(author.birth_date.map(date_to_unix))
            .bind(author.death_date.map(date_to_unix))
            .fetch_one(&self.pool)
            .await
            .or_raise_query()?;
        let author = Author::try_from(row)?;
        tracing::debug!(id = %author.id, "Created author");
        Ok(author)
    }

    pub async fn get_author(&self, id: AuthorId) -> Result<Option<Author>> {
        let row: Option<AuthorRow> = sqlx::query_as(include_str!("../../queries/authors/get.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise_query()?;
        row.map(Author::try_from).transpose()
    }

    pub async fn list_authors(&self) -> Result<Vec<Author>> {
        let rows: Vec<AuthorRow> = sqlx::query_as(include_str!("../../queries/authors/list.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise_query()?;
        into_models(rows)
    }

    #[instrument(skip_all, fields(id = %author.id))]
    pub async fn update_author(&self, author: &Author) -> Result<Author> {
        let tx = self.begin().await?;
        let update = sqlx::query(include_str!("../../queries/authors/update.sql"))
            .bind(author.id)
            .bind(&author.name)
            .bind(author.biography.as_deref())
            .bind(author.birth_date.map(date_to_unix))
            .bind(author.death_date.map(date_to_unix));
        update_and_refetch::<AuthorRow, _>(
            tx,
            update,
            include_str!("../../queries/authors/get.sql"),
            AuthorId::ENTITY,
            author.id.0,
        )
        .await
    }

    /// Delete an author. Their books stay in the catalogue without an author.
    #[instrument(skip(self))]
    pub async fn delete_author(&self, id: AuthorId) -> Result<bool> {
        let result = sqlx::query(include_str!("../../queries/authors/delete.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise_query()?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::debug!("Deleted author");
        }
        Ok(deleted)
    }

    /// Every book attributed to the author, ordered by title.
    pub async fn books_by_author(&self, id: AuthorId) -> Result<Vec<Book>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../../queries/books/by_author.sql"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise_query()?;
        into_models(rows)
    }

    /// The author a book is attributed to, if any.
    pub async fn author_of_book(&self, id: BookId) -> Result<Option<Author>> {
        let row: Option<AuthorRow> = sqlx::query_as(include_str!("../../queries/authors/of_book.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise_query()?;
        row.map(Author::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{AuthorId, NewAuthor, NewBook};
    use crate::repo::fixtures::{catalog, jane_doe, sample_book};
    use time::macros::date;

    #[tokio::test]
    async fn test_create_with_dates() {
        let (db, catalog) = catalog().await;
        let author = catalog
            .create_author(
                &NewAuthor::new("Jane Austen")
                    .with_biography("English novelist.")
                    .with_birth_date(date!(1775 - 12 - 16))
                    .with_death_date(date!(1817 - 07 - 18)),
            )
            .await
            .unwrap();
        let stored = catalog.get_author(author.id).await.unwrap().unwrap();
        assert_eq!(stored.birth_date, Some(date!(1775 - 12 - 16)));
        assert_eq!(stored.death_date, Some(date!(1817 - 07 - 18)));
        assert_eq!(stored.biography.as_deref(), Some("English novelist."));
        db.close().await;
    }

    #[tokio::test]
    async fn test_books_by_author() {
        let (db, catalog) = catalog().await;
        let jane = jane_doe(&catalog).await;
        let other = catalog.create_author(&NewAuthor::new("John Roe")).await.unwrap();
        sample_book(&catalog, &jane).await;
        catalog
            .create_book(&NewBook::new("Another Title").with_author(other.id))
            .await
            .unwrap();
        catalog.create_book(&NewBook::new("Anonymous")).await.unwrap();

        let titles: Vec<String> = catalog
            .books_by_author(jane.id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Sample Title".to_string()]);
        assert!(catalog.books_by_author(AuthorId(404)).await.unwrap().is_empty());
        db.close().await;
    }

    #[tokio::test]
    async fn test_author_of_book() {
        let (db, catalog) = catalog().await;
        let jane = jane_doe(&catalog).await;
        let book = sample_book(&catalog, &jane).await;
        let orphan = catalog.create_book(&NewBook::new("Anonymous")).await.unwrap();
        assert_eq!(catalog.author_of_book(book.id).await.unwrap(), Some(jane));
        assert_eq!(catalog.author_of_book(orphan.id).await.unwrap(), None);
        db.close().await;
    }

    #[tokio::test]
    async fn test_update_author() {
        let (db, catalog) = catalog().await;
        let before = jane_doe(&catalog).await;
        let mut changed = before.clone();
        changed.biography = Some("Pseudonymous.".to_string());
        let after = catalog.update_author(&changed).await.unwrap();
        assert_eq!(after.biography.as_deref(), Some("Pseudonymous."));
        assert_eq!(after.name, "Jane Doe");
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
        db.close().await;
    }

    #[tokio::test]
    async fn test_deleting_author_keeps_books() {
        let (db, catalog) = catalog().await;
        let jane = jane_doe(&catalog).await;
        let book = sample_book(&catalog, &jane).await;
        assert!(catalog.delete_author(jane.id).await.unwrap());
        let book = catalog.get_book(book.id).await.unwrap().unwrap();
        assert_eq!(book.author_id, None);
        assert_eq!(catalog.list_authors().await.unwrap(), vec![]);
        db.close().await;
    }
}
