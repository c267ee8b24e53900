use super::{Catalog, into_models};
use crate::error::{QueryResultExt, Result};
use crate::models::{Book, BookId, BookRow, NewTag, Tag, TagId, TagRow};
use tracing::instrument;

impl Catalog {
    // =========================================================================
    // Tags
    // =========================================================================

    #[instrument(skip_all, fields(name = %tag.name))]
    pub async fn create_tag(&self, tag: &NewTag) -> Result<Tag> {
        let row: TagRow = sqlx::query_as(include_str!("../../queries/tags/insert.sql"))
            .bind(&tag.name)
            .bind(tag.description.as_deref())
            .fetch_one(&self.pool)
            .await
            .or_raise_query()?;
        let tag = Tag::try_from(row)?;
        tracing::debug!(id = %tag.id, "Created tag");
        Ok(tag)
    }

    pub async fn get_tag(&self, id: TagId) -> Result<Option<Tag>> {
        let row: Option<TagRow> = sqlx::query_as(include_str!("../../queries/tags/get.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise_query()?;
        row.map(Tag::try_from).transpose()
    }

    pub async fn get_tag_by_name(&self, name: impl AsRef<str>) -> Result<Option<Tag>> {
        let row: Option<TagRow> = sqlx::query_as(include_str!("../../queries/tags/get_by_name.sql"))
            .bind(name.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise_query()?;
        row.map(Tag::try_from).transpose()
    }

    /// All tags, alphabetically.
    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let rows: Vec<TagRow> = sqlx::query_as(include_str!("../../queries/tags/list.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise_query()?;
        into_models(rows)
    }

    /// Delete a tag and detach it from every book.
    #[instrument(skip(self))]
    pub async fn delete_tag(&self, id: TagId) -> Result<bool> {
        let result = sqlx::query(include_str!("../../queries/tags/delete.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise_query()?;
        Ok(result.rows_affected() > 0)
    }

    /// Attach a tag to a book.
    ///
    /// Returns `false` if the pair was already linked. Both the book and the
    /// tag must exist.
    #[instrument(skip(self))]
    pub async fn tag_book(&self, book_id: BookId, tag_id: TagId) -> Result<bool> {
        let result = sqlx::query(include_str!("../../queries/tags/link.sql"))
            .bind(book_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .or_raise_query()?;
        Ok(result.rows_affected() > 0)
    }

    /// Detach a tag from a book. Returns `false` if they weren't linked.
    #[instrument(skip(self))]
    pub async fn untag_book(&self, book_id: BookId, tag_id: TagId) -> Result<bool> {
        let result = sqlx::query(include_str!("../../queries/tags/unlink.sql"))
            .bind(book_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .or_raise_query()?;
        Ok(result.rows_affected() > 0)
    }

    /// Tags attached to a book, alphabetically.
    pub async fn tags_for_book(&self, id: BookId) -> Result<Vec<Tag>> {
        let rows: Vec<TagRow> = sqlx::query_as(include_str!("../../queries/tags/for_book.sql"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise_query()?;
        into_models(rows)
    }

    /// Books carrying a tag, ordered by title.
    pub async fn books_for_tag(&self, id: TagId) -> Result<Vec<Book>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../../queries/books/for_tag.sql"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise_query()?;
        into_models(rows)
    }
}
