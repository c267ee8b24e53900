use super::{Catalog, into_models, update_and_refetch};
use crate::error::{QueryResultExt, Result};
use crate::models::{BookId, Comment, CommentId, CommentRow, NewComment, UserId};
use tracing::instrument;

impl Catalog {
    // =========================================================================
    // Comments
    // =========================================================================

    #[instrument(skip_all, fields(user_id = %comment.user_id, book_id = %comment.book_id))]
    pub async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        let row: CommentRow = sqlx::query_as(include_str!("../../queries/comments/insert.sql"))
            .bind(comment.user_id)
            .bind(comment.book_id)
            .bind(&comment.content)
            .fetch_one(&self.pool)
            .await
            .or_raise_query()?;
        let comment = Comment::try_from(row)?;
        tracing::debug!(id = %comment.id, "Created comment");
        Ok(comment)
    }

    pub async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>> {
        let row: Option<CommentRow> = sqlx::query_as(include_str!("../../queries/comments/get.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise_query()?;
        row.map(Comment::try_from).transpose()
    }

    #[instrument(skip(self, content))]
    pub async fn update_comment(&self, id: CommentId, content: impl AsRef<str>) -> Result<Comment> {
        let tx = self.begin().await?;
        let update = sqlx::query(include_str!("../../queries/comments/update.sql"))
            .bind(id)
            .bind(content.as_ref());
        update_and_refetch::<CommentRow, _>(
            tx,
            update,
            include_str!("../../queries/comments/get.sql"),
            CommentId::ENTITY,
            id.0,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_comment(&self, id: CommentId) -> Result<bool> {
        let result = sqlx::query(include_str!("../../queries/comments/delete.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise_query()?;
        Ok(result.rows_affected() > 0)
    }

    /// Comments on a book, oldest first.
    pub async fn comments_for_book(&self, id: BookId) -> Result<Vec<Comment>> {
        let rows: Vec<CommentRow> = sqlx::query_as(include_str!("../../queries/comments/for_book.sql"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise_query()?;
        into_models(rows)
    }

    pub async fn comments_by_user(&self, id: UserId) -> Result<Vec<Comment>> {
        let rows: Vec<CommentRow> = sqlx::query_as(include_str!("../../queries/comments/by_user.sql"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise_query()?;
        into_models(rows)
    }
}
