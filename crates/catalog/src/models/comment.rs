use crate::error::Error;
use crate::models::{BookId, CommentId, UserId, timestamp};
use time::UtcDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub content: String,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub user_id: UserId,
    pub book_id: BookId,
    pub content: String,
}
impl NewComment {
    pub fn new(user_id: UserId, book_id: BookId, content: impl Into<String>) -> Self {
        Self {
            user_id,
            book_id,
            content: content.into(),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct CommentRow {
    id: CommentId,
    user_id: UserId,
    book_id: BookId,
    content: String,
    created_at: i64,
    updated_at: i64,
}
impl TryFrom<CommentRow> for Comment {
    type Error = Error;
    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            book_id: row.book_id,
            content: row.content,
            created_at: timestamp(row.created_at, "comment created_at")?,
            updated_at: timestamp(row.updated_at, "comment updated_at")?,
        })
    }
}
