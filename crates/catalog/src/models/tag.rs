use crate::error::Error;
use crate::models::{TagId, timestamp};
use time::UtcDateTime;

/// A label for categorising books. Tags are created once and never updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: UtcDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub name: String,
    pub description: Option<String>,
}
impl NewTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), description: None }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct TagRow {
    id: TagId,
    name: String,
    description: Option<String>,
    created_at: i64,
}
impl TryFrom<TagRow> for Tag {
    type Error = Error;
    fn try_from(row: TagRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: timestamp(row.created_at, "tag created_at")?,
        })
    }
}
