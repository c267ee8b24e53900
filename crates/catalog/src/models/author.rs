use crate::error::Error;
use crate::models::{AuthorId, date, timestamp};
use time::{Date, UtcDateTime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub biography: Option<String>,
    /// Calendar day only; no time of day is stored.
    pub birth_date: Option<Date>,
    /// Calendar day only; no time of day is stored.
    pub death_date: Option<Date>,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthor {
    pub name: String,
    pub biography: Option<String>,
    pub birth_date: Option<Date>,
    pub death_date: Option<Date>,
}
impl NewAuthor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            biography: None,
            birth_date: None,
            death_date: None,
        }
    }

    pub fn with_biography(mut self, biography: impl Into<String>) -> Self {
        self.biography = Some(biography.into());
        self
    }

    pub fn with_birth_date(mut self, birth_date: Date) -> Self {
        self.birth_date = Some(birth_date);
        self
    }

    pub fn with_death_date(mut self, death_date: Date) -> Self {
        self.death_date = Some(death_date);
        self
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct AuthorRow {
    id: AuthorId,
    name: String,
    biography: Option<String>,
    birth_date: Option<i64>,
    death_date: Option<i64>,
    created_at: i64,
    updated_at: i64,
}
impl TryFrom<AuthorRow> for Author {
    type Error = Error;
    fn try_from(row: AuthorRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            biography: row.biography,
            birth_date: row.birth_date.map(|d| date(d, "author birth_date")).transpose()?,
            death_date: row.death_date.map(|d| date(d, "author death_date")).transpose()?,
            created_at: timestamp(row.created_at, "author created_at")?,
            updated_at: timestamp(row.updated_at, "author updated_at")?,
        })
    }
}
