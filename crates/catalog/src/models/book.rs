use crate::error::{Error, ErrorKind};
use crate::models::{AuthorId, BookId, date, timestamp};
use exn::ResultExt;
use time::{Date, UtcDateTime};

/// A catalogued book.
///
/// The author, tags, ratings and comments are not carried on the model; ask
/// the [`Catalog`](crate::Catalog) for them (`author_of_book`, `tags_for_book`,
/// `ratings_for_book`, `comments_for_book`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    /// Unique when present.
    pub isbn: Option<String>,
    pub description: Option<String>,
    /// Calendar day only; no time of day is stored.
    pub publication_date: Option<Date>,
    pub page_count: Option<u32>,
    pub language: String,
    pub author_id: Option<AuthorId>,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub publication_date: Option<Date>,
    pub page_count: Option<u32>,
    /// Left unset, the book is catalogued as English ([`DEFAULT_LANGUAGE`](crate::schema::DEFAULT_LANGUAGE)).
    pub language: Option<String>,
    pub author_id: Option<AuthorId>,
}
impl NewBook {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            isbn: None,
            description: None,
            publication_date: None,
            page_count: None,
            language: None,
            author_id: None,
        }
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_publication_date(mut self, publication_date: Date) -> Self {
        self.publication_date = Some(publication_date);
        self
    }

    pub fn with_page_count(mut self, page_count: u32) -> Self {
        self.page_count = Some(page_count);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_author(mut self, author_id: AuthorId) -> Self {
        self.author_id = Some(author_id);
        self
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookRow {
    id: BookId,
    title: String,
    isbn: Option<String>,
    description: Option<String>,
    publication_date: Option<i64>,
    page_count: Option<i64>,
    language: String,
    author_id: Option<AuthorId>,
    created_at: i64,
    updated_at: i64,
}
impl TryFrom<BookRow> for Book {
    type Error = Error;
    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            isbn: row.isbn,
            description: row.description,
            publication_date: row.publication_date.map(|d| date(d, "book publication_date")).transpose()?,
            page_count: row
                .page_count
                .map(|c| u32::try_from(c).or_raise(|| ErrorKind::InvalidData("book page_count")))
                .transpose()?,
            language: row.language,
            author_id: row.author_id,
            created_at: timestamp(row.created_at, "book created_at")?,
            updated_at: timestamp(row.updated_at, "book updated_at")?,
        })
    }
}
