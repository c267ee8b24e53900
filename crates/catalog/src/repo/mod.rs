//! Query-mapping layer over the catalogue tables.
//!
//! Relationships are exposed as explicit queries rather than references
//! between models: a [`Book`](crate::models::Book) knows its `author_id`, and
//! [`Catalog::books_by_author`] answers the reverse question. Nothing on the
//! Rust side holds a cycle.

mod author;
mod book;
mod comment;
mod plugin;
mod rating;
mod tag;
mod user;

use crate::Database;
use crate::error::{Error, ErrorKind, QueryResultExt, Result};
use exn::ResultExt;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};

/// Repository for every entity in the catalogue.
///
/// Cheap to clone; all clones share the same connection pool. Each section
/// (users, authors, books, tags, ratings, comments, plugins) lives in its
/// own module.
///
/// # Writes
///
/// - Inserts return the stored row, including database-supplied defaults
///   (`created_at`, `updated_at`, `language`, `is_active`).
/// - Updates return the refreshed row; `updated_at` is bumped by the
///   database. Updating a missing row fails with [`ErrorKind::NotFound`].
/// - Deletes return `false` when there was nothing to delete.
/// - Integrity failures come back as [`ErrorKind::UniqueViolation`],
///   [`ErrorKind::ForeignKeyViolation`] or [`ErrorKind::NotNullViolation`].
#[derive(Debug, Clone)]
pub struct Catalog {
    pool: SqlitePool,
}
impl From<&Database> for Catalog {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Catalog {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool.begin().await.or_raise(|| ErrorKind::Database)
    }
}

/// Convert a batch of rows, failing on the first that doesn't map.
fn into_models<R, M>(rows: Vec<R>) -> Result<Vec<M>>
where
    M: TryFrom<R, Error = Error>,
{
    rows.into_iter().map(M::try_from).collect()
}

/// Run a single-row `UPDATE` and read the row back in the same transaction,
/// so the caller sees what the update triggers wrote.
async fn update_and_refetch<'q, R, M>(
    mut tx: Transaction<'static, Sqlite>,
    update: Query<'q, Sqlite, SqliteArguments<'q>>,
    select: &'static str,
    entity: &'static str,
    id: i64,
) -> Result<M>
where
    R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    M: TryFrom<R, Error = Error>,
{
    let result = update.execute(&mut *tx).await.or_raise_query()?;
    if result.rows_affected() == 0 {
        exn::bail!(ErrorKind::NotFound(entity, id));
    }
    let row: R = sqlx::query_as(select).bind(id).fetch_one(&mut *tx).await.or_raise_query()?;
    tx.commit().await.or_raise(|| ErrorKind::Database)?;
    M::try_from(row)
}
