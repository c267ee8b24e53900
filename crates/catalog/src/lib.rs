//! SQLite catalogue for BookLib.
//!
//! This crate owns the relational layout of the book catalogue: users,
//! authors, books, tags, ratings, comments and plugins, plus the `book_tags`
//! association between books and tags.
//!
//! # Architecture
//! - **Schema registry** ([`schema()`](schema::schema)): an immutable
//!   description of every table, assembled once per process. It renders the
//!   DDL and checks a live database for drift.
//! - **Migrations**: embedded SQL that creates the tables and the triggers
//!   keeping `updated_at` current. Applied on every connect.
//! - **[`Database`]**: the connection pool.
//! - **[`Catalog`]**: typed reads and writes. Relationships are answered by
//!   queries (`books_by_author`, `tags_for_book`, ...) instead of references
//!   between models.

mod db;
pub mod error;
pub mod models;
mod repo;
pub mod schema;

pub use crate::db::Database;
pub use crate::repo::Catalog;
