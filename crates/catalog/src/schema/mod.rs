//! Schema registry.
//!
//! The catalogue's tables, columns and integrity rules declared as plain data.
//! Two consumers read the same declaration by reference: the drift check in
//! [`Database::verify_schema`](crate::Database::verify_schema), which compares
//! it against a live database, and anything that wants to render DDL from it
//! (see [`Schema::create_statements`]). Nothing registers itself implicitly;
//! [`Schema::assemble`] builds the whole thing in one explicit call.

mod drift;
mod tables;

pub use self::drift::Drift;
pub(crate) use self::drift::diff;

use std::fmt::{self, Write};
use std::sync::LazyLock;

/// Language assumed for a book when the caller doesn't provide one.
pub const DEFAULT_LANGUAGE: &str = "en";
/// Users and plugins are active unless told otherwise.
pub const DEFAULT_ACTIVE: bool = true;

/// SQL expression evaluating to the current time as Unix milliseconds.
pub(crate) const NOW_UNIX_MS: &str = "CAST(ROUND((julianday('now') - 2440587.5) * 86400000) AS INTEGER)";

static SCHEMA: LazyLock<Schema> = LazyLock::new(Schema::assemble);

/// The assembled catalogue schema, built once on first use and never mutated.
pub fn schema() -> &'static Schema {
    &SCHEMA
}

/// Storage type of a column, as declared to SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Boolean,
    Text,
    /// Bounded string. SQLite records the length but does not enforce it.
    Varchar(u32),
    /// Point in time, stored as Unix milliseconds.
    Timestamp,
    /// Calendar date, stored as the Unix timestamp of UTC midnight.
    Date,
}
impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer | Self::Timestamp | Self::Date => f.write_str("INTEGER"),
            Self::Real => f.write_str("REAL"),
            Self::Boolean => f.write_str("BOOLEAN"),
            Self::Text => f.write_str("TEXT"),
            Self::Varchar(len) => write!(f, "VARCHAR({len})"),
        }
    }
}

/// Value substituted by the database when an insert omits the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Integer(i64),
    Boolean(bool),
    Text(&'static str),
    /// Time of the insert.
    CurrentTimestamp,
}
impl DefaultValue {
    /// The literal as SQLite reports it back through `pragma_table_info`.
    ///
    /// Expression defaults have no stable textual form, so they return `None`.
    pub(crate) fn literal(&self) -> Option<String> {
        match self {
            Self::Integer(value) => Some(value.to_string()),
            Self::Boolean(value) => Some(i64::from(*value).to_string()),
            Self::Text(value) => Some(format!("'{}'", value.replace('\'', "''"))),
            Self::CurrentTimestamp => None,
        }
    }
}
impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.literal() {
            Some(literal) => f.write_str(&literal),
            None => write!(f, "({NOW_UNIX_MS})"),
        }
    }
}

/// What happens to referencing rows when the referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    SetNull,
    Restrict,
}
impl OnDelete {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::Restrict => "RESTRICT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub unique: bool,
    pub default: Option<DefaultValue>,
}
impl Column {
    /// A mandatory column with no default.
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            nullable: false,
            unique: false,
            default: None,
        }
    }
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
    pub const fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references_table: &'static str,
    pub references_column: &'static str,
    pub on_delete: OnDelete,
}
impl ForeignKey {
    pub const fn new(column: &'static str, references_table: &'static str, on_delete: OnDelete) -> Self {
        Self {
            column,
            references_table,
            references_column: "id",
            on_delete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub columns: Vec<Column>,
    /// A single `INTEGER` column is a surrogate rowid key; several columns
    /// form a composite key.
    pub primary_key: Vec<&'static str>,
    pub foreign_keys: Vec<ForeignKey>,
    /// Whether `updated_at` is refreshed by the database on every update.
    pub refreshes_updated_at: bool,
}
impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn foreign_key(&self, column: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }

    /// Name of the trigger implementing the `updated_at` refresh, if any.
    pub fn update_trigger_name(&self) -> Option<String> {
        self.refreshes_updated_at.then(|| format!("{}_refresh_updated_at", self.name))
    }

    fn has_surrogate_key(&self) -> bool {
        self.primary_key.len() == 1
    }

    /// Render the `CREATE TABLE` statement for this table.
    pub fn create_statement(&self) -> String {
        let mut lines = Vec::with_capacity(self.columns.len() + self.foreign_keys.len() + 1);
        for column in &self.columns {
            let mut line = format!("{} {}", column.name, column.sql_type);
            if self.has_surrogate_key() && self.primary_key[0] == column.name {
                line.push_str(" PRIMARY KEY");
            } else if !column.nullable {
                line.push_str(" NOT NULL");
            }
            if column.unique {
                line.push_str(" UNIQUE");
            }
            if let Some(default) = &column.default {
                // Writing into a String cannot fail.
                _ = write!(line, " DEFAULT {default}");
            }
            lines.push(line);
        }
        if !self.has_surrogate_key() {
            lines.push(format!("PRIMARY KEY ({})", self.primary_key.join(", ")));
        }
        for fk in &self.foreign_keys {
            lines.push(format!(
                "FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
                fk.column,
                fk.references_table,
                fk.references_column,
                fk.on_delete.as_sql(),
            ));
        }
        format!("CREATE TABLE {} (\n    {}\n)", self.name, lines.join(",\n    "))
    }

    /// Render the trigger that refreshes `updated_at` whenever a row changes
    /// without the writer setting `updated_at` itself.
    ///
    /// The refreshed value is strictly later than the previous one, so two
    /// writes inside the same millisecond still move it forward.
    pub fn update_trigger_statement(&self) -> Option<String> {
        let trigger = self.update_trigger_name()?;
        let key = self.primary_key.first()?;
        Some(format!(
            "CREATE TRIGGER {trigger}\nAFTER UPDATE ON {table}\nFOR EACH ROW WHEN NEW.updated_at = OLD.updated_at\nBEGIN\n    UPDATE {table} SET updated_at = MAX({NOW_UNIX_MS}, OLD.updated_at + 1) WHERE {key} = NEW.{key};\nEND",
            table = self.name,
        ))
    }
}

/// The whole catalogue: every table, in foreign-key dependency order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    tables: Vec<Table>,
}
impl Schema {
    /// Build the catalogue schema.
    pub fn assemble() -> Self {
        Self { tables: tables::all() }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Every statement needed to create the schema in an empty database:
    /// tables first (referenced before referencing), then triggers.
    pub fn create_statements(&self) -> Vec<String> {
        let tables = self.tables.iter().map(Table::create_statement);
        let triggers = self.tables.iter().filter_map(Table::update_trigger_statement);
        tables.chain(triggers).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SqlType::Integer, "INTEGER")]
    #[case(SqlType::Timestamp, "INTEGER")]
    #[case(SqlType::Date, "INTEGER")]
    #[case(SqlType::Real, "REAL")]
    #[case(SqlType::Boolean, "BOOLEAN")]
    #[case(SqlType::Text, "TEXT")]
    #[case(SqlType::Varchar(80), "VARCHAR(80)")]
    fn test_sql_type_display(#[case] sql_type: SqlType, #[case] expected: &str) {
        assert_eq!(sql_type.to_string(), expected);
    }

    #[rstest]
    #[case(DefaultValue::Integer(0), "0")]
    #[case(DefaultValue::Boolean(true), "1")]
    #[case(DefaultValue::Text("en"), "'en'")]
    #[case(DefaultValue::Text("it's"), "'it''s'")]
    #[case(DefaultValue::CurrentTimestamp, "(CAST(ROUND((julianday('now') - 2440587.5) * 86400000) AS INTEGER))")]
    fn test_default_value_display(#[case] value: DefaultValue, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn test_tables_are_in_dependency_order() {
        let schema = Schema::assemble();
        let position = |name: &str| schema.tables().iter().position(|t| t.name == name).unwrap();
        for table in schema.tables() {
            for fk in &table.foreign_keys {
                assert!(
                    position(fk.references_table) < position(table.name),
                    "{} must be created before {}",
                    fk.references_table,
                    table.name
                );
            }
        }
    }

    #[test]
    fn test_shared_schema_matches_fresh_assembly() {
        assert_eq!(schema(), &Schema::assemble());
    }

    #[test]
    fn test_books_create_statement() {
        let schema = Schema::assemble();
        let ddl = schema.table("books").unwrap().create_statement();
        assert!(ddl.starts_with("CREATE TABLE books ("));
        assert!(ddl.contains("id INTEGER PRIMARY KEY,"));
        assert!(ddl.contains("title VARCHAR(255) NOT NULL,"));
        assert!(ddl.contains("isbn VARCHAR(20) UNIQUE,"));
        assert!(ddl.contains("language VARCHAR(10) NOT NULL DEFAULT 'en',"));
        assert!(ddl.contains("FOREIGN KEY (author_id) REFERENCES authors (id) ON DELETE SET NULL"));
    }

    #[test]
    fn test_association_table_has_composite_key() {
        let schema = Schema::assemble();
        let book_tags = schema.table("book_tags").unwrap();
        assert_eq!(book_tags.primary_key, vec!["book_id", "tag_id"]);
        assert!(book_tags.update_trigger_statement().is_none());
        let ddl = book_tags.create_statement();
        assert!(ddl.contains("PRIMARY KEY (book_id, tag_id)"));
        assert!(ddl.contains("book_id INTEGER NOT NULL,"));
    }

    #[test]
    fn test_update_trigger_statement() {
        let schema = Schema::assemble();
        let trigger = schema.table("ratings").unwrap().update_trigger_statement().unwrap();
        assert!(trigger.starts_with("CREATE TRIGGER ratings_refresh_updated_at"));
        assert!(trigger.contains("WHEN NEW.updated_at = OLD.updated_at"));
        assert!(trigger.contains("WHERE id = NEW.id;"));
    }

    #[test]
    fn test_tags_do_not_track_updates() {
        let schema = Schema::assemble();
        let tags = schema.table("tags").unwrap();
        assert!(tags.column("updated_at").is_none());
        assert!(!tags.refreshes_updated_at);
    }
}
