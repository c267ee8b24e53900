//! Compare the registry against what a live database actually contains.

use super::{DefaultValue, NOW_UNIX_MS, Schema, Table};
use crate::error::{QueryResultExt, Result};
use derive_more::Display;
use sqlx::SqlitePool;
use std::collections::HashSet;

/// One difference between the declared schema and a live database.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Drift {
    #[display("table {_0} is missing")]
    MissingTable(&'static str),
    #[display("column {table}.{column} is missing")]
    MissingColumn { table: &'static str, column: &'static str },
    #[display("column {table}.{column} has type {actual}, expected {expected}")]
    ColumnType {
        table: &'static str,
        column: &'static str,
        expected: String,
        actual: String,
    },
    #[display("column {table}.{column} nullability differs (expected nullable: {expected_nullable})")]
    Nullability {
        table: &'static str,
        column: &'static str,
        expected_nullable: bool,
    },
    #[display("column {table}.{column} has default {actual:?}, expected {expected}")]
    Default {
        table: &'static str,
        column: &'static str,
        expected: String,
        actual: Option<String>,
    },
    #[display("table {table} has primary key ({}), expected ({})", actual.join(", "), expected.join(", "))]
    PrimaryKey {
        table: &'static str,
        expected: Vec<&'static str>,
        actual: Vec<String>,
    },
    #[display("column {table}.{column} is not unique")]
    MissingUnique { table: &'static str, column: &'static str },
    #[display("column {table}.{column} should reference {expected}")]
    ForeignKey {
        table: &'static str,
        column: &'static str,
        expected: String,
    },
    #[display("trigger {trigger} on {table} is missing")]
    MissingTrigger { table: &'static str, trigger: String },
}

#[derive(sqlx::FromRow)]
struct ColumnInfo {
    name: String,
    #[sqlx(rename = "type")]
    sql_type: String,
    notnull: i64,
    dflt_value: Option<String>,
    pk: i64,
}

#[derive(sqlx::FromRow)]
struct ForeignKeyInfo {
    column_name: String,
    referenced_table: String,
    referenced_column: Option<String>,
    on_delete: String,
}

/// Introspect the database behind `pool` and list every way it differs from `schema`.
pub(crate) async fn diff(schema: &Schema, pool: &SqlitePool) -> Result<Vec<Drift>> {
    let tables: HashSet<String> = sqlx::query_scalar::<_, String>("SELECT name FROM sqlite_master WHERE type = 'table'")
        .fetch_all(pool)
        .await
        .or_raise_query()?
        .into_iter()
        .collect();
    let triggers: HashSet<String> = sqlx::query_scalar::<_, String>("SELECT name FROM sqlite_master WHERE type = 'trigger'")
        .fetch_all(pool)
        .await
        .or_raise_query()?
        .into_iter()
        .collect();

    let mut drift = Vec::new();
    for table in schema.tables() {
        if !tables.contains(table.name) {
            drift.push(Drift::MissingTable(table.name));
            continue;
        }
        diff_columns(table, pool, &mut drift).await?;
        diff_unique(table, pool, &mut drift).await?;
        diff_foreign_keys(table, pool, &mut drift).await?;
        if let Some(trigger) = table.update_trigger_name()
            && !triggers.contains(&trigger)
        {
            drift.push(Drift::MissingTrigger { table: table.name, trigger });
        }
    }
    Ok(drift)
}

async fn diff_columns(table: &Table, pool: &SqlitePool, drift: &mut Vec<Drift>) -> Result<()> {
    let live: Vec<ColumnInfo> =
        sqlx::query_as(r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1)"#)
            .bind(table.name)
            .fetch_all(pool)
            .await
            .or_raise_query()?;

    let mut primary_key: Vec<(i64, String)> =
        live.iter().filter(|c| c.pk > 0).map(|c| (c.pk, c.name.clone())).collect();
    primary_key.sort();
    let primary_key: Vec<String> = primary_key.into_iter().map(|(_, name)| name).collect();
    if primary_key != table.primary_key {
        drift.push(Drift::PrimaryKey {
            table: table.name,
            expected: table.primary_key.clone(),
            actual: primary_key,
        });
    }

    for column in &table.columns {
        let Some(info) = live.iter().find(|c| c.name == column.name) else {
            drift.push(Drift::MissingColumn { table: table.name, column: column.name });
            continue;
        };
        let expected_type = column.sql_type.to_string();
        if !info.sql_type.eq_ignore_ascii_case(&expected_type) {
            drift.push(Drift::ColumnType {
                table: table.name,
                column: column.name,
                expected: expected_type,
                actual: info.sql_type.clone(),
            });
        }
        // A lone INTEGER PRIMARY KEY aliases the rowid and never reports NOT NULL.
        let surrogate = table.primary_key.len() == 1 && info.pk > 0;
        if !surrogate && column.nullable == (info.notnull != 0) {
            drift.push(Drift::Nullability {
                table: table.name,
                column: column.name,
                expected_nullable: column.nullable,
            });
        }
        let default_matches = match (&column.default, &info.dflt_value) {
            (None, None) => true,
            (Some(DefaultValue::CurrentTimestamp), Some(actual)) => {
                normalize_expression(actual) == normalize_expression(NOW_UNIX_MS)
            },
            (Some(expected), Some(actual)) => expected.literal().as_deref() == Some(actual.as_str()),
            _ => false,
        };
        if !default_matches {
            drift.push(Drift::Default {
                table: table.name,
                column: column.name,
                expected: column.default.map(|d| d.to_string()).unwrap_or_else(|| "none".to_string()),
                actual: info.dflt_value.clone(),
            });
        }
    }
    Ok(())
}

/// Canonical form of a default expression: no whitespace, no redundant outer
/// parentheses, lowercase.
fn normalize_expression(expression: &str) -> String {
    let mut compact: String = expression
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    while wrapped_in_parentheses(&compact) {
        compact = compact[1..compact.len() - 1].to_string();
    }
    compact
}

/// Whether the opening parenthesis at the start closes at the very end.
fn wrapped_in_parentheses(expression: &str) -> bool {
    if !expression.starts_with('(') {
        return false;
    }
    let mut depth = 0usize;
    for (i, c) in expression.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == expression.len() - 1;
                }
            },
            _ => {},
        }
    }
    false
}

async fn diff_unique(table: &Table, pool: &SqlitePool, drift: &mut Vec<Drift>) -> Result<()> {
    let unique: HashSet<String> = sqlx::query_scalar::<_, String>(
        r#"
            SELECT ii.name
            FROM pragma_index_list(?1) AS il, pragma_index_info(il.name) AS ii
            WHERE il."unique" = 1 AND il.origin = 'u'
        "#,
    )
    .bind(table.name)
    .fetch_all(pool)
    .await
    .or_raise_query()?
    .into_iter()
    .collect();
    for column in table.columns.iter().filter(|c| c.unique) {
        if !unique.contains(column.name) {
            drift.push(Drift::MissingUnique { table: table.name, column: column.name });
        }
    }
    Ok(())
}

async fn diff_foreign_keys(table: &Table, pool: &SqlitePool, drift: &mut Vec<Drift>) -> Result<()> {
    let live: Vec<ForeignKeyInfo> = sqlx::query_as(
        r#"
            SELECT "from" AS column_name, "table" AS referenced_table, "to" AS referenced_column, on_delete
            FROM pragma_foreign_key_list(?1)
        "#,
    )
    .bind(table.name)
    .fetch_all(pool)
    .await
    .or_raise_query()?;
    for fk in &table.foreign_keys {
        let found = live.iter().any(|info| {
            info.column_name == fk.column
                && info.referenced_table == fk.references_table
                && info.referenced_column.as_deref() == Some(fk.references_column)
                && info.on_delete.eq_ignore_ascii_case(fk.on_delete.as_sql())
        });
        if !found {
            drift.push(Drift::ForeignKey {
                table: table.name,
                column: fk.column,
                expected: format!(
                    "{}({}) ON DELETE {}",
                    fk.references_table,
                    fk.references_column,
                    fk.on_delete.as_sql()
                ),
            });
        }
    }
    Ok(())
}
