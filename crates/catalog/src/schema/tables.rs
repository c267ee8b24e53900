use super::{Column, DEFAULT_ACTIVE, DEFAULT_LANGUAGE, DefaultValue, ForeignKey, OnDelete, SqlType, Table};

fn id() -> Column {
    Column::new("id", SqlType::Integer)
}

fn created_at() -> Column {
    Column::new("created_at", SqlType::Timestamp).default(DefaultValue::CurrentTimestamp)
}

fn updated_at() -> Column {
    Column::new("updated_at", SqlType::Timestamp).default(DefaultValue::CurrentTimestamp)
}

fn is_active() -> Column {
    Column::new("is_active", SqlType::Boolean).default(DefaultValue::Boolean(DEFAULT_ACTIVE))
}

/// Every catalogue table, referenced tables before the tables that reference them.
pub(super) fn all() -> Vec<Table> {
    vec![users(), authors(), books(), tags(), book_tags(), ratings(), comments(), plugins()]
}

fn users() -> Table {
    Table {
        name: "users",
        columns: vec![
            id(),
            Column::new("username", SqlType::Varchar(80)).unique(),
            Column::new("email", SqlType::Varchar(120)).unique(),
            Column::new("password_hash", SqlType::Varchar(255)),
            is_active(),
            created_at(),
            updated_at(),
        ],
        primary_key: vec!["id"],
        foreign_keys: vec![],
        refreshes_updated_at: true,
    }
}

fn authors() -> Table {
    Table {
        name: "authors",
        columns: vec![
            id(),
            Column::new("name", SqlType::Varchar(255)),
            Column::new("biography", SqlType::Text).nullable(),
            Column::new("birth_date", SqlType::Date).nullable(),
            Column::new("death_date", SqlType::Date).nullable(),
            created_at(),
            updated_at(),
        ],
        primary_key: vec!["id"],
        foreign_keys: vec![],
        refreshes_updated_at: true,
    }
}

fn books() -> Table {
    Table {
        name: "books",
        columns: vec![
            id(),
            Column::new("title", SqlType::Varchar(255)),
            // SQLite treats every NULL as distinct, so any number of books may lack an ISBN.
            Column::new("isbn", SqlType::Varchar(20)).nullable().unique(),
            Column::new("description", SqlType::Text).nullable(),
            Column::new("publication_date", SqlType::Date).nullable(),
            Column::new("page_count", SqlType::Integer).nullable(),
            Column::new("language", SqlType::Varchar(10)).default(DefaultValue::Text(DEFAULT_LANGUAGE)),
            Column::new("author_id", SqlType::Integer).nullable(),
            created_at(),
            updated_at(),
        ],
        primary_key: vec!["id"],
        foreign_keys: vec![ForeignKey::new("author_id", "authors", OnDelete::SetNull)],
        refreshes_updated_at: true,
    }
}

fn tags() -> Table {
    Table {
        name: "tags",
        columns: vec![
            id(),
            Column::new("name", SqlType::Varchar(100)).unique(),
            Column::new("description", SqlType::Text).nullable(),
            created_at(),
        ],
        primary_key: vec!["id"],
        foreign_keys: vec![],
        refreshes_updated_at: false,
    }
}

fn book_tags() -> Table {
    Table {
        name: "book_tags",
        columns: vec![
            Column::new("book_id", SqlType::Integer),
            Column::new("tag_id", SqlType::Integer),
        ],
        primary_key: vec!["book_id", "tag_id"],
        foreign_keys: vec![
            ForeignKey::new("book_id", "books", OnDelete::Cascade),
            ForeignKey::new("tag_id", "tags", OnDelete::Cascade),
        ],
        refreshes_updated_at: false,
    }
}

fn ratings() -> Table {
    Table {
        name: "ratings",
        columns: vec![
            id(),
            Column::new("user_id", SqlType::Integer),
            Column::new("book_id", SqlType::Integer),
            // 1.0 to 5.0 by convention only.
            Column::new("rating", SqlType::Real),
            created_at(),
            updated_at(),
        ],
        primary_key: vec!["id"],
        foreign_keys: vec![
            ForeignKey::new("user_id", "users", OnDelete::Cascade),
            ForeignKey::new("book_id", "books", OnDelete::Cascade),
        ],
        refreshes_updated_at: true,
    }
}

fn comments() -> Table {
    Table {
        name: "comments",
        columns: vec![
            id(),
            Column::new("user_id", SqlType::Integer),
            Column::new("book_id", SqlType::Integer),
            Column::new("content", SqlType::Text),
            created_at(),
            updated_at(),
        ],
        primary_key: vec!["id"],
        foreign_keys: vec![
            ForeignKey::new("user_id", "users", OnDelete::Cascade),
            ForeignKey::new("book_id", "books", OnDelete::Cascade),
        ],
        refreshes_updated_at: true,
    }
}

fn plugins() -> Table {
    Table {
        name: "plugins",
        columns: vec![
            id(),
            Column::new("name", SqlType::Varchar(100)).unique(),
            Column::new("description", SqlType::Text).nullable(),
            is_active(),
            // Serialized structured data (JSON by convention), stored as given.
            Column::new("configuration", SqlType::Text).nullable(),
            created_at(),
            updated_at(),
        ],
        primary_key: vec!["id"],
        foreign_keys: vec![],
        refreshes_updated_at: true,
    }
}
