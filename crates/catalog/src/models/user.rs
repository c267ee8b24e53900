use crate::error::Error;
use crate::models::{UserId, timestamp};
use time::UtcDateTime;

/// A registered account. Owns ratings and comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// Unique across all users.
    pub username: String,
    /// Unique across all users.
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

/// Values for inserting a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    /// Left unset, the account starts out active.
    pub is_active: Option<bool>,
}
impl NewUser {
    pub fn new(username: impl Into<String>, email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            is_active: None,
        }
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: UserId,
    username: String,
    email: String,
    password_hash: String,
    is_active: bool,
    created_at: i64,
    updated_at: i64,
}
impl TryFrom<UserRow> for User {
    type Error = Error;
    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            is_active: row.is_active,
            created_at: timestamp(row.created_at, "user created_at")?,
            updated_at: timestamp(row.updated_at, "user updated_at")?,
        })
    }
}
