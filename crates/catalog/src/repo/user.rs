use super::{Catalog, into_models, update_and_refetch};
use crate::error::{QueryResultExt, Result};
use crate::models::{NewUser, User, UserId, UserRow};
use crate::schema::DEFAULT_ACTIVE;
use tracing::instrument;

impl Catalog {
    // =========================================================================
    // Users
    // =========================================================================

    /// Register a user.
    ///
    /// Fails with [`ErrorKind::UniqueViolation`](crate::error::ErrorKind::UniqueViolation)
    /// if the username or email is already taken.
    #[instrument(skip_all, fields(username = %user.username))]
    pub async fn create_user(&self, user: &NewUser) -> Result<User> {
        let row: UserRow = sqlx::query_as(include_str!("../../queries/users/insert.sql"))
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.is_active.unwrap_or(DEFAULT_ACTIVE))
            .fetch_one(&self.pool)
            .await
            .or_raise_query()?;
        let user = User::try_from(row)?;
        tracing::debug!(id = %user.id, "Created user");
        Ok(user)
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(include_str!("../../queries/users/get.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise_query()?;
        row.map(User::try_from).transpose()
    }

    pub async fn get_user_by_username(&self, username: impl AsRef<str>) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(include_str!("../../queries/users/get_by_username.sql"))
            .bind(username.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise_query()?;
        row.map(User::try_from).transpose()
    }

    pub async fn get_user_by_email(&self, email: impl AsRef<str>) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(include_str!("../../queries/users/get_by_email.sql"))
            .bind(email.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise_query()?;
        row.map(User::try_from).transpose()
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(include_str!("../../queries/users/list.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise_query()?;
        into_models(rows)
    }

    /// Write every mutable attribute of `user` back to its row.
    #[instrument(skip_all, fields(id = %user.id))]
    pub async fn update_user(&self, user: &User) -> Result<User> {
        let tx = self.begin().await?;
        let update = sqlx::query(include_str!("../../queries/users/update.sql"))
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.is_active);
        update_and_refetch::<UserRow, _>(
            tx,
            update,
            include_str!("../../queries/users/get.sql"),
            UserId::ENTITY,
            user.id.0,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn set_user_active(&self, id: UserId, is_active: bool) -> Result<User> {
        let tx = self.begin().await?;
        let update = sqlx::query(include_str!("../../queries/users/set_active.sql"))
            .bind(id)
            .bind(is_active);
        update_and_refetch::<UserRow, _>(tx, update, include_str!("../../queries/users/get.sql"), UserId::ENTITY, id.0)
            .await
    }

    /// Delete a user along with their ratings and comments.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: UserId) -> Result<bool> {
        let result = sqlx::query(include_str!("../../queries/users/delete.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise_query()?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::debug!("Deleted user");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::models::{NewUser, UserId};
    use crate::repo::fixtures::{alice, catalog, error_kind};

    #[tokio::test]
    async fn test_create_and_get() {
        let (db, catalog) = catalog().await;
        let user = alice(&catalog).await;
        assert!(user.is_active);
        assert_eq!(user.created_at, user.updated_at);
        assert_eq!(catalog.get_user(user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(catalog.get_user_by_username("alice").await.unwrap(), Some(user.clone()));
        assert_eq!(catalog.get_user_by_email("alice@example.com").await.unwrap(), Some(user));
        assert_eq!(catalog.get_user_by_username("bob").await.unwrap(), None);
        db.close().await;
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let (db, catalog) = catalog().await;
        alice(&catalog).await;
        let duplicate = catalog
            .create_user(&NewUser::new("alice", "someone-else@example.com", "hash"))
            .await;
        assert!(matches!(error_kind(duplicate), ErrorKind::UniqueViolation(_)));
        db.close().await;
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let (db, catalog) = catalog().await;
        alice(&catalog).await;
        let duplicate = catalog
            .create_user(&NewUser::new("alice2", "alice@example.com", "hash"))
            .await;
        assert!(matches!(error_kind(duplicate), ErrorKind::UniqueViolation(_)));
        assert_eq!(catalog.list_users().await.unwrap().len(), 1);
        db.close().await;
    }

    #[tokio::test]
    async fn test_inactive_on_request() {
        let (db, catalog) = catalog().await;
        let user = catalog
            .create_user(&NewUser::new("bob", "bob@example.com", "hash").with_active(false))
            .await
            .unwrap();
        assert!(!user.is_active);
        db.close().await;
    }

    #[tokio::test]
    async fn test_update_refreshes_updated_at() {
        let (db, catalog) = catalog().await;
        let before = alice(&catalog).await;
        let user = before.clone();

        let mut changed = before.clone();
        changed.email = "alice@example.org".to_string();
        let after = catalog.update_user(&changed).await.unwrap();
        assert_eq!(after.email, "alice@example.org");
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);

        let deactivated = catalog.set_user_active(user.id, false).await.unwrap();
        assert!(!deactivated.is_active);
        assert!(deactivated.updated_at > after.updated_at);
        db.close().await;
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let (db, catalog) = catalog().await;
        let result = catalog.set_user_active(UserId(404), false).await;
        assert_eq!(error_kind(result), ErrorKind::NotFound("user", 404));
        db.close().await;
    }

    #[tokio::test]
    async fn test_delete() {
        let (db, catalog) = catalog().await;
        let user = alice(&catalog).await;
        assert!(catalog.delete_user(user.id).await.unwrap());
        assert!(!catalog.delete_user(user.id).await.unwrap());
        assert_eq!(catalog.get_user(user.id).await.unwrap(), None);
        db.close().await;
    }
}
