use super::{Catalog, into_models, update_and_refetch};
use crate::error::{QueryResultExt, Result};
use crate::models::{BookId, NewRating, Rating, RatingId, RatingRow, RatingSummary, UserId};
use tracing::instrument;

impl Catalog {
    // =========================================================================
    // Ratings
    // =========================================================================

    /// Record a user's rating of a book.
    ///
    /// The value is stored as given, even outside the 1.0 to 5.0 scale; see
    /// [`Rating::is_conventional`].
    #[instrument(skip_all, fields(user_id = %rating.user_id, book_id = %rating.book_id))]
    pub async fn create_rating(&self, rating: &NewRating) -> Result<Rating> {
        let row: RatingRow = sqlx::query_as(include_str!("../../queries/ratings/insert.sql"))
            .bind(rating.user_id)
            .bind(rating.book_id)
            .bind(rating.value)
            .fetch_one(&self.pool)
            .await
            .or_raise_query()?;
        let rating = Rating::try_from(row)?;
        tracing::debug!(id = %rating.id, "Created rating");
        Ok(rating)
    }

    pub async fn get_rating(&self, id: RatingId) -> Result<Option<Rating>> {
        let row: Option<RatingRow> = sqlx::query_as(include_str!("../../queries/ratings/get.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise_query()?;
        row.map(Rating::try_from).transpose()
    }

    /// Change a rating's value. Nothing else about the rating changes, apart
    /// from `updated_at`.
    #[instrument(skip(self))]
    pub async fn update_rating(&self, id: RatingId, value: f64) -> Result<Rating> {
        let tx = self.begin().await?;
        let update = sqlx::query(include_str!("../../queries/ratings/update.sql"))
            .bind(id)
            .bind(value);
        update_and_refetch::<RatingRow, _>(
            tx,
            update,
            include_str!("../../queries/ratings/get.sql"),
            RatingId::ENTITY,
            id.0,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_rating(&self, id: RatingId) -> Result<bool> {
        let result = sqlx::query(include_str!("../../queries/ratings/delete.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise_query()?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn ratings_for_book(&self, id: BookId) -> Result<Vec<Rating>> {
        let rows: Vec<RatingRow> = sqlx::query_as(include_str!("../../queries/ratings/for_book.sql"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise_query()?;
        into_models(rows)
    }

    pub async fn ratings_by_user(&self, id: UserId) -> Result<Vec<Rating>> {
        let rows: Vec<RatingRow> = sqlx::query_as(include_str!("../../queries/ratings/by_user.sql"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise_query()?;
        into_models(rows)
    }

    /// How many times a book has been rated, and the mean of those ratings.
    pub async fn rating_summary(&self, id: BookId) -> Result<RatingSummary> {
        let row: (i64, Option<f64>) = sqlx::query_as(include_str!("../../queries/ratings/summary.sql"))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .or_raise_query()?;
        RatingSummary::try_from(row)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::models::{BookId, NewRating, NewUser, RatingId, RatingSummary, UserId};
    use crate::repo::fixtures::{alice, catalog, error_kind, jane_doe, sample_book};

    #[tokio::test]
    async fn test_update_changes_only_value_and_updated_at() {
        let (db, catalog) = catalog().await;
        let alice = alice(&catalog).await;
        assert_eq!(alice.email, "alice@example.com");
        let jane = jane_doe(&catalog).await;
        let book = sample_book(&catalog, &jane).await;
        let rating = catalog
            .create_rating(&NewRating::new(alice.id, book.id, 4.5))
            .await
            .unwrap();
        let before = catalog.get_rating(rating.id).await.unwrap().unwrap();
        assert_eq!(before, rating);

        let after = catalog.update_rating(rating.id, 5.0).await.unwrap();
        assert_eq!(after.value, 5.0);
        assert_eq!(after.id, before.id);
        assert_eq!(after.user_id, before.user_id);
        assert_eq!(after.book_id, before.book_id);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
        db.close().await;
    }

    #[tokio::test]
    async fn test_back_to_back_updates_always_move_updated_at() {
        let (db, catalog) = catalog().await;
        let alice = alice(&catalog).await;
        let jane = jane_doe(&catalog).await;
        let book = sample_book(&catalog, &jane).await;
        let rating = catalog
            .create_rating(&NewRating::new(alice.id, book.id, 4.5))
            .await
            .unwrap();
        assert_eq!(rating.updated_at, rating.created_at);

        let mut previous = rating.updated_at;
        for value in [5.0, 4.0, 5.0] {
            let updated = catalog.update_rating(rating.id, value).await.unwrap();
            assert!(updated.updated_at > previous);
            assert_eq!(updated.created_at, rating.created_at);
            previous = updated.updated_at;
        }
        db.close().await;
    }

    #[tokio::test]
    async fn test_explicit_updated_at_is_kept() {
        let (db, catalog) = catalog().await;
        let alice = alice(&catalog).await;
        let jane = jane_doe(&catalog).await;
        let book = sample_book(&catalog, &jane).await;
        let rating = catalog
            .create_rating(&NewRating::new(alice.id, book.id, 4.5))
            .await
            .unwrap();
        sqlx::query("UPDATE ratings SET rating = 3.0, updated_at = 1000 WHERE id = ?1")
            .bind(rating.id)
            .execute(db.pool())
            .await
            .unwrap();
        let stored = catalog.get_rating(rating.id).await.unwrap().unwrap();
        assert_eq!(stored.updated_at.unix_timestamp(), 1);
        assert_eq!(stored.updated_at.millisecond(), 0);
        db.close().await;
    }

    #[tokio::test]
    async fn test_unknown_user_or_book_is_rejected() {
        let (db, catalog) = catalog().await;
        let alice = alice(&catalog).await;
        let jane = jane_doe(&catalog).await;
        let book = sample_book(&catalog, &jane).await;

        let no_user = catalog.create_rating(&NewRating::new(UserId(404), book.id, 3.0)).await;
        assert!(matches!(error_kind(no_user), ErrorKind::ForeignKeyViolation(_)));
        let no_book = catalog.create_rating(&NewRating::new(alice.id, BookId(404), 3.0)).await;
        assert!(matches!(error_kind(no_book), ErrorKind::ForeignKeyViolation(_)));
        assert!(catalog.ratings_for_book(book.id).await.unwrap().is_empty());
        db.close().await;
    }

    #[tokio::test]
    async fn test_out_of_scale_values_are_stored() {
        let (db, catalog) = catalog().await;
        let alice = alice(&catalog).await;
        let jane = jane_doe(&catalog).await;
        let book = sample_book(&catalog, &jane).await;
        let rating = catalog
            .create_rating(&NewRating::new(alice.id, book.id, 11.0))
            .await
            .unwrap();
        assert_eq!(rating.value, 11.0);
        assert!(!rating.is_conventional());
        db.close().await;
    }

    #[tokio::test]
    async fn test_summary_and_listings() {
        let (db, catalog) = catalog().await;
        let alice = alice(&catalog).await;
        let bob = catalog
            .create_user(&NewUser::new("bob", "bob@example.com", "hash"))
            .await
            .unwrap();
        let jane = jane_doe(&catalog).await;
        let book = sample_book(&catalog, &jane).await;

        assert_eq!(
            catalog.rating_summary(book.id).await.unwrap(),
            RatingSummary { count: 0, average: None }
        );
        catalog.create_rating(&NewRating::new(alice.id, book.id, 4.0)).await.unwrap();
        catalog.create_rating(&NewRating::new(bob.id, book.id, 3.0)).await.unwrap();
        assert_eq!(
            catalog.rating_summary(book.id).await.unwrap(),
            RatingSummary { count: 2, average: Some(3.5) }
        );
        assert_eq!(catalog.ratings_by_user(bob.id).await.unwrap().len(), 1);
        assert_eq!(catalog.ratings_for_book(book.id).await.unwrap().len(), 2);
        db.close().await;
    }

    #[tokio::test]
    async fn test_deleting_user_or_book_cascades() {
        let (db, catalog) = catalog().await;
        let alice = alice(&catalog).await;
        let jane = jane_doe(&catalog).await;
        let book = sample_book(&catalog, &jane).await;
        let rating = catalog.create_rating(&NewRating::new(alice.id, book.id, 4.0)).await.unwrap();
        assert!(catalog.delete_user(alice.id).await.unwrap());
        assert_eq!(catalog.get_rating(rating.id).await.unwrap(), None);

        let bob = catalog
            .create_user(&NewUser::new("bob", "bob@example.com", "hash"))
            .await
            .unwrap();
        let rating = catalog.create_rating(&NewRating::new(bob.id, book.id, 2.0)).await.unwrap();
        assert!(catalog.delete_book(book.id).await.unwrap());
        assert_eq!(catalog.get_rating(rating.id).await.unwrap(), None);
        db.close().await;
    }

    #[tokio::test]
    async fn test_missing_rating() {
        let (db, catalog) = catalog().await;
        assert_eq!(
            error_kind(catalog.update_rating(RatingId(404), 1.0).await),
            ErrorKind::NotFound("rating", 404)
        );
        assert!(!catalog.delete_rating(RatingId(404)).await.unwrap());
        db.close().await;
    }
}
