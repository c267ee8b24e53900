use crate::error::{Error, ErrorKind};
use crate::models::{BookId, RatingId, UserId, timestamp};
use exn::ResultExt;
use time::UtcDateTime;

/// Lowest value of the rating scale.
pub const RATING_MIN: f64 = 1.0;
/// Highest value of the rating scale.
pub const RATING_MAX: f64 = 5.0;

/// A user's score for a book.
///
/// The 1.0 to 5.0 scale is a convention shared with the application layer;
/// the database stores whatever value it is given.
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    pub id: RatingId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub value: f64,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}
impl Rating {
    /// Whether the value lies on the conventional 1.0 to 5.0 scale.
    pub fn is_conventional(&self) -> bool {
        (RATING_MIN..=RATING_MAX).contains(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRating {
    pub user_id: UserId,
    pub book_id: BookId,
    pub value: f64,
}
impl NewRating {
    pub fn new(user_id: UserId, book_id: BookId, value: f64) -> Self {
        Self { user_id, book_id, value }
    }
}

/// Aggregate of every rating recorded for one book.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub count: u64,
    /// `None` when the book has not been rated.
    pub average: Option<f64>,
}
impl TryFrom<(i64, Option<f64>)> for RatingSummary {
    type Error = Error;
    fn try_from((count, average): (i64, Option<f64>)) -> Result<Self, Self::Error> {
        Ok(Self {
            count: u64::try_from(count).or_raise(|| ErrorKind::InvalidData("rating count"))?,
            average,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RatingRow {
    id: RatingId,
    user_id: UserId,
    book_id: BookId,
    rating: f64,
    created_at: i64,
    updated_at: i64,
}
impl TryFrom<RatingRow> for Rating {
    type Error = Error;
    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            book_id: row.book_id,
            value: row.rating,
            created_at: timestamp(row.created_at, "rating created_at")?,
            updated_at: timestamp(row.updated_at, "rating updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1.0, true)]
    #[case(4.5, true)]
    #[case(5.0, true)]
    #[case(0.5, false)]
    #[case(5.5, false)]
    #[case(f64::NAN, false)]
    fn test_conventional_scale(#[case] value: f64, #[case] expected: bool) {
        let rating = Rating {
            id: RatingId(1),
            user_id: UserId(1),
            book_id: BookId(1),
            value,
            created_at: UtcDateTime::from_unix_timestamp(0).unwrap(),
            updated_at: UtcDateTime::from_unix_timestamp(0).unwrap(),
        };
        assert_eq!(rating.is_conventional(), expected);
    }

    #[test]
    fn test_summary_of_unrated_book() {
        let summary = RatingSummary::try_from((0, None)).unwrap();
        assert_eq!(summary, RatingSummary { count: 0, average: None });
    }
}
