mod author;
mod book;
mod comment;
mod plugin;
mod rating;
mod tag;
mod user;

pub use self::author::{Author, NewAuthor};
pub use self::book::{Book, NewBook};
pub use self::comment::{Comment, NewComment};
pub use self::plugin::{NewPlugin, Plugin};
pub use self::rating::{NewRating, RATING_MAX, RATING_MIN, Rating, RatingSummary};
pub use self::tag::{NewTag, Tag};
pub use self::user::{NewUser, User};

pub(crate) use self::author::AuthorRow;
pub(crate) use self::book::BookRow;
pub(crate) use self::comment::CommentRow;
pub(crate) use self::plugin::PluginRow;
pub(crate) use self::rating::RatingRow;
pub(crate) use self::tag::TagRow;
pub(crate) use self::user::UserRow;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::{Date, UtcDateTime};

macro_rules! surrogate_id {
    ($(#[$meta:meta])* $name:ident => $entity:literal) => {
        $(#[$meta])*
        #[derive(Debug, derive_more::Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);
        impl $name {
            /// Entity name used when reporting a missing row.
            pub(crate) const ENTITY: &'static str = $entity;
        }
        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

surrogate_id!(
    /// Primary key of a row in `users`.
    UserId => "user"
);
surrogate_id!(
    /// Primary key of a row in `authors`.
    AuthorId => "author"
);
surrogate_id!(
    /// Primary key of a row in `books`.
    BookId => "book"
);
surrogate_id!(
    /// Primary key of a row in `tags`.
    TagId => "tag"
);
surrogate_id!(
    /// Primary key of a row in `ratings`.
    RatingId => "rating"
);
surrogate_id!(
    /// Primary key of a row in `comments`.
    CommentId => "comment"
);
surrogate_id!(
    /// Primary key of a row in `plugins`.
    PluginId => "plugin"
);

/// Stored Unix milliseconds to a point in time.
pub(crate) fn timestamp(millis: i64, field: &'static str) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).or_raise(|| ErrorKind::InvalidData(field))
}

/// Stored midnight (Unix seconds) to a calendar date.
pub(crate) fn date(seconds: i64, field: &'static str) -> Result<Date> {
    Ok(UtcDateTime::from_unix_timestamp(seconds).or_raise(|| ErrorKind::InvalidData(field))?.date())
}

/// Calendar date to the Unix timestamp of its UTC midnight.
pub(crate) fn date_to_unix(date: Date) -> i64 {
    date.midnight().as_utc().unix_timestamp()
}
