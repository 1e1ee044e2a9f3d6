//! Preparation time in minutes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`TimeMinutes`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeMinutesError {
    /// Zero or negative durations are not accepted.
    #[error("time_minutes must be a positive integer")]
    NotPositive,
}

/// A strictly positive number of minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct TimeMinutes(i32);

impl TimeMinutes {
    /// Create a duration.
    ///
    /// # Errors
    ///
    /// Returns [`TimeMinutesError::NotPositive`] for `minutes <= 0`.
    pub const fn new(minutes: i32) -> Result<Self, TimeMinutesError> {
        if minutes <= 0 {
            return Err(TimeMinutesError::NotPositive);
        }
        Ok(Self(minutes))
    }

    /// Returns the number of minutes.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for TimeMinutes {
    type Error = TimeMinutesError;

    fn try_from(minutes: i32) -> Result<Self, Self::Error> {
        Self::new(minutes)
    }
}

impl From<TimeMinutes> for i32 {
    fn from(time: TimeMinutes) -> Self {
        time.0
    }
}

impl fmt::Display for TimeMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for TimeMinutes {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for TimeMinutes {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let minutes = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(minutes)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for TimeMinutes {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_minutes() {
        assert_eq!(TimeMinutes::new(5).unwrap().as_i32(), 5);
    }

    #[test]
    fn test_rejects_zero_and_negative() {
        assert_eq!(TimeMinutes::new(0), Err(TimeMinutesError::NotPositive));
        assert_eq!(TimeMinutes::new(-3), Err(TimeMinutesError::NotPositive));
        assert!(serde_json::from_str::<TimeMinutes>("0").is_err());
    }
}
