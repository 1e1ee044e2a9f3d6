//! Fixed-point recipe price.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount has more than two significant decimal places.
    #[error("price must have at most {max} decimal places")]
    TooManyDecimalPlaces {
        /// Maximum number of decimal places.
        max: u32,
    },
    /// The amount does not fit the storage column.
    #[error("price must be at most {max}")]
    TooLarge {
        /// Largest accepted amount.
        max: Decimal,
    },
}

/// A non-negative price with exactly two decimal places.
///
/// Backed by `NUMERIC(5,2)`, so the largest accepted value is `999.99`.
/// Trailing zeros beyond the second place are accepted (`5.250` is `5.25`),
/// anything finer is rejected rather than rounded.
///
/// Serializes as a decimal string (`"5.25"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Number of decimal places kept.
    pub const SCALE: u32 = 2;

    /// Largest accepted amount.
    pub const MAX: Decimal = Decimal::from_parts(99_999, 0, 0, false, 2);

    /// Validate and rescale an amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative, has more than two
    /// significant decimal places, or exceeds [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        let mut normalized = amount.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(PriceError::TooManyDecimalPlaces { max: Self::SCALE });
        }

        if normalized > Self::MAX {
            return Err(PriceError::TooLarge { max: Self::MAX });
        }

        normalized.rescale(Self::SCALE);
        Ok(Self(normalized))
    }

    /// Returns the amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
