//! Per-user recipe attributes (tags and ingredients).

use core::fmt;

use serde::{Deserialize, Serialize};

/// The two kinds of named label a recipe can carry.
///
/// Both kinds share the same shape and the same rules, so storage and routing
/// code is written once and parametrized by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// A free-form label such as "Dinner" or "Vegan".
    Tag,
    /// An ingredient such as "Salt".
    Ingredient,
}

impl AttributeKind {
    /// Singular lowercase name, used in logs and messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Ingredient => "ingredient",
        }
    }

    /// Plural name, matching the recipe payload field and the URL segment.
    #[must_use]
    pub const fn plural(&self) -> &'static str {
        match self {
            Self::Tag => "tags",
            Self::Ingredient => "ingredients",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when parsing an [`AttributeName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeNameError {
    /// The name is empty after trimming.
    #[error("name cannot be blank")]
    Blank,
    /// The name is too long.
    #[error("name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// The trimmed, non-blank name of a tag or ingredient.
///
/// Names are compared exactly: `"Thai"` and `"thai"` are different
/// attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttributeName(String);

impl AttributeName {
    /// Maximum length in characters (matches the `VARCHAR(255)` column).
    pub const MAX_LENGTH: usize = 255;

    /// Parse an attribute name.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed name is empty or longer than 255
    /// characters.
    pub fn parse(s: &str) -> Result<Self, AttributeNameError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AttributeNameError::Blank);
        }
        if s.chars().count() > Self::MAX_LENGTH {
            return Err(AttributeNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Remove repeated names, keeping the first occurrence of each.
    #[must_use]
    pub fn dedup_first(names: Vec<Self>) -> Vec<Self> {
        let mut unique: Vec<Self> = Vec::with_capacity(names.len());
        for name in names {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        unique
    }
}

impl TryFrom<String> for AttributeName {
    type Error = AttributeNameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<AttributeName> for String {
    fn from(name: AttributeName) -> Self {
        name.0
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AttributeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for AttributeName {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for AttributeName {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for AttributeName {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<AttributeName> {
        raw.iter().map(|n| AttributeName::parse(n).unwrap()).collect()
    }

    #[test]
    fn test_parse_trims() {
        assert_eq!(AttributeName::parse("  Thai ").unwrap().as_str(), "Thai");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert_eq!(AttributeName::parse(""), Err(AttributeNameError::Blank));
        assert_eq!(AttributeName::parse(" \t"), Err(AttributeNameError::Blank));
    }

    #[test]
    fn test_parse_rejects_long_names() {
        assert!(AttributeName::parse(&"a".repeat(255)).is_ok());
        assert!(matches!(
            AttributeName::parse(&"a".repeat(256)),
            Err(AttributeNameError::TooLong { max: 255 })
        ));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let deduped = AttributeName::dedup_first(names(&["Thai", "Dinner", "Thai", "Lunch"]));
        assert_eq!(deduped, names(&["Thai", "Dinner", "Lunch"]));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let deduped = AttributeName::dedup_first(names(&["Thai", "thai"]));
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(AttributeKind::Tag.as_str(), "tag");
        assert_eq!(AttributeKind::Ingredient.plural(), "ingredients");
        assert_eq!(
            serde_json::to_string(&AttributeKind::Ingredient).unwrap(),
            "\"ingredient\""
        );
    }
}
