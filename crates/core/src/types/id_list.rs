//! Comma-separated id lists from query strings (`?tags=1,2,3`).

use core::fmt;

/// Errors that can occur when parsing an [`IdList`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdListError {
    /// One of the entries is not a valid integer id.
    #[error("'{0}' is not a valid id")]
    InvalidId(String),
}

/// A deduplicated list of integer ids in first-seen order.
///
/// Surrounding whitespace around each entry is ignored. Empty entries
/// (`"1,,2"` or a trailing comma) are skipped, so an empty string parses to
/// an empty list.
///
/// ```
/// use recipe_book_core::IdList;
///
/// let ids = IdList::parse("3, 1,3").unwrap();
/// assert_eq!(ids.as_slice(), &[3, 1]);
/// assert!(IdList::parse("1,abc").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdList(Vec<i32>);

impl IdList {
    /// Parse a comma-separated list.
    ///
    /// # Errors
    ///
    /// Returns [`IdListError::InvalidId`] naming the first entry that is not
    /// an `i32`.
    pub fn parse(s: &str) -> Result<Self, IdListError> {
        let mut ids = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let id: i32 = part
                .parse()
                .map_err(|_| IdListError::InvalidId(part.to_owned()))?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(Self(ids))
    }

    /// Returns the ids.
    #[must_use]
    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    /// Consumes the list and returns the ids.
    #[must_use]
    pub fn into_inner(self) -> Vec<i32> {
        self.0
    }

    /// Returns `true` if no ids were given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for IdList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for id in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{id}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::str::FromStr for IdList {
    type Err = IdListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
