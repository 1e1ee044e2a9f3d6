//! Tag and ingredient domain type.

use recipe_book_core::{AttributeId, AttributeKind, AttributeName, UserId};

/// A named label owned by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub id: AttributeId,
    pub kind: AttributeKind,
    pub user_id: UserId,
    pub name: AttributeName,
}
