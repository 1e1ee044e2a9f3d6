//! Core types for Recipe Book.
//!
//! This module provides type-safe wrappers for the recipe domain.

pub mod attribute;
pub mod email;
pub mod id;
pub mod id_list;
pub mod price;
pub mod time;

pub use attribute::{AttributeKind, AttributeName, AttributeNameError};
pub use email::{Email, EmailError};
pub use id::*;
pub use id_list::{IdList, IdListError};
pub use price::{Price, PriceError};
pub use time::{TimeMinutes, TimeMinutesError};
