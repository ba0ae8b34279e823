//! Reader model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Registered reader. Names are unique across all readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Reader {
    pub id: i32,
    pub name: String,
}

/// Create reader request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReader {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
}
