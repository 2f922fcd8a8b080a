//! Who may see and who may change what.

mod ownership;
mod visibility;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use ownership::{Access, OwnershipPolicy, RedirectTarget};
pub use visibility::{PublicWindow, Visibility, VisibilityPolicy};

/// The authenticated user acting on a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub user_id: Uuid,
    pub username: String,
}

impl Viewer {
    pub fn new(user_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}
