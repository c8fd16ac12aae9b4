//! Identity collaborator interface

use classquest_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Role the signed-in actor plays in the classroom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActorRole {
    Student,
    Teacher,
}

/// The signed-in user as reported by the auth provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub role: ActorRole,
}

/// Abstract operations the engine requires from the auth provider
pub trait IdentityProvider {
    /// The currently signed-in user, or `Error::Unauthenticated`
    fn current_user(&self) -> Result<UserIdentity>;
}

/// Fixed identity for tests and single-user embeddings
pub struct StaticIdentity {
    user: Option<UserIdentity>,
}

impl StaticIdentity {
    pub fn signed_in(user: UserIdentity) -> Self {
        Self { user: Some(user) }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }

    /// Convenience constructor for a signed-in student
    pub fn student(uid: &str) -> Self {
        Self::signed_in(UserIdentity {
            uid: uid.to_string(),
            display_name: None,
            role: ActorRole::Student,
        })
    }

    /// Convenience constructor for a signed-in teacher
    pub fn teacher(uid: &str) -> Self {
        Self::signed_in(UserIdentity {
            uid: uid.to_string(),
            display_name: None,
            role: ActorRole::Teacher,
        })
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Result<UserIdentity> {
        self.user.clone().ok_or(Error::Unauthenticated)
    }
}
