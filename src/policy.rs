//! Access policy engine.
//!
//! A pure decision function over `(principal, document, action)`. Every
//! combination yields a definite [`Decision`]; nothing here touches the store
//! or the cache.
//!
//! | access    | view                                   | mutate           |
//! |-----------|----------------------------------------|------------------|
//! | `public`  | anyone, including anonymous            | owner or admin   |
//! | `role`    | principal role == document role, admin | owner or admin   |
//! | `private` | owner only (admin is denied)           | owner or admin   |

use std::fmt;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AccessMode, Document};

/// Authenticated identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub is_admin: bool,
}

/// The requester, as seen by the policy engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    Authenticated(AuthUser),
}

impl Principal {
    pub fn user(user_id: Uuid, role_id: Uuid, is_admin: bool) -> Self {
        Principal::Authenticated(AuthUser {
            user_id,
            role_id,
            is_admin,
        })
    }

    /// The single admin predicate used by every admin-gated decision.
    pub fn is_admin(&self) -> bool {
        matches!(self, Principal::Authenticated(u) if u.is_admin)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Principal::Anonymous => None,
            Principal::Authenticated(u) => Some(u.user_id),
        }
    }

    pub fn role_id(&self) -> Option<Uuid> {
        match self {
            Principal::Anonymous => None,
            Principal::Authenticated(u) => Some(u.role_id),
        }
    }

    pub fn as_user(&self) -> Option<&AuthUser> {
        match self {
            Principal::Anonymous => None,
            Principal::Authenticated(u) => Some(u),
        }
    }

    fn owns(&self, document: &Document) -> bool {
        self.user_id() == Some(document.owner_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    /// Update or delete an existing document.
    Mutate,
    /// Create a new document.
    Create,
    /// Create, rename or delete roles.
    ManageRoles,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::View => write!(f, "view"),
            Action::Mutate => write!(f, "mutate"),
            Action::Create => write!(f, "create"),
            Action::ManageRoles => write!(f, "manage roles"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotFound,
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    fn allow_if(condition: bool) -> Self {
        if condition {
            Decision::Allow
        } else {
            Decision::Deny(DenyReason::Forbidden)
        }
    }

    /// Converts a denial into the matching service error.
    pub fn into_result(self, action: Action) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::NotFound) => Err(AppError::not_found("document")),
            Decision::Deny(DenyReason::Forbidden) => Err(AppError::forbidden(format!(
                "not allowed to {} this resource",
                action
            ))),
        }
    }
}

/// Decides whether `principal` may perform `action` on `document`.
///
/// `document` is only consulted for [`Action::View`] and [`Action::Mutate`];
/// a missing document for those actions is always `Deny(NotFound)`.
pub fn decide(principal: &Principal, document: Option<&Document>, action: Action) -> Decision {
    match action {
        Action::ManageRoles => Decision::allow_if(principal.is_admin()),
        Action::Create => Decision::allow_if(principal.as_user().is_some()),
        Action::View => match document {
            None => Decision::Deny(DenyReason::NotFound),
            Some(doc) => Decision::allow_if(can_view(principal, doc)),
        },
        Action::Mutate => match document {
            None => Decision::Deny(DenyReason::NotFound),
            Some(doc) => Decision::allow_if(principal.owns(doc) || principal.is_admin()),
        },
    }
}

fn can_view(principal: &Principal, document: &Document) -> bool {
    match document.access {
        AccessMode::Public => true,
        AccessMode::Private => principal.owns(document),
        AccessMode::Role => {
            principal.is_admin()
                || (document.role.is_some() && principal.role_id() == document.role)
        }
    }
}

/// Keeps only the documents `principal` may view.
pub fn visible(principal: &Principal, documents: Vec<Document>) -> Vec<Document> {
    documents
        .into_iter()
        .filter(|doc| decide(principal, Some(doc), Action::View).is_allowed())
        .collect()
}
