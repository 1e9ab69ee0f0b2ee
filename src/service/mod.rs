//! Request-level orchestration over the stores, the cache and the policy engine.

mod documents;
mod roles;
mod users;

pub use documents::DocumentService;
pub use roles::RoleService;
pub use users::UserService;
