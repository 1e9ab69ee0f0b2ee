mod access;
mod document;
mod role;
mod user;

pub use access::AccessMode;
pub use document::{Document, DocumentPatch, NewDocument};
pub use role::{Role, RoleInput};
pub use user::{Credentials, NewUser, PersonName, User};
