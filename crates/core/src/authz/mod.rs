//! Book authorization: who may do what to a book.
//!
//! A grant row stores a comma-joined authority string such as
//! `"admin,read,write,update,delete"`. In memory it is an explicit
//! [`Capabilities`] set and every operation names the single [`Capability`] it
//! requires. `Admin` does not imply the other capabilities.

pub mod capability;
pub mod error;

pub use capability::{Capabilities, Capability};
pub use error::AccessError;

/// Checks that a change to one grant leaves the book with at least one admin.
///
/// `admin_count` is the number of admins before the change, `was_admin`
/// whether the affected grant currently includes `Admin`, and `stays_admin`
/// whether it will afterwards (false for a revocation).
///
/// # Errors
///
/// Returns `AccessError::LastAdmin` when the change would remove the only admin.
pub const fn ensure_admin_remains(
    admin_count: u64,
    was_admin: bool,
    stays_admin: bool,
) -> Result<(), AccessError> {
    if was_admin && !stays_admin && admin_count <= 1 {
        return Err(AccessError::LastAdmin);
    }
    Ok(())
}
