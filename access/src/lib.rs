//! Role-based access control.
//!
//! A [`RoleTable`] is a plain `(role, address) → bool` relation plus the
//! admin role that governs each role. Components that gate mutations take
//! a `&RoleTable` and call [`RoleTable::require_role`]; nothing inherits
//! from it.

pub mod error;
pub mod table;

pub use error::AccessError;
pub use table::RoleTable;
