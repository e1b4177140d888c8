//! Data module: role-addressed field storage
#![warn(missing_docs)]

pub mod field;

pub use field::{Field, Role, RoleMap, StencilViews};
