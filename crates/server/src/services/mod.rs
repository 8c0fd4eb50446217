//! Business services for Stratus.

pub mod files;
pub mod identity;

pub use files::{FileError, FileService};
pub use identity::{IdentityError, IdentityGateway};
