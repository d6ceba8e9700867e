//! Unpacking of Android library bundles into exploded folders.

pub mod cache;
pub mod error;
pub mod extract;

pub use cache::{LibraryCache, UnpackOutcome};
pub use error::UnpackError;
pub use extract::extract_library;
