#![forbid(unsafe_code)]
//! Coordinates, path naming, hashing, and filesystem helpers for aarstage.

pub mod error;
pub mod fs;
pub mod hash;
pub mod maven;
pub mod naming;
