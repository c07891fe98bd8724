//! Build index rows.

pub mod build;
pub mod build_files;
