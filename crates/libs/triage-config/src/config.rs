//! Core configuration types for the triage scraper.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// A named source of builds sharing one object-store prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestGroup {
    /// Group name, used as the job name of every build it contains.
    pub name: String,
    /// Object-store location of the group's builds as `bucket/path/`.
    pub gcs_prefix: String,
}

/// Scraper configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Build groups to scrape.
    pub test_groups: Vec<TestGroup>,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file(file_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(file_path)?;
        Ok(Self::from_yaml(&contents)?)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(value: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(value)?)
    }
}
