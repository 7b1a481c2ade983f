//! Safe-prefix tables used when deriving human-readable library names.
//!
//! These are configuration, not graph data: the built-in defaults suit an
//! AOSP-like source layout and can be replaced wholesale from a JSON file.

use anyhow::Context;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// A source-tree prefix presumed safe to show in notices, and whether to
/// strip it from the path when forming a library name.
#[derive(Debug, Clone, Deserialize)]
pub struct SafePathPrefix {
    pub prefix: String,
    pub strip: bool,
}

/// Matches a prebuilt license-text path back to the safe prefix its source
/// lives under.
#[derive(Debug)]
pub struct SafePrebuiltPrefix {
    pub pattern: Regex,
    pub prefix: String,
    pub strip: bool,
}

/// The loaded safe-prefix tables.
#[derive(Debug)]
pub struct SafePrefixes {
    path_prefixes: Vec<SafePathPrefix>,
    prebuilt_prefixes: Vec<SafePrebuiltPrefix>,
}

#[derive(Debug, Deserialize)]
struct SafePrefixesFile {
    safe_path_prefixes: Vec<SafePathPrefix>,
}

const DEFAULT_PREFIXES: &[(&str, bool)] = &[
    ("external/", true),
    ("art/", false),
    ("build/", false),
    ("cts/", false),
    ("dalvik/", false),
    ("developers/", false),
    ("development/", false),
    ("frameworks/", false),
    ("libcore/", false),
    ("libnativehelper/", false),
    ("pdk/", false),
    ("prebuilts/", true),
    ("sdk/", false),
    ("system/", false),
    ("test/", false),
    ("toolchain/", false),
    ("tools/", false),
];

impl Default for SafePrefixes {
    fn default() -> Self {
        Self::from_path_prefixes(
            DEFAULT_PREFIXES
                .iter()
                .map(|&(prefix, strip)| SafePathPrefix { prefix: prefix.to_string(), strip })
                .collect(),
        )
    }
}

impl SafePrefixes {
    /// Builds the tables from a path-prefix list, deriving one prebuilt
    /// matcher per prefix.
    pub fn from_path_prefixes(path_prefixes: Vec<SafePathPrefix>) -> Self {
        let prebuilt_prefixes = path_prefixes
            .iter()
            .map(|p| SafePrebuiltPrefix {
                // mainline prebuilts mirror the source layout one level down
                pattern: Regex::new(&format!(
                    "^prebuilts/(?:runtime/mainline/)?{}",
                    regex::escape(&p.prefix)
                ))
                .unwrap(),
                prefix: p.prefix.clone(),
                strip: p.strip,
            })
            .collect();
        Self { path_prefixes, prebuilt_prefixes }
    }

    /// Loads a replacement table from a JSON file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read safe-prefix config {}", path.display()))?;
        let parsed: SafePrefixesFile = serde_json::from_str(&data)
            .with_context(|| format!("cannot parse safe-prefix config {}", path.display()))?;
        Ok(Self::from_path_prefixes(parsed.safe_path_prefixes))
    }

    pub fn path_prefixes(&self) -> &[SafePathPrefix] {
        &self.path_prefixes
    }

    pub fn prebuilt_prefixes(&self) -> &[SafePrebuiltPrefix] {
        &self.prebuilt_prefixes
    }

    /// The first safe path prefix `project` falls under.
    pub fn match_path(&self, project: &str) -> Option<&SafePathPrefix> {
        self.path_prefixes.iter().find(|p| project.starts_with(&p.prefix))
    }
}
