//! Content-addressed notice index.
//!
//! Given a resolution set, collates license texts by MD5 content id and maps
//! each id to the libraries shipping it and the install paths that cause it
//! to ship. Iteration orders are fully specified so repeated runs emit
//! byte-identical notice documents.

use crate::error::{GraphError, Result};
use crate::graph::{EdgeIndex, LicenseGraph, TargetIndex};
use crate::prefixes::SafePrefixes;
use crate::resolve::{resolve_notices, ResolutionSet};
use crate::shipped::shipped_nodes;
use md5::{Digest, Md5};
use regex::Regex;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Placeholder cached for project directories without a METADATA name.
const NO_PROJECT_NAME: &str = "\u{2205}";

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*name\s*:\s*"(.*)"\s*$"#).unwrap())
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*version\s*:\s*"(.*)"\s*$"#).unwrap())
}

fn description_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*description\s*:\s*"(.*)"\s*$"#).unwrap())
}

fn licenses_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"licen[cs]es?/").unwrap())
}

/// The lowercase hex MD5 of a license text's bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentId(String);

impl ContentId {
    fn of(text: &[u8]) -> Self {
        Self(hex::encode(Md5::digest(text)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Index of license texts by content id, library, and install path.
#[derive(Debug)]
pub struct NoticeIndex<'a> {
    lg: &'a LicenseGraph,
    rs: ResolutionSet,
    root: PathBuf,
    prefixes: SafePrefixes,
    /// license text path -> content id
    hash_of_file: FxHashMap<String, ContentId>,
    /// content id -> text bytes
    text: FxHashMap<ContentId, Vec<u8>>,
    /// content id -> library -> install paths
    hash_lib_install: FxHashMap<ContentId, BTreeMap<String, BTreeSet<String>>>,
    /// install path -> library -> content ids
    install_lib_hash: BTreeMap<String, BTreeMap<String, BTreeSet<ContentId>>>,
    /// library -> content ids
    lib_hash: BTreeMap<String, BTreeSet<ContentId>>,
    /// per-target content-id cache
    target_hashes: FxHashMap<TargetIndex, BTreeSet<ContentId>>,
    /// project directory -> METADATA-derived name cache
    project_name: FxHashMap<String, String>,
}

/// Builds a [`NoticeIndex`] for `lg` over `rs`, reading license texts and
/// METADATA files relative to `root`.
///
/// When `rs` is `None` the index is built over the notice resolutions of
/// the graph.
pub fn index_license_texts<'a>(
    root: &Path,
    lg: &'a LicenseGraph,
    rs: Option<ResolutionSet>,
    prefixes: SafePrefixes,
) -> Result<NoticeIndex<'a>> {
    let rs = match rs {
        Some(rs) => rs,
        None => resolve_notices(lg)?,
    };
    let mut ni = NoticeIndex {
        lg,
        rs,
        root: root.to_path_buf(),
        prefixes,
        hash_of_file: FxHashMap::default(),
        text: FxHashMap::default(),
        hash_lib_install: FxHashMap::default(),
        install_lib_hash: BTreeMap::new(),
        lib_hash: BTreeMap::new(),
        target_hashes: FxHashMap::default(),
        project_name: FxHashMap::default(),
    };
    let mut path = Vec::new();
    for &root_node in lg.root_nodes() {
        ni.walk(root_node, &mut path)?;
    }
    debug!(
        texts = ni.text.len(),
        libraries = ni.lib_hash.len(),
        installs = ni.install_lib_hash.len(),
        "notice index built"
    );
    Ok(ni)
}

impl<'a> NoticeIndex<'a> {
    /// Indexes one shipped target: its own license texts at its install
    /// paths, plus, for non-containers, the texts of every target acting on
    /// it. Containers descend so their contents are indexed at the
    /// container-relative install paths.
    fn walk(&mut self, target: TargetIndex, path: &mut Vec<EdgeIndex>) -> Result<()> {
        let lg = self.lg;
        if !shipped_nodes(lg).contains(target) {
            return Ok(());
        }
        let installs = install_paths_for(lg, target, path);
        let hashes = self.index_target(target)?;
        let lib = self.lib_name(target);
        self.link(&lib, &hashes, &installs);

        if lg.target(target).is_container() {
            for &ei in lg.target(target).edges() {
                let dep = lg.edge(ei).dependency();
                path.push(ei);
                self.walk(dep, path)?;
                path.pop();
            }
            return Ok(());
        }

        for r in self.rs.resolutions(lg, target) {
            let hashes = self.index_target(r.acts_on)?;
            let lib = self.lib_name(r.acts_on);
            self.link(&lib, &hashes, &installs);
        }
        Ok(())
    }

    /// Hashes every license text of `target`, cached per target.
    fn index_target(&mut self, target: TargetIndex) -> Result<BTreeSet<ContentId>> {
        if let Some(hashes) = self.target_hashes.get(&target) {
            return Ok(hashes.clone());
        }
        let lg = self.lg;
        let mut hashes = BTreeSet::new();
        for text in lg.target(target).license_texts() {
            if !self.hash_of_file.contains_key(text) {
                self.add_text(text)?;
            }
            hashes.insert(self.hash_of_file[text].clone());
        }
        self.target_hashes.insert(target, hashes.clone());
        Ok(hashes)
    }

    /// Reads and hashes one license text file, cached by path.
    fn add_text(&mut self, file: &str) -> Result<()> {
        let path = self.root.join(file);
        let text = fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound
                || e.kind() == std::io::ErrorKind::PermissionDenied
            {
                GraphError::open_failed(file, e)
            } else {
                GraphError::read_failed(file, e)
            }
        })?;
        let id = ContentId::of(&text);
        self.hash_of_file.insert(file.to_string(), id.clone());
        self.text.entry(id).or_insert(text);
        Ok(())
    }

    fn link(&mut self, lib: &str, hashes: &BTreeSet<ContentId>, installs: &[String]) {
        let lib_entry = self.lib_hash.entry(lib.to_string()).or_default();
        for h in hashes {
            lib_entry.insert(h.clone());
            let by_lib = self.hash_lib_install.entry(h.clone()).or_default();
            let install_set = by_lib.entry(lib.to_string()).or_default();
            for install in installs {
                install_set.insert(install.clone());
                self.install_lib_hash
                    .entry(install.clone())
                    .or_default()
                    .entry(lib.to_string())
                    .or_default()
                    .insert(h.clone());
            }
        }
    }

    /// Derives the human-readable library name for `target`.
    fn lib_name(&mut self, target: TargetIndex) -> String {
        if let Some(name) = self.check_metadata(target) {
            return name;
        }
        let node = self.lg.target(target);
        if !node.package_name().is_empty() {
            return node.package_name().to_string();
        }
        for project in node.projects() {
            if project.starts_with("prebuilts/") {
                if let Some(name) = self.prebuilt_name(target) {
                    return name;
                }
            }
            if let Some(sp) = self.prefixes.match_path(project) {
                if sp.strip {
                    return project[sp.prefix.len()..].to_string();
                }
                return project.clone();
            }
        }
        // fall back to the metadata file's base name
        let name = node.name().trim_end_matches(crate::graph::META_LIC_SUFFIX);
        match name.rfind('/') {
            Some(i) => name[i + 1..].to_string(),
            None => name.to_string(),
        }
    }

    /// Derives a name from the first prebuilt license-text path that falls
    /// under a safe prefix.
    fn prebuilt_name(&self, target: TargetIndex) -> Option<String> {
        let node = self.lg.target(target);
        let text = node
            .license_texts()
            .iter()
            .find(|t| t.starts_with("prebuilts/"))?;
        for sp in self.prefixes.prebuilt_prefixes() {
            let Some(m) = sp.pattern.find(text) else {
                continue;
            };
            let mut name: &str = if sp.strip {
                &text[m.end()..]
            } else {
                // keep the safe prefix, drop only the prebuilts/ layers
                &text[m.end() - sp.prefix.len()..]
            };
            // remove the LICENSE/NOTICE (or other) file name
            if let Some(i) = name.rfind('/') {
                if i > 0 {
                    name = &name[..i];
                }
            }
            // remove any licenses/ path segment and its subdirectory
            if let Some(m) = licenses_path_regex().find_iter(name).last() {
                if m.start() > 0 {
                    name = &name[..m.start()];
                    if let Some(i) = name.rfind('/') {
                        if i > 0 {
                            name = &name[..i];
                        }
                    }
                }
            }
            return Some(name.to_string());
        }
        None
    }

    /// Looks up a library name from a METADATA file co-located with one of
    /// the target's projects. Results, including misses, are cached per
    /// project directory.
    fn check_metadata(&mut self, target: TargetIndex) -> Option<String> {
        let lg = self.lg;
        for project in lg.target(target).projects() {
            if let Some(name) = self.project_name.get(project) {
                if name == NO_PROJECT_NAME {
                    continue;
                }
                return Some(name.clone());
            }
            let name = self.read_project_metadata(project);
            let cached = name.clone().unwrap_or_else(|| NO_PROJECT_NAME.to_string());
            self.project_name.insert(project.clone(), cached);
            if name.is_some() {
                return name;
            }
        }
        None
    }

    /// Best-effort scan of `project/METADATA` for name/version/description.
    fn read_project_metadata(&self, project: &str) -> Option<String> {
        let contents = fs::read_to_string(self.root.join(project).join("METADATA")).ok()?;
        let mut name = "";
        let mut version = "";
        let mut description = "";
        for line in contents.lines() {
            if let Some(m) = name_regex().captures(line) {
                if name.is_empty() {
                    name = m.get(1).unwrap().as_str();
                }
                if !version.is_empty() {
                    break;
                }
                continue;
            }
            if let Some(m) = version_regex().captures(line) {
                if version.is_empty() {
                    version = m.get(1).unwrap().as_str();
                }
                if !name.is_empty() {
                    break;
                }
                continue;
            }
            if let Some(m) = description_regex().captures(line) {
                if description.is_empty() {
                    description = m.get(1).unwrap().as_str();
                }
            }
        }
        if !name.is_empty() {
            if version.is_empty() {
                return Some(name.to_string());
            }
            if version.starts_with('v') || version.starts_with('V') {
                return Some(format!("{name}_{version}"));
            }
            return Some(format!("{name}_v_{version}"));
        }
        if !description.is_empty() {
            return Some(description.to_string());
        }
        None
    }

    /// Every content id once, grouped by sorted library name; within a
    /// library the most widely installed license first, shortest text and
    /// then id breaking ties.
    pub fn hashes(&self) -> Vec<ContentId> {
        let mut seen: BTreeSet<&ContentId> = BTreeSet::new();
        let mut ordered = Vec::new();
        for (lib, hashes) in &self.lib_hash {
            let mut fresh: Vec<&ContentId> =
                hashes.iter().filter(|h| !seen.contains(*h)).collect();
            for &h in &fresh {
                seen.insert(h);
            }
            let installs = |h: &ContentId| {
                self.hash_lib_install
                    .get(h)
                    .and_then(|m| m.get(lib))
                    .map(BTreeSet::len)
                    .unwrap_or(0)
            };
            fresh.sort_by(|a, b| {
                installs(b)
                    .cmp(&installs(a))
                    .then_with(|| self.text[*a].len().cmp(&self.text[*b].len()))
                    .then_with(|| a.cmp(b))
            });
            ordered.extend(fresh.into_iter().cloned());
        }
        ordered
    }

    /// Library names using the text with content id `h`, sorted.
    pub fn hash_libs(&self, h: &ContentId) -> Vec<&str> {
        self.hash_lib_install
            .get(h)
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Install paths through which `lib` ships the text `h`, sorted.
    pub fn hash_lib_installs(&self, h: &ContentId, lib: &str) -> Vec<&str> {
        self.hash_lib_install
            .get(h)
            .and_then(|m| m.get(lib))
            .map(|s| s.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// All indexed install paths, sorted.
    pub fn install_paths(&self) -> Vec<&str> {
        self.install_lib_hash.keys().map(String::as_str).collect()
    }

    /// Content ids shipped at `install`, shortest text first.
    pub fn install_hashes(&self, install: &str) -> Vec<ContentId> {
        let Some(libs) = self.install_lib_hash.get(install) else {
            return Vec::new();
        };
        let mut ids: BTreeSet<&ContentId> = BTreeSet::new();
        for hashes in libs.values() {
            ids.extend(hashes.iter());
        }
        let mut ids: Vec<&ContentId> = ids.into_iter().collect();
        ids.sort_by(|a, b| {
            self.text[*a]
                .len()
                .cmp(&self.text[*b].len())
                .then_with(|| a.cmp(b))
        });
        ids.into_iter().cloned().collect()
    }

    /// Library names shipping the text `h` at `install`, sorted.
    pub fn install_hash_libs(&self, install: &str, h: &ContentId) -> Vec<&str> {
        self.install_lib_hash
            .get(install)
            .map(|libs| {
                libs.iter()
                    .filter(|(_, hashes)| hashes.contains(h))
                    .map(|(lib, _)| lib.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The bytes of the text with content id `h`.
    pub fn hash_text(&self, h: &ContentId) -> &[u8] {
        self.text.get(h).map(Vec::as_slice).unwrap_or(&[])
    }

    /// License text files read while building the index, sorted.
    pub fn input_notice_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.hash_of_file.keys().map(String::as_str).collect();
        files.sort_unstable();
        files
    }
}

/// Computes where `attaches_to` lands in the shipped output, given the walk
/// path from the root.
///
/// With an empty path the target's own installed (else built) paths are the
/// answer. Otherwise the dependency outputs are rewritten level by level
/// through each ancestor's sources filter and install map, and finally
/// restricted to the root's installed prefixes.
pub(crate) fn install_paths_for(
    lg: &LicenseGraph,
    attaches_to: TargetIndex,
    path: &[EdgeIndex],
) -> Vec<String> {
    if path.is_empty() {
        return lg.target(attaches_to).target_files().to_vec();
    }

    fn get_installs(lg: &LicenseGraph, path: &[EdgeIndex]) -> Vec<String> {
        let deps: Vec<String> = if path.len() > 1 {
            get_installs(lg, &path[1..])
        } else {
            lg.target(lg.edge(path[0]).dependency()).target_files().to_vec()
        };
        let node = lg.target(lg.edge(path[0]).target());
        let prefixes = node.target_files();
        let mut installs = Vec::new();
        for dep in &deps {
            if !node.sources().iter().any(|s| dep.starts_with(s)) {
                continue;
            }
            for im in node.install_map() {
                if dep.starts_with(&im.from_path) {
                    for prefix in prefixes {
                        installs.push(format!(
                            "{prefix}{}{}",
                            im.container_path,
                            &dep[im.from_path.len()..]
                        ));
                    }
                    break;
                }
            }
        }
        installs
    }

    let all = get_installs(lg, path);
    let root_installed = lg.target(lg.edge(path[0]).target()).installed();
    if root_installed.is_empty() {
        return all;
    }
    all.into_iter()
        .filter(|install| root_installed.iter().any(|p| install.starts_with(p)))
        .collect()
}
