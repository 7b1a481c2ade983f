//! The license graph: an immutable, indexed DAG of build targets.
//!
//! Nodes and edges live in arenas on [`LicenseGraph`] and are addressed by
//! [`TargetIndex`] / [`EdgeIndex`]. The loader is the only writer; after it
//! publishes the graph, the resolution engine touches nothing but its own
//! claimed slot in the per-target effective-condition arrays.

use crate::conditions::LicenseConditionSet;
use crate::error::{GraphError, Result};
use crate::metadata::{AnnotatedDependency, InstallMap, LicenseMetadata};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

/// Limit on concurrent resolution slots per graph.
pub const MAX_RESOLUTIONS: usize = 10;

/// Metadata file suffix; all root file names are canonicalized to end in it.
pub const META_LIC_SUFFIX: &str = ".meta_lic";

/// Index of a target node within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetIndex(pub(crate) usize);

/// Index of an edge within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeIndex(pub(crate) usize);

/// A claimed per-graph resolution slot (see [`LicenseGraph::claim_resolution_slot`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionSlot(pub(crate) usize);

const ANNOTATION_STATIC: u8 = 0x1;
const ANNOTATION_DYNAMIC: u8 = 0x2;
const ANNOTATION_TOOLCHAIN: u8 = 0x4;

/// The unordered annotation set of a dependency edge, drawn from the closed
/// vocabulary `static` / `dynamic` / `toolchain`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EdgeAnnotations(u8);

impl EdgeAnnotations {
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut bits = 0;
        for name in names {
            match name.as_ref() {
                "static" => bits |= ANNOTATION_STATIC,
                "dynamic" => bits |= ANNOTATION_DYNAMIC,
                "toolchain" => bits |= ANNOTATION_TOOLCHAIN,
                "" => {}
                other => tracing::warn!("ignoring unrecognized edge annotation {other:?}"),
            }
        }
        Self(bits)
    }

    pub fn has_static(self) -> bool {
        self.0 & ANNOTATION_STATIC != 0
    }

    pub fn has_dynamic(self) -> bool {
        self.0 & ANNOTATION_DYNAMIC != 0
    }

    pub fn has_toolchain(self) -> bool {
        self.0 & ANNOTATION_TOOLCHAIN != 0
    }

    /// True when the annotation set consists solely of `toolchain`.
    pub fn is_toolchain_only(self) -> bool {
        self.0 == ANNOTATION_TOOLCHAIN
    }

    /// Annotation names in sorted order, for stable output.
    pub fn as_list(self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(3);
        if self.has_dynamic() {
            names.push("dynamic");
        }
        if self.has_static() {
            names.push("static");
        }
        if self.has_toolchain() {
            names.push("toolchain");
        }
        names
    }
}

/// A build target and its license metadata, immutable after loading.
#[derive(Debug)]
pub struct TargetNode {
    name: String,
    index: TargetIndex,
    meta: LicenseMetadata,
    /// Declared conditions; the condition set of resolution slot 0.
    license_conditions: LicenseConditionSet,
    /// Outgoing dependency edges in metadata order.
    edges: Vec<EdgeIndex>,
}

impl TargetNode {
    /// Canonical metadata path, ending in `.meta_lic`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> TargetIndex {
        self.index
    }

    pub fn package_name(&self) -> &str {
        &self.meta.package_name
    }

    pub fn module_types(&self) -> &[String] {
        &self.meta.module_types
    }

    pub fn module_classes(&self) -> &[String] {
        &self.meta.module_classes
    }

    /// Source-tree directory prefixes this target was built from.
    pub fn projects(&self) -> &[String] {
        &self.meta.projects
    }

    pub fn license_kinds(&self) -> &[String] {
        &self.meta.license_kinds
    }

    /// The target's declared license conditions.
    pub fn license_conditions(&self) -> LicenseConditionSet {
        self.license_conditions
    }

    pub fn license_texts(&self) -> &[String] {
        &self.meta.license_texts
    }

    /// True when the target aggregates other targets (zip, image) rather
    /// than deriving a new work from them.
    pub fn is_container(&self) -> bool {
        self.meta.is_container
    }

    /// True when the target declares itself bound to the same module as a
    /// classpath-exception dependency.
    pub fn is_dependent_module(&self) -> bool {
        self.meta.is_dependent_module
    }

    pub fn built(&self) -> &[String] {
        &self.meta.built
    }

    pub fn installed(&self) -> &[String] {
        &self.meta.installed
    }

    pub fn install_map(&self) -> &[InstallMap] {
        &self.meta.install_map
    }

    pub fn sources(&self) -> &[String] {
        &self.meta.sources
    }

    /// Installed output paths, falling back to built paths.
    pub fn target_files(&self) -> &[String] {
        if self.meta.installed.is_empty() {
            &self.meta.built
        } else {
            &self.meta.installed
        }
    }

    /// Outgoing edges in the order the metadata declared them.
    pub fn edges(&self) -> &[EdgeIndex] {
        &self.edges
    }
}

/// A directed edge from a target to one of its dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetEdge {
    target: TargetIndex,
    dependency: TargetIndex,
    annotations: EdgeAnnotations,
}

impl TargetEdge {
    pub fn target(&self) -> TargetIndex {
        self.target
    }

    pub fn dependency(&self) -> TargetIndex {
        self.dependency
    }

    pub fn annotations(&self) -> EdgeAnnotations {
        self.annotations
    }
}

/// A set of target nodes, e.g. the shipped-node set.
#[derive(Debug, Default, Clone)]
pub struct TargetNodeSet {
    members: FxHashSet<TargetIndex>,
}

impl TargetNodeSet {
    pub(crate) fn insert(&mut self, target: TargetIndex) -> bool {
        self.members.insert(target)
    }

    pub fn contains(&self, target: TargetIndex) -> bool {
        self.members.contains(&target)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TargetIndex> + '_ {
        self.members.iter().copied()
    }
}

/// The loaded license graph.
pub struct LicenseGraph {
    targets: Vec<TargetNode>,
    edges: Vec<TargetEdge>,
    by_name: FxHashMap<String, TargetIndex>,
    root_files: Vec<String>,
    root_nodes: Vec<TargetIndex>,
    /// Engine-owned per-target condition arrays, one per claimed slot.
    /// Slot 0 is the declared conditions and lives on the nodes.
    effective: Vec<Mutex<Vec<LicenseConditionSet>>>,
    next_slot: AtomicUsize,
    shipped: OnceLock<TargetNodeSet>,
}

impl LicenseGraph {
    pub(crate) fn new(root_files: Vec<String>) -> Self {
        let effective = (1..MAX_RESOLUTIONS).map(|_| Mutex::new(Vec::new())).collect();
        Self {
            targets: Vec::new(),
            edges: Vec::new(),
            by_name: FxHashMap::default(),
            root_files,
            root_nodes: Vec::new(),
            effective,
            next_slot: AtomicUsize::new(1),
            shipped: OnceLock::new(),
        }
    }

    pub(crate) fn add_target(&mut self, name: String, meta: LicenseMetadata) -> TargetIndex {
        let index = TargetIndex(self.targets.len());
        self.by_name.insert(name.clone(), index);
        self.targets.push(TargetNode {
            name,
            index,
            meta,
            license_conditions: LicenseConditionSet::EMPTY,
            edges: Vec::new(),
        });
        index
    }

    /// Seeds slot 0 from the declared condition names of every node.
    /// Fails on the first unrecognized name.
    pub(crate) fn seed_license_conditions(&mut self) -> Result<()> {
        for tn in &mut self.targets {
            let names = tn.meta.license_conditions.iter().map(String::as_str);
            tn.license_conditions = LicenseConditionSet::from_names(names)
                .map_err(|name| GraphError::unknown_condition(&tn.name, name))?;
        }
        Ok(())
    }

    /// Materializes edges from the parsed dependency lists. Every referenced
    /// dependency must already be a loaded node.
    pub(crate) fn index_dependencies(&mut self) -> Result<()> {
        let mut edges = Vec::new();
        for ti in 0..self.targets.len() {
            let deps = std::mem::take(&mut self.targets[ti].meta.deps);
            let mut node_edges = Vec::with_capacity(deps.len());
            for AnnotatedDependency { file, annotations } in &deps {
                if file.is_empty() {
                    return Err(GraphError::missing_dependency_name(&self.targets[ti].name));
                }
                let dep = self.by_name.get(file).copied().ok_or_else(|| {
                    GraphError::unknown_dependency(&self.targets[ti].name, file.as_str())
                })?;
                let edge = EdgeIndex(edges.len());
                edges.push(TargetEdge {
                    target: TargetIndex(ti),
                    dependency: dep,
                    annotations: EdgeAnnotations::from_names(annotations),
                });
                node_edges.push(edge);
            }
            self.targets[ti].edges = node_edges;
        }
        self.edges = edges;
        Ok(())
    }

    /// Resolves the root files to their nodes. Called once by the loader
    /// after every node has been stored.
    pub(crate) fn index_roots(&mut self) -> Result<()> {
        let mut roots = Vec::with_capacity(self.root_files.len());
        for f in &self.root_files {
            let idx = self
                .by_name
                .get(f)
                .copied()
                .ok_or_else(|| GraphError::unknown_dependency(f, f.as_str()))?;
            roots.push(idx);
        }
        self.root_nodes = roots;
        Ok(())
    }

    /// The canonicalized metadata paths the graph was rooted at.
    pub fn root_files(&self) -> &[String] {
        &self.root_files
    }

    /// The root nodes, in root-file order.
    pub fn root_nodes(&self) -> &[TargetIndex] {
        &self.root_nodes
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn target(&self, index: TargetIndex) -> &TargetNode {
        &self.targets[index.0]
    }

    pub fn target_by_name(&self, name: &str) -> Option<TargetIndex> {
        self.by_name.get(name).copied()
    }

    pub fn edge(&self, index: EdgeIndex) -> &TargetEdge {
        &self.edges[index.0]
    }

    /// All targets in load (completion) order.
    pub fn targets(&self) -> impl Iterator<Item = &TargetNode> {
        self.targets.iter()
    }

    /// All edges in load order.
    pub fn edges(&self) -> impl Iterator<Item = &TargetEdge> {
        self.edges.iter()
    }

    /// Targets sorted by name, for stable output.
    pub fn sorted_targets(&self) -> Vec<&TargetNode> {
        let mut targets: Vec<&TargetNode> = self.targets.iter().collect();
        targets.sort_by(|a, b| a.name.cmp(&b.name));
        targets
    }

    /// Edges sorted by (target name, dependency name, sorted annotations),
    /// for stable output.
    pub fn sorted_edges(&self) -> Vec<&TargetEdge> {
        let mut edges: Vec<&TargetEdge> = self.edges.iter().collect();
        edges.sort_by(|a, b| {
            let an = &self.target(a.target).name;
            let bn = &self.target(b.target).name;
            an.cmp(bn)
                .then_with(|| self.target(a.dependency).name.cmp(&self.target(b.dependency).name))
                .then_with(|| a.annotations.as_list().cmp(&b.annotations.as_list()))
        });
        edges
    }

    /// Claims the next resolution slot for a resolve walk.
    ///
    /// Slots never alias: each concurrent resolution writes its own
    /// per-target array. Exceeding [`MAX_RESOLUTIONS`] is a programming
    /// error surfaced as [`GraphError::TooManyResolutionSlots`].
    pub(crate) fn claim_resolution_slot(&self) -> Result<ResolutionSlot> {
        let slot = self.next_slot.fetch_add(1, Ordering::Relaxed);
        if slot >= MAX_RESOLUTIONS {
            return Err(GraphError::TooManyResolutionSlots { limit: MAX_RESOLUTIONS });
        }
        Ok(ResolutionSlot(slot))
    }

    /// Stores the effective conditions computed by a resolve walk.
    pub(crate) fn store_effective_conditions(
        &self,
        slot: ResolutionSlot,
        conditions: Vec<LicenseConditionSet>,
    ) {
        debug_assert_eq!(conditions.len(), self.targets.len());
        *self.effective[slot.0 - 1].lock().unwrap() = conditions;
    }

    /// The condition set attached to `target` in resolution slot `slot`.
    /// Slot 0 is the target's declared conditions.
    pub fn effective_conditions(&self, slot: usize, target: TargetIndex) -> LicenseConditionSet {
        if slot == 0 {
            return self.target(target).license_conditions();
        }
        let guard = self.effective[slot - 1].lock().unwrap();
        guard.get(target.0).copied().unwrap_or(LicenseConditionSet::EMPTY)
    }

    pub(crate) fn shipped_cache(&self) -> &OnceLock<TargetNodeSet> {
        &self.shipped
    }
}

impl std::fmt::Debug for LicenseGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseGraph")
            .field("targets", &self.targets.len())
            .field("edges", &self.edges.len())
            .field("roots", &self.root_files)
            .finish()
    }
}

/// Canonicalizes a metadata path to end in `.meta_lic`.
pub fn canonical_meta_path(path: &str) -> String {
    if path.ends_with(META_LIC_SUFFIX) {
        path.to_string()
    } else {
        format!("{path}{META_LIC_SUFFIX}")
    }
}
