//! lichen - license-compliance obligations over build dependency graphs.
//!
//! Given the per-target license metadata of a build, lichen determines, for
//! every shipped artifact, which license texts must be surfaced (notice
//! obligations), which artifacts must be offered as source (reciprocal
//! obligations), and which combinations impose sharing requirements on the
//! artifacts around them (restricted-copyleft propagation).
//!
//! # Architecture
//!
//! ```text
//! metadata files → loader → license graph → resolvers → resolution set
//!                                 ↓                          ↓
//!                          shipped filter  →  notice index → NOTICE docs
//! ```
//!
//! The loader reads metadata in parallel with a bounded reader pool and
//! publishes an immutable graph. The resolvers walk it bottom-up and
//! top-down, applying the per-edge policy until conditions reach a fix
//! point. The notice index hashes license texts by MD5 content id and maps
//! each id to the libraries and install paths that ship it.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! let graph = lichen::read_license_graph(Path::new("."), &["out/bin/app.meta_lic"])?;
//! let resolutions = lichen::resolve_top_down_conditions(&graph)?;
//! for target in resolutions.attaches_to(&graph) {
//!     for r in resolutions.resolutions(&graph, target) {
//!         println!(
//!             "{} acts on {}: {}",
//!             graph.target(r.attaches_to).name(),
//!             graph.target(r.acts_on).name(),
//!             r.conditions,
//!         );
//!     }
//! }
//! # Ok::<(), lichen::GraphError>(())
//! ```

pub mod cli;
pub mod commands;
pub mod conditions;
pub mod error;
pub mod graph;
pub mod loader;
pub mod metadata;
pub mod notice;
pub mod output;
pub mod policy;
pub mod prefixes;
pub mod resolve;
pub mod shipped;
pub mod walk;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types at the crate root
pub use conditions::{
    implication_group, LicenseCondition, LicenseConditionSet, IMPLIES_BY_EXCEPTION_ONLY,
    IMPLIES_NOTICE, IMPLIES_PERMISSIVE, IMPLIES_PRIVATE, IMPLIES_RECIPROCAL, IMPLIES_RESTRICTED,
    IMPLIES_SHARED, IMPLIES_UNENCUMBERED,
};
pub use error::{GraphError, Result};
pub use graph::{
    EdgeAnnotations, EdgeIndex, LicenseGraph, TargetEdge, TargetIndex, TargetNode, TargetNodeSet,
    MAX_RESOLUTIONS,
};
pub use loader::{read_license_graph, read_license_graph_with_readers, CONCURRENT_READERS};
pub use notice::{index_license_texts, ContentId, NoticeIndex};
pub use policy::{dep_actions_applicable_to_target, target_conditions_applicable_to_dep};
pub use prefixes::SafePrefixes;
pub use resolve::{
    join_resolutions, resolve_bottom_up_conditions, resolve_notices,
    resolve_top_down_conditions, resolve_top_down_for_condition, trace_top_down_conditions,
    walk_resolutions_for_condition, ActionSet, Resolution, ResolutionSet,
};
pub use shipped::shipped_nodes;
pub use walk::{walk_top_down, walk_top_down_breadth_first, walk_top_down_with_context};
