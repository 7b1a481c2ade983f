//! Shipped-node filter.
//!
//! A target ships when it is a root or is reached from a shipped target over
//! an edge whose annotations are not toolchain-only. Tools consumed during
//! the build but absent from the output do not ship.

use crate::graph::{LicenseGraph, TargetIndex, TargetNodeSet};

/// The set of targets shipped directly or as part of a derivative work.
/// Memoized on the graph; the first call computes it.
pub fn shipped_nodes(lg: &LicenseGraph) -> &TargetNodeSet {
    lg.shipped_cache().get_or_init(|| {
        let mut shipped = TargetNodeSet::default();
        let mut stack: Vec<TargetIndex> = Vec::new();
        for &root in lg.root_nodes() {
            if shipped.insert(root) {
                stack.push(root);
            }
        }
        while let Some(node) = stack.pop() {
            for &ei in lg.target(node).edges() {
                let edge = lg.edge(ei);
                if edge.annotations().is_toolchain_only() {
                    continue;
                }
                if shipped.insert(edge.dependency()) {
                    stack.push(edge.dependency());
                }
            }
        }
        shipped
    })
}
