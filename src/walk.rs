//! Generic graph traversals with path context.
//!
//! Walks call a visitor `(graph, node, path) -> descend?` where `path` is
//! the edge sequence from the root. A visited set keyed by (node, abstracted
//! context) prunes revisits; the default context collapses every visit of a
//! node to one.

use crate::graph::{EdgeIndex, LicenseGraph, TargetIndex};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// Pre-order walk from the graph roots.
///
/// `visit` returns whether to descend into the node's dependencies. Each
/// node is visited at most once.
pub fn walk_top_down<F>(lg: &LicenseGraph, visit: F)
where
    F: FnMut(&LicenseGraph, TargetIndex, &[EdgeIndex]) -> bool,
{
    walk_top_down_with_context(lg, |_, _, _| 0, visit)
}

/// Pre-order walk with an abstracted edge context.
///
/// `context` maps (path-so-far, edge) to an abstract key; a node is
/// re-visited once per distinct key. Contexts that depend on the path allow
/// a node shipped at several places to be seen at each of them.
pub fn walk_top_down_with_context<C, F>(lg: &LicenseGraph, mut context: C, mut visit: F)
where
    C: FnMut(&LicenseGraph, &[EdgeIndex], EdgeIndex) -> u64,
    F: FnMut(&LicenseGraph, TargetIndex, &[EdgeIndex]) -> bool,
{
    let mut visited: FxHashSet<(TargetIndex, u64)> = FxHashSet::default();
    let mut path: Vec<EdgeIndex> = Vec::new();

    fn walk<C, F>(
        lg: &LicenseGraph,
        node: TargetIndex,
        ctx: u64,
        visited: &mut FxHashSet<(TargetIndex, u64)>,
        path: &mut Vec<EdgeIndex>,
        context: &mut C,
        visit: &mut F,
    ) where
        C: FnMut(&LicenseGraph, &[EdgeIndex], EdgeIndex) -> u64,
        F: FnMut(&LicenseGraph, TargetIndex, &[EdgeIndex]) -> bool,
    {
        if !visited.insert((node, ctx)) {
            return;
        }
        if !visit(lg, node, path) {
            return;
        }
        for &ei in lg.target(node).edges() {
            let child_ctx = context(lg, path, ei);
            path.push(ei);
            walk(lg, lg.edge(ei).dependency(), child_ctx, visited, path, context, visit);
            path.pop();
        }
    }

    for &root in lg.root_nodes() {
        walk(lg, root, 0, &mut visited, &mut path, &mut context, &mut visit);
    }
}

/// Breadth-first dual of [`walk_top_down`]. `visit` receives the edge the
/// node was reached through (the last element of the path) and returns
/// whether to enqueue the node's dependencies.
pub fn walk_top_down_breadth_first<F>(lg: &LicenseGraph, mut visit: F)
where
    F: FnMut(&LicenseGraph, TargetIndex, Option<EdgeIndex>) -> bool,
{
    let mut visited: FxHashSet<TargetIndex> = FxHashSet::default();
    let mut queue: VecDeque<(TargetIndex, Option<EdgeIndex>)> = VecDeque::new();
    for &root in lg.root_nodes() {
        if visited.insert(root) {
            queue.push_back((root, None));
        }
    }
    while let Some((node, via)) = queue.pop_front() {
        if !visit(lg, node, via) {
            continue;
        }
        for &ei in lg.target(node).edges() {
            let dep = lg.edge(ei).dependency();
            if visited.insert(dep) {
                queue.push_back((dep, Some(ei)));
            }
        }
    }
}
