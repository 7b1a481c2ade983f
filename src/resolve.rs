//! The resolution engine: bottom-up and top-down fix-point propagation of
//! license conditions over the graph.
//!
//! A *resolution* is a triple (attaches-to, acts-on, conditions): by policy
//! and the shape of the graph, the conditions of *acts-on* impose
//! obligations at *attaches-to*. Resolutions are built here and frozen;
//! downstream consumers only read.

use crate::conditions::{LicenseConditionSet, IMPLIES_NOTICE};
use crate::error::Result;
use crate::graph::{LicenseGraph, TargetIndex};
use crate::policy::{dep_actions_applicable_to_target, target_conditions_applicable_to_dep};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Conditions keyed by the target they act on.
///
/// The working currency of the resolvers: the set of actions attached at one
/// point of the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSet {
    map: FxHashMap<TargetIndex, LicenseConditionSet>,
}

impl ActionSet {
    /// Unions `conditions` into the entry for `acts_on`.
    pub fn add(&mut self, acts_on: TargetIndex, conditions: LicenseConditionSet) {
        if conditions.is_empty() {
            return;
        }
        let entry = self.map.entry(acts_on).or_default();
        *entry = entry.union(conditions);
    }

    /// Unions every action of `other` into this set.
    pub fn add_set(&mut self, other: &ActionSet) {
        for (&acts_on, &cs) in &other.map {
            self.add(acts_on, cs);
        }
    }

    /// The union of all condition sets in this action set.
    pub fn conditions(&self) -> LicenseConditionSet {
        self.map
            .values()
            .fold(LicenseConditionSet::EMPTY, |acc, cs| acc.union(*cs))
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TargetIndex, LicenseConditionSet)> + '_ {
        self.map.iter().map(|(&t, &cs)| (t, cs))
    }

    /// The actions restricted to `mask`, dropping emptied entries.
    fn masked(&self, mask: LicenseConditionSet) -> ActionSet {
        let mut result = ActionSet::default();
        for (&acts_on, &cs) in &self.map {
            result.add(acts_on, cs.intersection(mask));
        }
        result
    }
}

/// One policy-derived attachment of conditions from `acts_on` to
/// `attaches_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub attaches_to: TargetIndex,
    pub acts_on: TargetIndex,
    pub conditions: LicenseConditionSet,
}

/// A frozen mapping attaches-to → (acts-on → conditions).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionSet {
    map: FxHashMap<TargetIndex, ActionSet>,
}

impl ResolutionSet {
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Targets with at least one resolution, sorted by name.
    pub fn attaches_to(&self, lg: &LicenseGraph) -> Vec<TargetIndex> {
        let mut targets: Vec<TargetIndex> = self.map.keys().copied().collect();
        targets.sort_by(|a, b| lg.target(*a).name().cmp(lg.target(*b).name()));
        targets
    }

    /// All resolutions attaching to `target`, ordered by acts-on name.
    pub fn resolutions(&self, lg: &LicenseGraph, target: TargetIndex) -> Vec<Resolution> {
        let Some(actions) = self.map.get(&target) else {
            return Vec::new();
        };
        let mut rl: Vec<Resolution> = actions
            .iter()
            .map(|(acts_on, conditions)| Resolution { attaches_to: target, acts_on, conditions })
            .collect();
        rl.sort_by(|a, b| lg.target(a.acts_on).name().cmp(lg.target(b.acts_on).name()));
        rl
    }

    /// The union of all conditions attached at `target`.
    pub fn conditions(&self, target: TargetIndex) -> LicenseConditionSet {
        self.map
            .get(&target)
            .map(ActionSet::conditions)
            .unwrap_or(LicenseConditionSet::EMPTY)
    }

    /// True when some resolution of `target` carries a condition of `mask`.
    pub fn matches_any(&self, target: TargetIndex, mask: LicenseConditionSet) -> bool {
        self.conditions(target).matches_any(mask)
    }

    /// Unions `other` into this set.
    pub fn add_set(&mut self, other: &ResolutionSet) {
        for (&attaches_to, actions) in &other.map {
            self.map.entry(attaches_to).or_default().add_set(actions);
        }
    }

    fn insert(&mut self, attaches_to: TargetIndex, actions: ActionSet) {
        if !actions.is_empty() {
            self.map.insert(attaches_to, actions);
        }
    }
}

/// Unions any number of resolution sets.
pub fn join_resolutions<'a, I: IntoIterator<Item = &'a ResolutionSet>>(sets: I) -> ResolutionSet {
    let mut result = ResolutionSet::default();
    for rs in sets {
        result.add_set(rs);
    }
    result
}

/// Keeps only the masked portion of every (attaches-to, acts-on) cell,
/// dropping cells whose conditions empty out.
pub fn walk_resolutions_for_condition(
    rs: &ResolutionSet,
    mask: LicenseConditionSet,
) -> ResolutionSet {
    let mut result = ResolutionSet::default();
    for (&attaches_to, actions) in &rs.map {
        result.insert(attaches_to, actions.masked(mask));
    }
    result
}

/// Post-order resolve: propagates conditions from dependencies up to the
/// targets that consume them.
///
/// Each node is resolved at most once per call; the recursion stack doubles
/// as the acyclicity check the metadata format promises.
pub fn resolve_bottom_up_conditions(lg: &LicenseGraph) -> Result<ResolutionSet> {
    let slot = lg.claim_resolution_slot()?;
    let amap = resolve_bottom_up_actions(lg);
    let mut effective = vec![LicenseConditionSet::EMPTY; lg.len()];
    let mut rs = ResolutionSet::default();
    for (i, actions) in amap.into_iter().enumerate() {
        if let Some(actions) = actions {
            effective[i] = actions.conditions();
            rs.insert(TargetIndex(i), actions);
        }
    }
    lg.store_effective_conditions(slot, effective);
    Ok(rs)
}

/// The shared bottom-up walk. Returns each reachable node's action set;
/// unreachable nodes stay `None`.
fn resolve_bottom_up_actions(lg: &LicenseGraph) -> Vec<Option<ActionSet>> {
    let mut amap: Vec<Option<ActionSet>> = vec![None; lg.len()];
    let mut on_stack = vec![false; lg.len()];
    for &root in lg.root_nodes() {
        walk_up(lg, root, &mut amap, &mut on_stack);
    }
    amap
}

fn walk_up(
    lg: &LicenseGraph,
    target: TargetIndex,
    amap: &mut Vec<Option<ActionSet>>,
    on_stack: &mut Vec<bool>,
) {
    if amap[target.0].is_some() {
        return;
    }
    assert!(
        !on_stack[target.0],
        "dependency cycle through {}",
        lg.target(target).name()
    );
    on_stack[target.0] = true;

    let node = lg.target(target);
    let mut actions = ActionSet::default();
    actions.add(target, node.license_conditions());
    for &ei in node.edges() {
        let edge = lg.edge(ei);
        walk_up(lg, edge.dependency(), amap, on_stack);
        let contribution = {
            let dep_actions = amap[edge.dependency().0].as_ref().unwrap();
            dep_actions_applicable_to_target(lg, edge, dep_actions, node.is_container())
        };
        actions.add_set(&contribution);
    }

    on_stack[target.0] = false;
    amap[target.0] = Some(actions);
}

/// Pre-order resolve: starts from the bottom-up result and pushes
/// restricted-family conditions down into dependencies until a fix point.
///
/// Applying it to a graph whose conditions have already reached the fix
/// point returns the same resolution set.
pub fn resolve_top_down_conditions(lg: &LicenseGraph) -> Result<ResolutionSet> {
    let slot = lg.claim_resolution_slot()?;
    let base = resolve_bottom_up_actions(lg);
    let rs = resolve_top_down(lg, |target| base[target.0].clone().unwrap_or_default());

    let mut effective = vec![LicenseConditionSet::EMPTY; lg.len()];
    for (&t, actions) in &rs.map {
        effective[t.0] = actions.conditions();
    }
    lg.store_effective_conditions(slot, effective);
    Ok(rs)
}

/// As [`resolve_top_down_conditions`], but the result is restricted to the
/// implication group of the named condition.
pub fn resolve_top_down_for_condition(
    lg: &LicenseGraph,
    mask: LicenseConditionSet,
) -> Result<ResolutionSet> {
    let rs = resolve_top_down_conditions(lg)?;
    Ok(walk_resolutions_for_condition(&rs, mask))
}

/// Top-down resolutions filtered to NOTICE-trackable conditions; the default
/// resolution set of the notice index.
pub fn resolve_notices(lg: &LicenseGraph) -> Result<ResolutionSet> {
    let rs = resolve_top_down_conditions(lg)?;
    Ok(walk_resolutions_for_condition(&rs, IMPLIES_NOTICE))
}

/// Top-down walk seeded by a caller-provided function instead of the
/// bottom-up result, enabling reverse tracing (e.g. which restricted
/// conditions reach a given project).
pub fn trace_top_down_conditions<F>(lg: &LicenseGraph, source: F) -> Result<ResolutionSet>
where
    F: Fn(&crate::graph::TargetNode) -> LicenseConditionSet,
{
    let slot = lg.claim_resolution_slot()?;
    let rs = resolve_top_down(lg, |target| {
        let node = lg.target(target);
        let mut actions = ActionSet::default();
        actions.add(target, source(node));
        actions
    });
    let mut effective = vec![LicenseConditionSet::EMPTY; lg.len()];
    for (&t, actions) in &rs.map {
        effective[t.0] = actions.conditions();
    }
    lg.store_effective_conditions(slot, effective);
    Ok(rs)
}

/// The shared top-down fix-point walk. `seed` supplies each node's initial
/// action set the first time the walk reaches it.
fn resolve_top_down<F>(lg: &LicenseGraph, seed: F) -> ResolutionSet
where
    F: Fn(TargetIndex) -> ActionSet,
{
    let mut rmap: Vec<Option<ActionSet>> = vec![None; lg.len()];
    let mut rounds = 0usize;
    for &root in lg.root_nodes() {
        walk_down(lg, root, ActionSet::default(), &seed, &mut rmap, &mut rounds);
    }
    debug!(rounds, "top-down resolve reached fix point");

    let mut rs = ResolutionSet::default();
    for (i, actions) in rmap.into_iter().enumerate() {
        if let Some(actions) = actions {
            rs.insert(TargetIndex(i), actions);
        }
    }
    rs
}

fn walk_down<F>(
    lg: &LicenseGraph,
    target: TargetIndex,
    inherited: ActionSet,
    seed: &F,
    rmap: &mut Vec<Option<ActionSet>>,
    rounds: &mut usize,
) where
    F: Fn(TargetIndex) -> ActionSet,
{
    *rounds += 1;
    let changed = if rmap[target.0].is_none() {
        let mut actions = seed(target);
        actions.add_set(&inherited);
        rmap[target.0] = Some(actions);
        true
    } else {
        let actions = rmap[target.0].as_mut().unwrap();
        let before = actions.clone();
        actions.add_set(&inherited);
        *actions != before
    };
    // re-queue only when the attached set grew; conditions only ever grow,
    // so this fix-points in O(E * |vocabulary|)
    if !changed {
        return;
    }

    let node = lg.target(target);
    let treat_as_aggregate = node.is_container();
    let current = rmap[target.0].as_ref().unwrap().clone();
    let attached = current.conditions();
    for &ei in node.edges() {
        let edge = lg.edge(ei);
        let dcs = target_conditions_applicable_to_dep(lg, edge, attached, treat_as_aggregate);
        let dep_inherited = current.masked(dcs);
        walk_down(lg, edge.dependency(), dep_inherited, seed, rmap, rounds);
    }
}
