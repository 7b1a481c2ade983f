//! Per-edge propagation policy.
//!
//! Two pure functions decide, for each edge and direction, which license
//! conditions cross it. Dispatch is bitmask intersection over the closed
//! vocabulary; neither function touches global state.

use crate::conditions::{LicenseCondition, LicenseConditionSet, IMPLIES_RESTRICTED};
use crate::graph::{EdgeAnnotations, LicenseGraph, TargetEdge};
use crate::resolve::ActionSet;

/// True when the target consumes the dependency into a derived work.
///
/// An edge with a `static` annotation is always a derivation edge, even when
/// `dynamic` also appears (ties break toward static). An edge with no
/// annotations at all is a plain dependency consumed into the derived work.
pub(crate) fn edge_is_derivation(ann: EdgeAnnotations) -> bool {
    ann.has_static() || (!ann.has_dynamic() && !ann.has_toolchain())
}

/// True when the dependency is consumed purely through dynamic linkage.
pub(crate) fn edge_is_dynamic_link(ann: EdgeAnnotations) -> bool {
    ann.has_dynamic() && !ann.has_static()
}

/// True when the classpath exception severs the edge: dynamic linkage where
/// neither endpoint declares itself bound to the other's module.
fn edge_nodes_are_independent_modules(lg: &LicenseGraph, edge: &TargetEdge) -> bool {
    edge_is_dynamic_link(edge.annotations())
        && !lg.target(edge.target()).is_dependent_module()
        && !lg.target(edge.dependency()).is_dependent_module()
}

/// The subset of `cs` that crosses `edge` from dependency up to target.
fn conditions_propagating_to_target(
    lg: &LicenseGraph,
    edge: &TargetEdge,
    cs: LicenseConditionSet,
) -> LicenseConditionSet {
    let ann = edge.annotations();
    if edge_is_derivation(ann) {
        // everything flows into a derived work, except the static-only
        // condition on an edge without an actual static annotation
        if ann.has_static() {
            return cs;
        }
        return cs.minus(LicenseCondition::RestrictedIfStaticallyLinked);
    }
    if !edge_is_dynamic_link(ann) {
        // toolchain-only edges carry nothing
        return LicenseConditionSet::EMPTY;
    }
    // dynamic linkage: only the unconditional restricted condition crosses,
    // plus the classpath-exception variant between dependent modules
    let mut result = cs.intersection(LicenseConditionSet::of(LicenseCondition::Restricted));
    if cs.contains(LicenseCondition::RestrictedWithClasspathException)
        && !edge_nodes_are_independent_modules(lg, edge)
    {
        result = result.plus(LicenseCondition::RestrictedWithClasspathException);
    }
    result
}

/// Decides which of the actions currently attached at `edge.dependency`
/// propagate up to `edge.target`.
///
/// Conditions in the restricted family additionally act on the target
/// itself: a restricted dependency makes the consuming work restricted.
/// `treat_as_aggregate` is part of the policy contract for containers; the
/// recording difference for aggregates lives in the resolvers.
pub fn dep_actions_applicable_to_target(
    lg: &LicenseGraph,
    edge: &TargetEdge,
    dep_actions: &ActionSet,
    _treat_as_aggregate: bool,
) -> ActionSet {
    let mut result = ActionSet::default();
    for (acts_on, cs) in dep_actions.iter() {
        let propagated = conditions_propagating_to_target(lg, edge, cs);
        if propagated.is_empty() {
            continue;
        }
        result.add(acts_on, propagated);
        let infectious = propagated.intersection(IMPLIES_RESTRICTED);
        if !infectious.is_empty() {
            result.add(edge.target(), infectious);
        }
    }
    result
}

/// Decides which of the conditions attached at `edge.target` reach down into
/// `edge.dependency`.
///
/// Only the restricted family ever flows downward. A container passes
/// restricted conditions down only when its own declared license is
/// restricted; conditions it merely aggregates stop at its boundary.
pub fn target_conditions_applicable_to_dep(
    lg: &LicenseGraph,
    edge: &TargetEdge,
    target_conditions: LicenseConditionSet,
    treat_as_aggregate: bool,
) -> LicenseConditionSet {
    let mut result = target_conditions.intersection(IMPLIES_RESTRICTED);
    if result.is_empty() {
        return result;
    }
    if treat_as_aggregate
        && !lg.target(edge.target()).license_conditions().matches_any(IMPLIES_RESTRICTED)
    {
        return LicenseConditionSet::EMPTY;
    }
    let ann = edge.annotations();
    if edge_is_derivation(ann) {
        if !ann.has_static() {
            result = result.minus(LicenseCondition::RestrictedIfStaticallyLinked);
        }
        return result;
    }
    if !edge_is_dynamic_link(ann) {
        return LicenseConditionSet::EMPTY;
    }
    result = result
        .minus(LicenseCondition::RestrictedAllowsDynamicLinking)
        .minus(LicenseCondition::RestrictedIfStaticallyLinked);
    if edge_nodes_are_independent_modules(lg, edge) {
        result = result.minus(LicenseCondition::RestrictedWithClasspathException);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_license_graph;
    use crate::testutil::{meta_fixture, write_file};
    use tempfile::TempDir;

    struct Case {
        name: &'static str,
        target: &'static str,
        dep: &'static str,
        annotations: &'static [&'static str],
        treat_as_aggregate: bool,
        /// (target, condition) pair simulating a condition inherited from a
        /// sub-dependency, already propagated up to `dep`.
        other_condition: Option<(&'static str, &'static str)>,
        /// `actsOn:cond1:cond2` entries expected at the target.
        expected_dep_actions: &'static [&'static str],
        /// condition names expected to flow down into the dependency.
        expected_target_conditions: &'static [&'static str],
    }

    const CASES: &[Case] = &[
        Case {
            name: "firstparty",
            target: "apacheBin",
            dep: "apacheLib",
            annotations: &["static"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &["apacheLib:notice"],
            expected_target_conditions: &[],
        },
        Case {
            name: "notice",
            target: "mitBin",
            dep: "mitLib",
            annotations: &["static"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &["mitLib:notice"],
            expected_target_conditions: &[],
        },
        Case {
            name: "fponlgpl",
            target: "apacheBin",
            dep: "lgplLib",
            annotations: &["static"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &[
                "apacheBin:restricted_allows_dynamic_linking",
                "lgplLib:restricted_allows_dynamic_linking",
            ],
            expected_target_conditions: &[],
        },
        Case {
            name: "fponlgpldynamic",
            target: "apacheBin",
            dep: "lgplLib",
            annotations: &["dynamic"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &[],
            expected_target_conditions: &[],
        },
        Case {
            name: "fpongpl",
            target: "apacheBin",
            dep: "gplLib",
            annotations: &["static"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &["apacheBin:restricted", "gplLib:restricted"],
            expected_target_conditions: &[],
        },
        Case {
            name: "fpongpldynamic",
            target: "apacheBin",
            dep: "gplLib",
            annotations: &["dynamic"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &["apacheBin:restricted", "gplLib:restricted"],
            expected_target_conditions: &[],
        },
        Case {
            name: "independentmodule",
            target: "apacheBin",
            dep: "gplWithClasspathException",
            annotations: &["dynamic"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &[],
            expected_target_conditions: &[],
        },
        Case {
            name: "independentmodulestatic",
            target: "apacheBin",
            dep: "gplWithClasspathException",
            annotations: &["static"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &[
                "apacheBin:restricted_with_classpath_exception",
                "gplWithClasspathException:restricted_with_classpath_exception",
            ],
            expected_target_conditions: &[],
        },
        Case {
            name: "dependentmodule",
            target: "dependentModule",
            dep: "gplWithClasspathException",
            annotations: &["dynamic"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &[
                "dependentModule:restricted_with_classpath_exception",
                "gplWithClasspathException:restricted_with_classpath_exception",
            ],
            expected_target_conditions: &[],
        },
        Case {
            name: "lgplonfp",
            target: "lgplBin",
            dep: "apacheLib",
            annotations: &["static"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &["apacheLib:notice"],
            expected_target_conditions: &["restricted_allows_dynamic_linking"],
        },
        Case {
            name: "lgplonfpdynamic",
            target: "lgplBin",
            dep: "apacheLib",
            annotations: &["dynamic"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &[],
            expected_target_conditions: &[],
        },
        Case {
            name: "gplonfp",
            target: "gplBin",
            dep: "apacheLib",
            annotations: &["static"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &["apacheLib:notice"],
            expected_target_conditions: &["restricted"],
        },
        Case {
            name: "gplcontainer",
            target: "gplContainer",
            dep: "apacheLib",
            annotations: &["static"],
            treat_as_aggregate: true,
            other_condition: None,
            expected_dep_actions: &["apacheLib:notice"],
            expected_target_conditions: &["restricted"],
        },
        Case {
            name: "gploncontainer",
            target: "apacheContainer",
            dep: "apacheLib",
            annotations: &["static"],
            treat_as_aggregate: true,
            other_condition: Some(("gplLib", "restricted")),
            expected_dep_actions: &[
                "apacheContainer:restricted",
                "apacheLib:notice:restricted",
                "gplLib:restricted",
            ],
            expected_target_conditions: &[],
        },
        Case {
            name: "gplonbin",
            target: "apacheBin",
            dep: "apacheLib",
            annotations: &["static"],
            treat_as_aggregate: false,
            other_condition: Some(("gplLib", "restricted")),
            expected_dep_actions: &[
                "apacheBin:restricted",
                "apacheLib:notice:restricted",
                "gplLib:restricted",
            ],
            expected_target_conditions: &["restricted"],
        },
        Case {
            name: "gplonfpdynamic",
            target: "gplBin",
            dep: "apacheLib",
            annotations: &["dynamic"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &[],
            expected_target_conditions: &["restricted"],
        },
        Case {
            name: "independentmodulereverse",
            target: "gplWithClasspathException",
            dep: "apacheBin",
            annotations: &["dynamic"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &[],
            expected_target_conditions: &[],
        },
        Case {
            name: "independentmodulereversestatic",
            target: "gplWithClasspathException",
            dep: "apacheBin",
            annotations: &["static"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &["apacheBin:notice"],
            expected_target_conditions: &["restricted_with_classpath_exception"],
        },
        Case {
            name: "dependentmodulereverse",
            target: "gplWithClasspathException",
            dep: "dependentModule",
            annotations: &["dynamic"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &[],
            expected_target_conditions: &["restricted_with_classpath_exception"],
        },
        Case {
            name: "ponr",
            target: "proprietary",
            dep: "gplLib",
            annotations: &["static"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &["gplLib:restricted", "proprietary:restricted"],
            expected_target_conditions: &[],
        },
        Case {
            name: "ronp",
            target: "gplBin",
            dep: "proprietary",
            annotations: &["static"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &["proprietary:proprietary"],
            expected_target_conditions: &["restricted"],
        },
        Case {
            name: "noticeonb_e_o",
            target: "mitBin",
            dep: "by_exception",
            annotations: &["static"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &["by_exception:by_exception_only"],
            expected_target_conditions: &[],
        },
        Case {
            name: "b_e_oonnotice",
            target: "by_exception",
            dep: "mitLib",
            annotations: &["static"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &["mitLib:notice"],
            expected_target_conditions: &[],
        },
        Case {
            name: "noticeonrecip",
            target: "mitBin",
            dep: "mplLib",
            annotations: &["static"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &["mplLib:reciprocal"],
            expected_target_conditions: &[],
        },
        Case {
            name: "reciponnotice",
            target: "mplBin",
            dep: "mitLib",
            annotations: &["static"],
            treat_as_aggregate: false,
            other_condition: None,
            expected_dep_actions: &["mitLib:notice"],
            expected_target_conditions: &[],
        },
    ];

    #[test]
    fn test_edge_conditions() {
        for case in CASES {
            let tmp = TempDir::new().unwrap();
            let mut target_meta = meta_fixture(case.target).to_string();
            target_meta.push_str(&format!("deps: {{\n  file: \"{}.meta_lic\"\n", case.dep));
            for ann in case.annotations {
                target_meta.push_str(&format!("  annotations: \"{ann}\"\n"));
            }
            target_meta.push_str("}\n");
            write_file(tmp.path(), &format!("{}.meta_lic", case.target), &target_meta);
            write_file(
                tmp.path(),
                &format!("{}.meta_lic", case.dep),
                meta_fixture(case.dep),
            );
            if let Some((other, _)) = case.other_condition {
                write_file(tmp.path(), &format!("{other}.meta_lic"), meta_fixture(other));
                // other target must exist in the graph; load it as an extra root
            }
            let mut roots = vec![format!("{}.meta_lic", case.target)];
            if let Some((other, _)) = case.other_condition {
                roots.push(format!("{other}.meta_lic"));
            }
            let lg = read_license_graph(tmp.path(), &roots).unwrap();

            let target_idx = lg.target_by_name(&format!("{}.meta_lic", case.target)).unwrap();
            let dep_idx = lg.target_by_name(&format!("{}.meta_lic", case.dep)).unwrap();
            let edge = *lg
                .edges()
                .find(|e| e.target() == target_idx && e.dependency() == dep_idx)
                .unwrap();

            // seed the dependency's own declared conditions, plus the
            // simulated already-propagated condition from a sub-dependency
            let mut dep_actions = ActionSet::default();
            dep_actions.add(dep_idx, lg.target(dep_idx).license_conditions());
            let mut target_conditions = lg.target(target_idx).license_conditions();
            if let Some((other, cond)) = case.other_condition {
                let other_idx = lg.target_by_name(&format!("{other}.meta_lic")).unwrap();
                let cs = LicenseConditionSet::from_names([cond]).unwrap();
                dep_actions.add(dep_idx, cs);
                dep_actions.add(other_idx, cs);
                target_conditions = target_conditions.union(cs);
            }

            let actual =
                dep_actions_applicable_to_target(&lg, &edge, &dep_actions, case.treat_as_aggregate);
            let mut actual_triples: Vec<String> = actual
                .iter()
                .map(|(acts_on, cs)| {
                    let name = lg.target(acts_on).name().trim_end_matches(".meta_lic");
                    format!("{name}:{}", cs.names().join(":"))
                })
                .collect();
            actual_triples.sort();
            assert_eq!(
                actual_triples, case.expected_dep_actions,
                "case {}: dep actions",
                case.name
            );

            let cs = target_conditions_applicable_to_dep(
                &lg,
                &edge,
                target_conditions,
                case.treat_as_aggregate,
            );
            assert_eq!(
                cs.names(),
                case.expected_target_conditions,
                "case {}: target conditions",
                case.name
            );
        }
    }

    #[test]
    fn test_both_static_and_dynamic_is_treated_as_static() {
        let tmp = TempDir::new().unwrap();
        let mut target_meta = meta_fixture("apacheBin").to_string();
        target_meta.push_str(
            "deps: {\n  file: \"lgplLib.meta_lic\"\n  annotations: \"static\"\n  annotations: \"dynamic\"\n}\n",
        );
        write_file(tmp.path(), "apacheBin.meta_lic", &target_meta);
        write_file(tmp.path(), "lgplLib.meta_lic", meta_fixture("lgplLib"));
        let lg = read_license_graph(tmp.path(), &["apacheBin.meta_lic"]).unwrap();
        let edge = *lg.edges().next().unwrap();
        assert!(edge_is_derivation(edge.annotations()));
        assert!(!edge_is_dynamic_link(edge.annotations()));

        let mut dep_actions = ActionSet::default();
        let dep = edge.dependency();
        dep_actions.add(dep, lg.target(dep).license_conditions());
        let up = dep_actions_applicable_to_target(&lg, &edge, &dep_actions, false);
        assert!(!up.is_empty(), "the LGPL-style condition must cross a static edge");

        let down = target_conditions_applicable_to_dep(
            &lg,
            &edge,
            lg.target(dep).license_conditions(),
            false,
        );
        assert_eq!(down.names(), vec!["restricted_allows_dynamic_linking"]);
    }

    #[test]
    fn test_toolchain_edges_carry_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut target_meta = meta_fixture("apacheBin").to_string();
        target_meta.push_str(
            "deps: {\n  file: \"gplLib.meta_lic\"\n  annotations: \"toolchain\"\n}\n",
        );
        write_file(tmp.path(), "apacheBin.meta_lic", &target_meta);
        write_file(tmp.path(), "gplLib.meta_lic", meta_fixture("gplLib"));
        let lg = read_license_graph(tmp.path(), &["apacheBin.meta_lic"]).unwrap();
        let edge = *lg.edges().next().unwrap();

        let mut dep_actions = ActionSet::default();
        let dep = edge.dependency();
        dep_actions.add(dep, lg.target(dep).license_conditions());
        assert!(dep_actions_applicable_to_target(&lg, &edge, &dep_actions, false).is_empty());
        assert!(target_conditions_applicable_to_dep(
            &lg,
            &edge,
            LicenseConditionSet::from_names(["restricted"]).unwrap(),
            false
        )
        .is_empty());
    }
}
