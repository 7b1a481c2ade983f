use crate::conditions::{LicenseConditionSet, IMPLIES_RESTRICTED};
use crate::loader::read_license_graph;
use crate::resolve::trace_top_down_conditions;
use anyhow::Context;
use std::io::Write;
use std::path::Path;

/// Traces restricted conditions from `sources` down through the graph and
/// prints each target they reach.
///
/// A source may name a metadata file or a project directory; matching
/// targets are seeded with their declared restricted-family conditions.
pub fn run_trace(
    out: &mut dyn Write,
    files: &[String],
    sources: &[String],
    strip_prefix: String,
) -> anyhow::Result<()> {
    let lg = read_license_graph(Path::new("."), files)
        .with_context(|| format!("unable to read license metadata file(s) {files:?}"))?;

    let rs = trace_top_down_conditions(&lg, |tn| {
        let named = sources.iter().any(|s| s == tn.name())
            || tn.projects().iter().any(|p| sources.iter().any(|s| s == p));
        if named {
            tn.license_conditions().intersection(IMPLIES_RESTRICTED)
        } else {
            LicenseConditionSet::EMPTY
        }
    })?;

    let mut reached = 0usize;
    for t in rs.attaches_to(&lg) {
        let traced = rs.conditions(t).intersection(IMPLIES_RESTRICTED);
        if traced.is_empty() {
            continue;
        }
        reached += 1;
        let name = lg.target(t).name();
        let name = name.strip_prefix(&strip_prefix).unwrap_or(name);
        let mut names = traced.names();
        names.sort_unstable();
        writeln!(out, "{} {}", name, names.join(":"))?;
    }
    writeln!(out, "restricted conditions trace to {reached} targets")?;
    if reached == 0 {
        writeln!(out, "  (check for typos in project names or metadata files)")?;
    }
    Ok(())
}
