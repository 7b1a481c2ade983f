use crate::conditions::implication_group;
use crate::loader::read_license_graph;
use crate::output::{format_resolutions, DumpOptions};
use crate::resolve::{
    join_resolutions, resolve_bottom_up_conditions, resolve_top_down_conditions,
    walk_resolutions_for_condition,
};
use anyhow::{bail, Context};
use std::io::Write;
use std::path::Path;

/// Loads the graph rooted at `files` and dumps its resolutions to `out`.
///
/// Without conditions this is the bottom-up resolve. With one or more
/// conditions, the joined top-down resolutions for each named condition's
/// implication group.
pub fn run_resolutions(
    out: &mut dyn Write,
    files: &[String],
    conditions: &[String],
    dot: bool,
    label_conditions: bool,
    strip_prefix: String,
) -> anyhow::Result<()> {
    let lg = read_license_graph(Path::new("."), files)
        .with_context(|| format!("unable to read license metadata file(s) {files:?}"))?;

    let rs = if conditions.is_empty() {
        resolve_bottom_up_conditions(&lg)?
    } else {
        // one top-down fix point, masked per requested condition
        let full = resolve_top_down_conditions(&lg)?;
        let mut masked = Vec::with_capacity(conditions.len());
        for name in conditions {
            let Some(mask) = implication_group(name) else {
                bail!("unrecognized license condition {name:?}");
            };
            masked.push(walk_resolutions_for_condition(&full, mask));
        }
        join_resolutions(masked.iter())
    };

    let opts = DumpOptions { graphviz: dot, label_conditions, strip_prefix };
    out.write_all(format_resolutions(&lg, &rs, &opts).as_bytes())?;
    Ok(())
}
