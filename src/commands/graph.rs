use crate::loader::read_license_graph;
use crate::output::{format_graph, DumpOptions};
use anyhow::Context;
use std::io::Write;
use std::path::Path;

/// Loads the graph rooted at `files` and dumps its edges to `out`.
pub fn run_graph(
    out: &mut dyn Write,
    files: &[String],
    dot: bool,
    label_conditions: bool,
    strip_prefix: String,
) -> anyhow::Result<()> {
    let lg = read_license_graph(Path::new("."), files)
        .with_context(|| format!("unable to read license metadata file(s) {files:?}"))?;
    let opts = DumpOptions { graphviz: dot, label_conditions, strip_prefix };
    out.write_all(format_graph(&lg, &opts).as_bytes())?;
    Ok(())
}
