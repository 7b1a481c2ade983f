use crate::cli::NoticeFormat;
use crate::loader::read_license_graph;
use crate::notice::index_license_texts;
use crate::output::{format_notice_text, format_notice_xml};
use crate::prefixes::SafePrefixes;
use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Builds the notice index for the graph rooted at `files` and renders it
/// to `output` (stdout when `None`).
pub fn run_notice(
    out: &mut dyn Write,
    files: &[String],
    output: Option<&PathBuf>,
    format: NoticeFormat,
    prefix_config: Option<&PathBuf>,
    strip_prefix: String,
) -> anyhow::Result<()> {
    let root = Path::new(".");
    let lg = read_license_graph(root, files)
        .with_context(|| format!("unable to read license metadata file(s) {files:?}"))?;

    let prefixes = match prefix_config {
        Some(path) => SafePrefixes::from_file(path)?,
        None => SafePrefixes::default(),
    };

    let ni = index_license_texts(root, &lg, None, prefixes)
        .with_context(|| format!("unable to read license text file(s) for {files:?}"))?;

    let rendered = match format {
        NoticeFormat::Xml => format_notice_xml(&ni, &strip_prefix),
        NoticeFormat::Text => format_notice_text(&ni, &strip_prefix),
    };

    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("could not write output to {}", path.display()))?;
            info!(path = %path.display(), "notice document written");
        }
        None => out.write_all(rendered.as_bytes())?,
    }
    Ok(())
}
