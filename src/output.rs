//! Rendering of graphs, resolution sets, and notice indexes.
//!
//! Plain-text output is space-separated tuples with colon-separated values
//! within a field. Graph output is the `strict digraph` text format. Notice
//! output is either the XML document keyed by content id or a plain-text
//! NOTICE file. Every renderer sorts its view, so repeated runs are
//! byte-identical.

use crate::conditions::LicenseConditionSet;
use crate::graph::{LicenseGraph, TargetNode};
use crate::notice::NoticeIndex;
use crate::resolve::ResolutionSet;
use std::fmt::Write;

/// Condition names in lexicographic order, the order output fields use.
fn sorted_names(cs: LicenseConditionSet) -> Vec<&'static str> {
    let mut names = cs.names();
    names.sort_unstable();
    names
}

/// Options shared by the graph and resolution dumpers.
#[derive(Debug, Clone, Default)]
pub struct DumpOptions {
    /// Emit graphviz (dot) format instead of plain text tuples.
    pub graphviz: bool,
    /// Label each target with its sorted condition names.
    pub label_conditions: bool,
    /// Prefix to remove from paths, e.g. the path to the source root.
    pub strip_prefix: String,
}

impl DumpOptions {
    fn target_out(&self, target: &TargetNode, sep: &str) -> String {
        let mut out = target
            .name()
            .strip_prefix(&self.strip_prefix)
            .unwrap_or(target.name())
            .to_string();
        if self.label_conditions {
            for name in sorted_names(target.license_conditions()) {
                out.push_str(sep);
                out.push_str(name);
            }
        }
        out
    }
}

/// Assigns stable `n0, n1, ...` graphviz ids in first-use order.
struct NodeIds {
    ids: std::collections::HashMap<String, String>,
}

impl NodeIds {
    fn new() -> Self {
        Self { ids: std::collections::HashMap::new() }
    }

    fn make_node(&mut self, out: &mut String, opts: &DumpOptions, target: &TargetNode) {
        if self.ids.contains_key(target.name()) {
            return;
        }
        let id = format!("n{}", self.ids.len());
        let _ = writeln!(out, "\t{} [label=\"{}\"];", id, opts.target_out(target, "\\n"));
        self.ids.insert(target.name().to_string(), id);
    }

    fn id(&self, name: &str) -> &str {
        &self.ids[name]
    }
}

fn close_digraph(out: &mut String, lg: &LicenseGraph, nodes: &NodeIds) {
    out.push_str("\t{rank=same;");
    for f in lg.root_files() {
        if let Some(root) = lg.target_by_name(f) {
            if nodes.ids.contains_key(lg.target(root).name()) {
                let _ = write!(out, " {}", nodes.id(lg.target(root).name()));
            }
        }
    }
    out.push_str("}\n}\n");
}

/// Renders one `Target Dependency Annotations` tuple per edge, or the
/// graphviz form when requested.
pub fn format_graph(lg: &LicenseGraph, opts: &DumpOptions) -> String {
    let mut out = String::new();
    let edges = lg.sorted_edges();

    if opts.graphviz {
        let mut nodes = NodeIds::new();
        out.push_str("strict digraph {\n\trankdir=RL;\n");
        for target in lg.sorted_targets() {
            nodes.make_node(&mut out, opts, target);
        }
        for e in &edges {
            let _ = writeln!(
                out,
                "\t{} -> {} [label=\"{}\"];",
                nodes.id(lg.target(e.dependency()).name()),
                nodes.id(lg.target(e.target()).name()),
                e.annotations().as_list().join("\\n")
            );
        }
        close_digraph(&mut out, lg, &nodes);
        return out;
    }

    for e in &edges {
        let _ = writeln!(
            out,
            "{} {} {}",
            opts.target_out(lg.target(e.target()), ":"),
            opts.target_out(lg.target(e.dependency()), ":"),
            e.annotations().as_list().join(":")
        );
    }
    out
}

/// Renders one `AttachesTo ActsOn Conditions` tuple per resolution, or the
/// graphviz form when requested.
pub fn format_resolutions(lg: &LicenseGraph, rs: &ResolutionSet, opts: &DumpOptions) -> String {
    let mut out = String::new();
    let targets = rs.attaches_to(lg);

    if opts.graphviz {
        let mut nodes = NodeIds::new();
        out.push_str("strict digraph {\n\trankdir=LR;\n");
        for &t in &targets {
            nodes.make_node(&mut out, opts, lg.target(t));
            for r in rs.resolutions(lg, t) {
                nodes.make_node(&mut out, opts, lg.target(r.acts_on));
            }
        }
        for &t in &targets {
            for r in rs.resolutions(lg, t) {
                let _ = writeln!(
                    out,
                    "\t{} -> {} [label=\"{}\"];",
                    nodes.id(lg.target(t).name()),
                    nodes.id(lg.target(r.acts_on).name()),
                    sorted_names(r.conditions).join("\\n")
                );
            }
        }
        close_digraph(&mut out, lg, &nodes);
        return out;
    }

    for &t in &targets {
        let resolutions = rs.resolutions(lg, t);
        if resolutions.is_empty() {
            let _ = writeln!(out, "{}", opts.target_out(lg.target(t), ":"));
            continue;
        }
        for r in resolutions {
            let _ = writeln!(
                out,
                "{} {} {}",
                opts.target_out(lg.target(t), ":"),
                opts.target_out(lg.target(r.acts_on), ":"),
                sorted_names(r.conditions).join(":")
            );
        }
    }
    out
}

/// Escapes text for XML character data and attribute values.
fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn strip_install(install: &str, strip_prefix: &str) -> String {
    if !strip_prefix.is_empty() {
        if let Some(stripped) = install.strip_prefix(strip_prefix) {
            if stripped.is_empty() {
                return "root".to_string();
            }
            return stripped.to_string();
        }
    }
    install.to_string()
}

/// Renders the notice index as the XML notice document: one `<file-name>`
/// per (install path, content id, library) and one `<file-content>` per
/// distinct license text.
pub fn format_notice_xml(ni: &NoticeIndex, strip_prefix: &str) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str("<licenses>\n");
    for install in ni.install_paths() {
        let p = strip_install(install, strip_prefix);
        for h in ni.install_hashes(install) {
            for lib in ni.install_hash_libs(install, &h) {
                let _ = writeln!(
                    out,
                    "<file-name contentId=\"{}\" lib=\"{}\">{}</file-name>",
                    h,
                    xml_escape(lib),
                    xml_escape(&p)
                );
            }
        }
    }
    for h in ni.hashes() {
        let _ = write!(
            out,
            "<file-content contentId=\"{}\"><![CDATA[{}]]></file-content>\n\n",
            h,
            xml_escape(&String::from_utf8_lossy(ni.hash_text(&h)))
        );
    }
    out.push_str("</licenses>\n");
    out
}

/// Renders the notice index as a plain-text NOTICE file: each distinct
/// license text once, preceded by the libraries and install paths using it.
pub fn format_notice_text(ni: &NoticeIndex, strip_prefix: &str) -> String {
    let mut out = String::new();
    for h in ni.hashes() {
        out.push_str(
            "==============================================================================\n",
        );
        for lib in ni.hash_libs(&h) {
            let _ = writeln!(out, "{lib} used by:");
            for install in ni.hash_lib_installs(&h, lib) {
                let _ = writeln!(out, "  {}", strip_install(install, strip_prefix));
            }
        }
        out.push('\n');
        out.push_str(&String::from_utf8_lossy(ni.hash_text(&h)));
        out.push('\n');
    }
    out
}
