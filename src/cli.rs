//! Command-line interface definitions.
//!
//! One subcommand per report the tool produces:
//! - `graph` - dump the dependency edges of the license graph
//! - `resolutions` - dump resolved license conditions
//! - `trace` - trace restricted conditions back from sources
//! - `notice` - render a NOTICE document from the notice index
//!
//! Metadata paths are resolved against the current working directory, which
//! is expected to be the build output root.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lichen")]
#[command(about = "Computes license-compliance obligations over a build's dependency graph")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Output a space-separated Target Dependency Annotations tuple for
    /// each edge in the license graph
    Graph {
        /// Root license metadata files (.meta_lic)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,

        /// Output graphviz (dot) format instead of plain tuples
        #[arg(long)]
        dot: bool,

        /// Label target nodes with their license conditions
        #[arg(long)]
        label_conditions: bool,

        /// Prefix to remove from paths, e.g. the path to the source root
        #[arg(long, default_value = "")]
        strip_prefix: String,
    },

    /// Output a space-separated AttachesTo ActsOn Conditions tuple for each
    /// resolution in the graph
    Resolutions {
        /// Root license metadata files (.meta_lic)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,

        /// License condition to resolve top-down (may be given multiple
        /// times; without it, dumps the bottom-up resolve)
        #[arg(short = 'c', long = "condition", value_name = "CONDITION")]
        conditions: Vec<String>,

        /// Output graphviz (dot) format instead of plain tuples
        #[arg(long)]
        dot: bool,

        /// Label target nodes with their license conditions
        #[arg(long)]
        label_conditions: bool,

        /// Prefix to remove from paths, e.g. the path to the source root
        #[arg(long, default_value = "")]
        strip_prefix: String,
    },

    /// Trace where restricted conditions originating at the given sources
    /// end up in the graph
    Trace {
        /// Root license metadata files (.meta_lic)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,

        /// Project directory or metadata file to trace back from
        /// (required; may be given multiple times)
        #[arg(long = "source", value_name = "SOURCE", required = true)]
        sources: Vec<String>,

        /// Prefix to remove from paths, e.g. the path to the source root
        #[arg(long, default_value = "")]
        strip_prefix: String,
    },

    /// Render a NOTICE document for the shipped targets of the graph
    Notice {
        /// Root license metadata files (.meta_lic)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,

        /// Where to write the NOTICE document (default stdout)
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "xml")]
        format: NoticeFormat,

        /// JSON file replacing the built-in safe-prefix tables
        #[arg(long, value_name = "FILE")]
        prefix_config: Option<PathBuf>,

        /// Prefix to remove from install paths
        #[arg(long, default_value = "")]
        strip_prefix: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeFormat {
    /// The XML notice document keyed by content id
    Xml,
    /// A plain-text NOTICE file
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_args_parse() {
        let args = Args::try_parse_from([
            "lichen",
            "graph",
            "--dot",
            "--strip-prefix",
            "out/",
            "a.meta_lic",
            "b.meta_lic",
        ])
        .unwrap();
        match args.command {
            Command::Graph { files, dot, label_conditions, strip_prefix } => {
                assert_eq!(files, vec!["a.meta_lic", "b.meta_lic"]);
                assert!(dot);
                assert!(!label_conditions);
                assert_eq!(strip_prefix, "out/");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_resolutions_accepts_repeated_conditions() {
        let args = Args::try_parse_from([
            "lichen",
            "resolutions",
            "-c",
            "restricted",
            "-c",
            "reciprocal",
            "a.meta_lic",
        ])
        .unwrap();
        match args.command {
            Command::Resolutions { conditions, .. } => {
                assert_eq!(conditions, vec!["restricted", "reciprocal"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_trace_requires_a_source() {
        assert!(Args::try_parse_from(["lichen", "trace", "a.meta_lic"]).is_err());
    }

    #[test]
    fn test_files_are_required() {
        assert!(Args::try_parse_from(["lichen", "graph"]).is_err());
    }
}
