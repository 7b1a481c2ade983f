use anyhow::Result;
use clap::Parser;
use lichen::cli::{self, Args};
use lichen::commands;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();

    // Initialize tracing/logging.
    // Use RUST_LOG env var if set, otherwise use the verbose flag.
    // Examples: RUST_LOG=debug, RUST_LOG=lichen=trace
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if args.verbose {
        EnvFilter::new("lichen=debug")
    } else {
        EnvFilter::new("lichen=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    debug!("logging initialized (verbose={})", args.verbose);

    if let Err(e) = run(args) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.command {
        cli::Command::Graph { files, dot, label_conditions, strip_prefix } => {
            commands::run_graph(&mut out, &files, dot, label_conditions, strip_prefix)
        }
        cli::Command::Resolutions {
            files,
            conditions,
            dot,
            label_conditions,
            strip_prefix,
        } => commands::run_resolutions(
            &mut out,
            &files,
            &conditions,
            dot,
            label_conditions,
            strip_prefix,
        ),
        cli::Command::Trace { files, sources, strip_prefix } => {
            commands::run_trace(&mut out, &files, &sources, strip_prefix)
        }
        cli::Command::Notice { files, output, format, prefix_config, strip_prefix } => {
            commands::run_notice(
                &mut out,
                &files,
                output.as_ref(),
                format,
                prefix_config.as_ref(),
                strip_prefix,
            )
        }
    }
}
