use std::path::PathBuf;

use anyhow::Context;
use bpmn_diff::{
    check::{dangling_references, FlowGraph},
    diff::render_summary,
    ingest::{self, IngestOptions},
    DiffOptions, Differ,
};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::instrument;

/// Compare BPMN 2.0 process models.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Report the differences between two models
    Diff(Diff),

    /// Check a model for dangling references and unreachable flow nodes
    Check(Check),
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Format {
    #[default]
    Json,
    Summary,
}

#[derive(Debug, clap::Args)]
struct Diff {
    /// The earlier version of the model
    old: PathBuf,

    /// The later version of the model
    new: PathBuf,

    #[arg(long, value_enum, default_value_t)]
    format: Format,

    /// Leave layout-only changes out of the report
    #[arg(long)]
    semantic: bool,

    /// Differ options file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
struct Check {
    /// The model to check
    path: PathBuf,
}

impl Diff {
    #[instrument(skip_all)]
    fn run(self) -> anyhow::Result<()> {
        let options = match &self.config {
            Some(path) => DiffOptions::load(path)
                .with_context(|| format!("failed to load options from {}", path.display()))?,
            None => DiffOptions::default(),
        };

        let old = ingest::from_path(&self.old, IngestOptions::default())?;
        let new = ingest::from_path(&self.new, IngestOptions::default())?;

        let mut report = Differ::new(options).diff(&old.model, &new.model)?;
        if self.semantic {
            report = report.semantic_view();
        }

        match self.format {
            Format::Json => println!("{}", report.to_json_pretty()?),
            Format::Summary => print!("{}", render_summary(&report)),
        }
        Ok(())
    }
}

impl Check {
    #[instrument(skip_all)]
    fn run(self) -> anyhow::Result<()> {
        let definitions = ingest::from_path(&self.path, IngestOptions::default())?;
        let model = &definitions.model;

        let dangling = dangling_references(model);
        for reference in &dangling {
            println!(
                "dangling: {}.{} -> {}",
                reference.element, reference.field, reference.target
            );
        }

        let graph = FlowGraph::new(model);
        let unreachable = graph.unreachable();
        for node in &unreachable {
            println!("unreachable: {node}");
        }
        if graph.has_cycles() {
            println!("note: sequence flow contains loops");
        }

        anyhow::ensure!(
            dangling.is_empty() && unreachable.is_empty(),
            "{} dangling reference(s), {} unreachable node(s)",
            dangling.len(),
            unreachable.len()
        );
        println!(
            "ok: {} elements, {} flow nodes, {} sequence flows",
            model.len(),
            graph.node_count(),
            graph.flow_count()
        );
        Ok(())
    }
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Command::Diff(diff) => diff.run(),
        Command::Check(check) => check.run(),
    }
}
