//! `xfer-plan`: build transfer jobs for a batch of compute jobs

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use xfer_engine::plan::{plan, PlanOutput, PlanRequest};
use xfer_engine::{ImplementationRegistry, PlannerContext, TransferConfig, TransferEngine};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run_plan(config: Option<&Path>, request: &Path) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => TransferConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => TransferConfig::default(),
    };
    let request = PlanRequest::load(request)
        .with_context(|| format!("loading request {}", request.display()))?;

    let (catalog, sites) = request.catalog.clone().into_stores();
    let ctx = PlannerContext::new(config, Arc::new(catalog), Arc::new(sites))
        .context("invalid transfer configuration")?;
    let engine = TransferEngine::new(ctx).context("selecting transfer implementations")?;

    let graph = plan(&engine, &request).context("planning failed")?;
    tracing::info!(
        jobs = graph.node_count(),
        edges = graph.edge_count(),
        "planning complete"
    );

    let output = PlanOutput::from(&graph);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Command::new("xfer-plan")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build transfer jobs for workflow compute jobs")
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("plan")
                .about("Build transfer jobs and print the resulting graph as JSON")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Transfer configuration (.toml, .yaml or .json)"),
                )
                .arg(
                    Arg::new("request")
                        .long("request")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Sites, catalog and transfer requests (.yaml or .json)"),
                ),
        )
        .subcommand(Command::new("strategies").about("List transfer implementations"));

    let matches = cli.get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("plan", args)) => {
            let request = args
                .get_one::<PathBuf>("request")
                .context("--request is required")?;
            run_plan(args.get_one::<PathBuf>("config").map(PathBuf::as_path), request)
        }
        Some(("strategies", _)) => {
            for (key, description) in ImplementationRegistry::describe() {
                println!("{key:<16} {description}");
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
