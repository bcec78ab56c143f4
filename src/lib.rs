pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod filter;
pub mod groups;
pub mod io_utils;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod schema;
pub mod session;
pub mod stats;
pub mod table;

use std::{env, io::Write, sync::OnceLock};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, InputArgs},
    config::AliasConfig,
    io_utils::ReadOptions,
    pipeline::SourcePaths,
    session::AnalysisSession,
    stats::Variable,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("school_climate", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Summary(args) => handle_summary(&args),
        Commands::Stats(args) => handle_stats(&args),
        Commands::Correlate(args) => handle_correlate(&args),
        Commands::Groups(args) => handle_groups(&args),
        Commands::Export(args) => export::execute(&args),
        Commands::Aliases(args) => handle_aliases(&args),
    }
}

/// Reads the three exports named by `input` into a fresh session.
pub(crate) fn load_session(input: &InputArgs) -> Result<AnalysisSession> {
    let encoding = io_utils::resolve_encoding(input.input_encoding.as_deref())?;
    let config = match &input.aliases {
        Some(path) => AliasConfig::load(path)
            .with_context(|| format!("Loading alias configuration from {path:?}"))?,
        None => AliasConfig::default(),
    };
    debug!("Alias configuration: {config:?}");
    let paths = SourcePaths {
        schools: input.schools.clone(),
        early: input.early.clone(),
        final_: input.final_.clone(),
    };
    let options = ReadOptions {
        delimiter: input.delimiter,
        encoding,
    };
    AnalysisSession::load(&paths, &options, &config)
}

fn emit(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes()).context("Writing to stdout")?;
    stdout.flush().context("Flushing stdout")
}

fn handle_summary(args: &cli::SummaryArgs) -> Result<()> {
    let session = load_session(&args.input)?;
    let spec = args.filter.to_spec();
    let view = session.filter(&spec);
    let report = report::SummaryReport {
        summary: session.summary(&view),
        filter_active: !spec.is_empty(),
        sources: session.reports(),
        bounds: session.bounds(),
    };
    emit(&report.render(args.format)?)
}

fn handle_stats(args: &cli::StatsArgs) -> Result<()> {
    let session = load_session(&args.input)?;
    let view = session.filter(&args.filter.to_spec());
    let fields = if args.fields.is_empty() {
        Variable::value_variants().to_vec()
    } else {
        args.fields.clone()
    };
    info!(
        "Describing {} field(s) over {} school(s)",
        fields.len(),
        view.len()
    );
    let summaries = report::describe_fields(&view, &fields);
    emit(&report::render_stats(&summaries, args.format)?)
}

fn handle_correlate(args: &cli::CorrelateArgs) -> Result<()> {
    let session = load_session(&args.input)?;
    let view = session.filter(&args.filter.to_spec());
    let correlations = stats::analyze_correlations(&view);
    info!(
        "Computed {} correlation(s) over {} school(s)",
        correlations.len(),
        view.len()
    );
    let matrix = if args.matrix {
        stats::correlation_matrix(&view)
    } else {
        None
    };
    let report = report::CorrelationReport {
        correlations: &correlations,
        strongest: stats::strongest(&correlations),
        matrix: matrix.as_ref(),
    };
    emit(&report.render(args.format)?)
}

fn handle_groups(args: &cli::GroupsArgs) -> Result<()> {
    let session = load_session(&args.input)?;
    let view = session.filter(&args.filter.to_spec());
    let report = report::GroupReport {
        bands: groups::group_by_ac_band(&view),
        comparisons: groups::compare_high_low_ac(&view),
    };
    info!(
        "{} AC band(s), {} high/low comparison(s)",
        report.bands.len(),
        report.comparisons.len()
    );
    emit(&report.render(args.format)?)
}

fn handle_aliases(args: &cli::AliasesArgs) -> Result<()> {
    let config = AliasConfig::default();
    if io_utils::is_dash(&args.output) {
        return emit(&config.to_yaml_string()?);
    }
    config
        .save(&args.output)
        .with_context(|| format!("Writing alias configuration to {:?}", args.output))?;
    info!("Default alias configuration written to {:?}", args.output);
    Ok(())
}
