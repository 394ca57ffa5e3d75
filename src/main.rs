//! filter_predicates - compile a JSON filter into SQL predicates for a catalog entity

use anyhow::{bail, Context, Result};
use clap::Parser as ClapParser;
use filter_predicates::catalog::Catalog;
use filter_predicates::expression::Expression;
use filter_predicates::filter::FilterMapping;
use filter_predicates::predicate_builder::{BuilderConfig, NestedArrayPolicy, PredicateBuilder};
use log::info;
use std::path::PathBuf;

/// Compile a JSON filter mapping into the predicates of a WHERE clause
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Catalog document describing entities, columns and associations
    #[arg(short, long)]
    schema: PathBuf,

    /// Entity the filter applies to
    #[arg(short, long)]
    entity: String,

    /// Filter as an inline JSON object
    #[arg(short, long, conflicts_with = "filter_file")]
    filter: Option<String>,

    /// Read the filter from a file instead
    #[arg(short = 'F', long)]
    filter_file: Option<PathBuf>,

    /// Builder configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fail on nested arrays instead of flattening them
    #[arg(long)]
    reject_nested_arrays: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let catalog = Catalog::load(&args.schema).context("Failed to load catalog")?;
    info!(
        "loaded {} entities from {}",
        catalog.list_entities().len(),
        args.schema.display()
    );

    let mut config = match &args.config {
        Some(path) => BuilderConfig::load(path)?,
        None => BuilderConfig::default(),
    };
    if args.reject_nested_arrays {
        config.nested_array_policy = NestedArrayPolicy::Reject;
    }

    let json = match (&args.filter, &args.filter_file) {
        (Some(inline), None) => inline.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read filter {}", path.display()))?,
        _ => bail!("Pass exactly one of --filter or --filter-file"),
    };
    let filter = FilterMapping::from_json_str(&json)?;

    let builder = PredicateBuilder::for_entity(&catalog, &args.entity)
        .context("Failed to create predicate builder")?
        .with_config(config);
    let predicates = builder
        .build_from_hash(&filter)
        .context("Failed to compile filter")?;

    for predicate in &predicates {
        println!("{}", predicate);
    }
    println!();
    println!("WHERE {}", Expression::conjunction(predicates));

    let references = PredicateBuilder::references(&filter);
    if !references.is_empty() {
        let names: Vec<_> = references.into_iter().collect();
        println!("-- joins: {}", names.join(", "));
    }

    Ok(())
}
