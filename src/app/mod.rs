use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::aeronet::translate;
use crate::config::AppConfig;
use crate::cql2::{self, FilterLang};
use crate::sql::{select_statement, to_sql_where};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Translate a filter into an AERONET web service request
    Search(SearchArgs),
    /// Translate a filter into a SQL query over an archived GeoParquet file
    Query(QueryArgs),
}

#[derive(Args)]
pub struct FilterArgs {
    /// Filter on queryables, in the language given by --filter-lang
    #[arg(long)]
    pub filter: String,

    /// Filter language used by --filter
    #[arg(long, value_enum, default_value = "cql2-json")]
    pub filter_lang: FilterLang,
}

#[derive(Args)]
pub struct SearchArgs {
    /// AERONET service base URL (default: from config)
    #[arg(env = "AERONET_API_BASE_URL")]
    pub url: Option<String>,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Site list file used to validate `site` values
    #[arg(long)]
    pub site_list: Option<PathBuf>,

    /// Only print the browse URL
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct QueryArgs {
    /// GeoParquet file to query
    pub file: PathBuf,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Run the selected command and return what it prints.
pub fn run(cli: &Cli) -> Result<String> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Search(args) => {
            if let Some(site_list) = &args.site_list {
                config.site_list = Some(site_list.clone());
            }
            run_search(args, &config)
        }
        Command::Query(args) => run_query(args, &config),
    }
}

pub fn run_search(args: &SearchArgs, config: &AppConfig) -> Result<String> {
    let vocabulary = config.vocabulary()?;
    tracing::info!("Vocabulary: {} sites", vocabulary.sites().len());

    let translation = translate(
        &args.filter.filter,
        args.filter.filter_lang,
        config.attribute_map(),
        &vocabulary,
    )
    .context("Translate: Failed to translate filter")?;

    let base_url = args.url.as_deref().unwrap_or(&config.base_url);
    let url = translation.url(base_url, &config.endpoint);
    tracing::info!(
        "Translated filter into {} parameters",
        translation.parameters.len()
    );

    if args.dry_run {
        tracing::info!("You can browse data on: {}", url);
        return Ok(url);
    }

    let output = serde_json::json!({
        "url": url,
        "query": translation.query,
        "parameters": translation.parameters,
    });
    serde_json::to_string_pretty(&output).context("CLI: Failed to serialize request")
}

pub fn run_query(args: &QueryArgs, config: &AppConfig) -> Result<String> {
    let root = cql2::parse(&args.filter.filter, args.filter.filter_lang)
        .context("Translate: Failed to parse filter")?;
    let where_clause = to_sql_where(&root, config.attribute_map())
        .context("Translate: Failed to build SQL predicate")?;

    let file = absolute_path(&args.file)?;
    let statement = select_statement(&file, &where_clause);
    tracing::info!("Filtering {:?} with `{}`", file, statement);
    Ok(statement)
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("CLI: Failed to resolve {:?}", path))
}
