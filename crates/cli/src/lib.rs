use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use grounder_catalog::{Category, JsonFileLoader};
use grounder_search::{MatchOptions, Resolver, ResolverConfig};
use grounder_vector_store::{EmbeddingProvider, HashingEmbedder};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod report;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "grounder")]
#[command(about = "Ground financial questions in known master-data entities", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for results)
    #[arg(long, global = true)]
    quiet: bool,

    /// Resolver configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip embedding-based matching
    #[arg(long, global = true)]
    no_semantic: bool,

    /// Dimension of the built-in hashing embedder
    #[arg(long, global = true, default_value_t = HashingEmbedder::DEFAULT_DIMENSION)]
    dimension: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one question against a catalog
    Match(MatchArgs),

    /// Resolve every question in a file (one per line, `#` comments)
    Batch(BatchArgs),

    /// Show catalog statistics and the effective stopword list
    Inspect(InspectArgs),
}

#[derive(Args)]
struct MatchArgs {
    /// Master-data export: `{ "<category>": [{"id": .., "name": ..}] }`
    #[arg(long)]
    catalog: PathBuf,

    /// Question to resolve
    query: String,

    /// Number of entities to return
    #[arg(long)]
    top_k: Option<usize>,

    /// Only return entities of this category (repeatable)
    #[arg(long = "category")]
    categories: Vec<Category>,

    /// Output JSON
    #[arg(long)]
    json: bool,

    /// Text layout when not printing JSON
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Args)]
struct BatchArgs {
    #[arg(long)]
    catalog: PathBuf,

    /// File with one question per line
    #[arg(long)]
    queries: PathBuf,

    #[arg(long)]
    top_k: Option<usize>,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct InspectArgs {
    #[arg(long)]
    catalog: PathBuf,

    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Ranked table with scores and sources
    Table,
    /// `id|name|category`
    Lines,
    /// `name (category)`
    Named,
    /// Ready-to-send grounding prompt
    Prompt,
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match &cli.command {
        Commands::Match(args) => run_match(&cli, args).await,
        Commands::Batch(args) => run_batch(&cli, args).await,
        Commands::Inspect(args) => run_inspect(&cli, args).await,
    }
}

async fn build_resolver(cli: &Cli, catalog: &Path) -> Result<Resolver> {
    let mut config = match &cli.config {
        Some(path) => ResolverConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ResolverConfig::default(),
    };
    if cli.no_semantic {
        config.semantic.enabled = false;
    }

    let embedder: Option<Arc<dyn EmbeddingProvider>> = if config.semantic.enabled {
        Some(Arc::new(HashingEmbedder::new(cli.dimension)))
    } else {
        None
    };

    let resolver = Resolver::new(config, embedder).context("Invalid resolver configuration")?;
    let loader = JsonFileLoader::new(catalog);
    resolver
        .reload_from(&loader)
        .await
        .with_context(|| format!("Failed to load catalog from {}", loader.path().display()))?;
    Ok(resolver)
}

async fn run_match(cli: &Cli, args: &MatchArgs) -> Result<()> {
    let resolver = build_resolver(cli, &args.catalog).await?;
    let options = MatchOptions {
        top_k: args.top_k,
        categories: args.categories.clone(),
    };
    let result = resolver.match_with_options(&args.query, &options).await;

    let output = if args.json {
        serde_json::to_string_pretty(&result)?
    } else {
        report::render(&result, args.format)
    };
    print_stdout(&output)
}

async fn run_batch(cli: &Cli, args: &BatchArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.queries)
        .with_context(|| format!("Failed to read queries from {}", args.queries.display()))?;
    let queries: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();

    let resolver = build_resolver(cli, &args.catalog).await?;
    let options = MatchOptions {
        top_k: args.top_k,
        categories: Vec::new(),
    };

    let mut results = Vec::with_capacity(queries.len());
    for query in &queries {
        results.push(resolver.match_with_options(query, &options).await);
    }
    log::info!("Resolved {} queries", results.len());

    let output = if args.json {
        serde_json::to_string_pretty(&results)?
    } else {
        results
            .iter()
            .map(|result| {
                format!(
                    "Query: {}\n{}",
                    result.query,
                    report::render(result, OutputFormat::Table)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    print_stdout(&output)
}

async fn run_inspect(cli: &Cli, args: &InspectArgs) -> Result<()> {
    let resolver = build_resolver(cli, &args.catalog).await?;
    let catalog = resolver.snapshot();
    let stats = catalog.stats();
    let stopwords = catalog.stopwords().effective();

    let output = if args.json {
        serde_json::to_string_pretty(&serde_json::json!({
            "stats": stats,
            "stopwords": stopwords,
        }))?
    } else {
        report::render_stats(&stats, &stopwords)
    };
    print_stdout(&output)
}
