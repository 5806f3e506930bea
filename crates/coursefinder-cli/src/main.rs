mod config;

use clap::{Args, Parser, Subcommand};
use config::CourseFinderConfig;
use coursefinder_gateway::GatewayServer;
use coursefinder_retrieval::{
    CourseSearch, EmbeddingProvider, EmbeddingStore, RawCatalog, SearchParams, SearchResponse,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coursefinder", about = "Course catalog similarity search")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "coursefinder.toml")]
    config: PathBuf,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Rank courses against free text
    Search {
        query: String,
        #[command(flatten)]
        options: SearchOptions,
    },
    /// Rank courses against an existing course
    Similar {
        course_id: String,
        #[command(flatten)]
        options: SearchOptions,
    },
    /// Rank individual learning objectives against free text
    Objectives {
        query: String,
        #[command(flatten)]
        options: SearchOptions,
    },
    /// Load the catalog, embed it and report its size
    Check,
}

#[derive(Args)]
struct SearchOptions {
    /// Number of results (non-positive returns nothing)
    #[arg(long, allow_hyphen_values = true)]
    top_k: Option<i64>,
    /// dense, sparse or hybrid
    #[arg(long)]
    mode: Option<String>,
    /// Dense weight for hybrid mode, in [0, 1]
    #[arg(long)]
    alpha: Option<f32>,
}

impl From<SearchOptions> for SearchParams {
    fn from(options: SearchOptions) -> Self {
        Self {
            top_k: options.top_k,
            mode: options.mode,
            alpha: options.alpha,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = CourseFinderConfig::load(&cli.config).await?;
    let search = Arc::new(build_search(&config).await?);

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("Starting coursefinder API on {}", addr);
            GatewayServer::serve(listener, search).await?;
        }
        Commands::Search { query, options } => {
            let request = search.request(&options.into())?;
            print_response(&search.search_courses(&query, &request).await?)?;
        }
        Commands::Similar { course_id, options } => {
            let request = search.request(&options.into())?;
            print_response(&search.similar_courses(&course_id, &request)?)?;
        }
        Commands::Objectives { query, options } => {
            let request = search.request(&options.into())?;
            print_response(&search.search_objectives(&query, &request).await?)?;
        }
        Commands::Check => {
            let store = search.store();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "catalog": config.catalog_path,
                    "courses": store.len(),
                    "objectives": store.objective_count(),
                    "dimension": store.dimension(),
                }))?
            );
        }
    }

    Ok(())
}

async fn build_search(config: &CourseFinderConfig) -> anyhow::Result<CourseSearch> {
    let embedder: Arc<dyn EmbeddingProvider> = config.embedding.build()?;
    info!(
        provider = ?config.embedding.provider,
        dimension = embedder.dimension(),
        "Embedding provider ready"
    );

    let catalog = RawCatalog::from_path(&config.catalog_path).await?;
    let store = EmbeddingStore::load(catalog, embedder.as_ref()).await?;

    Ok(CourseSearch::with_bm25(Arc::new(store), embedder).with_defaults(config.search.clone()))
}

fn print_response(response: &SearchResponse) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}
