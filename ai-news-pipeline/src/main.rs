use ai_news_pipeline::server::{self, AppState};
use ai_news_pipeline::{CacheStore, Cohort, NewsPipeline, PipelineConfig, PostgresCacheStore, ResultOrigin};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "ai-news", about = "AI news classified by generation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the news endpoint over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: SocketAddr,
    },
    /// Run the pipeline once and print the result
    Fetch {
        /// gen-z, millennials, gen-x or boomers
        #[arg(long, short)]
        generation: Cohort,
    },
    /// Create the cache table
    InitDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env().context("failed to load configuration")?;

    let store = PostgresCacheStore::new(&config.database_url)
        .await
        .context("failed to connect to the cache database")?;

    match cli.command {
        Command::InitDb => {
            store.setup_schema().await?;
            info!("Database initialised");
        }
        Command::Serve { bind } => {
            let store: Arc<dyn CacheStore> = Arc::new(store);
            let pipeline = NewsPipeline::from_config(&config, store)?;
            server::serve(bind, AppState { pipeline }).await?;
        }
        Command::Fetch { generation } => {
            let store: Arc<dyn CacheStore> = Arc::new(store);
            let pipeline = NewsPipeline::from_config(&config, store)?;
            let outcome = pipeline.run(generation).await?;

            let origin = match outcome.origin {
                ResultOrigin::Cache => "cached",
                ResultOrigin::Fresh => "fresh",
            };
            println!(
                "{} ({}) - {} {} articles",
                generation.label(),
                generation.age_range(),
                outcome.articles.len(),
                origin
            );
            for article in &outcome.articles {
                let marker = if article.is_relevant_to(generation) { "*" } else { " " };
                println!("{} {} [{}]\n    {}", marker, article.title, article.source, article.url);
            }
        }
    }

    Ok(())
}
