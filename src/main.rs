// SPDX-License-Identifier: MIT

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use stepflow_rs::adk::model::openai::OpenAIModel;
use stepflow_rs::adk::model::Model;
use stepflow_rs::stepflow::agents::{api_test, deep_research, web_summary};
use stepflow_rs::stepflow::config::Settings;
use stepflow_rs::stepflow::graph::{write_diagram, CompiledGraph};
use stepflow_rs::stepflow::http::HttpRequester;
use stepflow_rs::stepflow::openapi::reduce_openapi_spec;
use stepflow_rs::stepflow::registry::ToolRegistry;
use stepflow_rs::stepflow::state::WorkflowState;
use stepflow_rs::stepflow::tools::{BraveSearchTool, WebScrapeTool, WriteFileTool};

const MODEL_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional YAML settings file; environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Plan and execute one request per endpoint of an OpenAPI document
    ApiTest {
        /// Path to the OpenAPI document (YAML or JSON)
        #[arg(short, long, default_value = "openapi.yaml")]
        spec: PathBuf,

        /// Only test operations carrying this tag
        #[arg(short, long, default_value = "banner")]
        tag: Vec<String>,

        /// Server environment to test against
        #[arg(short, long, default_value = "stg")]
        env: String,

        /// Bearer token for the API under test
        #[arg(long)]
        token: Option<String>,
    },
    /// Research a topic with repeated web searches
    Research {
        #[arg(short, long, default_value = "kubernetes")]
        topic: String,

        /// Searches after the first one
        #[arg(short, long, default_value_t = 2)]
        max_loops: u32,
    },
    /// Search, scrape and summarize a question into a markdown file
    WebSummary {
        #[arg(short, long)]
        query: String,
    },
}

fn model(settings: &Settings, name: &str) -> anyhow::Result<Arc<dyn Model>> {
    let model = OpenAIModel::new(
        name,
        settings.openai_api_key.clone(),
        settings.openai_base_url.as_str(),
        MODEL_TIMEOUT,
    )?;
    Ok(Arc::new(model))
}

async fn tools(settings: &Settings) -> anyhow::Result<ToolRegistry> {
    let registry = ToolRegistry::new();
    match settings.require_brave_api_key() {
        Ok(key) => {
            let search = BraveSearchTool::new(key, settings.http_timeout())?;
            registry.register(Arc::new(search)).await;
        }
        Err(e) => log::warn!("Web search disabled: {}", e),
    }
    registry
        .register(Arc::new(WebScrapeTool::new(settings.http_timeout())?))
        .await;
    registry
        .register(Arc::new(WriteFileTool::new(settings.output_dir.clone())))
        .await;
    Ok(registry)
}

async fn run(graph: &CompiledGraph, initial: WorkflowState) -> anyhow::Result<()> {
    write_diagram(format!("{}.mmd", graph.name()), graph);

    let mut run = graph.stream(initial);
    while let Some(event) = run.next().await {
        let event = event?;
        println!("{}: {}", event.step, event.update);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref()).context("loading settings")?;
    let planner = model(&settings, &settings.planner_model)?;
    let summarizer = model(&settings, &settings.summary_model)?;

    match args.command {
        Commands::ApiTest {
            spec,
            tag,
            env,
            token,
        } => {
            let reduced = reduce_openapi_spec(&spec, &env, &tag, true)
                .with_context(|| format!("reducing {}", spec.display()))?;
            if reduced.endpoints.is_empty() {
                println!("No endpoints to test for tags {:?}", tag);
                return Ok(());
            }
            log::info!("Testing {} endpoints", reduced.endpoints.len());

            let requester = Arc::new(HttpRequester::new(settings.http_timeout(), token.clone())?);
            let graph = api_test::build_graph(planner, summarizer, requester)?;
            let initial = WorkflowState::from_record(&api_test::ApiTestState::new(reduced, token))?;
            run(&graph, initial).await?;
        }
        Commands::Research { topic, max_loops } => {
            let registry = tools(&settings).await?;
            let graph = deep_research::build_graph(planner, summarizer, &registry).await?;
            let initial = WorkflowState::from_record(&deep_research::DeepResearchState::new(
                topic, max_loops,
            ))?;
            run(&graph, initial).await?;
        }
        Commands::WebSummary { query } => {
            let registry = tools(&settings).await?;
            let graph = web_summary::build_graph(planner, summarizer, &registry).await?;
            let initial =
                WorkflowState::from_record(&web_summary::WebSummaryState::new(query))?;
            run(&graph, initial).await?;
        }
    }

    Ok(())
}
