//! Webscribe - LLM-powered web research pipeline
//!
//! Plans search queries for a topic, fetches matching pages under a fixed
//! concurrency ceiling and summarizes them with a language model. The same
//! pipeline can be served as an MCP `research` tool over stdio.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (invalid arguments, config, model, search, report write)

mod analysis;
mod cli;
mod config;
mod error;
mod fetch;
mod llm;
mod models;
mod pipeline;
mod report;
mod search;
mod server;

use analysis::{format_bytes, CorpusStats};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, OutputFormat, CONFIG_FILE_NAME};
use fetch::HttpPageFetcher;
use indicatif::{ProgressBar, ProgressStyle};
use llm::tool_schema::to_gemini_tool;
use llm::LanguageModel;
use models::{ReportMetadata, ResearchReport, WorkflowStage};
use pipeline::{ResearchWorkflow, WorkflowSettings};
use search::DuckDuckGoSearch;
use server::ResearchServer;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handled before logging is set up
    if args.init_config {
        return handle_init_config();
    }
    if args.list_tools {
        return handle_list_tools();
    }

    init_logging(&args)?;

    info!("Webscribe v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let outcome = if args.serve {
        run_server(&args).await
    } else {
        run_research(&args).await
    };

    if let Err(e) = outcome {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .webscribe.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the model, search, fetch and report settings.");
    Ok(())
}

/// Handle --list-tools: read the advertised MCP tools back and print them
/// as Gemini function declarations.
fn handle_list_tools() -> Result<()> {
    let tools: Vec<_> = server::list_tools().iter().map(to_gemini_tool).collect();

    let json = serde_json::to_string_pretty(&tools).context("Failed to serialize tools")?;
    println!("{}", json);
    Ok(())
}

/// Initialize logging. Logs always go to stderr so stdout stays usable
/// for the MCP channel.
fn init_logging(args: &Args) -> Result<()> {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        Config::load(config_path)?
    } else {
        match Config::load_default() {
            Ok(Some(config)) => {
                info!("Loaded default config from {}", CONFIG_FILE_NAME);
                config
            }
            Ok(None) => {
                debug!("No config file found, using defaults");
                Config::default()
            }
            Err(e) => {
                warn!("Failed to load config: {:#}", e);
                Config::default()
            }
        }
    };

    config.merge_with_args(args);
    Ok(config)
}

/// Build the model client and a workflow wired to the real collaborators.
fn build_workflow(config: &Config) -> Result<(Arc<dyn LanguageModel>, ResearchWorkflow)> {
    let model = llm::build_model(&config.model)?;
    let search = Arc::new(DuckDuckGoSearch::new(
        &config.search,
        &config.fetch.user_agent,
    )?);
    let fetcher = Arc::new(HttpPageFetcher::new(&config.fetch)?);

    let workflow = ResearchWorkflow::new(
        model.clone(),
        search,
        fetcher,
        WorkflowSettings::from(config),
    );
    Ok((model, workflow))
}

/// Serve the pipeline as an MCP tool on stdio.
async fn run_server(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    info!("Model: {}", config.model.label());

    let (model, workflow) = build_workflow(&config)?;
    server::serve_stdio(ResearchServer::new(Arc::new(workflow), model)).await
}

/// Research a topic from the command line and write the report.
async fn run_research(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let config = load_config(args)?;
    let topic = args.topic().trim().to_string();

    let (_, workflow) = build_workflow(&config)?;

    if !args.quiet {
        println!("🔎 Researching: {}", topic);
        println!("   Model: {}", config.model.label());
        println!(
            "   Fetch: {} concurrent, {}s timeout",
            config.fetch.concurrency, config.fetch.timeout_seconds
        );
    }

    if args.dry_run {
        return handle_dry_run(&workflow, &topic).await;
    }

    let spinner = stage_spinner(args.quiet);
    let run = workflow
        .run_observed(&topic, &|stage, state| {
            let message = match stage {
                WorkflowStage::Start => "Planning search queries...".to_string(),
                WorkflowStage::Planned => {
                    format!("Researching {} queries...", state.plan.len())
                }
                WorkflowStage::Researched => {
                    format!("Summarizing {} pages...", state.research_data.len())
                }
                WorkflowStage::Summarized | WorkflowStage::End => "Finishing...".to_string(),
            };
            spinner.set_message(message);
        })
        .await;
    spinner.finish_and_clear();
    let run = run?;

    let stats = CorpusStats::from_records(&run.state.research_data);
    let duration = start_time.elapsed().as_secs_f64();

    let metadata = ReportMetadata {
        topic: topic.clone(),
        generated_at: Utc::now(),
        model_used: config.model.label(),
        queries: run.state.plan.len(),
        sources: stats.records,
        failed_fetches: run.failures.len(),
        corpus_bytes: stats.total_bytes,
        duration_seconds: duration,
    };
    let report = ResearchReport::from_state(
        &run.state,
        &run.failures,
        metadata,
        config.report.include_content,
    );

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, config.report.include_sources)
        }
    };

    let output_path = Path::new(&config.general.output);
    report::write_report(&output, output_path)?;

    if !args.quiet {
        println!("\n📊 Research Summary:");
        println!("   Queries: {}", report.metadata.queries);
        println!(
            "   Sources: {} from {} domains ({})",
            stats.records,
            stats.domain_count(),
            format_bytes(stats.total_bytes)
        );
        if !run.failures.is_empty() {
            println!("   Failed fetches: {}", run.failures.len());
        }
        println!("   Duration: {:.1}s", duration);
        println!(
            "\n✅ Research complete! Report saved to: {}",
            output_path.display()
        );
    }

    Ok(())
}

/// Handle --dry-run: plan and search, print what would be fetched, exit.
async fn handle_dry_run(workflow: &ResearchWorkflow, topic: &str) -> Result<()> {
    println!("\n🔍 Dry run: planning and searching (no fetches, no summary)...\n");

    let preview = workflow.preview(topic).await?;

    if preview.plan.is_empty() {
        println!("   The planner produced no search queries.");
    } else {
        for query in &preview.plan {
            println!("   🔸 {}", query);
            for request in preview.requests.iter().filter(|r| &r.query == query) {
                println!("      📄 {} ({})", request.hit.title, request.hit.href);
            }
        }
        println!(
            "\n   Total: {} queries, {} pages would be fetched",
            preview.plan.len(),
            preview.requests.len()
        );
    }

    println!("\n✅ Dry run complete. No pages were fetched.");
    Ok(())
}

/// Spinner shown while the pipeline runs. Hidden in quiet mode.
fn stage_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
