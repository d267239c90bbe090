use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{parser, InteractionLog, UserId, DEFAULT_HISTORY_LENGTH};
use evaluation::{evaluate_matrix, evaluate_submission, EvaluationReport, DEFAULT_K};
use ranking::{
    ModelKind, RankingConfig, RecommendationContext, RecommendationPage, RecommendationService,
    Session,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// ShelfRecs - Book Recommendation Demo
#[derive(Parser)]
#[command(name = "shelf-recs")]
#[command(about = "Book recommendations from precomputed score matrices", long_about = None)]
struct Cli {
    /// Directory holding score matrices and prediction files
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// JSON ranking config; replaces the --data-dir defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one page of recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Recommender model
        #[arg(long, default_value = "Collaborative Filtering")]
        model: String,

        /// Number of top items already shown
        #[arg(long, default_value = "0")]
        start_pos: usize,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive session: login, switch models, page with "more"
    Browse,

    /// Show a user's most recent interactions
    History {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,

        /// Interaction log, relative to the data directory
        #[arg(long, default_value = "interactions_train.csv")]
        interactions: PathBuf,

        /// Number of interactions to show
        #[arg(long, default_value_t = DEFAULT_HISTORY_LENGTH)]
        limit: usize,
    },

    /// Compute MAP@K of a score matrix or a submission file
    Evaluate {
        /// Held-out interactions (u, i, t columns)
        #[arg(long)]
        test: PathBuf,

        /// Score matrix (.npy) to rank from
        #[arg(long, conflicts_with = "submission", required_unless_present = "submission")]
        matrix: Option<PathBuf>,

        /// Submission CSV (user_id, recommendation)
        #[arg(long)]
        submission: Option<PathBuf>,

        /// Rank cutoff
        #[arg(short, long, default_value_t = DEFAULT_K)]
        k: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Measure ranking latency under concurrent requests
    Benchmark {
        /// Recommender model to query
        #[arg(long, default_value = "Hybrid")]
        model: String,

        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RankingConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RankingConfig::with_data_dir(&cli.data_dir),
    };

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            user_id,
            model,
            start_pos,
            json,
        } => handle_recommend(config, user_id, &model, start_pos, json)?,
        Commands::Browse => handle_browse(config)?,
        Commands::History {
            user_id,
            interactions,
            limit,
        } => handle_history(&config.data_dir.join(interactions), user_id, limit)?,
        Commands::Evaluate {
            test,
            matrix,
            submission,
            k,
            json,
        } => handle_evaluate(&test, matrix.as_deref(), submission.as_deref(), k, json)?,
        Commands::Benchmark {
            model,
            requests,
            concurrent,
        } => handle_benchmark(config, &model, requests, concurrent).await?,
    }

    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(
    config: RankingConfig,
    user_id: UserId,
    model: &str,
    start_pos: usize,
    json: bool,
) -> Result<()> {
    let model: ModelKind = model.parse()?;
    let service = RecommendationService::new(config)?;

    let context = RecommendationContext::new(user_id, model).with_start_pos(start_pos);
    let page = service
        .recommend(&context)
        .with_context(|| format!("Failed to rank items for user {}", user_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        print_page(&page, model);
    }
    Ok(())
}

/// Handle the 'browse' command
///
/// Reads one command per line from stdin until `quit` or end of input.
fn handle_browse(config: RankingConfig) -> Result<()> {
    let service = RecommendationService::new(config)?;
    let mut session = Session::new();

    println!("{}", "Commands: login <id> | model <name> | more | models | logout | quit".dimmed());
    prompt(&session)?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        let (command, argument) = match line.trim().split_once(' ') {
            Some((command, argument)) => (command, argument.trim()),
            None => (line.trim(), ""),
        };

        let show_page = match command {
            "" => false,
            "quit" | "exit" => break,
            "login" => match argument.parse::<UserId>() {
                Ok(user_id) => {
                    session.login(user_id);
                    println!("{} Welcome, User {}!", "✓".green(), user_id);
                    true
                }
                Err(_) => {
                    println!("{} '{}' is not a user ID", "✗".red(), argument);
                    false
                }
            },
            "model" => match argument.parse::<ModelKind>() {
                Ok(model) => {
                    session.select_model(model);
                    session.is_logged_in()
                }
                Err(e) => {
                    println!("{} {}", "✗".red(), e);
                    false
                }
            },
            "more" => match session.show_more(service.page_size()) {
                Ok(_) => true,
                Err(e) => {
                    println!("{} {}", "✗".red(), e);
                    false
                }
            },
            "models" => {
                for model in ModelKind::ALL {
                    let marker = if model == session.model() { "•".green() } else { " ".normal() };
                    println!("{} {}", marker, model);
                }
                false
            }
            "logout" => {
                session.logout();
                println!("Logged out");
                false
            }
            other => {
                println!("{} Unknown command '{}'", "✗".red(), other);
                false
            }
        };

        if show_page {
            match session.context().and_then(|ctx| service.recommend(&ctx)) {
                Ok(page) => print_page(&page, session.model()),
                Err(e) => println!("{} {}", "✗".red(), e),
            }
        }
        prompt(&session)?;
    }
    Ok(())
}

fn prompt(session: &Session) -> Result<()> {
    let label = match session.context() {
        Ok(ctx) => format!(
            "user {} | {} | from {}",
            ctx.user_id.unwrap_or_default(),
            session.model(),
            ctx.start_pos
        ),
        Err(_) => "logged out".to_string(),
    };
    print!("{} ", format!("[{}]>", label).cyan());
    io::stdout().flush()?;
    Ok(())
}

/// Handle the 'history' command
fn handle_history(path: &Path, user_id: UserId, limit: usize) -> Result<()> {
    let log = InteractionLog::load_from_file(path)
        .with_context(|| format!("Failed to load interaction log {}", path.display()))?;

    let history = log.user_history(user_id, limit);
    println!("{}", format!("Recent interactions of User {}:", user_id).bold().blue());
    if history.is_empty() {
        println!("  (none)");
    }
    for interaction in &history {
        println!(
            "  {} {} {}",
            "•".green(),
            format!("item {}", interaction.item_id).bold(),
            interaction.local_time()
        );
    }
    Ok(())
}

/// Handle the 'evaluate' command
fn handle_evaluate(
    test: &Path,
    matrix: Option<&Path>,
    submission: Option<&Path>,
    k: usize,
    json: bool,
) -> Result<()> {
    let start = Instant::now();
    let ground_truth = InteractionLog::load_from_file(test)
        .with_context(|| format!("Failed to load held-out interactions {}", test.display()))?
        .ground_truth();

    let report: EvaluationReport = match (matrix, submission) {
        (Some(path), None) => {
            let scores = parser::parse_score_matrix(path)
                .with_context(|| format!("Failed to load score matrix {}", path.display()))?;
            evaluate_matrix(&ground_truth, &scores, k)
        }
        (None, Some(path)) => {
            let rows = parser::parse_submission(path)
                .with_context(|| format!("Failed to load submission {}", path.display()))?;
            evaluate_submission(&ground_truth, &rows, k)?
        }
        _ => bail!("Pass exactly one of --matrix or --submission"),
    };
    info!("Evaluation finished in {:?}", start.elapsed());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("MAP@{}: {:.4}", report.k, report.map);
        println!(
            "{}",
            format!(
                "{} users scored, {} without predictions",
                report.users_scored, report.users_skipped
            )
            .dimmed()
        );
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    config: RankingConfig,
    model: &str,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 {
        bail!("--requests must be at least 1");
    }
    let model: ModelKind = model.parse()?;
    let service = Arc::new(RecommendationService::new(config)?);

    // Load once up front so timings measure ranking, not file I/O
    let n_users = service.store().load(model)?.n_users() as u32;
    if n_users == 0 {
        bail!("Score matrix for {} has no users", model);
    }
    let page_size = service.page_size();

    let limiter = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall_clock = Instant::now();

    let mut handles = Vec::with_capacity(requests);
    for _ in 0..requests {
        let user_id = rand::random_range(0..n_users);
        let start_pos = rand::random_range(0..5usize) * page_size;
        let service = service.clone();
        let limiter = limiter.clone();

        handles.push(tokio::spawn(async move {
            let _permit = limiter.acquire_owned().await?;
            tokio::task::spawn_blocking(move || {
                let start = Instant::now();
                let context = RecommendationContext::new(user_id, model).with_start_pos(start_pos);
                service.recommend(&context)?;
                Ok::<_, anyhow::Error>(start.elapsed())
            })
            .await?
        }));
    }

    // Wait for all tasks to complete and collect timings
    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let busy: Duration = timings.iter().sum();
    let avg_latency = busy / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];

    println!("{}", "Benchmark results:".bold().blue());
    println!("Model: {}", model);
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!(
        "Throughput: {:.2} requests/second",
        requests as f64 / total_time.as_secs_f64()
    );

    Ok(())
}

/// Helper function to format and print a page
fn print_page(page: &RecommendationPage, model: ModelKind) {
    println!(
        "{}",
        format!("Recommendations for User {} ({})", page.user_id, model)
            .bold()
            .blue()
    );
    if page.is_empty() {
        println!("  No more recommendations.");
        return;
    }
    for (offset, item_id) in page.items.iter().enumerate() {
        let rank = page.start_pos + offset + 1;
        println!("{}. Book #{}", rank.to_string().green(), item_id);
    }
}
