use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use clipdna_core::{
    ChatCompletionsModel, EXAMPLE_URL, LogEntry, LogListener, Orchestrator, PipelineConfig,
    Provider, Severity, format_result_readable,
};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::Level;

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
        }
    }
}

#[derive(Parser)]
#[command(name = "clipdna")]
#[command(about = "Extract a TikTok video's metadata and generate an AI prompt to recreate its style")]
struct Cli {
    /// TikTok video URL
    #[arg(required_unless_present = "example")]
    url: Option<String>,

    /// Use a sample TikTok URL instead of one from the command line
    #[arg(long, conflicts_with = "url")]
    example: bool,

    /// AI provider for the analysis
    #[arg(short, long, default_value = "gemini")]
    provider: CliProvider,

    /// Override the provider's default model
    #[arg(short, long)]
    model: Option<String>,

    /// Relay base URL, repeatable; replaces the built-in relay list
    #[arg(long = "relay", value_name = "BASE")]
    relays: Vec<String>,

    /// Print the video record and analysis as JSON
    #[arg(long)]
    json: bool,

    /// Show diagnostic logs on stderr, including each failed relay attempt
    #[arg(short, long)]
    verbose: bool,
}

/// Failed relay attempts log at WARN, so they only show with --verbose.
fn log_level(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::ERROR }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn render_entry(entry: &LogEntry) -> String {
    let clock = style(format!("[{}]", entry.clock())).dim();
    let (mark, message) = match entry.severity {
        Severity::Info => (style(" "), style(entry.message.as_str())),
        Severity::Success => (
            style("✓").green().bold(),
            style(entry.message.as_str()).green(),
        ),
        Severity::Warning => (
            style("!").yellow().bold(),
            style(entry.message.as_str()).yellow(),
        ),
        Severity::Error => (style("✗").red().bold(), style(entry.message.as_str()).red()),
    };
    format!("{} {} {}", clock, mark, message)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(log_level(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    let provider: Provider = cli.provider.into();

    // Validate API key early
    let model = match ChatCompletionsModel::for_provider(&provider, cli.model) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    let url = match cli.url {
        Some(url) if !cli.example => url,
        _ => EXAMPLE_URL.to_string(),
    };

    println!(
        "\n{}  {}\n",
        style("clipdna").cyan().bold(),
        style("TikTok Clone Engine").dim()
    );
    println!("{}", style("─".repeat(60)).dim());

    let spinner = create_spinner("Starting...");
    let listener_spinner = spinner.clone();
    let listener: LogListener = Arc::new(move |entry: &LogEntry| {
        listener_spinner.println(render_entry(entry));
        listener_spinner.set_message(entry.message.clone());
    });

    let config = PipelineConfig::default().with_relays(cli.relays);
    let orchestrator = Orchestrator::from_config(&config, Arc::new(model), Some(listener));

    let started = Instant::now();
    let outcome = orchestrator.submit(&url).await;
    spinner.finish_and_clear();

    let (video, analysis) = match outcome {
        Ok(result) => result,
        Err(e) => {
            eprintln!("\n{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(started.elapsed())).cyan().bold()
    );
    println!("{}", style("─".repeat(60)).dim());

    if cli.json {
        let output = serde_json::json!({
            "video": video,
            "analysis": analysis,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", format_result_readable(&video, &analysis));
    }

    Ok(())
}
