//! Rate My Next CLI - Command-line interface for Rate My Next
//!
//! Scores Next.js repositories on GitHub and shows the stored leaderboard

use clap::{Parser, Subcommand};
use ratemynext_core::{
    config_error, init_logging, log_operation_error, log_operation_start, log_operation_success,
    AnalysisResponse, ErrorContext, LoggingConfig, RateConfig, RateError, RateResult, RepoData,
};
use ratemynext_engine::Engine;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "ratemynext")]
#[command(about = "Score Next.js repositories by size and modern feature usage")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a repository and record its score
    Analyze {
        /// GitHub URL, optionally pointing at an app directory
        url: String,

        /// Access token for private repositories
        #[arg(short, long)]
        token: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the stored result for a repository without fetching
    Show {
        /// GitHub URL, optionally pointing at an app directory
        url: String,
    },

    /// Show the highest scoring repositories
    Leaderboard {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() -> RateResult<()> {
    let cli = Cli::parse();

    let logging_config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };

    init_logging(&logging_config).map_err(|e| RateError::Config {
        message: format!("Failed to initialize logging: {}", e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check logging configuration"),
    })?;

    info!("Starting Rate My Next CLI v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Analyze { url, token, json } => {
            let mut config = load_config(cli.config.as_ref())?;
            if token.is_some() {
                config.github.token = token;
            }
            handle_analyze(&url, json, &config).await?;
        }
        Commands::Show { url } => {
            let config = load_config(cli.config.as_ref())?;
            handle_show(&url, &config).await?;
        }
        Commands::Leaderboard { limit } => {
            let config = load_config(cli.config.as_ref())?;
            handle_leaderboard(limit, &config).await?;
        }
        Commands::Config {
            show,
            init,
            validate,
        } => {
            handle_config(cli.config.as_ref(), show, init, validate)?;
        }
    }

    Ok(())
}

fn load_config(config_path: Option<&PathBuf>) -> RateResult<RateConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return RateConfig::from_file(path);
    }

    let default_paths = [
        dirs::config_dir().map(|d| d.join("ratemynext").join("config.toml")),
        dirs::home_dir().map(|d| d.join(".ratemynext").join("config.toml")),
        Some(PathBuf::from("ratemynext.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            return RateConfig::from_file(path);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(RateConfig::default())
}

fn default_config_path() -> RateResult<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
        .map(|d| d.join("ratemynext").join("config.toml"))
        .ok_or_else(|| config_error!("Could not determine a configuration directory", "cli"))
}

fn to_json(value: &impl serde::Serialize) -> RateResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| config_error!(format!("Failed to serialize output: {}", e), "cli"))
}

async fn handle_analyze(url: &str, json: bool, config: &RateConfig) -> RateResult<()> {
    log_operation_start!("analyze_repository", url = %url);

    let engine = Engine::from_config(config).await?;

    if json {
        let response = engine.respond(url).await;
        println!("{}", to_json(&response)?);
        if let AnalysisResponse::Error { error, .. } = response {
            log_operation_error!("analyze_repository", error.user_message(), url = %url);
        }
        return Ok(());
    }

    match engine.analyze(url).await {
        Ok(data) => {
            print_result(&data);
            log_operation_success!("analyze_repository", url = %url, score = data.stats.score);
            Ok(())
        }
        Err(e) => {
            let e = e.into_analysis_error();
            println!("❌ {}", e.user_message());
            log_operation_error!("analyze_repository", e, url = %url);
            Err(e)
        }
    }
}

async fn handle_show(url: &str, config: &RateConfig) -> RateResult<()> {
    let engine = Engine::from_config(config).await?;

    match engine.lookup(url).await? {
        Some(data) => print_result(&data),
        None => println!(
            "No stored result for {}. Run 'ratemynext analyze {}' first.",
            url, url
        ),
    }
    Ok(())
}

async fn handle_leaderboard(limit: usize, config: &RateConfig) -> RateResult<()> {
    let engine = Engine::from_config(config).await?;
    let entries = engine.leaderboard(limit).await?;

    if entries.is_empty() {
        println!("The leaderboard is empty.");
        return Ok(());
    }

    println!("🏆 Top {} repositories", entries.len());
    for (rank, entry) in entries.iter().enumerate() {
        let name = match &entry.info {
            Some(info) => match &info.sub_path {
                Some(sub_path) => format!("{}/{} ({})", info.owner, info.repo, sub_path),
                None => format!("{}/{}", info.owner, info.repo),
            },
            None => entry.key.to_string(),
        };
        println!("{:>3}. {:<50} {:>8}", rank + 1, name, entry.score);
    }
    Ok(())
}

fn handle_config(
    config_path: Option<&PathBuf>,
    show: bool,
    init: bool,
    validate: bool,
) -> RateResult<()> {
    if init {
        let path = match config_path {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                config_error!(format!("Failed to create config directory: {}", e), "cli")
            })?;
        }

        RateConfig::default().save_to_file(&path)?;
        println!("✅ Configuration initialized at: {:?}", path);
        println!("📝 Set github.token or GITHUB_TOKEN to analyze private repositories.");
    }

    if show {
        let config = load_config(config_path)?;
        let content = toml::to_string_pretty(&config.redacted())
            .map_err(|e| config_error!(format!("Failed to serialize config: {}", e), "cli"))?;
        println!("📋 Current configuration:");
        println!("{}", content);
    }

    if validate {
        let config = load_config(config_path)?;
        match config.validate() {
            Ok(()) => println!("✅ Configuration is valid"),
            Err(e) => {
                println!("❌ Configuration validation failed: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}

fn print_result(data: &RepoData) {
    let info = &data.info;
    let stats = &data.stats;
    let check = |enabled: bool| if enabled { "✅" } else { "❌" };

    match &info.sub_path {
        Some(sub_path) => println!("📦 {}/{} ({})", info.owner, info.repo, sub_path),
        None => println!("📦 {}/{}", info.owner, info.repo),
    }
    println!("🏅 Score: {}", stats.score);
    println!("📄 Pages: {}", stats.pages);
    println!("🧩 Components: {}", stats.components);
    println!("🔌 API routes: {}", stats.api_routes);
    println!("📁 Files: {}", stats.total_files);
    println!(
        "⚡ Turbo: {}  🎨 Tailwind: {}  🧪 PPR: {}",
        check(stats.is_turbo),
        check(stats.is_tailwind),
        check(stats.is_ppr)
    );
    println!("🕒 Updated: {}", info.updated_at.to_rfc3339());
}
