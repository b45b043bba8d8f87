//! litrev - follow literature reviews from the terminal

mod commands;
mod config;
mod form;
mod plain;
mod ui;

use clap::Parser;
use litrev_api::{DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT, ReviewClient};
use litrev_session::{FileStore, SessionStore, StreamSession};
use litrev_tui::ThemeMode;
use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// litrev - literature reviews by a team of research agents
#[derive(Parser, Debug)]
#[command(name = "litrev")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Review service base URL (default: http://localhost:8000)
    #[arg(long)]
    api_url: Option<String>,

    /// Model for new reviews (gpt-4o-mini, gpt-4o, gpt-4-turbo)
    #[arg(short, long)]
    model: Option<String>,

    /// Number of papers to review
    #[arg(short, long)]
    papers: Option<u32>,

    /// Start a review on this topic right away
    #[arg(short, long)]
    topic: Option<String>,

    /// Forget the stored session before starting
    #[arg(long)]
    new: bool,

    /// Disable TUI mode (print messages line by line)
    #[arg(long)]
    no_tui: bool,

    /// Use the light color theme
    #[arg(long)]
    light: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// List reviews known to the service
    #[arg(long)]
    list: bool,

    /// Page size for --list
    #[arg(long, default_value_t = 10)]
    limit: u32,

    /// Offset for --list
    #[arg(long, default_value_t = 0)]
    offset: u32,

    /// Delete a review by ID
    #[arg(long, value_name = "ID")]
    delete: Option<String>,

    /// Check that the service is reachable
    #[arg(long)]
    health: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

/// Set up tracing. The TUI owns the terminal, so it logs to a file.
fn init_logging(verbose: bool, use_tui: bool) {
    let filter = if verbose {
        EnvFilter::new("litrev=debug,litrev_api=debug,litrev_session=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    if !use_tui {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
        return;
    }

    let dir = config::Config::data_dir();
    let file = fs::create_dir_all(&dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("litrev.log"))
    });
    match file {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        Err(e) => eprintln!("Warning: logging disabled: {}", e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Load config file
    let cfg = config::Config::load();

    let one_shot = args.list || args.health || args.delete.is_some();
    let use_tui =
        !one_shot && !args.no_tui && cfg.tui.unwrap_or(true) && io::stdout().is_terminal();
    init_logging(args.verbose, use_tui);

    // Merge config with CLI args (CLI takes precedence)
    let api_url = args
        .api_url
        .or(cfg.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let timeout = cfg
        .request_timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
    let subscribe_delay = Duration::from_millis(cfg.subscribe_delay_ms.unwrap_or(0));

    let client = Arc::new(
        ReviewClient::with_timeout(api_url, timeout)?.with_subscribe_delay(subscribe_delay),
    );

    if args.health {
        println!("{}", commands::health(client.as_ref(), client.base_url()).await?);
        return Ok(());
    }
    if args.list {
        println!(
            "{}",
            commands::list_reviews(client.as_ref(), args.limit, args.offset).await?
        );
        return Ok(());
    }
    if let Some(ref review_id) = args.delete {
        println!("{}", commands::delete_review(client.as_ref(), review_id).await?);
        return Ok(());
    }

    let model = args
        .model
        .or(cfg.model.clone())
        .unwrap_or_else(|| form::DEFAULT_MODEL.to_string());
    if form::model_index(&model).is_none() {
        tracing::warn!("Model {} is not offered by the service UI", model);
    }
    let num_papers = args
        .papers
        .or(cfg.num_papers)
        .unwrap_or(form::DEFAULT_NUM_PAPERS);

    let store: Arc<dyn SessionStore> = Arc::new(FileStore::new(cfg.session_dir()));
    let mut session = StreamSession::new(client.clone(), store.clone());
    if args.new {
        session.clear_session()?;
    }

    // TUI mode
    if use_tui {
        let theme = if args.light {
            ThemeMode::Light
        } else {
            ui::stored_theme(store.as_ref())
                .or_else(|| cfg.theme.as_deref().and_then(|t| t.parse().ok()))
                .unwrap_or_default()
        };
        let options = ui::TuiOptions {
            model,
            num_papers,
            theme,
            topic: args.topic,
        };
        return ui::run_tui(client, &mut session, store, options).await;
    }

    // Line-oriented mode
    let target = match args.topic {
        Some(topic) => plain::Target::Create(
            form::build_request(&topic, &model, num_papers).map_err(anyhow::Error::msg)?,
        ),
        None => plain::Target::Resume,
    };
    let mut stdout = io::stdout().lock();
    plain::run(&mut stdout, client.as_ref(), &mut session, target).await
}
