use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use duo_chat::application::messaging::{Input, InputParser};
use duo_chat::application::services::{ChatClient, PendingSends};
use duo_chat::domain::entities::AccountList;
use duo_chat::domain::traits::DocumentStore;
use duo_chat::infrastructure::adapters::console::{ConsoleInput, ConsoleView};
use duo_chat::infrastructure::config::{Config, StoreBackend};
use duo_chat::infrastructure::storage;

type ConsoleClient = ChatClient<dyn DocumentStore, ConsoleView>;

const HELP: &str = "Commands:\n  /help   - Show this message\n  /whoami - Show the signed-in user\n  /quit   - Leave the chat";

#[derive(Parser)]
#[command(name = "duo-chat")]
#[command(about = "A two-account realtime chat client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "duo-chat.yaml")]
    config: String,

    /// Directory for the JSON file store (overrides config)
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Message collection name (overrides config)
    #[arg(long)]
    collection: Option<String>,

    /// Append feed updates instead of redrawing the screen
    #[arg(long)]
    no_redraw: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and chat
    Run,
    /// List the accounts that can sign in
    Accounts,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Logs go to stderr so they don't tear the feed on stdout
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            run_chat(&cli);
        }
        Commands::Accounts => {
            for (i, name) in AccountList::builtin().names().iter().enumerate() {
                println!("{}) {}", i + 1, name);
            }
        }
        Commands::Version => {
            println!("duo-chat v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn load_config(cli: &Cli) -> Config {
    let mut config = if Path::new(&cli.config).exists() {
        Config::load(&cli.config)
            .map(Config::with_env)
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Config::load_env()
            })
    } else {
        Config::load_env()
    };

    if let Some(dir) = &cli.store {
        config.store.backend = StoreBackend::JsonFile;
        config.store.path = Some(dir.clone());
    }
    if let Some(collection) = &cli.collection {
        config.store.collection = collection.clone();
    }

    config
}

fn run_chat(cli: &Cli) {
    let config = load_config(cli);
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(2);
    }

    let store = match storage::open_store(&config.store) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to open store: {}", e);
            std::process::exit(2);
        }
    };
    let view = Arc::new(ConsoleView::new().with_redraw(!cli.no_redraw));
    let console = Arc::clone(&view);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting {}", config.app.name);

    rt.block_on(async {
        let mut client: ConsoleClient =
            ChatClient::new(AccountList::builtin(), store, view, config.feed_settings());
        let mut input = ConsoleInput::new();

        if !login_loop(&mut client, &mut input).await {
            return;
        }
        let pending = chat_loop(&client, &console, &mut input).await;
        // Let in-flight inserts land before the runtime goes away
        pending.wait_all().await;
        client.shutdown();
    });
}

/// Ask for an account and password until sign-in succeeds. False on EOF.
async fn login_loop(client: &mut ConsoleClient, input: &mut ConsoleInput) -> bool {
    client.show_accounts();

    loop {
        let Some(choice) = input.read_line("account (name or number, blank to keep)> ").await else {
            return false;
        };
        let choice = choice.trim();
        if !choice.is_empty() {
            let name = client
                .accounts()
                .resolve(choice)
                .unwrap_or(choice)
                .to_string();
            if client.select_account(&name).is_err() {
                continue;
            }
        }

        let Some(password) = input.read_line("password> ").await else {
            return false;
        };
        match client.login(&password).await {
            Ok(()) => return true,
            Err(e) => tracing::debug!("Login rejected: {}", e),
        }
    }
}

/// Read chat input until /quit or EOF. Returns the sends still in flight.
async fn chat_loop(
    client: &ConsoleClient,
    console: &ConsoleView,
    input: &mut ConsoleInput,
) -> PendingSends {
    let parser = InputParser::default();
    let mut pending = PendingSends::new();

    // The view prints the prompt after each redraw
    while let Some(line) = input.read_line("").await {
        match parser.parse(&line) {
            Input::Empty => {}
            Input::Text(text) => pending.push(client.send(&text)),
            Input::Command { name, .. } => match name.as_str() {
                "quit" | "exit" => break,
                "help" => console.notice(HELP),
                "whoami" => {
                    console.notice(client.session().username().unwrap_or("(not signed in)"))
                }
                other => console.notice(&format!("Unknown command: {}{}", parser.prefix(), other)),
            },
        }
    }

    pending
}

fn init_config() {
    match Config::default().to_yaml() {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to duo-chat.yaml and adjust as needed.");
        }
        Err(e) => eprintln!("Failed to render config: {}", e),
    }
}
