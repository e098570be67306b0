use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nftvoice_core::{
    ChatClient, Config, Controller, ControllerOptions, Language, NftApiClient, Session,
};
use std::fs::{self, File};
use std::sync::Mutex;
use tracing::info;

mod app;
mod handler;
mod input;
mod speech;
mod tui;
mod ui;

use app::App;
use speech::{KeyboardRecognizer, TerminalSynthesizer};
use tui::{AppEvent, EventHandler};

#[derive(Parser)]
#[command(name = "nftvoice")]
#[command(about = "Talk to your NFTs by voice")]
#[command(version)]
struct Cli {
    /// Base URL of the NFT API (overrides config and NFTVOICE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Conversation language tag (en-US or es-ES)
    #[arg(short, long, global = true)]
    language: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the voice chat interface
    Chat {
        #[arg(long)]
        chain: Option<String>,
        #[arg(long)]
        contract: Option<String>,
    },
    /// List supported chains
    Chains,
    /// Show collection info and its NFTs
    Collection {
        #[arg(long)]
        chain: String,
        #[arg(long)]
        contract: String,
    },
    /// Show metadata for one NFT
    Nft {
        token_id: String,
        #[arg(long)]
        chain: String,
        #[arg(long)]
        contract: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|_| Config::new());

    let api_url = cli.api_url.clone().unwrap_or_else(|| config.api_url());
    let language = match cli.language.as_deref() {
        Some(tag) => Language::from_tag(tag)
            .with_context(|| format!("Unsupported language: {}", tag))?,
        None => config.language(),
    };

    let log_level = if cli.verbose { "debug" } else { "info" };
    let command = cli.command.unwrap_or(Commands::Chat { chain: None, contract: None });

    match command {
        Commands::Chat { chain, contract } => {
            init_file_logging(log_level)?;
            let chain = chain.or(config.chain.clone());
            let contract = contract.or(config.contract.clone());
            let options = ControllerOptions {
                language,
                max_chunk_len: config.max_chunk_len(),
                persona: config.persona.clone(),
            };
            run_tui(&api_url, options, chain, contract).await?
        }
        Commands::Chains => {
            init_stderr_logging(log_level);
            let api = NftApiClient::new(&api_url);
            for chain in api.chains().await? {
                println!("{}", chain);
            }
        }
        Commands::Collection { chain, contract } => {
            init_stderr_logging(log_level);
            print_collection(&NftApiClient::new(&api_url), &chain, &contract).await?
        }
        Commands::Nft { token_id, chain, contract } => {
            init_stderr_logging(log_level);
            print_nft(&NftApiClient::new(&api_url), &token_id, &chain, &contract).await?
        }
    }

    Ok(())
}

fn env_filter(level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
}

fn init_stderr_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .init();
}

// The TUI owns the terminal, so logs go to a file
fn init_file_logging(level: &str) -> Result<()> {
    let dir = dirs::cache_dir()
        .context("Could not determine cache directory")?
        .join("nftvoice");
    fs::create_dir_all(&dir)?;
    let file = File::create(dir.join("nftvoice.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run_tui(
    api_url: &str,
    options: ControllerOptions,
    chain: Option<String>,
    contract: Option<String>,
) -> Result<()> {
    let mut events = EventHandler::new();
    let sender = events.sender();

    let initial_status = Controller::new(options.clone()).snapshot();
    let (session, handle, mut updates) = Session::new(
        KeyboardRecognizer::new(sender.clone()),
        TerminalSynthesizer::new(sender.clone()),
        ChatClient::new(api_url),
        options,
    );
    tokio::spawn(session.run());

    let forward = sender.clone();
    tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            if forward.send(AppEvent::Session(update)).is_err() {
                break;
            }
        }
    });

    info!(api_url, "starting voice chat");
    let mut app = App::new(
        NftApiClient::new(api_url),
        handle.clone(),
        sender,
        initial_status,
        chain,
        contract,
    );
    app.load_chains();
    app.load_collection();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event)?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    handle.shutdown();
    tui::restore()?;
    result
}

async fn print_collection(api: &NftApiClient, chain: &str, contract: &str) -> Result<()> {
    let collection = api.collection(chain, contract).await?;

    println!("{}", collection.display_name());
    println!("{}", collection.description_or_default());
    println!("Floor price: {}", collection.floor_price_display());
    if let Some(count) = collection.distinct_nft_count {
        println!("Items: {}", count);
    }
    if let Some(count) = collection.distinct_owner_count {
        println!("Owners: {}", count);
    }
    if let Some(url) = collection.twitter_url() {
        println!("Twitter: {}", url);
    }
    if let Some(url) = &collection.discord_url {
        println!("Discord: {}", url);
    }
    if let Some(url) = &collection.external_url {
        println!("Website: {}", url);
    }

    println!();
    for nft in &collection.nfts {
        println!("  {:>8}  {}", nft.token_id, nft.display_name());
    }
    Ok(())
}

async fn print_nft(api: &NftApiClient, token_id: &str, chain: &str, contract: &str) -> Result<()> {
    let nft = api.nft(token_id, chain, contract).await?;

    println!("{}", nft.display_name());
    if let Some(url) = &nft.image_url {
        println!("Image: {}", url);
    }
    for t in nft.visible_traits() {
        println!("  {}: {}", t.trait_type, t.value);
    }
    if let Some(personality) = &nft.generated_personality {
        println!();
        println!("{}", personality);
    }
    Ok(())
}
