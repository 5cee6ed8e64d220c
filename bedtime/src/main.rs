//! Interactive bedtime story generator.
//!
//! Reads story requests from the terminal and tells them with Claude.
//!
//! ```bash
//! ANTHROPIC_API_KEY=... cargo run -p bedtime
//! ```
//!
//! Diagnostics go to stderr; set `RUST_LOG` or `--log-level` to see more.

use bedtime_core::{ModelGateway, Session, StdConsole};
use clap::Parser;
use claude::Claude;
use tracing_subscriber::EnvFilter;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "bedtime")]
#[command(about = "Children's story generator with genre detection and episodes")]
#[command(version)]
struct Args {
    /// Claude model id to use instead of the default
    #[arg(long, env = "BEDTIME_MODEL")]
    model: Option<String>,

    /// Override the Anthropic API base URL
    #[arg(long, env = "ANTHROPIC_BASE_URL")]
    base_url: Option<String>,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

const EXAMPLE_REQUESTS: [&str; 4] = [
    "A story about a girl named Alice and her best friend Bob, who happens to be a cat",
    "A brave little mouse who wants to become a knight",
    "Two siblings who discover a secret door in their grandmother's attic",
    "A friendly dragon who is afraid of flying",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    print_welcome();

    let client = match Claude::from_env() {
        Ok(client) => client,
        Err(claude::Error::NoApiKey) => {
            print_setup_instructions();
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };
    let client = match args.model {
        Some(model) => client.with_model(model),
        None => client,
    };
    let client = match args.base_url {
        Some(url) => client.with_base_url(url),
        None => client,
    };
    tracing::info!(model = client.model(), "starting session");

    let mut session = Session::new(ModelGateway::new(client), StdConsole::new());
    match session.run().await {
        Ok(summary) => {
            tracing::info!(
                stories_told = summary.stories_told,
                favorite = ?summary.favorite_genre,
                "session finished"
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn print_welcome() {
    println!("Welcome to the Children's Story Generator!");
    println!("I can create fun, engaging stories for kids ages 5-10.");
    println!("\nExample requests:");
    for request in EXAMPLE_REQUESTS {
        println!("  - {request}");
    }
    println!();
}

fn print_setup_instructions() {
    eprintln!("Error: {} not found!", claude::API_KEY_VAR);
    eprintln!("\nTo use this application, you need an Anthropic API key:");
    eprintln!("\nSetup Instructions:");
    eprintln!("1. Get your API key from: https://console.anthropic.com/settings/keys");
    eprintln!("2. Set it as an environment variable or in a .env file:");
    eprintln!("   - On Mac/Linux: export {}='your-key-here'", claude::API_KEY_VAR);
    eprintln!("   - On Windows: set {}=your-key-here", claude::API_KEY_VAR);
    eprintln!("3. Restart the application");
}
