//! Lost & Found QR CLI - Database migrations and offline QR rendering.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! lf-cli migrate
//!
//! # Render the QR code for an existing tag
//! lf-cli qr --code 1a2b3c4d --base-url https://tags.example.com --out tag.png
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `qr` - Render a scan URL as a PNG QR code

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "lf-cli")]
#[command(author, version, about = "Lost & Found QR CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Render the QR code for a unique code as a PNG
    Qr {
        /// Unique code of the tag
        #[arg(short, long)]
        code: String,

        /// Public base URL the code links to
        #[arg(short, long, env = "LOSTFOUND_BASE_URL")]
        base_url: String,

        /// Output file (default: qr-code-<code>.png)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Image width in pixels
        #[arg(long, default_value_t = 300)]
        width: u32,

        /// Quiet zone in modules
        #[arg(long, default_value_t = 2)]
        margin: u32,

        /// Foreground color (#RGB or #RRGGBB)
        #[arg(long, default_value = "#000000")]
        dark: String,

        /// Background color (#RGB or #RRGGBB)
        #[arg(long, default_value = "#FFFFFF")]
        light: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env before clap reads `env` defaults
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Qr {
            code,
            base_url,
            out,
            width,
            margin,
            dark,
            light,
        } => {
            let request = commands::qr::QrRequest {
                code,
                base_url,
                out,
                width,
                margin,
                dark,
                light,
            };
            let path = commands::qr::render(&request)?;
            tracing::info!(path = %path.display(), "QR code written");
        }
    }
    Ok(())
}
