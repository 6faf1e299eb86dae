//! NoteSpace command line client
//!
//! # Usage
//!
//! ```bash
//! notespace list --pages 2
//! notespace create --title "Groceries" --content "milk, eggs"
//! notespace show 6f1c...
//! notespace delete 6f1c...
//! ```
//!
//! # Environment Variables
//!
//! - `NOTESPACE_SERVER`: Server URL (default: http://127.0.0.1:3001)
//! - `NOTESPACE_OWNER`: Owner id sent with every request (default: "default")
//! - `NOTESPACE_LOCALE`: Date locale (en-US, en-GB, de-DE, fr-FR)
//! - `RUST_LOG`: Logging level (default: "warn")

use clap::{Parser, Subcommand};
use notespace_client::{ClientConfig, NoteApi, NoteListView, NotificationLevel};
use notespace_core::models::{NoteId, DEFAULT_OWNER, DEFAULT_PAGE_SIZE};
use notespace_core::utils::{format_timestamp, DateFormatOptions, DateStyle, DisplayLocale};
use std::sync::Arc;

#[derive(Clone, Debug, Parser)]
#[command(version, author, about)]
struct Cli {
    #[arg(long, env = "NOTESPACE_SERVER", default_value = notespace_client::config::DEFAULT_SERVER_URL)]
    server: String,

    #[arg(long, env = "NOTESPACE_OWNER", default_value = DEFAULT_OWNER)]
    owner: String,

    #[arg(long, env = "NOTESPACE_LOCALE", default_value = "en-US")]
    locale: DisplayLocale,

    /// full, long, medium or short
    #[arg(long)]
    date_style: Option<DateStyle>,

    /// full, long, medium or short
    #[arg(long)]
    time_style: Option<DateStyle>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// List notes, newest first
    List {
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u32,
    },
    /// Show one note in full
    Show { id: NoteId },
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        content: String,
    },
    Delete { id: NoteId },
}

impl Cli {
    fn date_format(&self) -> DateFormatOptions {
        match (self.date_style, self.time_style) {
            (None, None) => DateFormatOptions {
                locale: self.locale,
                ..DateFormatOptions::default()
            },
            (date_style, time_style) => DateFormatOptions {
                locale: self.locale,
                date_style,
                time_style,
            },
        }
    }

    fn client_config(&self) -> ClientConfig {
        let page_size = match self.command {
            Command::List { limit, .. } => limit,
            _ => DEFAULT_PAGE_SIZE,
        };
        ClientConfig {
            server_url: self.server.clone(),
            owner: self.owner.clone(),
            page_size,
            date_format: self.date_format(),
            ..ClientConfig::default()
        }
    }
}

fn print_notifications(view: &mut NoteListView) {
    for notification in view.drain_notifications() {
        match notification.level {
            NotificationLevel::Info => eprintln!("✅ {}", notification.message),
            NotificationLevel::Error => eprintln!("❌ {}", notification.message),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.client_config();
    let controller = Arc::new(config.build_controller()?);
    let mut view = NoteListView::new(controller.clone(), config.date_format);

    match cli.command {
        Command::List { pages, .. } => {
            view.load().await?;
            for _ in 1..pages {
                if !view.has_more().await {
                    break;
                }
                view.load_more().await?;
            }
            print!("{}", view.render().await);
        }
        Command::Show { id } => {
            let note = controller.api().get(&id).await?;
            println!("{}", note.title);
            println!("{}", format_timestamp(note.created_at, &config.date_format));
            println!();
            println!("{}", note.content);
        }
        Command::Create { title, content } => {
            view.load().await?;
            let result = view.create(&title, &content).await;
            print_notifications(&mut view);
            let note = result?;
            println!("{}", note.id);
        }
        Command::Delete { id } => {
            let result = view.delete(&id).await;
            print_notifications(&mut view);
            result?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_flags() {
        let cli = Cli::try_parse_from([
            "notespace",
            "--owner",
            "alice",
            "--date-style",
            "long",
            "list",
            "--pages",
            "3",
            "--limit",
            "5",
        ])
        .unwrap();

        let config = cli.client_config();
        assert_eq!(config.owner, "alice");
        assert_eq!(config.page_size, 5);
        assert_eq!(config.date_format.date_style, Some(DateStyle::Long));
        assert_eq!(config.date_format.time_style, None);
        assert!(matches!(cli.command, Command::List { pages: 3, .. }));
    }

    #[test]
    fn test_invalid_id_is_rejected() {
        assert!(Cli::try_parse_from(["notespace", "delete", "nope"]).is_err());
    }
}
