use std::io::{self, BufRead};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use pocket_ledger::bot::{IncomingMessage, MessageHandler, WriterSink};
use pocket_ledger::config::{paths::LedgerPaths, settings::Settings};
use pocket_ledger::logging::{init_logging, logging_status};
use pocket_ledger::services::ClosureService;
use pocket_ledger::storage::init::{initialize_storage, needs_initialization};
use pocket_ledger::storage::Storage;

/// Chat id `init` authorizes when none is configured
const LOCAL_CHAT_ID: &str = "local";

#[derive(Parser)]
#[command(
    name = "pocket",
    version,
    about = "Personal finance ledger driven by chat commands",
    long_about = "pocket-ledger registers income, outgo and credit card installments \
                  from short commands such as `gasto 500 comida` or \
                  `tarjeta 3000 TiendaX 3`, and answers balances and monthly closures."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and empty data files
    Init,

    /// Send one command and print the reply
    Send {
        /// Command text, e.g. `gasto 500 comida`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
        /// Sender chat id (defaults to the authorized chat)
        #[arg(long, env = "POCKET_CHAT_ID")]
        chat_id: Option<String>,
        /// Sender display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Read commands from stdin, one per line
    Chat {
        /// Sender chat id (defaults to the authorized chat)
        #[arg(long, env = "POCKET_CHAT_ID")]
        chat_id: Option<String>,
        /// Sender display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Show current configuration and paths, optionally updating settings
    Config {
        /// Only accept commands from this chat id
        #[arg(long)]
        authorize: Option<String>,
        /// Currency symbol used in replies
        #[arg(long)]
        currency: Option<String>,
    },

    /// List closed months, most recent first
    Closures,

    /// Show the most recent audit entries
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        count: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = LedgerPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    if let Err(e) = init_logging(&settings.log_level, &paths.log_dir()) {
        eprintln!("Warning: file logging disabled: {}", e);
    }

    // Initialize storage
    let mut storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Init) => {
            if !needs_initialization(&paths) && paths.is_initialized() {
                println!("pocket-ledger is already initialized at: {}", paths.base_dir().display());
                return Ok(());
            }
            println!("Initializing pocket-ledger at: {}", paths.base_dir().display());
            initialize_storage(&paths)?;
            if settings.authorized_chat_id.is_none() {
                settings.authorized_chat_id = Some(LOCAL_CHAT_ID.to_string());
                println!("Authorized chat: {}", LOCAL_CHAT_ID);
            }
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Try: pocket send gasto 500 comida");
        }
        Some(Commands::Send {
            text,
            chat_id,
            name,
        }) => {
            let chat_id = sender_id(chat_id, &settings)?;
            let message = IncomingMessage::new(text.join(" "), chat_id.clone(), name);
            let handler = MessageHandler::new(&storage, &settings);
            let mut sink = WriterSink::new(io::stdout().lock());

            if !handler.handle(&message, &mut sink)? {
                bail!("chat {} is not authorized", chat_id);
            }
        }
        Some(Commands::Chat { chat_id, name }) => {
            let chat_id = sender_id(chat_id, &settings)?;
            let handler = MessageHandler::new(&storage, &settings);
            let mut sink = WriterSink::new(io::stdout());

            for line in io::stdin().lock().lines() {
                let line = line?;
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                if text == "salir" {
                    break;
                }

                let message = IncomingMessage::new(text, chat_id.clone(), name.clone());
                if !handler.handle(&message, &mut sink)? {
                    bail!("chat {} is not authorized", chat_id);
                }
            }
        }
        Some(Commands::Config {
            authorize,
            currency,
        }) => {
            if authorize.is_some() || currency.is_some() {
                if let Some(chat_id) = authorize {
                    settings.authorized_chat_id = Some(chat_id);
                }
                if let Some(symbol) = currency {
                    settings.currency_symbol = symbol;
                }
                settings.save(&paths)?;
                println!("Settings saved.");
                println!();
            }

            println!("pocket-ledger Configuration");
            println!("===========================");
            println!("Base directory:  {}", paths.base_dir().display());
            println!("Data directory:  {}", paths.data_dir().display());
            println!("Log directory:   {}", paths.log_dir().display());
            println!("Audit log:       {}", paths.audit_log().display());
            println!("Initialized:     {}", if paths.is_initialized() { "yes" } else { "no" });
            println!();
            println!("Settings:");
            println!(
                "  Authorized chat: {}",
                settings.authorized_chat_id.as_deref().unwrap_or("(none)")
            );
            println!("  Currency symbol: {}", settings.currency_symbol);
            println!("  Log level:       {}", settings.log_level);
            match logging_status() {
                Some((level, dir)) => println!("  File logging:    {} in {}", level, dir.display()),
                None => println!("  File logging:    disabled"),
            }
        }
        Some(Commands::Closures) => {
            let closures = ClosureService::new(&storage).list()?;
            if closures.is_empty() {
                println!("No closed months.");
            }
            for closure in closures {
                println!(
                    "{:04}-{:02}  income {:>14}  outgo {:>14}  balance {:>14}",
                    closure.year,
                    closure.month,
                    closure.income.format_compact(&settings.currency_symbol),
                    closure.outgo.format_compact(&settings.currency_symbol),
                    closure.balance.format_compact(&settings.currency_symbol)
                );
            }
        }
        Some(Commands::Audit { count }) => {
            let entries = storage.audit().read_recent(count)?;
            if entries.is_empty() {
                println!("No audit entries.");
            }
            for entry in entries {
                println!("{}", entry.format_human_readable());
            }
        }
        None => {
            println!("pocket-ledger - personal finance ledger");
            println!();
            println!("Run 'pocket --help' for usage information.");
            println!("Run 'pocket chat' to type commands interactively.");
        }
    }

    Ok(())
}

/// Sender for `send`/`chat`: the explicit id, else the authorized one
fn sender_id(explicit: Option<String>, settings: &Settings) -> Result<String> {
    match explicit.or_else(|| settings.authorized_chat_id.clone()) {
        Some(chat_id) => Ok(chat_id),
        None => bail!(
            "no authorized chat configured; run 'pocket init' or 'pocket config --authorize <chat-id>'"
        ),
    }
}
