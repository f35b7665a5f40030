// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Oficio - marketplace client CLI.
//!
//! Wires the API client, realtime channel, and chat core end to end for
//! inspection and scripting: list a professional's chats, or run a one-shot
//! send through a full chat session.

mod chats;
mod send;

use clap::{Parser, Subcommand};

/// Oficio - services marketplace client for professionals.
#[derive(Parser, Debug)]
#[command(name = "oficio", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List the professional's chats with unread counts.
    Chats {
        /// Professional user id.
        #[arg(long)]
        user_id: String,
    },
    /// Open a chat session, send one text message, and tear down.
    Send {
        /// Professional user id.
        #[arg(long)]
        user_id: String,
        /// Client counterpart id.
        #[arg(long)]
        client_id: String,
        /// Service the conversation is about.
        #[arg(long)]
        service_id: Option<String>,
        /// Existing chat id; skips create-or-get when given.
        #[arg(long)]
        chat_id: Option<String>,
        /// Message text.
        text: String,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match oficio_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            oficio_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.app.log_level);

    let result = match cli.command {
        Some(Commands::Chats { user_id }) => chats::run(&config, &user_id).await,
        Some(Commands::Send {
            user_id,
            client_id,
            service_id,
            chat_id,
            text,
        }) => send::run(&config, user_id, client_id, service_id, chat_id, &text).await,
        Some(Commands::Config) => {
            match toml::to_string_pretty(&config) {
                Ok(rendered) => {
                    println!("{rendered}");
                    Ok(())
                }
                Err(e) => Err(oficio_core::OficioError::Internal(format!(
                    "rendering config: {e}"
                ))),
            }
        }
        None => {
            println!("oficio: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("oficio: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("oficio={log_level},warn")));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        super::Cli::command().debug_assert();
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = oficio_config::load_and_validate_str("").expect("default config is valid");
        assert_eq!(config.app.name, "oficio");
    }
}
