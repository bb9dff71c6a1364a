//! terminal-chat: a line-oriented front end for a Parley chat server.
//!
//! Reads commands from stdin and prints roster changes and messages to
//! stdout. Logs go to stderr (`RUST_LOG`, default `info`).

mod cli;
mod command;
mod render;

use std::process::ExitCode;

use clap::Parser;
use parley::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::command::Command;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), url = %cli.url, "starting terminal-chat");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "terminal-chat failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ParleyError> {
    let mut builder = ChatClient::builder().url(&cli.url);
    if let Some(name) = &cli.name {
        builder = builder.display_name(name);
    }
    if let Some(id) = &cli.user_id {
        builder = builder.requested_user_id(id);
    }
    let mut client = builder.connect()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            update = client.next_event() => match update {
                Some(update) => show(&client, &update),
                None => break,
            },

            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if execute(&mut client, command::parse(&line)) == Flow::Quit {
                        stdin_open = false;
                        client.close();
                    }
                }
                Ok(None) => {
                    stdin_open = false;
                    client.close();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "stdin read failed");
                    stdin_open = false;
                    client.close();
                }
            },
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

fn execute(client: &mut ChatClient<WebSocketChannel>, cmd: Command) -> Flow {
    let result = match cmd {
        Command::Nothing => Ok(()),
        Command::Quit => return Flow::Quit,
        Command::Help => {
            println!("{}", command::HELP);
            Ok(())
        }
        Command::Users => {
            println!("{}", render::roster(&client.snapshot()));
            Ok(())
        }
        Command::Invalid(msg) => {
            println!("! {msg}");
            Ok(())
        }
        Command::Chat(target) => client.start_chat(&target),
        Command::End => client.end_chat().map(|()| println!("* chat ended")),
        // Our own line is printed when it reaches the log.
        Command::Say(text) => client.send_message(&text).map(|()| {
            let snapshot = client.snapshot();
            if let Some(sent) = snapshot.messages.last() {
                println!("{}", render::message(&snapshot, sent));
            }
        }),
    };
    if let Err(e) = result {
        println!("! {e}");
    }
    Flow::Continue
}

fn show(client: &ChatClient<WebSocketChannel>, update: &ClientUpdate) {
    let snapshot = client.snapshot();
    match update {
        ClientUpdate::Connected => println!("* connected, {}", render::status(&snapshot)),
        ClientUpdate::Applied { kind, outcome } => {
            if !outcome.is_updated() {
                return;
            }
            match *kind {
                "registered" => {
                    println!("* {}", render::status(&snapshot));
                    println!("{}", command::HELP);
                }
                "presence" => println!("{}", render::roster(&snapshot)),
                "chat_started" => println!("* {}", render::status(&snapshot)),
                "chat_ended" => println!("* chat ended"),
                "message" => {
                    if let Some(received) = snapshot.messages.last() {
                        println!("{}", render::message(&snapshot, received));
                    }
                }
                _ => {}
            }
        }
        ClientUpdate::Discarded(_) => {}
        ClientUpdate::Disconnected { reason } => match reason {
            Some(reason) => println!("* disconnected: {reason}"),
            None => println!("* disconnected"),
        },
    }
}
