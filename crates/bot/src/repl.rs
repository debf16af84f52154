//! Line-oriented front-end over stdin.
//!
//! The chat platform is a collaborator, not part of this program: the
//! service only needs someone to feed it `(user, message)` pairs. This
//! runner does that from the terminal, one local user, which is also how
//! the conversation flow is exercised without any platform credentials.

use std::io::Write;

use anyhow::Result;
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::mailer::Mailer;
use crate::service::BotService;
use crate::storage::DataStore;

/// User id assigned to the terminal session.
const LOCAL_USER: &str = "local";

/// Reads messages from stdin until EOF, printing each reply.
pub async fn run_repl<S: DataStore, M: Mailer>(service: &BotService<S, M>) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    println!("{}", "Paperboy ready. Send a URL or some text; Ctrl-D to quit.".dimmed());

    let reply = service.handle_message(LOCAL_USER, "/start").await;
    println!("{} {}", "bot:".bold().bright_blue(), reply);

    loop {
        print!("{} ", ">".bright_green());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        if line.trim().is_empty() {
            continue;
        }

        let reply = service.handle_message(LOCAL_USER, &line).await;
        println!("{} {}", "bot:".bold().bright_blue(), reply);
    }

    Ok(())
}
