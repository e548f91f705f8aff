use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use colored::Colorize;
use tracing::info;

use crate::advisor::Advisor;
use crate::db::{SqliteStore, DB_FILE};
use crate::error::{AdvisorError, Result};
use crate::models::Sender;
use crate::reply::Reply;
use crate::settings::load_settings;

fn print_reply(reply: &Reply) {
    let text = if reply.text.starts_with('❌') || reply.text.starts_with('⚠') {
        reply.text.red().to_string()
    } else if reply.text.starts_with('✅') {
        reply.text.green().to_string()
    } else {
        reply.text.clone()
    };
    println!("{text}");
    for row in &reply.buttons {
        let labels: Vec<String> = row.iter().map(|b| format!("[ {b} ]")).collect();
        println!("{}", labels.join(" ").dimmed());
    }
    println!();
}

fn prompt(interactive: bool) -> Result<()> {
    if interactive {
        print!("{} ", ">".bold());
        std::io::stdout().flush()?;
    }
    Ok(())
}

pub fn run(user: i64, name: Option<String>, today: Option<NaiveDate>) -> Result<()> {
    let settings = load_settings();
    let db_path = PathBuf::from(&settings.data_dir).join(DB_FILE);
    if !db_path.exists() {
        return Err(AdvisorError::Settings(format!(
            "no database at {}. Run `cashback init` first.",
            db_path.display()
        )));
    }

    let store = SqliteStore::open(&db_path)?;
    let mut advisor = Advisor::new(Arc::new(store), settings);
    if let Some(date) = today {
        advisor = advisor.with_clock(Arc::new(move || date));
    }
    let sender = Sender {
        id: user,
        name: name.unwrap_or_else(|| format!("user {user}")),
    };
    info!(user = sender.id, db = %db_path.display(), "chat started");

    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    if interactive {
        println!("{}", format!("Chatting as {} (/help for commands, Ctrl-D to quit)", sender.name).bold());
    }
    prompt(interactive)?;

    let mut message = String::new();
    for line in stdin.lock().lines() {
        let line = line?;
        if let Some(head) = line.strip_suffix('\\') {
            message.push_str(head);
            message.push('\n');
            continue;
        }
        message.push_str(&line);

        if !message.trim().is_empty() {
            let reply = advisor.on_text(&sender, &message);
            print_reply(&reply);
        }
        message.clear();
        prompt(interactive)?;
    }
    Ok(())
}
