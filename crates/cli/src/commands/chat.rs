//! `groundchat chat` — Interactive or single-message chat mode.

use std::io::Write;

use groundchat_core::message::Message;
use groundchat_core::preference::PreferenceStore;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::runtime::Runtime;

pub async fn run(message: Option<String>, model: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::load()?;
    let preferences = Runtime::preferences();

    let mut session = runtime.session(preferences.clone());
    if let Some(model) = model {
        session = session.with_model(model);
    }

    let print_delta = |delta: &str| {
        print!("{delta}");
        let _ = std::io::stdout().flush();
    };

    if let Some(msg) = message {
        // Single message mode
        session.run_turn(&msg, &[], print_delta).await?;
        println!();
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  GroundChat — Interactive Mode");
    println!();
    println!("  Model:       {}", session.model());
    println!(
        "  Web search:  {}",
        if preferences.web_search_enabled() { "on" } else { "off" }
    );
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut history: Vec<Message> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        print!("\n  Assistant > ");
        std::io::stdout().flush()?;

        match session.run_turn(input, &history, print_delta).await {
            Ok(outcome) => {
                println!("\n");
                history.extend(outcome.messages);
            }
            Err(e) => {
                println!();
                eprintln!("  [Error] {e}");
                println!();
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}
