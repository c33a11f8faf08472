use std::env;

use eplc_cli::bootstrap::{build_assistant, Surface};
use eplc_cli::console::read_line;
use eplc_cli::init_tracing;
use eplc_core::config::Config;
use eplc_core::types::Phase;
use eplc_engine::Conversation;

fn parse_args() -> anyhow::Result<Option<Phase>> {
    let mut args = env::args();
    let prog = args.next().unwrap_or_else(|| "eplc-ask".to_string());
    match (args.next().as_deref(), args.next()) {
        (None, _) => Ok(None),
        (Some("--phase"), Some(phase)) => Ok(Some(phase.parse()?)),
        _ => {
            eprintln!("Usage: {prog} [--phase <requirement|design|implementation|development>]");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let phase = parse_args()?;
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let settings = config.settings()?;
    let assistant = build_assistant(&settings, Surface::Ask).await?;

    // single-phase mode when asked for, or when no domain store is configured
    let phase = match phase {
        Some(p) => Some(p),
        None if !assistant.has_qa_stores() => Some(Phase::Implementation),
        None => None,
    };

    println!("[ready] model={} | top_k={}", settings.generation.chat_model, settings.retrieval.top_k);
    if let Some(p) = phase {
        println!("Answering from the {p} phase store.");
    }
    println!("Ask EPLC/HHS questions. Type 'restart' to clear the history, 'exit' to quit.");

    let mut conversation = Conversation::new(&assistant);
    while let Some(q) = read_line("\nQ> ")? {
        match q.to_ascii_lowercase().as_str() {
            "" => continue,
            "exit" | "quit" => break,
            "restart" => {
                conversation.restart();
                println!("History cleared.");
                continue;
            }
            _ => {}
        }
        println!("Processing...");
        if let Some(p) = phase {
            match assistant.answer_in_phase(&q, p).await {
                Ok(answer) => println!("A> {}", answer.text),
                Err(e) => eprintln!("Error: {e}"),
            }
            continue;
        }
        match conversation.ask(&q).await {
            Ok(exchange) => {
                println!("A> {}", exchange.answer);
                println!("   citations: {:?}", exchange.citations);
            }
            Err(e) => eprintln!("Error: {e}"),
        }
    }
    Ok(())
}
