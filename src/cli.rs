use std::env;
use std::io::{self, Write};
use std::sync::Arc;
use memvdb::{Embedder, ProviderEmbedder, StoreError, TextChunk, VecStore};
use memvdb::chunker::{ChunkGenerator, Document};
use memvdb::config::Config;
use tracing::info;

const DEFAULT_K_TOP: usize = 10;

#[derive(Debug, PartialEq)]
pub enum Command {
    Index { path: String },
    Ask { text: String, k_top: usize },
    Search { vec: Vec<f32>, k_top: usize },
    Get { index: usize },
    Count,
    Save { path: String },
    Load { path: String },
}

/// Everything a command needs: the collection plus the chunker and embedder
/// used to fill it.
pub struct Session {
    store: VecStore<TextChunk>,
    chunker: ChunkGenerator,
    embedder: ProviderEmbedder,
}

impl Session {
    pub fn new(config: &Config) -> Result<Session, StoreError> {
        let embedder = ProviderEmbedder::new(config.embedding_provider());
        let chunker = ChunkGenerator::new(config.chunk_size, config.chunk_overlap)?;
        let store: VecStore<TextChunk> = VecStore::new(embedder.dimension(), Arc::new(embedder.clone()));
        Ok(Session { store, chunker, embedder })
    }
}

/// Parse a command from a provided argument vector
/// This is used both for command-line args and REPL input
pub fn parse_command_from_args(args: &[String]) -> Result<Command, String> {
    if args.len() < 2 {
        return Err("No command provided. Use: index, ask, search, get, count, save, load".to_string());
    }

    let command = &args[1];

    match command.as_str() {
        "index" => parse_path(args, "index").map(|path| Command::Index { path }),
        "ask" => parse_ask(args),
        "search" => parse_search(args),
        "get" => parse_get(args),
        "count" => Ok(Command::Count),
        "save" => parse_path(args, "save").map(|path| Command::Save { path }),
        "load" => parse_path(args, "load").map(|path| Command::Load { path }),
        _ => Err(format!("Unknown command: {}. Available: index, ask, search, get, count, save, load", command)),
    }
}

/// Splits a trailing `--k_top <number>` off `args`.
/// Returns the k value and the end of the remaining arguments.
fn split_k_top(args: &[String]) -> Result<(usize, usize), String> {
    if args.len() >= 4 && args[args.len() - 2] == "--k_top" {
        return match args[args.len() - 1].parse::<usize>() {
            Ok(k) => Ok((k, args.len() - 2)),
            Err(_) => Err(format!("Invalid --k_top value: '{}'. Must be a positive integer.", args[args.len() - 1])),
        };
    }

    Ok((DEFAULT_K_TOP, args.len()))
}

/// Usage: memvdb index|save|load <path>
fn parse_path(args: &[String], name: &str) -> Result<String, String> {
    if args.len() < 3 {
        return Err(format!("'{}' command requires a file path. Usage: {} <path>", name, name));
    }
    Ok(args[2].clone())
}

/// Parse the 'ask' command
/// Usage: memvdb ask <words...> [--k_top <number>]
fn parse_ask(args: &[String]) -> Result<Command, String> {
    let (k_top, text_end) = split_k_top(args)?;
    if text_end <= 2 {
        return Err("'ask' command requires query text. Usage: ask <text> [--k_top <number>]".to_string());
    }

    let text = args[2..text_end].join(" ");
    Ok(Command::Ask { text, k_top })
}

/// Parse the 'search' command
/// Usage: memvdb search <v1> <v2> ... [--k_top <number>]
fn parse_search(args: &[String]) -> Result<Command, String> {
    if args.len() < 3 {
        return Err("'search' command requires at least one vector component. Usage: search <v1> <v2> ... [--k_top <number>]".to_string());
    }

    let (k_top, vector_end) = split_k_top(args)?;

    let vec: Result<Vec<f32>, _> = args[2..vector_end].iter()
        .map(|s| s.parse::<f32>())
        .collect();

    match vec {
        Ok(v) => {
            if v.is_empty() {
                return Err("Search vector cannot be empty".to_string());
            }
            Ok(Command::Search { vec: v, k_top })
        }
        Err(_) => Err("Failed to parse vector components as numbers".to_string()),
    }
}

/// Parse the 'get' command
/// Usage: memvdb get <index>
fn parse_get(args: &[String]) -> Result<Command, String> {
    if args.len() < 3 {
        return Err("'get' command requires an index. Usage: get <index>".to_string());
    }

    match args[2].parse::<usize>() {
        Ok(index) => Ok(Command::Get { index }),
        Err(_) => Err(format!("Invalid index: '{}'", args[2])),
    }
}

/// REPL mode - interactive session with an in-memory collection
pub async fn run_repl(session: &Session) {
    println!("MEMVDB - In-Memory Vector Store");
    println!("Type 'help' for commands, 'exit' or 'quit' to quit\n");

    loop {
        print!("memvdb> ");
        if let Err(error) = io::stdout().flush() {
            eprintln!("Error writing prompt: {}", error);
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                continue;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input == "exit" || input == "quit" {
            println!("Goodbye!");
            break;
        }

        if input == "help" {
            print_help();
            continue;
        }

        let mut args: Vec<String> = vec!["memvdb".to_string()];
        args.extend(input.split_whitespace().map(|s| s.to_string()));

        let command = match parse_command_from_args(&args) {
            Ok(cmd) => cmd,
            Err(error) => {
                eprintln!("Error: {}", error);
                continue;
            }
        };

        if let Err(error) = execute_command(session, command).await {
            eprintln!("Error: {}", error);
        }
    }
}

/// Single-command mode - load collection from path, execute command, save back
/// Usage: memvdb <db_path> <command> [args...]
pub async fn run_single_command(config: &Config) {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: memvdb <db_path> <command> [args...]");
        std::process::exit(1);
    }

    let db_path = &args[1];

    let session = match Session::new(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Load existing collection or start empty
    if std::path::Path::new(db_path).exists() {
        if let Err(e) = session.store.load_json(db_path) {
            eprintln!("Error loading '{}': {}", db_path, e);
            std::process::exit(1);
        }
    }

    // Rebuild args: shift so args[1] becomes the command
    let shifted_args: Vec<String> = std::iter::once(args[0].clone())
        .chain(args[2..].iter().cloned())
        .collect();

    let command = match parse_command_from_args(&shifted_args) {
        Ok(cmd) => cmd,
        Err(error) => {
            eprintln!("Error: {}", error);
            std::process::exit(1);
        }
    };

    if let Err(error) = execute_command(&session, command).await {
        eprintln!("Error: {}", error);
        std::process::exit(1);
    }

    // Save collection back to path
    if let Err(e) = session.store.save_json(db_path) {
        eprintln!("Error saving '{}': {}", db_path, e);
        std::process::exit(1);
    }
}

async fn execute_command(session: &Session, command: Command) -> Result<(), StoreError> {
    match command {
        Command::Index { path } => {
            let text = std::fs::read_to_string(&path)?;
            let doc = Document::from_text(path.as_str(), &text);
            let chunks = session.chunker.chunks(&doc);
            let total = chunks.len();

            let inserted = session.store.insert_many(chunks).await;
            info!(path = %path, inserted, total, "document indexed");
            println!("Indexed '{}': {} of {} chunks embedded", path, inserted, total);
        }

        Command::Ask { text, k_top } => {
            let query = match session.embedder.embed(TextChunk::query(text)).await {
                Some(chunk) => chunk,
                None => {
                    eprintln!("Error: could not embed query");
                    return Ok(());
                }
            };
            let vector = query.vector.unwrap_or_default();
            print_results(&session.store.find_nearest(&vector, k_top)?);
        }

        Command::Search { vec, k_top } => {
            print_results(&session.store.find_nearest(&vec, k_top)?);
        }

        Command::Get { index } => {
            match session.store.get(index) {
                Some(chunk) => println!("{}", serde_json::to_string_pretty(&chunk).map_err(StoreError::Encode)?),
                None => eprintln!("Error: no record at index {}", index),
            }
        }

        Command::Count => println!("{}", session.store.len()),

        Command::Save { path } => {
            session.store.save_json(&path)?;
            println!("Collection saved to '{}'", path);
        }

        Command::Load { path } => {
            let count = session.store.load_json(&path)?;
            println!("Collection loaded from '{}' ({} records)", path, count);
        }
    }

    Ok(())
}

fn print_results(results: &[memvdb::Neighbor<TextChunk>]) {
    if results.is_empty() {
        println!("No results found");
        return;
    }

    println!("Top {} results:", results.len());
    for (rank, n) in results.iter().enumerate() {
        println!("{}. Score: {:.4} - {} [{}..{}]",
            rank + 1, n.score, n.record.source, n.record.start_char,
            n.record.start_char + n.record.char_length);
        println!("   {}", n.record.text.trim());
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  index <path>                     - Chunk, embed and insert a text file");
    println!("  ask <text> [--k_top N]           - Embed text and search (default k=10)");
    println!("  search <v1> <v2> ... [--k_top N] - Search with a raw vector (default k=10)");
    println!("  get <index>                      - Show the record at an index");
    println!("  count                            - Show record count");
    println!("  save <path>                      - Save collection to a JSON file");
    println!("  load <path>                      - Load collection from a JSON file");
    println!("  help                             - Show this help");
    println!("  exit, quit                       - Exit the program");
}
