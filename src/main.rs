mod cli;

use actix_web::{App, HttpServer};
use memvdb::config::Config;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[actix_web::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    let args: Vec<String> = std::env::args().collect();

    if args.len() == 1 {
        let session = match cli::Session::new(&config) {
            Ok(session) => session,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };
        cli::run_repl(&session).await;
    } else if args[1] == "serve" {
        info!(bind = %config.bind, "starting server");
        HttpServer::new(|| App::new().configure(memvdb::server::config))
            .bind(&config.bind)?
            .run()
            .await?;
    } else {
        cli::run_single_command(&config).await;
    }

    Ok(())
}
