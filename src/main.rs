use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use vecsink::cli::{load_records, parse_filter, parse_vector, Commands};
use vecsink::{EpsillaConfig, EpsillaSink, InMemorySink, SinkConnector};

#[derive(Parser)]
#[command(name = "vecsink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use a process-local sink instead of Epsilla Cloud. Dry run only:
    /// nothing persists between invocations, so `info` and `search` always
    /// see an empty collection
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let sink: Box<dyn SinkConnector> = if cli.memory {
        info!("Using in-memory sink");
        Box::new(InMemorySink::new())
    } else {
        let config = EpsillaConfig::from_env()?;
        info!(
            "Using Epsilla table {} in database {}",
            config.table_name, config.db_id
        );
        Box::new(EpsillaSink::new(config))
    };

    match cli.command {
        Commands::Validate => {
            sink.validation().await?;
            println!("{}: connection OK", sink.sink_name());
        }

        Commands::Info => {
            let info = sink.info().await?;
            println!("Vectors stored: {}", info.number_vectors_stored);
        }

        Commands::Store { file } => {
            let records = load_records(Path::new(&file))?;
            let counts = sink.store(&records).await?;
            println!("Stored {} records (backend reported {:?})", records.len(), counts);
        }

        Commands::Search {
            vector,
            num,
            filter,
        } => {
            let vector = parse_vector(&vector)?;
            let filter = filter.as_deref().map(parse_filter).transpose()?;
            let results = sink.search(&vector, num, filter.as_ref()).await?;

            if results.is_empty() {
                println!("No results found.");
            } else {
                println!("Found {} results:\n", results.len());
                for (i, result) in results.iter().enumerate() {
                    println!("{}. {}", i + 1, result.display_line());
                    if !result.metadata().is_empty() {
                        println!("   {}", serde_json::Value::Object(result.metadata().clone()));
                    }
                }
            }
        }

        Commands::Delete { file_id } => {
            sink.delete_vectors_with_file_id(&file_id).await?;
            println!("Deleted vectors for file entry {}", file_id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn search_requires_a_vector() {
        let res = Cli::try_parse_from(["vecsink", "search"]);
        assert!(res.is_err());

        let res = Cli::try_parse_from(["vecsink", "--memory", "search", "--vector", "[0.1]"]);
        assert!(res.is_ok());
    }

    #[test]
    fn memory_flag_help_warns_nothing_persists() {
        use clap::CommandFactory;

        let cmd = Cli::command();
        let memory = cmd
            .get_arguments()
            .find(|a| a.get_id() == "memory")
            .expect("memory flag");
        let help = memory.get_help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("nothing persists"), "help was: {help}");
    }
}
