use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use docstore::{
    card::Card, configuration, document::Fields, helper::CollectionHelper, telemetry,
};
use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "docstore", about = "Read and write collections of a document store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every document of a collection
    List { collection: String },
    /// Create a document from a JSON object
    Add { collection: String, json: String },
    /// Print one document
    Get { collection: String, id: String },
    /// Remove one document
    Delete { collection: String, id: String },
    /// Re-print the collection on every change until Ctrl-C
    Watch { collection: String },
    /// Render the static card
    Card,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = telemetry::get_subscriber("docstore=info", std::io::stderr);
    telemetry::init_subscriber(subscriber)?;

    match Cli::parse().command {
        Command::Card => println!("{}", Card::default()),
        Command::List { collection } => {
            print_records(&open_helper()?.read_collection(&collection).await)?
        }
        Command::Add { collection, json } => {
            let fields = parse_fields(&json)?;
            open_helper()?.write_document(&collection, fields).await;
        }
        Command::Get { collection, id } => {
            match open_helper()?.fetch_document(&collection, &id).await {
                Some(fields) => println!("{}", serde_json::to_string_pretty(&fields)?),
                None => println!("null"),
            }
        }
        Command::Delete { collection, id } => {
            open_helper()?.delete_document(&collection, &id).await
        }
        Command::Watch { collection } => watch(&open_helper()?, &collection).await?,
    }
    Ok(())
}

fn open_helper() -> anyhow::Result<CollectionHelper> {
    let settings = configuration::get_configuration().context("failed to read configuration")?;
    CollectionHelper::open(&settings).context("failed to open document store")
}

async fn watch(helper: &CollectionHelper, collection: &str) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = helper
        .subscribe(collection, move || {
            let _ = tx.send(());
        })
        .await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.recv() => match changed {
                Some(()) => print_records(&helper.read_collection(collection).await)?,
                None => break,
            },
        }
    }

    subscription.unsubscribe();
    Ok(())
}

fn parse_fields(json: &str) -> anyhow::Result<Fields> {
    match serde_json::from_str::<Value>(json).context("document is not valid JSON")? {
        Value::Object(fields) => Ok(fields),
        other => bail!("document must be a JSON object, got {}", other),
    }
}

fn print_records(records: &[Fields]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}
