use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use drugquery::databases::AVAILABLE_DATABASES;
use drugquery::entity::EntityType;
use drugquery::environment::Settings;
use drugquery::harmonize::{Intent, RawRecord, SENTINEL};
use drugquery::query::{QueryPipeline, QueryRequest, QueryResponse, SampleOpenTargetsClient};
use prettytable::{Cell, Row as PrettyRow, Table};
use serde_json::Value;
use std::sync::Arc;
use tokio::main;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List the databases that can be queried
    Databases,

    /// Resolve an entity mention to per-database identifiers
    Resolve {
        /// Entity type (drug, target, disease, phase)
        #[arg(short, long)]
        entity_type: String,

        /// Mention to resolve
        #[arg(short, long)]
        name: String,

        /// Database to resolve for; may be repeated (defaults to DATABASES)
        #[arg(long = "database")]
        databases: Vec<String>,

        /// Skip external lookup services
        #[arg(long)]
        offline: bool,
    },

    /// Run a query against the sample OpenTargets data
    Query {
        /// Query intent (list_diseases, list_drugs, list_toxicities, ...)
        #[arg(short, long)]
        intent: String,

        #[arg(long)]
        drug: Option<String>,

        #[arg(long)]
        target: Option<String>,

        #[arg(long)]
        disease: Option<String>,

        #[arg(long)]
        phase: Option<String>,

        /// Database to query; may be repeated (defaults to DATABASES)
        #[arg(long = "database")]
        databases: Vec<String>,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Skip external lookup services
        #[arg(long)]
        offline: bool,
    },
}

#[main]
async fn main() -> Result<()> {
    // Initialize tracing
    drugquery::logging::configure_logging();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    match cli.command {
        Commands::Databases => {
            for database in AVAILABLE_DATABASES {
                println!("{}", database);
            }
        }

        Commands::Resolve {
            entity_type,
            name,
            databases,
            offline,
        } => {
            let settings = settings.with_offline(offline);
            let entity_type = parse_entity_type(&entity_type)?;
            let databases = if databases.is_empty() {
                settings.databases.clone()
            } else {
                databases
            };

            let resolver = settings
                .build_resolver()
                .context("Failed to set up entity resolver")?;
            info!("Resolving '{}' as {} for {:?}", name, entity_type, databases);

            let record = resolver.resolve(&name, entity_type, &databases).await;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Commands::Query {
            intent,
            drug,
            target,
            disease,
            phase,
            databases,
            format,
            offline,
        } => {
            let settings = settings.with_offline(offline);
            let databases = if databases.is_empty() {
                settings.databases.clone()
            } else {
                databases
            };

            let mut request = QueryRequest::new(Intent::from(intent.as_str()), databases);
            let mentions = [
                (EntityType::Drug, drug),
                (EntityType::Target, target),
                (EntityType::Disease, disease),
                (EntityType::Phase, phase),
            ];
            for (entity_type, mention) in mentions {
                if let Some(mention) = mention {
                    request = request.with_entity(entity_type, &mention);
                }
            }

            let resolver = settings
                .build_resolver()
                .context("Failed to set up entity resolver")?;
            let pipeline = QueryPipeline::new(Arc::new(resolver))
                .with_client("OpenTargets", Arc::new(SampleOpenTargetsClient::new()))
                .with_query_timeout(settings.query_timeout);

            let response = pipeline.run(request).await;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
                OutputFormat::Table => print_response(&response)?,
            }
        }
    }

    Ok(())
}

fn parse_entity_type(entity_type: &str) -> Result<EntityType> {
    match EntityType::from(entity_type) {
        EntityType::Other => Err(anyhow!(
            "Invalid entity type: {}. Must be one of: drug, target, disease, phase",
            entity_type
        )),
        parsed => Ok(parsed),
    }
}

fn print_response(response: &QueryResponse) -> Result<()> {
    println!("{} ({} records)", response.message, response.total_records);

    let rows = response
        .data
        .to_records()
        .context("Failed to format results")?;
    if !rows.is_empty() {
        print_table(&rows);
    }

    let info = &response.query_info;
    if !info.failed_databases.is_empty() {
        println!("Failed databases: {}", info.failed_databases.join(", "));
    }
    if !info.unsupported_databases.is_empty() {
        println!(
            "Databases without a client: {}",
            info.unsupported_databases.join(", ")
        );
    }
    Ok(())
}

/// Print records as a table, leaving out columns that hold nothing but the
/// sentinel.
fn print_table(rows: &[RawRecord]) {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for (key, value) in row {
            if columns.contains(&key.as_str()) || is_blank(value) {
                continue;
            }
            columns.push(key.as_str());
        }
    }

    let mut table = Table::new();
    table.add_row(PrettyRow::new(
        columns.iter().map(|column| Cell::new(column)).collect(),
    ));

    for row in rows {
        table.add_row(PrettyRow::new(
            columns
                .iter()
                .map(|column| Cell::new(&format_value(row.get(*column))))
                .collect(),
        ));
    }

    table.printstd();
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s == SENTINEL,
        _ => false,
    }
}

fn format_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => SENTINEL.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.2}", f),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}
