use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use landreg::config::Config;
use landreg::form::{
    validate_step, FormData, FormSchema, LogRenderer, SimulatedSubmission, StepController,
    SubmissionOutcome, ValidationResult,
};
use landreg::logging;
use landreg::search::{SearchCategory, SearchResults, SearchService};

#[derive(Parser)]
#[command(name = "landreg")]
#[command(about = "Land registration form controller and record search")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the steps and fields of the form
    Steps {
        /// Form definition (JSON or YAML); defaults to the built-in registration form
        #[arg(long)]
        form: Option<String>,
    },

    /// Validate one step against a values file
    Validate {
        /// Step index (0-based)
        #[arg(long)]
        step: usize,

        /// JSON object mapping field ids to values
        #[arg(long)]
        values: String,

        #[arg(long)]
        form: Option<String>,
    },

    /// Fill every step from a values file and submit
    Register {
        /// JSON object mapping field ids to values
        #[arg(long)]
        values: String,

        #[arg(long)]
        form: Option<String>,

        /// Cancel the submission if it has not finished after this many milliseconds
        #[arg(long)]
        cancel_after: Option<u64>,
    },

    /// Search sample land records
    Search {
        /// Category: property, owner or location
        category: String,

        /// Search criteria
        query: String,
    },

    /// Show full details for a record
    Details {
        /// Record id (e.g., LR-2023-5842)
        id: String,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;
    let logging_handle = logging::init_logging(&config, cli.debug)?;

    match cli.command {
        Commands::Steps { form } => cmd_steps(&config, form.as_deref())?,
        Commands::Validate { step, values, form } => {
            cmd_validate(&config, step, &values, form.as_deref())?;
        }
        Commands::Register {
            values,
            form,
            cancel_after,
        } => cmd_register(&config, &values, form.as_deref(), cancel_after).await?,
        Commands::Search { category, query } => cmd_search(&config, &category, &query).await?,
        Commands::Details { id } => cmd_details(&config, &id).await?,
        Commands::Config => print!("{}", config.to_toml()?),
    }

    if let Some(log_path) = logging_handle.log_file_path {
        eprintln!("Session log: {}", log_path.display());
    }

    Ok(())
}

/// Resolve the form definition: CLI flag, then config, then the built-in form
fn load_form(config: &Config, form: Option<&str>) -> Result<FormSchema> {
    let Some(path) = form.or(config.form.definition.as_deref()) else {
        return FormSchema::registration().context("Built-in registration form is invalid");
    };

    let path = Path::new(path);
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read form definition {}", path.display()))?;

    let schema = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => FormSchema::from_yaml(&contents),
        _ => FormSchema::from_json(&contents),
    };
    schema.with_context(|| format!("Invalid form definition {}", path.display()))
}

fn load_values(path: &str) -> Result<FormData> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read values file {}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid values file {}", path))
}

fn cmd_steps(config: &Config, form: Option<&str>) -> Result<()> {
    let schema = load_form(config, form)?;

    println!("{} ({} steps)", schema.name, schema.len());
    println!("{}", "─".repeat(60));

    for (index, step) in schema.steps().iter().enumerate() {
        println!("{}. {}", index + 1, step.title);
        for field in &step.fields {
            let marker = if field.required { "*" } else { " " };
            let hint = field
                .placeholder
                .as_deref()
                .map(|p| format!(" [{}]", p))
                .unwrap_or_default();
            println!(
                "   {} {:<24} {:<8} {}{}",
                marker,
                field.id,
                format!("{:?}", field.kind).to_lowercase(),
                field.label,
                hint
            );
        }
    }

    Ok(())
}

fn cmd_validate(config: &Config, step: usize, values: &str, form: Option<&str>) -> Result<()> {
    let schema = load_form(config, form)?;
    let values = load_values(values)?;

    let result = validate_step(&schema, step, &values)?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

fn print_step_errors(result: &ValidationResult) {
    println!("Step {} is incomplete:", result.step + 1);
    for error in result.errors() {
        println!("  {}: {}", error.field, error.message);
    }
}

async fn cmd_register(
    config: &Config,
    values: &str,
    form: Option<&str>,
    cancel_after: Option<u64>,
) -> Result<()> {
    let schema = load_form(config, form)?;
    let values = load_values(values)?;

    let sink = Arc::new(SimulatedSubmission::new(config.submission_delay()));
    let mut controller = StepController::new(schema, sink, Box::new(LogRenderer));

    for (field, value) in values.iter() {
        if let Err(e) = controller.set_value(field, value) {
            tracing::warn!(error = %e, "Ignoring value");
        }
    }

    while !controller.is_final_step() {
        let result = controller.go_next()?;
        if !result.is_valid() {
            print_step_errors(&result);
            return Ok(());
        }
    }

    let result = controller.submit()?;
    if !result.is_valid() {
        print_step_errors(&result);
        return Ok(());
    }

    let outcome = match cancel_after {
        Some(ms) => {
            let waited =
                tokio::time::timeout(Duration::from_millis(ms), controller.wait_for_submission())
                    .await;
            if let Ok(outcome) = waited {
                outcome
            } else {
                controller.cancel_submission();
                println!("Submission cancelled after {}ms", ms);
                return Ok(());
            }
        }
        None => controller.wait_for_submission().await,
    };

    match outcome {
        Some(SubmissionOutcome::Submitted(receipt)) => {
            println!("{} submitted", controller.schema().name);
            println!("  Reference: {}", receipt.reference);
            println!("  Submitted: {}", receipt.submitted_at.to_rfc3339());
            println!("  Fields:    {}", receipt.field_count);
        }
        Some(SubmissionOutcome::Failed(message)) => println!("{}", message),
        None => println!("Nothing was submitted"),
    }

    Ok(())
}

async fn cmd_search(config: &Config, category: &str, query: &str) -> Result<()> {
    let category: SearchCategory = category.parse()?;
    let service = SearchService::embedded(config.search_latency())?;

    println!("Searching...");
    let results = service.search(category, query).await?;

    let records = match &results {
        SearchResults::Single(record) => {
            println!("Property Found");
            std::slice::from_ref(record)
        }
        SearchResults::Many(records) => {
            println!("{} Properties Found", records.len());
            records.as_slice()
        }
    };
    for record in records {
        println!("  {:<14} {}", record.id, record.location());
    }
    println!("{}", serde_json::to_string_pretty(&results)?);

    Ok(())
}

async fn cmd_details(config: &Config, id: &str) -> Result<()> {
    let service = SearchService::embedded(config.search_latency())?;

    if !service.catalog().has_details(id) {
        tracing::info!(id, "No dedicated details, showing default record");
    }
    let details = service.details(id).await;
    println!("{}", serde_json::to_string_pretty(&details)?);

    Ok(())
}
