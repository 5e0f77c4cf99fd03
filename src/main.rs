//! cotejo CLI: import, list, and compare benchmark results

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cotejo::compare::compare;
use cotejo::db::Db;
use cotejo::import::import_result;
use cotejo::model::FactValue;
use cotejo::report;

#[derive(Parser)]
#[command(name = "cotejo")]
#[command(about = "Content-addressed benchmark result database with A/B comparison")]
#[command(version)]
struct Cli {
    /// Path to the result database root
    #[arg(long, global = true, default_value = "./results")]
    result_db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an A/B comparison grouped by the experiment fact
    Compare {
        /// The fact whose values define the comparison groups
        experiment_fact: String,

        /// The metric to aggregate per group
        metric: String,

        /// Fix a fact to a value; the comparison only includes results
        /// matching this equality. Repeatable.
        #[arg(long = "fact-eq", num_args = 2, value_names = ["NAME", "VALUE"], action = clap::ArgAction::Append)]
        fact_eq: Vec<String>,
    },

    /// Import a new result into the database
    ///
    /// Files specified directly are added by name to the root of the
    /// artifacts tree. Directories are copied recursively, preserving their
    /// structure.
    Import {
        /// Name of the test the result belongs to
        test_name: String,

        /// Artifact files or directories to import
        #[arg(required = true)]
        file: Vec<PathBuf>,
    },

    /// List results in the database
    LsResults,

    /// List metrics in the database
    LsMetrics,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cotejo=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let db = Db::read(&cli.result_db)?;

    match cli.command {
        Commands::Compare {
            experiment_fact,
            metric,
            fact_eq,
        } => {
            let facts_eq = parse_fact_eq(&fact_eq);
            let groups = compare(&db, &facts_eq, &experiment_fact, &metric)?;
            print!("{}", report::render_groups(&experiment_fact, &metric, &groups));
        }
        Commands::Import { test_name, file } => {
            import_result(db.root(), &test_name, &file)?;
        }
        Commands::LsResults => print!("{}", report::render_results(&db)),
        Commands::LsMetrics => print!("{}", report::render_metrics(&db)),
    }

    Ok(())
}

/// Fold the flat `--fact-eq NAME VALUE` repetitions into a constraint map.
/// clap guarantees an even number of values; a repeated name keeps the last
/// value.
fn parse_fact_eq(pairs: &[String]) -> BTreeMap<String, FactValue> {
    pairs
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), FactValue::parse_cli(&pair[1])))
        .collect()
}
