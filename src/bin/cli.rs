//! BGU course catalog CLI
//!
//! Local entry point: runs one query against the live upstream and the
//! on-disk cache, printing the result as JSON.

use std::path::PathBuf;

use bgu_catalog::{
    Catalog, TermQuery,
    error::Result,
    models::Config,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

/// catalog - BGU course catalog cache
#[derive(Parser, Debug)]
#[command(name = "catalog", version, about = "BGU course catalog sync and query")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the storage directory from config
    #[arg(short, long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct QueryArgs {
    #[arg(long)]
    dept: Option<String>,
    #[arg(long)]
    degree: Option<String>,
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    semester: Option<String>,
}

impl From<QueryArgs> for TermQuery {
    fn from(args: QueryArgs) -> Self {
        TermQuery {
            dept: args.dept,
            degree: args.degree,
            year: args.year,
            semester: args.semester,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the department directory
    Departments,

    /// List courses of a department offered in a term
    Courses(QueryArgs),

    /// Dump every cached course with its offerings
    All,

    /// Show one course with related and blocked courses
    Course {
        /// Course id, full (202.1.1011) or bare number
        id: String,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    if let Some(dir) = &cli.storage_dir {
        config.storage.dir = dir.display().to_string();
    }
    log::debug!("Using storage directory {}", config.storage.dir);

    if let Command::Validate = cli.command {
        if let Err(e) = config.validate() {
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
        log::info!("✓ Config OK");
        return Ok(());
    }

    let catalog = Catalog::from_config(&config)?;

    match cli.command {
        Command::Departments => print_json(&catalog.departments().await)?,
        Command::Courses(args) => {
            print_json(&catalog.courses_by_department(&args.into()).await)?
        }
        Command::All => print_json(&catalog.all_courses().await)?,
        Command::Course { id, query } => {
            match catalog.course_detail(&id, &query.into()).await {
                Some(view) => print_json(&view)?,
                None => log::warn!("Course {} not found", id),
            }
        }
        Command::Validate => {}
    }

    Ok(())
}
