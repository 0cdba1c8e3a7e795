//! Lecture catalog CLI
//!
//! Queries the flat-file catalog and prints JSON on stdout.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lecture_catalog::{
    Catalog, Session,
    error::{AppError, Result},
    models::{Config, LectureId},
    services::{ALL, PaymentAggregator},
};
use serde::Serialize;

/// Lecture catalog browser
#[derive(Parser, Debug)]
#[command(name = "catalog", version, about = "Lecture catalog queries and enrollment")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "catalog.toml")]
    config: PathBuf,

    /// Override the data directory from the configuration
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the lecture catalog
    Lectures {
        #[arg(long, default_value = ALL)]
        subject: String,

        /// Grade bucket, e.g. "고2" or "고3/N수"
        #[arg(long, default_value = ALL)]
        grade: String,

        #[arg(long, default_value = ALL)]
        academy: String,

        /// Sort option, e.g. "평점순"
        #[arg(long, default_value = "")]
        sort: String,

        /// Matches title or instructor
        #[arg(long, default_value = "")]
        keyword: String,
    },

    /// Show a user's weekly schedule
    Schedule {
        #[arg(long)]
        user: String,
    },

    /// Show a user's enrolled lectures with textbooks
    MyLectures {
        #[arg(long)]
        user: String,
    },

    /// Enroll a user in a lecture
    Enroll {
        #[arg(long)]
        user: String,

        /// Lecture ID, "L001" or "1"
        #[arg(long)]
        lecture: String,
    },

    /// Show a user's payment summary
    Payments {
        #[arg(long)]
        user: String,

        /// Size of the recent window (default from config)
        #[arg(long)]
        recent: Option<usize>,

        /// Print totals per month instead
        #[arg(long)]
        monthly: bool,
    },

    /// Show an instructor profile
    Instructor {
        #[arg(long)]
        id: String,
    },

    /// Validate configuration and report what loads
    Validate,
}

/// Initialize logging; `--verbose` wins over the configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::default(),
    };
    init_logging(cli.verbose, &config.logging.level);

    match loaded {
        Ok(_) => log::info!("Loaded configuration from {}", cli.config.display()),
        Err(e) => log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        ),
    }
    if let Some(dir) = cli.data_dir {
        config.data.dir = dir;
    }

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    let catalog = Catalog::open(&config)?;

    match cli.command {
        Command::Lectures {
            subject,
            grade,
            academy,
            sort,
            keyword,
        } => {
            let lectures = catalog
                .lecture_query()
                .search(&subject, &grade, &academy, &sort, &keyword);
            log::info!("{} lectures matched", lectures.len());
            print_json(&lectures)?;
        }

        Command::Schedule { user } => {
            print_json(&catalog.my_schedule(&Session::new(user))?)?;
        }

        Command::MyLectures { user } => {
            print_json(&catalog.my_lectures(&Session::new(user))?)?;
        }

        Command::Enroll { user, lecture } => {
            let lecture_id = LectureId::parse(&lecture)?;
            let outcome = catalog.enroll(&Session::new(user), lecture_id)?;
            print_json(&outcome)?;
        }

        Command::Payments {
            user,
            recent,
            monthly,
        } => {
            let aggregator = catalog.payment_aggregator();
            if monthly {
                let payments = aggregator.find_by_user(&user);
                print_json(&PaymentAggregator::monthly_totals(&payments))?;
            } else {
                let recent = recent.unwrap_or(config.query.recent_payments);
                print_json(&aggregator.summary(&user, recent))?;
            }
        }

        Command::Instructor { id } => {
            let profile = catalog
                .instructor_directory()
                .profile(&id)
                .ok_or_else(|| AppError::validation(format!("unknown instructor '{id}'")))?;
            print_json(&profile)?;
        }

        Command::Validate => {
            log::info!("✓ Config OK");
            let report = [
                ("lectures", catalog.lectures().summary()),
                ("instructors", catalog.instructors().summary()),
                ("textbooks", catalog.textbooks().summary()),
                ("reviews", catalog.reviews().summary()),
                ("payments", catalog.payments().summary()),
            ];
            for (name, summary) in report {
                if summary.missing {
                    log::warn!("✗ {}: file not found", name);
                } else {
                    log::info!(
                        "✓ {}: {} loaded, {} skipped, {} duplicates",
                        name,
                        summary.loaded,
                        summary.skipped,
                        summary.duplicates
                    );
                }
            }
            log::info!("✓ users: {} readable", catalog.users().find_all()?.len());
            log::info!("All validations passed!");
        }
    }

    Ok(())
}
