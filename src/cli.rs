use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::{info, warn};

use crate::config::Config;
use crate::database::Database;
use crate::error::PillTrackError;
use crate::logging::init_logging;
use crate::progress::{ConsoleReporter, ProgressReporter};
use crate::reconciler::ReconcileReport;
use crate::reports::{self, CatalogCounts};
use crate::run::{SetupOptions, SetupRun};
use crate::schema::{ColumnMigration, Schema, MEDICATION_REMINDERS, USER_HEALTH};
use crate::users::{self, HealthUpdate, UserHealth};

const BANNER_WIDTH: usize = 60;
const MEDICATION_SAMPLE_SIZE: usize = 5;

#[derive(Parser)]
#[command(
    name = "pilltrack-db",
    version,
    about = "PillTrack: database setup, column migrations and catalog import"
)]
pub struct Cli {
    /// Config file (default: config.toml in the app data directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file (overrides [database] path)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create tables, seed reference data and import the CSV catalogs
    Setup {
        /// Drop every table first (all data is lost)
        #[arg(long)]
        reset: bool,

        /// Import medicines even though the table already has rows
        #[arg(long)]
        append: bool,

        #[arg(long)]
        skip_indications: bool,

        #[arg(long)]
        skip_medicines: bool,

        /// Medicine catalog CSV (overrides [import] medicine_csv)
        #[arg(long)]
        medicine_csv: Option<PathBuf>,

        /// Indication CSV (overrides [import] indication_csv)
        #[arg(long)]
        indication_csv: Option<PathBuf>,
    },

    /// Add the reminder columns to medications
    MigrateMedications,

    /// Add the health columns to users
    MigrateUserHealth,

    /// Set health info on a single user
    UpdateUser {
        #[arg(long)]
        id: i64,

        /// Date of birth as YYYY-MM-DD
        #[arg(long, value_parser = parse_date_arg)]
        date_of_birth: Option<NaiveDate>,

        #[arg(long)]
        blood_type: Option<String>,

        #[arg(long)]
        allergies: Option<String>,

        #[arg(long)]
        emergency_contact: Option<String>,
    },

    /// List users with their contact and health info
    CheckUsers {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Print catalog row counts
    Verify,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    users::parse_date_of_birth(s).map_err(|e| e.to_string())
}

impl Cli {
    pub fn handle_command_line() -> Result<(), PillTrackError> {
        let args = Cli::parse();

        let project_dirs = Config::project_dirs();
        let config = Config::load_config(project_dirs.as_ref(), args.config.as_deref())?;

        let log_dir = project_dirs
            .as_ref()
            .map(|dirs| dirs.data_local_dir().join("logs"));
        if let Some(dir) = &log_dir {
            fs::create_dir_all(dir)?;
        }
        let _logger = init_logging(&config.logging, log_dir.as_deref())?;

        let db_path = args
            .db
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.database.path));
        info!("Using database {}", db_path.display());

        args.command.execute(&config, &db_path)
    }
}

impl Command {
    fn execute(self, config: &Config, db_path: &Path) -> Result<(), PillTrackError> {
        match self {
            Command::Setup {
                reset,
                append,
                skip_indications,
                skip_medicines,
                medicine_csv,
                indication_csv,
            } => {
                let mut options = SetupOptions::from_config(config);
                options.reset = reset;
                options.append = append;
                options.skip_indications = skip_indications;
                options.skip_medicines = skip_medicines;
                if let Some(path) = medicine_csv {
                    options.medicine_csv = path;
                }
                if let Some(path) = indication_csv {
                    options.indication_csv = path;
                }
                Self::setup(db_path, &options)
            }
            Command::MigrateMedications => Self::migrate_medications(db_path),
            Command::MigrateUserHealth => Self::migrate_user_health(db_path),
            Command::UpdateUser {
                id,
                date_of_birth,
                blood_type,
                allergies,
                emergency_contact,
            } => Self::update_user(
                db_path,
                id,
                &HealthUpdate {
                    date_of_birth,
                    blood_type,
                    allergies,
                    emergency_contact,
                },
            ),
            Command::CheckUsers { limit } => Self::check_users(db_path, limit),
            Command::Verify => Self::verify(db_path),
        }
    }

    fn banner(title: &str) {
        println!("{}", "=".repeat(BANNER_WIDTH));
        println!("{}", title);
        println!("{}", "=".repeat(BANNER_WIDTH));
    }

    fn setup(db_path: &Path, options: &SetupOptions) -> Result<(), PillTrackError> {
        Self::banner("PillTrack Database Setup");

        if options.seed.uses_development_credential() {
            warn!("Seeding the admin account with the development password hash; set [seed] admin_password_hash for real deployments");
        }
        if options.reset {
            warn!("--reset: dropping all PillTrack tables in {}", db_path.display());
        }

        let reporter = ConsoleReporter;
        let mut run = SetupRun::new(&reporter);
        let result = run.run(db_path, options);
        info!("Setup run ended in state {}", run.state());
        let report = result?;

        println!();
        Self::banner("Setup complete");
        if let Some(summary) = &report.indications {
            println!("  Indications: {}", summary);
        }
        if let Some(summary) = &report.medicines {
            println!("  Medicines:   {}", summary);
        }
        println!();
        report.counts.print();
        Ok(())
    }

    /// Applies one column migration in its own transaction.
    fn migrate(
        db_path: &Path,
        migration: &ColumnMigration,
        reporter: &dyn ProgressReporter,
    ) -> Result<Database, PillTrackError> {
        reporter.stage_start(1, 2, "Connecting to database...");
        let mut db = Database::open_existing(db_path)?;
        reporter.stage_finish("Connected");

        reporter.stage_start(2, 2, &format!("Migrating {}...", migration.table));
        let report = db.in_transaction(|tx| migration.apply(tx))?;
        Self::print_reconcile_report(&report, reporter);

        Ok(db)
    }

    fn print_reconcile_report(report: &ReconcileReport, reporter: &dyn ProgressReporter) {
        for column in &report.added {
            reporter.stage_finish(&format!("Added column {}.{}", report.table, column));
        }
        for (column, rows) in &report.backfilled {
            reporter.stage_finish(&format!(
                "Column {}.{} already exists; backfilled {} rows",
                report.table, column, rows
            ));
        }
        for column in &report.unchanged {
            reporter.stage_finish(&format!(
                "Column {}.{} already exists",
                report.table, column
            ));
        }
        if report.is_noop() {
            reporter.stage_finish("Nothing to change");
        }
    }

    fn migrate_medications(db_path: &Path) -> Result<(), PillTrackError> {
        Self::banner("PillTrack Migration: medication reminders");
        let db = Self::migrate(db_path, &MEDICATION_REMINDERS, &ConsoleReporter)?;

        let samples = reports::sample_medications(db.conn(), MEDICATION_SAMPLE_SIZE)?;
        reports::print_medication_samples(&samples);
        db.close()
    }

    fn migrate_user_health(db_path: &Path) -> Result<(), PillTrackError> {
        Self::banner("PillTrack Migration: user health info");
        let db = Self::migrate(db_path, &USER_HEALTH, &ConsoleReporter)?;

        let columns = reports::table_columns(db.conn(), USER_HEALTH.table)?;
        reports::print_columns(USER_HEALTH.table, &columns);
        db.close()
    }

    fn update_user(db_path: &Path, id: i64, update: &HealthUpdate) -> Result<(), PillTrackError> {
        if update.is_empty() {
            return Err(PillTrackError::Error(
                "Nothing to update: pass at least one of --date-of-birth, --blood-type, --allergies, --emergency-contact".into(),
            ));
        }

        let mut db = Database::open_existing(db_path)?;
        let updated = db.in_transaction(|tx| UserHealth::update_health(tx, id, update))?;
        println!("Updated {} rows", updated);

        match UserHealth::get_by_id(db.conn(), id)? {
            Some(user) => {
                println!("\nUser after update:");
                reports::print_user(&user);
            }
            None => println!("No user with id {}", id),
        }
        db.close()
    }

    fn check_users(db_path: &Path, limit: usize) -> Result<(), PillTrackError> {
        let db = Database::open_existing(db_path)?;
        let users = UserHealth::list(db.conn(), limit)?;

        println!("\nFound {} users:\n", users.len());
        for user in &users {
            reports::print_user(user);
            println!();
        }
        db.close()
    }

    fn verify(db_path: &Path) -> Result<(), PillTrackError> {
        let db = Database::open_existing(db_path)?;

        let missing = Schema::missing_tables(db.conn())?;
        if !missing.is_empty() {
            return Err(PillTrackError::Error(format!(
                "Schema is incomplete, missing tables: {}. Run setup first",
                missing.join(", ")
            )));
        }

        let counts = CatalogCounts::load(&db)?;
        println!("Catalog counts:");
        counts.print();
        db.close()
    }
}
