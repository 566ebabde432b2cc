use std::fs;
use std::path::Path;

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::PillTrackError;

const CONFIG_FILENAME: &str = "config.toml";
const ENV_PREFIX: &str = "PILLTRACK_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub pilltrack: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const PILLTRACK_LEVEL: &str = "info";

    fn default() -> Self {
        LoggingConfig {
            pilltrack: Self::PILLTRACK_LEVEL.to_string(),
        }
    }

    fn ensure_valid(&mut self) {
        let str_original = self.pilltrack.clone();
        self.pilltrack = self.pilltrack.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.pilltrack.as_str()) {
            eprintln!(
                "Config error: pilltrack log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::PILLTRACK_LEVEL
            );
            self.pilltrack = Self::PILLTRACK_LEVEL.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub path: String,
}

impl DatabaseConfig {
    const DEFAULT_PATH: &str = "pilltrack.db";

    fn default() -> Self {
        DatabaseConfig {
            path: Self::DEFAULT_PATH.to_owned(),
        }
    }

    fn ensure_valid(&mut self) {
        self.path = self.path.trim().to_owned();
        if self.path.is_empty() {
            eprintln!(
                "Config error: database path is empty - using default of '{}'",
                Self::DEFAULT_PATH
            );
            self.path = Self::DEFAULT_PATH.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImportConfig {
    pub medicine_csv: String,
    pub indication_csv: String,
    pub progress_interval: usize,
}

impl ImportConfig {
    const MEDICINE_CSV: &str = "med_DB/medicine.csv";
    const INDICATION_CSV: &str = "med_DB/indication.csv";
    pub const PROGRESS_INTERVAL: usize = 1000;

    fn default() -> Self {
        ImportConfig {
            medicine_csv: Self::MEDICINE_CSV.to_owned(),
            indication_csv: Self::INDICATION_CSV.to_owned(),
            progress_interval: Self::PROGRESS_INTERVAL,
        }
    }

    fn ensure_valid(&mut self) {
        if self.progress_interval == 0 {
            eprintln!(
                "Config error: progress_interval must be positive - using default of {}",
                Self::PROGRESS_INTERVAL
            );
            self.progress_interval = Self::PROGRESS_INTERVAL;
        }
    }
}

/// Fixed rows written by `setup`. The admin password is stored as given, so it
/// must already be a bcrypt hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SeedConfig {
    pub admin_name: String,
    pub admin_email: String,
    pub admin_password_hash: String,
}

impl SeedConfig {
    const ADMIN_NAME: &str = "Admin User";
    const ADMIN_EMAIL: &str = "admin@pilltrack.com";
    // bcrypt (10 rounds) of the development password "admin123"
    const DEV_PASSWORD_HASH: &str =
        "$2a$10$EqKcp1WFKVQISheBxkguQuqDFOXEewZVSWXeHh6e7bP3FGlg6m7Ji";

    fn default() -> Self {
        SeedConfig {
            admin_name: Self::ADMIN_NAME.to_owned(),
            admin_email: Self::ADMIN_EMAIL.to_owned(),
            admin_password_hash: Self::DEV_PASSWORD_HASH.to_owned(),
        }
    }

    pub fn uses_development_credential(&self) -> bool {
        self.admin_password_hash == Self::DEV_PASSWORD_HASH
    }

    fn ensure_valid(&mut self) {
        self.admin_email = self.admin_email.trim().to_ascii_lowercase();
        if !self.admin_email.contains('@') {
            eprintln!(
                "Config error: admin email of '{}' is invalid - using default of '{}'",
                self.admin_email,
                Self::ADMIN_EMAIL
            );
            self.admin_email = Self::ADMIN_EMAIL.to_owned();
        }

        if !self.admin_password_hash.starts_with("$2") {
            eprintln!("Config error: admin password hash is not a bcrypt hash - using the development credential");
            self.admin_password_hash = Self::DEV_PASSWORD_HASH.to_owned();
        }

        if self.admin_name.trim().is_empty() {
            self.admin_name = Self::ADMIN_NAME.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub database: DatabaseConfig,
    pub import: ImportConfig,
    pub seed: SeedConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig::default(),
            import: ImportConfig::default(),
            seed: SeedConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "pilltrack")
    }

    /// Loads the configuration, layering defaults, the TOML file and `PILLTRACK_`
    /// environment variables (`__` separates sections, e.g. `PILLTRACK_DATABASE__PATH`).
    ///
    /// With no explicit path the file lives in the app's data directory and a default
    /// file is written there if none exists yet. An explicit path must exist.
    pub fn load_config(
        project_dirs: Option<&ProjectDirs>,
        explicit_path: Option<&Path>,
    ) -> Result<Self, PillTrackError> {
        let config_path = match explicit_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(PillTrackError::Error(format!(
                        "Config file '{}' does not exist",
                        path.display()
                    )));
                }
                Some(path.to_path_buf())
            }
            None => project_dirs.map(|dirs| {
                let path = dirs.data_local_dir().join(CONFIG_FILENAME);
                Self::write_default_if_missing(&path);
                path
            }),
        };

        let mut config: Config = Self::figment(config_path.as_deref())
            .extract()
            .map_err(Box::new)?;
        config.ensure_valid();

        Ok(config)
    }

    fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn write_default_if_missing(config_path: &Path) {
        if config_path.exists() {
            return;
        }

        if let Some(parent) = config_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!(
                    "Failed to create configuration directory {}: {}",
                    parent.display(),
                    e
                );
                return;
            }
        }

        match toml::to_string_pretty(&Config::default()) {
            Ok(toml_string) => {
                if let Err(e) = fs::write(config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            }
            Err(_) => eprintln!("Failed to serialize default config."),
        }
    }

    fn ensure_valid(&mut self) {
        self.database.ensure_valid();
        self.import.ensure_valid();
        self.seed.ensure_valid();
        self.logging.ensure_valid();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config: Config = Config::figment(None).extract()?;
            assert_eq!(config, Config::default());
            assert_eq!(config.import.progress_interval, 1000);
            assert!(config.seed.uses_development_credential());
            Ok(())
        });
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [database]
                path = "/var/lib/pilltrack/prod.db"

                [import]
                medicine_csv = "data/medicine.csv"
                indication_csv = "data/indication.csv"
                progress_interval = 250
                "#,
            )?;

            let config: Config = Config::figment(Some(Path::new("config.toml"))).extract()?;
            assert_eq!(config.database.path, "/var/lib/pilltrack/prod.db");
            assert_eq!(config.import.medicine_csv, "data/medicine.csv");
            assert_eq!(config.import.progress_interval, 250);
            assert_eq!(config.logging, LoggingConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[database]\npath = \"from-file.db\"\n")?;
            jail.set_env("PILLTRACK_DATABASE__PATH", "from-env.db");
            jail.set_env("PILLTRACK_LOGGING__PILLTRACK", "debug");

            let config: Config = Config::figment(Some(Path::new("config.toml"))).extract()?;
            assert_eq!(config.database.path, "from-env.db");
            assert_eq!(config.logging.pilltrack, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = Config::load_config(None, Some(Path::new("/nonexistent/pilltrack.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_ensure_valid_restores_defaults() {
        let mut config = Config::default();
        config.logging.pilltrack = " LOUD ".to_string();
        config.import.progress_interval = 0;
        config.database.path = "   ".to_string();
        config.seed.admin_email = "nobody".to_string();
        config.seed.admin_password_hash = "plaintext".to_string();

        config.ensure_valid();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_ensure_valid_normalizes_log_level() {
        let mut logging = LoggingConfig {
            pilltrack: "  WARN ".to_string(),
        };
        logging.ensure_valid();
        assert_eq!(logging.pilltrack, "warn");
    }
}
