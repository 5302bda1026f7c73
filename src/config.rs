use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    ConnectOptions,
};
use std::path::Path;

pub const DEFAULT_DB: &str = "list.db";
pub const DEFAULT_BIND_JSON: &str = "0.0.0.0:8080";
pub const DEFAULT_BIND_GRPC: &str = "0.0.0.0:8081";
pub const ENV_PREFIX: &str = "EMAILLIST";

/// Command line flags. Each one wins over the environment, the config file
/// and the defaults.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path of the SQLite database file
    #[arg(long = "db-path", value_name = "FILE")]
    pub db: Option<String>,

    /// Address the JSON API listens on
    #[arg(long, value_name = "ADDR")]
    pub bind_json: Option<String>,

    /// Address the gRPC API listens on
    #[arg(long, value_name = "ADDR")]
    pub bind_grpc: Option<String>,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    /// Path of the SQLite database file, created when missing
    pub db: String,
    pub bind_json: String,
    pub bind_grpc: String,
}

impl Settings {
    pub fn get_store_options(&self) -> SqliteConnectOptions {
        let mut db_options = SqliteConnectOptions::new()
            .filename(&self.db)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        db_options.log_statements(tracing::log::LevelFilter::Trace);

        db_options
    }

    pub fn get_json_address(&self) -> String {
        self.bind_json.clone()
    }

    pub fn get_grpc_address(&self) -> String {
        self.bind_grpc.clone()
    }

    pub fn set_db(&mut self, db: String) {
        self.db = db
    }

    pub fn set_bind_json(&mut self, address: String) {
        self.bind_json = address
    }

    pub fn set_bind_grpc(&mut self, address: String) {
        self.bind_grpc = address
    }
}

pub fn get_configuration(args: &CliArgs) -> Result<Settings, ConfigError> {
    let root_path =
        std::env::current_dir().map_err(|err| ConfigError::Foreign(Box::new(err)))?;

    get_configuration_from(
        &root_path.join("config"),
        Environment::with_prefix(ENV_PREFIX),
        args,
    )
}

/// Layers, from lowest to highest priority: defaults, `base.yaml` in
/// `config_directory`, `environment`, then the command line flags.
pub fn get_configuration_from(
    config_directory: &Path,
    environment: Environment,
    args: &CliArgs,
) -> Result<Settings, ConfigError> {
    let settings = Config::builder()
        .set_default("db", DEFAULT_DB)?
        .set_default("bind_json", DEFAULT_BIND_JSON)?
        .set_default("bind_grpc", DEFAULT_BIND_GRPC)?
        .add_source(File::from(config_directory.join("base")).required(false))
        // E.g EMAILLIST_BIND_JSON would set Settings.bind_json
        .add_source(environment)
        .set_override_option("db", args.db.clone())?
        .set_override_option("bind_json", args.bind_json.clone())?
        .set_override_option("bind_grpc", args.bind_grpc.clone())?
        .build()?;

    settings.try_deserialize()
}
