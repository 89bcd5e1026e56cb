use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use schema_yaml::config::{self, Config};
use schema_yaml::platform::PLATFORM_NAMES;
use schema_yaml::utils::logging::init_logging;
use schema_yaml::{
    diff_against_database, Connection, DbPlatform, DbPlatformFactory, SchemaAnalyzer, SchemaBuilder,
    SchemaExporter, SchemaImporter, YamlSchemaImporter,
};
use tracing::info;

const CAUTION: &[&str] = &[
    "This operation should not be executed in a production environment!",
    "",
    "Use the incremental update to detect changes during development and use",
    "the SQL DDL provided to manually update your database in production.",
];

#[derive(Parser, Debug)]
#[command(name = "schema_yaml", version, about = "Import, export and dump YAML database schemas")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dump the SQL DDL of the schema.
    DumpSql(DumpSqlArgs),
    /// Export a schema as YAML.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct DumpSqlArgs {
    /// YAML schema file to import on top of the configured schema files.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
    /// Compare with the configured database and dump only the differences.
    #[arg(long, default_value_t = false)]
    compare: bool,
    /// Generate SQL for this platform instead of the database one.
    #[arg(long, value_name = "PLATFORM")]
    force_platform: Option<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// YAML schema file to normalise; the configured database is exported otherwise.
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,
    /// Output path; defaults to stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    init_logging(&config.logging)?;

    match cli.command {
        Command::DumpSql(args) => run_dump_sql(&config, args).await,
        Command::Export(args) => run_export(&config, args).await,
    }
}

async fn run_dump_sql(config: &Config, args: DumpSqlArgs) -> anyhow::Result<()> {
    let DumpSqlArgs {
        file,
        compare,
        force_platform,
    } = args;

    let forced = force_platform
        .as_deref()
        .map(forced_platform)
        .transpose()?;

    let mut builder = SchemaBuilder::from_config(config);
    builder.build_schema()?;
    if let Some(file) = &file {
        builder
            .import_schema_from_file(file)
            .with_context(|| format!("failed to import {}", file.display()))?;
    }
    let schema = builder.take_schema().unwrap_or_default();

    // Without --force-platform the database driver decides the platform
    let factory = DbPlatformFactory::default();
    let (platform, connection): (&dyn DbPlatform, Option<Connection>) = match &forced {
        Some(platform) if compare => (platform.as_ref(), Some(connect(config).await?)),
        Some(platform) => (platform.as_ref(), None),
        None => {
            let connection = connect(config).await?;
            (connection.platform(&factory)?, Some(connection))
        }
    };

    eprintln!("{}\n", CAUTION.join("\n"));

    let statements = match connection.filter(|_| compare) {
        Some(connection) => diff_against_database(connection, &schema, platform).await?,
        None => schema.to_sql(platform)?,
    };
    info!(platform = platform.name(), statements = statements.len(), "Dumped SQL");

    let mut stdout = io::stdout().lock();
    for statement in &statements {
        writeln!(stdout, "{};", statement)?;
    }
    Ok(())
}

async fn run_export(config: &Config, args: ExportArgs) -> anyhow::Result<()> {
    let schema = match &args.file {
        Some(file) => YamlSchemaImporter
            .import_from_file(file, None)
            .with_context(|| format!("failed to import {}", file.display()))?,
        None => SchemaAnalyzer::new(connect(config).await?).analyze().await?,
    };

    let exporter = SchemaExporter::default();
    match &args.output {
        Some(path) => exporter.export_to_file(&schema, path)?,
        None => io::stdout().write_all(exporter.export(&schema)?.as_bytes())?,
    }
    Ok(())
}

/// Platform named by `--force-platform`
fn forced_platform(name: &str) -> anyhow::Result<Box<dyn DbPlatform>> {
    if !PLATFORM_NAMES.contains(&name) {
        bail!(
            "Invalid --force-platform option. Received \"{}\", expected one of: \"{}\"",
            name,
            PLATFORM_NAMES.join("\",\"")
        );
    }
    Ok(DbPlatformFactory::create(name)?)
}

async fn connect(config: &Config) -> anyhow::Result<Connection> {
    let Some(database) = &config.database else {
        bail!("no [database] section in the configuration");
    };
    Connection::connect(database)
        .await
        .with_context(|| format!("failed to connect using driver {}", database.driver))
}
