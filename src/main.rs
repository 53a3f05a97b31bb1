use anyhow::Context;
use clap::{Parser, Subcommand};
use containerservice_testing::auth::JwtAuthHarness;
use containerservice_testing::config::HarnessConfig;
use containerservice_testing::coverage::AuthCoverage;
use containerservice_testing::router::RouteTable;
use std::path::{Path, PathBuf};

/// Container service test harness - inspect auth coverage and JWT test env
#[derive(Parser, Debug)]
#[command(name = "containerservice-testing")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to harness configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the authentication cases generated for a controller
    Cases {
        /// Route table YAML file
        #[arg(short, long)]
        routes: PathBuf,

        /// Test or controller type name, e.g. WidgetsControllerTest
        #[arg(long)]
        controller: String,
    },
    /// Generate a keypair and print the default JWT env plus a valid token
    Env,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<HarnessConfig> {
    let config = match path {
        Some(path) => HarnessConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => HarnessConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn print_cases(config: &HarnessConfig, routes: &Path, controller: &str) -> anyhow::Result<()> {
    let table = RouteTable::from_file(routes)
        .with_context(|| format!("Failed to load routes from {}", routes.display()))?;
    let coverage = AuthCoverage::declare(&table, controller, &config.coverage)?;

    tracing::info!(
        controller = %coverage.controller(),
        cases = coverage.len(),
        "Generated authentication cases"
    );

    for case in coverage.cases() {
        println!(
            "{}\t{} {}\t-> {}",
            case.name,
            case.verb,
            case.path,
            case.expected_status().as_u16()
        );
    }
    Ok(())
}

fn print_env(config: &HarnessConfig) -> anyhow::Result<()> {
    let harness = JwtAuthHarness::new(config.jwt.clone())?;
    let env = harness.default_env()?;

    for (name, value) in env.iter() {
        // PEM values span lines; quote them for shell use
        println!("{}={:?}", name, value.unwrap_or_default());
    }
    println!("AUTHORIZATION={:?}", harness.valid_token()?.authorization_value());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    containerservice_testing::logging::init_subscriber(&config.logging)
        .context("Failed to initialize logging subsystem")?;

    match &args.command {
        Command::Cases { routes, controller } => print_cases(&config, routes, controller),
        Command::Env => print_env(&config),
    }
}
