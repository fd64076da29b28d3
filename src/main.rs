use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use incident_tracker::audit::Actor;
use incident_tracker::cli::{
    handle_audit_command, handle_incident_command, handle_school_command, handle_user_command,
    resolve_actor,
};
use incident_tracker::config::{paths::TrackerPaths, settings::Settings};
use incident_tracker::display::OutputFormat;
use incident_tracker::models::UserId;
use incident_tracker::services::UserService;
use incident_tracker::storage::Storage;

#[derive(Parser)]
#[command(
    name = "incident-tracker",
    version,
    about = "Incident report administration with a row-level audit log",
    long_about = "incident-tracker manages incident reports, users and schools. \
                  Every change to an incident or user is recorded in an audit log \
                  together with who made it."
)]
struct Cli {
    /// Act as this user (ID); without it changes are attributed to the system
    #[arg(long, global = true, env = "INCIDENT_TRACKER_USER")]
    as_user: Option<UserId>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Incident management commands
    #[command(subcommand)]
    Incident(incident_tracker::cli::IncidentCommands),

    /// User management commands
    #[command(subcommand)]
    User(incident_tracker::cli::UserCommands),

    /// School management commands
    #[command(subcommand)]
    School(incident_tracker::cli::SchoolCommands),

    /// Audit log commands
    #[command(subcommand)]
    Audit(incident_tracker::cli::AuditCommands),

    /// Initialize storage and create the administrator
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = TrackerPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut storage = Storage::open(paths.clone())?;

    match cli.command {
        Some(Commands::Incident(cmd)) => {
            let actor = resolve_actor(&storage, cli.as_user)?;
            handle_incident_command(&mut storage, actor, cli.format, cmd)?;
        }
        Some(Commands::User(cmd)) => {
            let actor = resolve_actor(&storage, cli.as_user)?;
            handle_user_command(&mut storage, actor, cli.format, cmd)?;
        }
        Some(Commands::School(cmd)) => {
            let actor = resolve_actor(&storage, cli.as_user)?;
            handle_school_command(&mut storage, actor, cli.format, cmd)?;
        }
        Some(Commands::Audit(cmd)) => {
            handle_audit_command(&storage, settings.page_size as usize, cli.format, cmd)?;
        }
        Some(Commands::Init) => {
            println!("Initializing incident-tracker at: {}", paths.base_dir().display());
            settings.save(&paths)?;

            let mut users = UserService::new(&mut storage, Actor::System);
            match users.ensure_admin(&settings.admin_email)? {
                Some(admin) => println!("Created administrator #{}: {}", admin.id, admin),
                None => println!("Administrator {} already exists.", settings.admin_email),
            }
            println!("Initialization complete!");
        }
        Some(Commands::Config) => {
            println!("incident-tracker Configuration");
            println!("==============================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Database file:  {}", paths.database_file().display());
            println!();
            println!("Settings:");
            println!("  Page size:   {}", settings.page_size);
            println!("  Log level:   {}", settings.log_level);
            println!("  Admin email: {}", settings.admin_email);
        }
        None => {
            println!("incident-tracker - incident administration with audit logging");
            println!();
            println!("Run 'incident-tracker --help' for usage information.");
        }
    }

    Ok(())
}
