//! School CLI commands

use clap::Subcommand;

use crate::audit::Actor;
use crate::display::{render_list, school_rows, OutputFormat};
use crate::error::TrackerResult;
use crate::services::SchoolService;
use crate::storage::Storage;

/// School subcommands
#[derive(Subcommand)]
pub enum SchoolCommands {
    /// Add a school
    Create {
        /// School name
        name: String,
        /// Two-letter state code
        #[arg(short, long)]
        state: String,
        /// City
        #[arg(short, long, default_value = "")]
        city: String,
    },
    /// List schools
    List,
}

/// Handle a school command
pub fn handle_school_command(
    storage: &mut Storage,
    actor: Actor,
    format: OutputFormat,
    cmd: SchoolCommands,
) -> TrackerResult<()> {
    let mut service = SchoolService::new(storage, actor);

    match cmd {
        SchoolCommands::Create { name, state, city } => {
            let school = service.create(&name, &city, &state)?;
            println!("Created school #{}: {}", school.id, school);
        }
        SchoolCommands::List => {
            let schools = service.list()?;
            println!(
                "{}",
                render_list(&school_rows(&schools), format, "No schools found.")
            );
        }
    }

    Ok(())
}
