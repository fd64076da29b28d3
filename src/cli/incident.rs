//! Incident CLI commands
//!
//! Implements CLI commands for incident management.

use clap::Subcommand;

use crate::audit::{Actor, AuditModel, AuditQuery};
use crate::display::{format_incident_details, incident_rows, render_json, render_list, OutputFormat};
use crate::error::{TrackerError, TrackerResult};
use crate::models::{IncidentId, IncidentStatus, UserId};
use crate::services::{IncidentService, IncidentUpdate, NewIncident};
use crate::storage::Storage;

/// Incident subcommands
#[derive(Subcommand)]
pub enum IncidentCommands {
    /// Report a new incident
    Create {
        /// One-line summary
        summary: String,
        /// Two-letter state code
        #[arg(short, long)]
        state: String,
        /// City
        #[arg(short, long, default_value = "")]
        city: String,
        /// Longer description
        #[arg(short, long, default_value = "")]
        details: String,
        /// Status (active, filed)
        #[arg(long)]
        status: Option<String>,
        /// Owning user ID
        #[arg(short, long)]
        owner: Option<UserId>,
    },
    /// List incidents
    List {
        /// Only show incidents with this status
        #[arg(long)]
        status: Option<String>,
    },
    /// Show incident details
    Show {
        /// Incident ID
        id: IncidentId,
    },
    /// Edit an incident
    Edit {
        /// Incident ID
        id: IncidentId,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        details: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        /// New status (active, filed)
        #[arg(long)]
        status: Option<String>,
        /// New owning user ID
        #[arg(long, conflicts_with = "clear_owner")]
        owner: Option<UserId>,
        /// Remove the owner
        #[arg(long)]
        clear_owner: bool,
    },
    /// Delete an incident
    Delete {
        /// Incident ID
        id: IncidentId,
    },
}

/// Handle an incident command
pub fn handle_incident_command(
    storage: &mut Storage,
    actor: Actor,
    format: OutputFormat,
    cmd: IncidentCommands,
) -> TrackerResult<()> {
    let mut service = IncidentService::new(storage, actor);

    match cmd {
        IncidentCommands::Create {
            summary,
            state,
            city,
            details,
            status,
            owner,
        } => {
            let incident = service.create(NewIncident {
                summary,
                details,
                city,
                state,
                status: status.as_deref().map(parse_status).transpose()?,
                owner_id: owner,
            })?;

            println!("Created incident #{}: {}", incident.id, incident.summary);
            println!("  Status: {}", incident.status);
        }

        IncidentCommands::List { status } => {
            let status = status.as_deref().map(parse_status).transpose()?;
            let incidents = service.list(status)?;
            println!(
                "{}",
                render_list(&incident_rows(&incidents), format, "No incidents found.")
            );
        }

        IncidentCommands::Show { id } => {
            let incident = service
                .get(id)?
                .ok_or_else(|| TrackerError::incident_not_found(id.to_string()))?;

            match format {
                OutputFormat::Json => println!("{}", render_json(&incident)),
                OutputFormat::Table => {
                    let link = AuditQuery::for_record(AuditModel::Incident, id.get()).history_link()?;
                    print!("{}", format_incident_details(&incident, &link));
                }
            }
        }

        IncidentCommands::Edit {
            id,
            summary,
            details,
            city,
            state,
            status,
            owner,
            clear_owner,
        } => {
            let owner_id = if clear_owner { Some(None) } else { owner.map(Some) };
            let incident = service.update(
                id,
                IncidentUpdate {
                    summary,
                    details,
                    city,
                    state,
                    status: status.as_deref().map(parse_status).transpose()?,
                    owner_id,
                },
            )?;

            println!("Updated incident #{}: {}", incident.id, incident.summary);
        }

        IncidentCommands::Delete { id } => {
            let incident = service.delete(id)?;
            println!("Deleted incident #{}: {}", incident.id, incident.summary);
        }
    }

    Ok(())
}

fn parse_status(s: &str) -> TrackerResult<IncidentStatus> {
    IncidentStatus::parse(s).ok_or_else(|| {
        TrackerError::Validation(format!(
            "Invalid status: '{}'. Valid statuses: active, filed",
            s
        ))
    })
}
