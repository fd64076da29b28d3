//! Audit log CLI commands

use clap::Subcommand;

use crate::audit::{
    list_audit_records, record_history, resolve_actors, AuditAction, AuditModel, AuditQuery,
    MAX_PAGE_SIZE,
};
use crate::display::{format_audit_page, format_record_history, render_json, OutputFormat};
use crate::error::{TrackerError, TrackerResult};
use crate::models::UserId;
use crate::storage::Storage;

/// Audit subcommands
#[derive(Subcommand)]
pub enum AuditCommands {
    /// List audit records
    List {
        /// Audited model (incident, user)
        #[arg(short, long)]
        model: Option<String>,
        /// Primary key of the audited record
        #[arg(short, long)]
        record: Option<i64>,
        /// Action (insert, update, delete)
        #[arg(short, long)]
        action: Option<String>,
        /// Acting user ID
        #[arg(short, long)]
        user: Option<UserId>,
        /// Filters from an audit log link or query string
        #[arg(long, conflicts_with_all = ["model", "record", "action", "user"])]
        link: Option<String>,
        /// Page size (defaults to the configured page size)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Records to skip
        #[arg(long, default_value = "0")]
        offset: usize,
        /// Show the most recent records first
        #[arg(long)]
        newest_first: bool,
    },
    /// Show the full history of one record
    History {
        /// Audited model (incident, user)
        model: String,
        /// Primary key
        id: i64,
    },
    /// Print the audit log link for one record
    Link {
        /// Audited model (incident, user)
        model: String,
        /// Primary key
        id: i64,
    },
}

/// Handle an audit command
pub fn handle_audit_command(
    storage: &Storage,
    page_size: usize,
    format: OutputFormat,
    cmd: AuditCommands,
) -> TrackerResult<()> {
    match cmd {
        AuditCommands::List {
            model,
            record,
            action,
            user,
            link,
            limit,
            offset,
            newest_first,
        } => {
            let mut query = match link {
                Some(link) => AuditQuery::from_query_string(&link)?,
                None => AuditQuery {
                    model_name: model.as_deref().map(parse_model).transpose()?,
                    record_id: record,
                    action: action.as_deref().map(parse_action).transpose()?,
                    user_id: user,
                    ..AuditQuery::default()
                },
            };
            query.limit = Some(limit.unwrap_or(page_size.clamp(1, MAX_PAGE_SIZE)));
            query.offset = offset;
            query.newest_first = newest_first;

            let page = list_audit_records(storage, &query)?;
            let views = resolve_actors(storage, &page.records)?;
            println!("{}", format_audit_page(&page, &views, format));
        }

        AuditCommands::History { model, id } => {
            let model_name = parse_model(&model)?;
            let records = record_history(storage, model_name, id)?;
            let views = resolve_actors(storage, &records)?;
            let subject = format!("{}#{}", model_name, id);

            match format {
                OutputFormat::Json => println!("{}", render_json(&views)),
                OutputFormat::Table => print!("{}", format_record_history(&subject, &views)),
            }
        }

        AuditCommands::Link { model, id } => {
            let query = AuditQuery::for_record(parse_model(&model)?, id);
            println!("{}", query.history_link()?);
        }
    }

    Ok(())
}

fn parse_model(s: &str) -> TrackerResult<AuditModel> {
    AuditModel::parse(s).ok_or_else(|| {
        TrackerError::Query(format!(
            "Invalid model: '{}'. Audited models: incident, user",
            s
        ))
    })
}

fn parse_action(s: &str) -> TrackerResult<AuditAction> {
    AuditAction::parse(s).ok_or_else(|| {
        TrackerError::Query(format!(
            "Invalid action: '{}'. Valid actions: insert, update, delete",
            s
        ))
    })
}
