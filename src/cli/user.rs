//! User CLI commands

use clap::Subcommand;

use crate::audit::Actor;
use crate::display::{
    format_user_details, render_json, render_list, user_history_link, user_rows, OutputFormat,
};
use crate::error::{TrackerError, TrackerResult};
use crate::models::{User, UserRole};
use crate::services::{UserService, UserUpdate};
use crate::storage::Storage;

/// User subcommands
#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a new user
    Create {
        first_name: String,
        last_name: String,
        email: String,
        /// Role to grant (admin, editor); repeatable
        #[arg(short, long = "role")]
        roles: Vec<String>,
    },
    /// List users
    List,
    /// Show user details
    Show {
        /// User ID or email
        user: String,
    },
    /// Edit a user
    Edit {
        /// User ID or email
        user: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Replace the user's roles; repeatable
        #[arg(short, long = "role")]
        roles: Vec<String>,
        /// Remove all roles
        #[arg(long, conflicts_with = "roles")]
        no_roles: bool,
    },
    /// Delete a user
    Delete {
        /// User ID or email
        user: String,
    },
}

/// Handle a user command
pub fn handle_user_command(
    storage: &mut Storage,
    actor: Actor,
    format: OutputFormat,
    cmd: UserCommands,
) -> TrackerResult<()> {
    let mut service = UserService::new(storage, actor);

    match cmd {
        UserCommands::Create {
            first_name,
            last_name,
            email,
            roles,
        } => {
            let roles = parse_roles(&roles)?;
            let user = service.create(&first_name, &last_name, &email, roles)?;
            println!("Created user #{}: {}", user.id, user);
        }

        UserCommands::List => {
            let users = service.list()?;
            println!("{}", render_list(&user_rows(&users)?, format, "No users found."));
        }

        UserCommands::Show { user } => {
            let found = find_user(&service, &user)?;
            match format {
                OutputFormat::Json => println!("{}", render_json(&found)),
                OutputFormat::Table => {
                    let link = user_history_link(&found)?;
                    print!("{}", format_user_details(&found, &link));
                }
            }
        }

        UserCommands::Edit {
            user,
            first_name,
            last_name,
            email,
            roles,
            no_roles,
        } => {
            let found = find_user(&service, &user)?;
            let roles = if no_roles {
                Some(Vec::new())
            } else if roles.is_empty() {
                None
            } else {
                Some(parse_roles(&roles)?)
            };

            let updated = service.update(
                found.id,
                UserUpdate {
                    first_name,
                    last_name,
                    email,
                    roles,
                },
            )?;
            println!("Updated user #{}: {}", updated.id, updated);
        }

        UserCommands::Delete { user } => {
            let found = find_user(&service, &user)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted user #{}: {}", deleted.id, deleted);
        }
    }

    Ok(())
}

fn find_user(service: &UserService<'_>, identifier: &str) -> TrackerResult<User> {
    service
        .find(identifier)?
        .ok_or_else(|| TrackerError::user_not_found(identifier))
}

fn parse_roles(roles: &[String]) -> TrackerResult<Vec<UserRole>> {
    roles
        .iter()
        .map(|r| {
            UserRole::parse(r).ok_or_else(|| {
                TrackerError::Validation(format!("Invalid role: '{}'. Valid roles: admin, editor", r))
            })
        })
        .collect()
}
