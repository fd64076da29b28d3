//! User display formatting

use serde::Serialize;
use tabled::Tabled;

use super::kv;
use crate::audit::{AuditModel, AuditQuery};
use crate::error::TrackerResult;
use crate::models::User;

/// One user in a table
#[derive(Debug, Serialize, Tabled)]
pub struct UserRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Email")]
    pub email: String,
    #[tabled(rename = "Roles")]
    pub roles: String,
    #[tabled(rename = "History")]
    pub history: String,
}

pub fn user_rows(users: &[User]) -> TrackerResult<Vec<UserRow>> {
    users
        .iter()
        .map(|u| {
            Ok(UserRow {
                id: u.id.get(),
                name: u.full_name(),
                email: u.email.clone(),
                roles: roles(u),
                history: user_history_link(u)?,
            })
        })
        .collect()
}

/// Link to the audit log filtered to one user's own records
pub fn user_history_link(user: &User) -> TrackerResult<String> {
    AuditQuery::for_record(AuditModel::User, user.id.get()).history_link()
}

/// Format a single user with all of their fields
pub fn format_user_details(user: &User, history_link: &str) -> String {
    let mut output = format!("User #{}\n", user.id);
    output.push_str(&kv("Name", user.full_name()));
    output.push_str(&kv("Email", &user.email));
    output.push_str(&kv("Roles", roles(user)));
    output.push_str(&kv("History", history_link));
    output
}

fn roles(user: &User) -> String {
    if user.roles.is_empty() {
        return "-".to_string();
    }
    user.roles
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
