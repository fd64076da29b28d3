//! School display formatting

use serde::Serialize;
use tabled::Tabled;

use crate::models::School;

/// One school in a table
#[derive(Debug, Serialize, Tabled)]
pub struct SchoolRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "City")]
    pub city: String,
    #[tabled(rename = "State")]
    pub state: String,
}

pub fn school_rows(schools: &[School]) -> Vec<SchoolRow> {
    schools
        .iter()
        .map(|s| SchoolRow {
            id: s.id.get(),
            name: s.name.clone(),
            city: s.city.clone(),
            state: s.state.clone(),
        })
        .collect()
}
