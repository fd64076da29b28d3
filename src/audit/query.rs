//! Read side of the audit log
//!
//! Filtered, paginated listing of committed records, deep links to a single
//! entity's history, and actor labels for display. Nothing here writes.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{TrackerError, TrackerResult};
use crate::models::{User, UserId};
use crate::storage::Storage;

use super::record::{AuditAction, AuditModel, AuditRecord};

/// Page size used when a query does not set one
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page a query may request
pub const MAX_PAGE_SIZE: usize = 1000;

/// Path of the audit log list view
pub const AUDIT_LOG_PATH: &str = "/admin/auditlog/";

/// Path of the user detail view
pub const USER_DETAILS_PATH: &str = "/admin/user/details";

/// Filters and paging for [`list_audit_records`]
///
/// Filters combine with AND; unset filters match everything. Only the
/// filters take part in the query-string form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i64>,

    /// Matched case-insensitively when parsed from a link
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_model_name"
    )]
    pub model_name: Option<AuditModel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<AuditAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    /// Maximum number of records returned; defaults to [`DEFAULT_PAGE_SIZE`]
    #[serde(skip)]
    pub limit: Option<usize>,

    /// Records skipped before the page starts
    #[serde(skip)]
    pub offset: usize,

    /// Return the most recent records first
    #[serde(skip)]
    pub newest_first: bool,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// History of one entity
    pub fn for_record(model_name: AuditModel, record_id: i64) -> Self {
        Self {
            model_name: Some(model_name),
            record_id: Some(record_id),
            ..Self::default()
        }
    }

    /// Every record carrying `record_id`, across audited models
    pub fn record(record_id: i64) -> Self {
        Self {
            record_id: Some(record_id),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model_name: AuditModel) -> Self {
        self.model_name = Some(model_name);
        self
    }

    pub fn with_action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn by_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    /// Whether a record passes every set filter
    pub fn matches(&self, record: &AuditRecord) -> bool {
        self.model_name.map_or(true, |m| record.model_name == m)
            && self.record_id.map_or(true, |id| record.record_id == id)
            && self.action.map_or(true, |a| record.action == a)
            && self.user_id.map_or(true, |u| record.user_id == Some(u))
    }

    /// Page size after defaults and clamping
    pub fn effective_limit(&self) -> TrackerResult<usize> {
        match self.limit {
            None => Ok(DEFAULT_PAGE_SIZE),
            Some(0) => Err(TrackerError::Query("limit must be at least 1".into())),
            Some(limit) => Ok(limit.min(MAX_PAGE_SIZE)),
        }
    }

    /// Filters as a URL query string, e.g. `record_id=42&model_name=Incident`
    pub fn to_query_string(&self) -> TrackerResult<String> {
        serde_urlencoded::to_string(self)
            .map_err(|e| TrackerError::Query(format!("Failed to encode query: {}", e)))
    }

    /// Parse filters from a URL query string
    ///
    /// Accepts a bare query string, one with a leading `?`, or a full link.
    /// Unknown parameters are rejected.
    pub fn from_query_string(input: &str) -> TrackerResult<Self> {
        let query = match input.split_once('?') {
            Some((_, query)) => query,
            None => input,
        };
        serde_urlencoded::from_str(query)
            .map_err(|e| TrackerError::Query(format!("Invalid audit query '{}': {}", input, e)))
    }

    /// Link to the audit log list view showing these filters
    pub fn history_link(&self) -> TrackerResult<String> {
        let query = self.to_query_string()?;
        if query.is_empty() {
            Ok(AUDIT_LOG_PATH.to_string())
        } else {
            Ok(format!("{}?{}", AUDIT_LOG_PATH, query))
        }
    }
}

fn deserialize_model_name<'de, D>(deserializer: D) -> Result<Option<AuditModel>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(name) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    AuditModel::parse(&name).map(Some).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "unknown model `{}`, expected `Incident` or `User`",
            name
        ))
    })
}

/// One page of audit records
#[derive(Debug, Clone, PartialEq)]
pub struct AuditPage {
    pub records: Vec<AuditRecord>,
    /// Number of records matching the filters, across all pages
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

impl AuditPage {
    /// Whether records exist past this page
    pub fn has_more(&self) -> bool {
        self.offset + self.records.len() < self.total
    }
}

/// List committed audit records matching `query`
///
/// Records come back in id order (oldest first) unless the query asks for
/// newest first.
pub fn list_audit_records(storage: &Storage, query: &AuditQuery) -> TrackerResult<AuditPage> {
    let limit = query.effective_limit()?;
    let log = storage.audit_log();

    let mut matching: Vec<&AuditRecord> = match (query.model_name, query.record_id) {
        (Some(model_name), Some(record_id)) => log
            .for_record(model_name, record_id)
            .into_iter()
            .filter(|r| query.matches(r))
            .collect(),
        _ => log.records().iter().filter(|r| query.matches(r)).collect(),
    };

    if query.newest_first {
        matching.reverse();
    }

    let total = matching.len();
    let records = matching
        .into_iter()
        .skip(query.offset)
        .take(limit)
        .cloned()
        .collect();

    Ok(AuditPage {
        records,
        total,
        offset: query.offset,
        limit,
    })
}

/// Every record of one entity, oldest first
///
/// Walks all pages, so the result is never cut off at [`MAX_PAGE_SIZE`].
pub fn record_history(
    storage: &Storage,
    model_name: AuditModel,
    record_id: i64,
) -> TrackerResult<Vec<AuditRecord>> {
    let mut query = AuditQuery::for_record(model_name, record_id).with_limit(MAX_PAGE_SIZE);
    let mut records = Vec::new();

    loop {
        let page = list_audit_records(storage, &query)?;
        let more = page.has_more();
        query.offset += page.records.len();
        records.extend(page.records);
        if !more {
            return Ok(records);
        }
    }
}

/// Display label for the actor of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorLabel {
    pub user_id: Option<UserId>,
    pub label: String,
    /// Link to the user's detail view, if the user still exists
    pub link: Option<String>,
}

/// An audit record with its actor resolved for display
///
/// Serializes as the record's own fields plus an `actor` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecordView {
    #[serde(flatten)]
    pub record: AuditRecord,
    pub actor: ActorLabel,
}

/// Link to a user's detail view
pub fn user_details_link(user_id: UserId) -> String {
    format!("{}?id={}", USER_DETAILS_PATH, user_id)
}

/// Attach actor labels to records
pub fn resolve_actors(
    storage: &Storage,
    records: &[AuditRecord],
) -> TrackerResult<Vec<AuditRecordView>> {
    let mut labels: HashMap<UserId, ActorLabel> = HashMap::new();
    let mut views = Vec::with_capacity(records.len());

    for record in records {
        let actor = match record.user_id {
            None => ActorLabel {
                user_id: None,
                label: "System".to_string(),
                link: None,
            },
            Some(user_id) => match labels.get(&user_id) {
                Some(label) => label.clone(),
                None => {
                    let label = label_user(storage, user_id)?;
                    labels.insert(user_id, label.clone());
                    label
                }
            },
        };
        views.push(AuditRecordView {
            record: record.clone(),
            actor,
        });
    }

    Ok(views)
}

fn label_user(storage: &Storage, user_id: UserId) -> TrackerResult<ActorLabel> {
    Ok(match storage.get::<User>(user_id)? {
        Some(user) => ActorLabel {
            user_id: Some(user_id),
            label: user.to_string(),
            link: Some(user_details_link(user_id)),
        },
        None => ActorLabel {
            user_id: Some(user_id),
            label: format!("User #{} (deleted)", user_id),
            link: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_link_format() {
        let query = AuditQuery::for_record(AuditModel::Incident, 42);
        assert_eq!(
            query.to_query_string().unwrap(),
            "record_id=42&model_name=Incident"
        );
        assert_eq!(
            query.history_link().unwrap(),
            "/admin/auditlog/?record_id=42&model_name=Incident"
        );
        assert_eq!(AuditQuery::new().history_link().unwrap(), "/admin/auditlog/");
    }

    #[test]
    fn test_deep_link_round_trip() {
        let query = AuditQuery::for_record(AuditModel::User, 3)
            .with_action(AuditAction::Update)
            .by_user(UserId::new(1));
        let link = query.history_link().unwrap();
        assert_eq!(AuditQuery::from_query_string(&link).unwrap(), query);
    }

    #[test]
    fn test_malformed_query_rejected() {
        assert!(AuditQuery::from_query_string("record_id=abc").is_err());
        assert!(AuditQuery::from_query_string("model_name=School").is_err());
        assert!(AuditQuery::from_query_string("colour=red").is_err());
        assert!(AuditQuery::from_query_string("").unwrap() == AuditQuery::new());
    }

    #[test]
    fn test_model_name_in_link_is_case_insensitive() {
        let expected = AuditQuery::for_record(AuditModel::Incident, 42);
        for link in [
            "record_id=42&model_name=incident",
            "record_id=42&model_name=INCIDENT",
            "/admin/auditlog/?record_id=42&model_name=Incident",
        ] {
            assert_eq!(AuditQuery::from_query_string(link).unwrap(), expected);
        }
        // Links we produce keep the canonical spelling
        assert_eq!(
            AuditQuery::from_query_string("model_name=user")
                .unwrap()
                .history_link()
                .unwrap(),
            "/admin/auditlog/?model_name=User"
        );
    }

    #[test]
    fn test_effective_limit() {
        assert_eq!(AuditQuery::new().effective_limit().unwrap(), DEFAULT_PAGE_SIZE);
        assert_eq!(
            AuditQuery::new().with_limit(5000).effective_limit().unwrap(),
            MAX_PAGE_SIZE
        );
        assert!(AuditQuery::new().with_limit(0).effective_limit().is_err());
    }

    #[test]
    fn test_user_details_link() {
        assert_eq!(user_details_link(UserId::new(7)), "/admin/user/details?id=7");
    }
}
