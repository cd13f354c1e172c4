//! Domain types for batch reporting.
//!
//! Records arrive fully populated from upstream ingest steps and are never
//! mutated here. All types are serializable via serde so they can cross the
//! activity boundary as JSON.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Object store key of a batch report, e.g. `batch_<uuid>.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportKey(pub String);

impl ReportKey {
    /// Basename of the report for `batch`. One report per batch.
    pub fn for_batch(batch: &Batch) -> Self {
        Self::for_batch_uuid(&batch.uuid)
    }

    pub fn for_batch_uuid(uuid: &Uuid) -> Self {
        Self(format!("batch_{uuid}.csv"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ReportKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ReportKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A processing run grouping several SIPs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub uuid: Uuid,
    /// Informational only; not checked against the SIP list.
    #[serde(default)]
    pub sips_count: usize,
}

impl Batch {
    pub fn new(uuid: Uuid, sips_count: usize) -> Self {
        Self { uuid, sips_count }
    }
}

/// A Submission Information Package tracked through ingest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sip {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    /// Identifier of the stored AIP. `None` until the SIP has been archived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aip_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Package type recorded when the workflow failed, if it did.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub failed_as: String,
    /// Object key of the failed package in the internal bucket.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub failed_key: String,
}

impl Sip {
    /// A SIP with only the fields that affect reporting populated.
    pub fn named(name: impl Into<String>, aip_id: Option<Uuid>) -> Self {
        Self {
            name: name.into(),
            aip_id,
            ..Self::default()
        }
    }

    pub fn is_archived(&self) -> bool {
        self.aip_id.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_uuid() -> Uuid {
        Uuid::parse_str("33333333-3333-3333-3333-333333333333").unwrap()
    }

    #[test]
    fn report_key_uses_batch_uuid() {
        let batch = Batch::new(batch_uuid(), 2);
        assert_eq!(
            ReportKey::for_batch(&batch).to_string(),
            "batch_33333333-3333-3333-3333-333333333333.csv"
        );
    }

    #[test]
    fn report_key_is_stable_for_same_batch() {
        let a = ReportKey::for_batch(&Batch::new(batch_uuid(), 1));
        let b = ReportKey::for_batch(&Batch::new(batch_uuid(), 7));
        assert_eq!(a, b);
    }

    #[test]
    fn sip_without_aip_is_not_archived() {
        assert!(!Sip::named("pending", None).is_archived());
        assert!(Sip::named("stored", Some(Uuid::new_v4())).is_archived());
    }

    #[test]
    fn sip_deserializes_with_only_name() {
        let sip: Sip = serde_yaml::from_str("name: Test SIP\n").expect("deserialize");
        assert_eq!(sip.name, "Test SIP");
        assert!(sip.aip_id.is_none());
        assert!(sip.uuid.is_nil());
    }
}
