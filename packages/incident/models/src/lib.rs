#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident record and listing-scope types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use precinct_geography_models::GeoPoint;
use precinct_identity_models::UserId;
use serde::{Deserialize, Serialize};

/// Identifier of an incident.
pub type IncidentId = i64;

/// The mutable fields of an incident, as supplied on create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentFields {
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Incident type label (e.g. "THEFT").
    pub incident_type: String,
    /// Priority label (e.g. "HIGH").
    pub priority: String,
    /// Where the incident took place.
    pub location: GeoPoint,
}

/// A reported incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Primary key.
    pub id: IncidentId,
    /// Mutable fields.
    #[serde(flatten)]
    pub fields: IncidentFields,
    /// The user that reported this incident. Not an owning reference:
    /// deleting the user leaves the incident in place.
    pub reported_by: UserId,
    /// Creation timestamp; never changes after insert.
    pub occurred_at: DateTime<Utc>,
}

/// An incident handed to storage before an id has been assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIncident {
    /// Mutable fields.
    pub fields: IncidentFields,
    /// The reporting user.
    pub reported_by: UserId,
    /// Creation timestamp.
    pub occurred_at: DateTime<Utc>,
}

/// The set of reporters whose incidents a caller may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReporterFilter {
    /// No restriction.
    All,
    /// Only incidents reported by one of these users. An empty set matches
    /// nothing.
    Reporters(BTreeSet<UserId>),
}

impl ReporterFilter {
    /// A filter matching no incident at all.
    #[must_use]
    pub const fn nothing() -> Self {
        Self::Reporters(BTreeSet::new())
    }

    /// A filter matching incidents from a single reporter.
    #[must_use]
    pub fn only(reporter: UserId) -> Self {
        Self::Reporters(BTreeSet::from([reporter]))
    }

    /// Whether an incident reported by `reporter` passes the filter.
    #[must_use]
    pub fn permits(&self, reporter: UserId) -> bool {
        match self {
            Self::All => true,
            Self::Reporters(ids) => ids.contains(&reporter),
        }
    }

    /// Whether the filter can match anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Reporters(ids) if ids.is_empty())
    }
}
