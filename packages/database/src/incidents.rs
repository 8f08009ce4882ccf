//! `incidents` table.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use moosicbox_json_utils::database::ToValue as _;
use precinct_access::StoreError;
use precinct_access::store::IncidentStore;
use precinct_geography_models::GeoPoint;
use precinct_incident_models::{Incident, IncidentFields, IncidentId, NewIncident, ReporterFilter};
use switchy_database::{DatabaseValue, Row};

use crate::{SqliteStore, backend, corrupt};

/// Fixed-width timestamps so that text ordering matches time ordering.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_incident(row: &Row) -> Result<Incident, StoreError> {
    let occurred_at: String = row.to_value("occurred_at").map_err(corrupt)?;
    let occurred_at = DateTime::parse_from_rfc3339(&occurred_at)
        .map_err(corrupt)?
        .with_timezone(&Utc);

    Ok(Incident {
        id: row.to_value("id").map_err(corrupt)?,
        fields: IncidentFields {
            title: row.to_value("title").map_err(corrupt)?,
            description: row.to_value("description").map_err(corrupt)?,
            incident_type: row.to_value("incident_type").map_err(corrupt)?,
            priority: row.to_value("priority").map_err(corrupt)?,
            location: GeoPoint::from_lat_lon(
                row.to_value("latitude").map_err(corrupt)?,
                row.to_value("longitude").map_err(corrupt)?,
            ),
        },
        reported_by: row.to_value("reported_by").map_err(corrupt)?,
        occurred_at,
    })
}

fn field_params(fields: &IncidentFields) -> Vec<DatabaseValue> {
    vec![
        DatabaseValue::String(fields.title.clone()),
        fields
            .description
            .clone()
            .map_or(DatabaseValue::Null, DatabaseValue::String),
        DatabaseValue::String(fields.incident_type.clone()),
        DatabaseValue::String(fields.priority.clone()),
        DatabaseValue::Real64(fields.location.latitude),
        DatabaseValue::Real64(fields.location.longitude),
    ]
}

#[async_trait]
impl IncidentStore for SqliteStore {
    async fn insert_incident(&self, incident: NewIncident) -> Result<Incident, StoreError> {
        let mut params = field_params(&incident.fields);
        params.push(DatabaseValue::Int64(incident.reported_by));
        params.push(DatabaseValue::String(timestamp(incident.occurred_at)));

        let rows = self
            .db
            .query_raw_params(
                "INSERT INTO incidents (title, description, incident_type, priority,
                     latitude, longitude, reported_by, occurred_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                 RETURNING *",
                &params,
            )
            .await
            .map_err(backend)?;

        rows.first()
            .map(row_to_incident)
            .transpose()?
            .ok_or_else(|| backend("insert returned no row"))
    }

    async fn get_incident(&self, id: IncidentId) -> Result<Option<Incident>, StoreError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT * FROM incidents WHERE id = ?",
                &[DatabaseValue::Int64(id)],
            )
            .await
            .map_err(backend)?;
        rows.first().map(row_to_incident).transpose()
    }

    async fn list_incidents(&self, filter: &ReporterFilter) -> Result<Vec<Incident>, StoreError> {
        let (sql, params) = match filter {
            ReporterFilter::All => (
                "SELECT * FROM incidents ORDER BY occurred_at DESC, id DESC".to_string(),
                vec![],
            ),
            ReporterFilter::Reporters(ids) if ids.is_empty() => return Ok(vec![]),
            ReporterFilter::Reporters(ids) => {
                let placeholders = vec!["?"; ids.len()].join(", ");
                (
                    format!(
                        "SELECT * FROM incidents WHERE reported_by IN ({placeholders})
                         ORDER BY occurred_at DESC, id DESC"
                    ),
                    ids.iter().map(|id| DatabaseValue::Int64(*id)).collect(),
                )
            }
        };

        let rows = self
            .db
            .query_raw_params(&sql, &params)
            .await
            .map_err(backend)?;
        rows.iter().map(row_to_incident).collect()
    }

    async fn update_incident(
        &self,
        id: IncidentId,
        fields: &IncidentFields,
    ) -> Result<Option<Incident>, StoreError> {
        let mut params = field_params(fields);
        params.push(DatabaseValue::Int64(id));

        let rows = self
            .db
            .query_raw_params(
                "UPDATE incidents SET title = ?, description = ?, incident_type = ?,
                     priority = ?, latitude = ?, longitude = ?
                 WHERE id = ?
                 RETURNING *",
                &params,
            )
            .await
            .map_err(backend)?;
        rows.first().map(row_to_incident).transpose()
    }

    async fn delete_incident(&self, id: IncidentId) -> Result<bool, StoreError> {
        let deleted = self
            .db
            .exec_raw_params(
                "DELETE FROM incidents WHERE id = ?",
                &[DatabaseValue::Int64(id)],
            )
            .await
            .map_err(backend)?;
        Ok(deleted > 0)
    }
}
