//! `boundaries` table, one WKT polygon per user.

use async_trait::async_trait;
use moosicbox_json_utils::database::ToValue as _;
use precinct_access::StoreError;
use precinct_access::store::BoundaryStore;
use precinct_geography_models::{Boundary, SRID_WGS84};
use precinct_identity_models::UserId;
use switchy_database::DatabaseValue;

use crate::{SqliteStore, backend, corrupt};

#[async_trait]
impl BoundaryStore for SqliteStore {
    async fn put_boundary(&self, user: UserId, boundary: &Boundary) -> Result<(), StoreError> {
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .exec_raw_params(
                "INSERT INTO boundaries (user_id, wkt, srid, updated_at)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT (user_id) DO UPDATE SET
                   wkt = excluded.wkt,
                   srid = excluded.srid,
                   updated_at = excluded.updated_at",
                &[
                    DatabaseValue::Int64(user),
                    DatabaseValue::String(boundary.to_wkt()),
                    DatabaseValue::Int64(i64::from(boundary.srid())),
                    DatabaseValue::String(now),
                ],
            )
            .await
            .map_err(backend)?;

        Ok(())
    }

    async fn get_boundary(&self, user: UserId) -> Result<Option<Boundary>, StoreError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT wkt, srid FROM boundaries WHERE user_id = ?",
                &[DatabaseValue::Int64(user)],
            )
            .await
            .map_err(backend)?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let srid: i64 = row.to_value("srid").map_err(corrupt)?;
        if srid != i64::from(SRID_WGS84) {
            return Err(corrupt(format!(
                "boundary of user {user} has SRID {srid}"
            )));
        }

        let wkt: String = row.to_value("wkt").map_err(corrupt)?;
        Boundary::from_wkt(&wkt).map(Some).map_err(corrupt)
    }
}

#[cfg(test)]
mod tests {
    use precinct_geography_models::GeoPoint;

    use super::*;
    use crate::test_support::fresh_store;

    #[tokio::test]
    async fn boundary_survives_wkt_round_trip() {
        let (store, path) = fresh_store("boundary_round_trip").await;
        let original = Boundary::from_wkt(
            "POLYGON((0 0, 4 0, 4 4, 0 4, 0 0), (1 1, 2 1, 2 2, 1 2, 1 1))",
        )
        .unwrap();

        store.put_boundary(7, &original).await.unwrap();
        let stored = store.get_boundary(7).await.unwrap().unwrap();

        assert_eq!(stored, original);
        assert_eq!(stored.srid(), SRID_WGS84);
        for (lat, lon, inside) in [(0.5, 0.5, true), (1.5, 1.5, false), (0.0, 4.0, true)] {
            assert_eq!(stored.covers(GeoPoint::from_lat_lon(lat, lon)), inside);
        }
        assert!(store.get_boundary(8).await.unwrap().is_none());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn put_replaces_existing_boundary() {
        let (store, path) = fresh_store("boundary_replace").await;
        let small = Boundary::from_wkt("POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap();
        let large = Boundary::from_wkt("POLYGON((0 0, 9 0, 9 9, 0 9, 0 0))").unwrap();

        store.put_boundary(3, &small).await.unwrap();
        store.put_boundary(3, &large).await.unwrap();
        assert_eq!(store.get_boundary(3).await.unwrap(), Some(large));

        let _ = std::fs::remove_file(&path);
    }
}
