//! PostgreSQL implementation of the record store.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::models::{FillRow, TripRow};
use crate::domain::{FillEvent, FillMetrics, RecordId, Trip, ValidatedFill, ValidatedTrip};
use crate::error::LedgerError;

type FillTuple = (
    Uuid,
    i64,
    DateTime<Utc>,
    Option<i64>,
    i64,
    f64,
    f64,
    Option<bool>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);

type TripTuple = (
    Uuid,
    i64,
    DateTime<Utc>,
    i64,
    i64,
    Option<i64>,
    bool,
    Option<i64>,
);

/// Connection settings for [`PostgresStore::connect`].
#[derive(Debug, Clone)]
pub struct PostgresSettings {
    /// Connection string.
    pub url: String,
    /// Pool upper bound.
    pub max_connections: u32,
    /// Idle connections kept open.
    pub min_connections: u32,
    /// How long to wait for a connection.
    pub connect_timeout: Duration,
}

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

fn unavailable(e: sqlx::Error) -> LedgerError {
    LedgerError::StorageUnavailable(e.to_string())
}

fn column_u32(column: &str, value: i64) -> Result<u32, LedgerError> {
    u32::try_from(value)
        .map_err(|_| LedgerError::Internal(format!("column {column} holds out-of-range value {value}")))
}

fn column_u64(column: &str, value: i64) -> Result<u64, LedgerError> {
    u64::try_from(value)
        .map_err(|_| LedgerError::Internal(format!("column {column} holds out-of-range value {value}")))
}

fn fill_from_tuple(row: FillTuple) -> Result<FillRow, LedgerError> {
    let (id, seq, fecha, km_inicial, km_actual, galones, precio, aire, km_acum, consumo, costo) = row;
    Ok(FillRow {
        id: RecordId::from_uuid(id),
        seq: column_u64("seq", seq)?,
        timestamp: fecha,
        odometer_start: km_inicial.map(|v| column_u32("km_inicial", v)).transpose()?,
        odometer: column_u32("km_actual", km_actual)?,
        fuel_amount: galones,
        price_total: precio,
        climate_control: aire,
        distance: km_acum,
        economy: consumo,
        cost_per_distance: costo,
    })
}

fn trip_from_tuple(row: TripTuple) -> Result<TripRow, LedgerError> {
    let (id, seq, fecha, km_inicial, km_final, km_recorridos, aire, km_restante) = row;
    Ok(TripRow {
        id: RecordId::from_uuid(id),
        seq: column_u64("seq", seq)?,
        timestamp: fecha,
        odometer_start: column_u32("km_inicial", km_inicial)?,
        odometer_end: column_u32("km_final", km_final)?,
        distance: km_recorridos,
        climate_control_used: aire,
        board_remaining_range: km_restante.map(|v| column_u32("km_restante", v)).transpose()?,
    })
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and runs the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] if the database cannot be
    /// reached or migrated.
    pub async fn connect(settings: &PostgresSettings) -> Result<Self, LedgerError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.connect_timeout)
            .connect(&settings.url)
            .await
            .map_err(unavailable)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| LedgerError::StorageUnavailable(format!("migration failed: {e}")))?;

        Ok(Self::new(pool))
    }

    /// Fill rows ordered by (`fecha`, `seq`).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] on database failure.
    pub async fn load_fills(&self) -> Result<Vec<FillRow>, LedgerError> {
        let rows = sqlx::query_as::<_, FillTuple>(
            "SELECT id, seq, fecha, km_inicial, km_actual, galones, precio, aire_acondicionado, \
             km_recorridos_acum, consumo_km_gal, costo_por_km \
             FROM repostajes ORDER BY fecha ASC, seq ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.into_iter().map(fill_from_tuple).collect()
    }

    /// Inserts a fill under a fresh id; the database assigns the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] on database failure.
    pub async fn append_fill(&self, fill: &ValidatedFill) -> Result<FillEvent, LedgerError> {
        let id = RecordId::new();
        let input = fill.input();
        let seq = sqlx::query_scalar::<_, i64>(
            "INSERT INTO repostajes (id, fecha, km_inicial, km_actual, galones, precio, aire_acondicionado) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING seq",
        )
        .bind(*id.as_uuid())
        .bind(input.timestamp)
        .bind(input.odometer_start.map(i64::from))
        .bind(i64::from(input.odometer))
        .bind(input.fuel_amount)
        .bind(input.price_total)
        .bind(input.climate_control)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(FillEvent::from_validated(id, column_u64("seq", seq)?, fill))
    }

    /// Replaces a fill's raw columns and clears its derived ones.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id, or
    /// [`LedgerError::StorageUnavailable`] on database failure.
    pub async fn update_fill(&self, id: RecordId, fill: &ValidatedFill) -> Result<FillEvent, LedgerError> {
        let input = fill.input();
        let seq = sqlx::query_scalar::<_, i64>(
            "UPDATE repostajes SET fecha = $2, km_inicial = $3, km_actual = $4, galones = $5, \
             precio = $6, aire_acondicionado = $7, km_recorridos_acum = NULL, \
             consumo_km_gal = NULL, costo_por_km = NULL \
             WHERE id = $1 RETURNING seq",
        )
        .bind(*id.as_uuid())
        .bind(input.timestamp)
        .bind(input.odometer_start.map(i64::from))
        .bind(i64::from(input.odometer))
        .bind(input.fuel_amount)
        .bind(input.price_total)
        .bind(input.climate_control)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?
        .ok_or(LedgerError::fill_not_found(id))?;

        Ok(FillEvent::from_validated(id, column_u64("seq", seq)?, fill))
    }

    /// Deletes a fill.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id, or
    /// [`LedgerError::StorageUnavailable`] on database failure.
    pub async fn delete_fill(&self, id: RecordId) -> Result<(), LedgerError> {
        let result = sqlx::query("DELETE FROM repostajes WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        if result.rows_affected() == 0 {
            return Err(LedgerError::fill_not_found(id));
        }
        Ok(())
    }

    /// Writes derived fill columns in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] on database failure.
    pub async fn save_fill_metrics(&self, updates: &[(RecordId, FillMetrics)]) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;
        for (id, metrics) in updates {
            #[allow(clippy::cast_precision_loss)]
            let distance = metrics.distance_since_prior_fill.map(|d| d as f64);
            sqlx::query(
                "UPDATE repostajes SET km_recorridos_acum = $2, consumo_km_gal = $3, costo_por_km = $4 \
                 WHERE id = $1",
            )
            .bind(*id.as_uuid())
            .bind(distance)
            .bind(metrics.economy)
            .bind(metrics.cost_per_distance)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;
        }
        tx.commit().await.map_err(unavailable)
    }

    /// Trip rows ordered by (`fecha`, `seq`).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] on database failure.
    pub async fn load_trips(&self) -> Result<Vec<TripRow>, LedgerError> {
        let rows = sqlx::query_as::<_, TripTuple>(
            "SELECT id, seq, fecha, km_inicial, km_final, km_recorridos, aire_acondicionado, km_restante \
             FROM recorridos ORDER BY fecha ASC, seq ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.into_iter().map(trip_from_tuple).collect()
    }

    /// Inserts a trip under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] on database failure.
    pub async fn append_trip(&self, trip: &ValidatedTrip) -> Result<Trip, LedgerError> {
        let id = RecordId::new();
        let input = trip.input();
        let seq = sqlx::query_scalar::<_, i64>(
            "INSERT INTO recorridos (id, fecha, km_inicial, km_final, km_recorridos, aire_acondicionado, km_restante) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING seq",
        )
        .bind(*id.as_uuid())
        .bind(input.timestamp)
        .bind(i64::from(input.odometer_start))
        .bind(i64::from(input.odometer_end))
        .bind(i64::from(input.odometer_end) - i64::from(input.odometer_start))
        .bind(input.climate_control_used)
        .bind(input.board_remaining_range.map(i64::from))
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(Trip::from_validated(id, column_u64("seq", seq)?, trip))
    }

    /// Replaces a trip's raw columns.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id, or
    /// [`LedgerError::StorageUnavailable`] on database failure.
    pub async fn update_trip(&self, id: RecordId, trip: &ValidatedTrip) -> Result<Trip, LedgerError> {
        let input = trip.input();
        let seq = sqlx::query_scalar::<_, i64>(
            "UPDATE recorridos SET fecha = $2, km_inicial = $3, km_final = $4, km_recorridos = $5, \
             aire_acondicionado = $6, km_restante = $7 WHERE id = $1 RETURNING seq",
        )
        .bind(*id.as_uuid())
        .bind(input.timestamp)
        .bind(i64::from(input.odometer_start))
        .bind(i64::from(input.odometer_end))
        .bind(i64::from(input.odometer_end) - i64::from(input.odometer_start))
        .bind(input.climate_control_used)
        .bind(input.board_remaining_range.map(i64::from))
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?
        .ok_or(LedgerError::trip_not_found(id))?;

        Ok(Trip::from_validated(id, column_u64("seq", seq)?, trip))
    }

    /// Deletes a trip.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id, or
    /// [`LedgerError::StorageUnavailable`] on database failure.
    pub async fn delete_trip(&self, id: RecordId) -> Result<(), LedgerError> {
        let result = sqlx::query("DELETE FROM recorridos WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        if result.rows_affected() == 0 {
            return Err(LedgerError::trip_not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn negative_odometer_column_is_rejected() {
        let row: FillTuple = (
            Uuid::new_v4(),
            1,
            Utc::now(),
            None,
            -5,
            10.0,
            100.0,
            None,
            None,
            None,
            None,
        );
        assert!(matches!(fill_from_tuple(row), Err(LedgerError::Internal(_))));
    }

    #[test]
    fn trip_tuple_maps_to_row() {
        let id = Uuid::new_v4();
        let row: TripTuple = (id, 3, Utc::now(), 100, 160, Some(60), true, Some(410));
        let Ok(mapped) = trip_from_tuple(row) else {
            panic!("mapping failed");
        };
        assert_eq!(mapped.id, RecordId::from_uuid(id));
        assert_eq!(mapped.seq, 3);
        assert_eq!(mapped.distance, Some(60));
        assert_eq!(mapped.board_remaining_range, Some(410));
    }
}
