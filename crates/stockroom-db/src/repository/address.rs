//! # Address Repository
//!
//! Addresses, cities, and states.
//!
//! ## Resolution Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewAddress { city_name: "Campinas", state_id: "SP", ... }             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO cities SELECT ... FROM states WHERE id = 'SP'           │
//! │      ON CONFLICT (state_id, name) DO NOTHING   (first write: lock)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT id FROM cities WHERE state_id = 'SP' AND name = 'Campinas'     │
//! │       │   no row → NotFound("State")  (racing callers get one city)   │
//! │       ▼                                                                 │
//! │  INSERT INTO addresses (..., city_id)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockroom_core::{Address, City, NewAddress, ResolvedAddress, State};

/// Repository for addresses and their reference data.
#[derive(Debug, Clone)]
pub struct AddressRepository {
    pool: SqlitePool,
}

impl AddressRepository {
    /// Creates a new AddressRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AddressRepository { pool }
    }

    // =========================================================================
    // States
    // =========================================================================

    /// Lists every state by name.
    pub async fn list_states(&self) -> DbResult<Vec<State>> {
        let states = sqlx::query_as::<_, State>("SELECT id, name FROM states ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(states)
    }

    /// Gets a state by its two-letter abbreviation (case-insensitive).
    pub async fn get_state(&self, abbreviation: &str) -> DbResult<Option<State>> {
        let state = sqlx::query_as::<_, State>("SELECT id, name FROM states WHERE id = ?1")
            .bind(abbreviation.trim().to_uppercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(state)
    }

    // =========================================================================
    // Cities
    // =========================================================================

    /// Lists the cities of a state by name.
    pub async fn list_cities(&self, state_id: &str) -> DbResult<Vec<City>> {
        let cities = sqlx::query_as::<_, City>(
            "SELECT id, name, state_id FROM cities WHERE state_id = ?1 ORDER BY name",
        )
        .bind(state_id.trim().to_uppercase())
        .fetch_all(&self.pool)
        .await?;

        Ok(cities)
    }

    /// Returns the city with this name in the state, creating it if needed.
    pub async fn get_or_create_city(&self, state_id: &str, name: &str) -> DbResult<City> {
        let mut conn = self.pool.acquire().await?;
        get_or_create_city_in(&mut conn, state_id, name).await
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Inserts an address, creating its city when the name is new.
    pub async fn insert(&self, new: &NewAddress) -> DbResult<ResolvedAddress> {
        new.validate()?;

        let mut tx = self.pool.begin().await?;
        let city = get_or_create_city_in(&mut tx, &new.state_id, &new.city_name).await?;

        let now = Utc::now();
        let address = Address {
            id: Uuid::new_v4().to_string(),
            street: new.street.trim().to_string(),
            number: new.number,
            neighborhood: new.neighborhood.trim().to_string(),
            postal_code: new.postal_code.trim().to_string(),
            city_id: city.id,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %address.id, city_id = %address.city_id, "Inserting address");

        sqlx::query(
            r#"
            INSERT INTO addresses (
                id, street, number, neighborhood, postal_code, city_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&address.id)
        .bind(&address.street)
        .bind(address.number)
        .bind(&address.neighborhood)
        .bind(&address.postal_code)
        .bind(&address.city_id)
        .bind(address.created_at)
        .bind(address.updated_at)
        .execute(&mut *tx)
        .await?;

        let resolved = resolve_in(&mut tx, &address.id)
            .await?
            .ok_or_else(|| DbError::not_found("Address", &address.id))?;
        tx.commit().await?;

        Ok(resolved)
    }

    /// Replaces an address. The city is resolved again from its name.
    pub async fn update(&self, id: &str, new: &NewAddress) -> DbResult<ResolvedAddress> {
        new.validate()?;

        debug!(id = %id, "Updating address");

        let mut tx = self.pool.begin().await?;
        let city = get_or_create_city_in(&mut tx, &new.state_id, &new.city_name).await?;

        let result = sqlx::query(
            r#"
            UPDATE addresses SET
                street = ?2,
                number = ?3,
                neighborhood = ?4,
                postal_code = ?5,
                city_id = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(new.street.trim())
        .bind(new.number)
        .bind(new.neighborhood.trim())
        .bind(new.postal_code.trim())
        .bind(&city.id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Address", id));
        }

        let resolved = resolve_in(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Address", id))?;
        tx.commit().await?;

        Ok(resolved)
    }

    /// Gets an address with its city and state.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ResolvedAddress>> {
        let mut conn = self.pool.acquire().await?;
        resolve_in(&mut conn, id).await
    }

    /// Deletes an address. Parties pointing at it keep no address.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting address");

        let result = sqlx::query("DELETE FROM addresses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Address", id));
        }

        Ok(())
    }
}

/// Resolves a city by name, creating it on first use.
///
/// The insert is the first statement so that, inside a transaction, the
/// write lock is taken before any read snapshot exists and the wait is
/// bounded by the busy timeout. Concurrent creators of the same city all
/// land on the single row kept by `UNIQUE(state_id, name)`.
async fn get_or_create_city_in(
    conn: &mut SqliteConnection,
    state_id: &str,
    name: &str,
) -> DbResult<City> {
    let state_id = state_id.trim().to_uppercase();
    let name = name.trim();

    // WHERE on the SELECT keeps the upsert clause unambiguous.
    let inserted = sqlx::query(
        r#"
        INSERT INTO cities (id, name, state_id)
        SELECT ?1, ?2, id FROM states WHERE id = ?3
        ON CONFLICT (state_id, name) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(&state_id)
    .execute(&mut *conn)
    .await?;

    if inserted.rows_affected() == 1 {
        debug!(state_id = %state_id, name = %name, "Created city");
    }

    let city = sqlx::query_as::<_, City>(
        "SELECT id, name, state_id FROM cities WHERE state_id = ?1 AND name = ?2",
    )
    .bind(&state_id)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    // Nothing inserted and nothing found: the state does not exist.
    city.ok_or_else(|| DbError::not_found("State", state_id))
}

async fn resolve_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<ResolvedAddress>> {
    let address = sqlx::query_as::<_, ResolvedAddress>(
        r#"
        SELECT
            a.id, a.street, a.number, a.neighborhood, a.postal_code,
            c.id AS city_id, c.name AS city_name,
            s.id AS state_id, s.name AS state_name
        FROM addresses a
        JOIN cities c ON c.id = a.city_id
        JOIN states s ON s.id = c.state_id
        WHERE a.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(address)
}
