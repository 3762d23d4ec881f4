//! # Party Repository
//!
//! Customers and suppliers share one table and one repository, tagged by
//! role. The repository is generic over the record type, so
//! `PartyRepository<Customer>` only ever sees and returns customers.
//!
//! ```text
//! db.customers()  ──► PartyRepository<Customer> ──┐
//!                                                 ├──► parties WHERE role = ?
//! db.suppliers()  ──► PartyRepository<Supplier> ──┘
//! ```

use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockroom_core::{PartyDetails, PartyRecord, PartyWithAddress, ResolvedAddress};

/// Raw `parties` row before it is given its role type.
#[derive(Debug, sqlx::FromRow)]
struct PartyRow {
    id: String,
    name: String,
    phone: String,
    email: String,
    address_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PartyRow {
    fn into_record<P: PartyRecord>(self) -> P {
        P::from_parts(
            P::Id::from(self.id),
            PartyDetails {
                name: self.name,
                phone: self.phone,
                email: self.email,
                address_id: self.address_id,
            },
            self.created_at,
            self.updated_at,
        )
    }
}

/// `parties` row with its address resolved (all address columns optional).
#[derive(Debug, sqlx::FromRow)]
struct PartyAddressRow {
    #[sqlx(flatten)]
    party: PartyRow,
    street: Option<String>,
    number: Option<i64>,
    neighborhood: Option<String>,
    postal_code: Option<String>,
    city_id: Option<String>,
    city_name: Option<String>,
    state_id: Option<String>,
    state_name: Option<String>,
}

impl PartyAddressRow {
    fn into_listing<P: PartyRecord>(self) -> PartyWithAddress<P> {
        let address = match (
            self.party.address_id.clone(),
            self.street,
            self.number,
            self.neighborhood,
            self.postal_code,
            self.city_id,
            self.city_name,
            self.state_id,
            self.state_name,
        ) {
            (
                Some(id),
                Some(street),
                Some(number),
                Some(neighborhood),
                Some(postal_code),
                Some(city_id),
                Some(city_name),
                Some(state_id),
                Some(state_name),
            ) => Some(ResolvedAddress {
                id,
                street,
                number,
                neighborhood,
                postal_code,
                city_id,
                city_name,
                state_id,
                state_name,
            }),
            _ => None,
        };

        PartyWithAddress {
            party: self.party.into_record(),
            address,
        }
    }
}

/// Repository for one party role.
pub struct PartyRepository<P> {
    pool: SqlitePool,
    _role: PhantomData<fn() -> P>,
}

impl<P> Clone for PartyRepository<P> {
    fn clone(&self) -> Self {
        PartyRepository {
            pool: self.pool.clone(),
            _role: PhantomData,
        }
    }
}

impl<P: PartyRecord> fmt::Debug for PartyRepository<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartyRepository")
            .field("role", &P::ROLE)
            .finish()
    }
}

impl<P: PartyRecord> PartyRepository<P> {
    /// Creates a new PartyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PartyRepository {
            pool,
            _role: PhantomData,
        }
    }

    /// Inserts a new party of this role.
    pub async fn insert(&self, details: &PartyDetails) -> DbResult<P> {
        details.validate()?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let details = normalized(details);

        debug!(role = P::ROLE.label(), id = %id, "Inserting party");

        sqlx::query(
            r#"
            INSERT INTO parties (
                id, role, name, phone, email, address_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&id)
        .bind(P::ROLE)
        .bind(&details.name)
        .bind(&details.phone)
        .bind(&details.email)
        .bind(&details.address_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(P::from_parts(P::Id::from(id), details, now, now))
    }

    /// Gets a party by id. A party of the other role is not found.
    pub async fn get_by_id(&self, id: &P::Id) -> DbResult<Option<P>> {
        let row = sqlx::query_as::<_, PartyRow>(
            r#"
            SELECT id, name, phone, email, address_id, created_at, updated_at
            FROM parties
            WHERE id = ?1 AND role = ?2
            "#,
        )
        .bind(id.as_ref())
        .bind(P::ROLE)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PartyRow::into_record::<P>))
    }

    /// Lists every party of this role by name.
    pub async fn list(&self) -> DbResult<Vec<P>> {
        debug!(role = P::ROLE.label(), "Listing parties");

        let rows = sqlx::query_as::<_, PartyRow>(
            r#"
            SELECT id, name, phone, email, address_id, created_at, updated_at
            FROM parties
            WHERE role = ?1
            ORDER BY name, id
            "#,
        )
        .bind(P::ROLE)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PartyRow::into_record::<P>).collect())
    }

    /// Lists every party of this role by name, with addresses resolved.
    pub async fn list_with_addresses(&self) -> DbResult<Vec<PartyWithAddress<P>>> {
        let rows = sqlx::query_as::<_, PartyAddressRow>(
            r#"
            SELECT
                p.id, p.name, p.phone, p.email, p.address_id,
                p.created_at, p.updated_at,
                a.street, a.number, a.neighborhood, a.postal_code,
                c.id AS city_id, c.name AS city_name,
                s.id AS state_id, s.name AS state_name
            FROM parties p
            LEFT JOIN addresses a ON a.id = p.address_id
            LEFT JOIN cities c ON c.id = a.city_id
            LEFT JOIN states s ON s.id = c.state_id
            WHERE p.role = ?1
            ORDER BY p.name, p.id
            "#,
        )
        .bind(P::ROLE)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PartyAddressRow::into_listing::<P>).collect())
    }

    /// Replaces a party's details.
    pub async fn update(&self, id: &P::Id, details: &PartyDetails) -> DbResult<P> {
        details.validate()?;
        let details = normalized(details);

        debug!(role = P::ROLE.label(), id = %id, "Updating party");

        let row = sqlx::query_as::<_, PartyRow>(
            r#"
            UPDATE parties SET
                name = ?3,
                phone = ?4,
                email = ?5,
                address_id = ?6,
                updated_at = ?7
            WHERE id = ?1 AND role = ?2
            RETURNING id, name, phone, email, address_id, created_at, updated_at
            "#,
        )
        .bind(id.as_ref())
        .bind(P::ROLE)
        .bind(&details.name)
        .bind(&details.phone)
        .bind(&details.email)
        .bind(&details.address_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PartyRow::into_record::<P>)
            .ok_or_else(|| DbError::not_found(P::ROLE.label(), id.as_ref()))
    }

    /// Deletes a party.
    ///
    /// A customer with sales cannot be deleted ([`DbError::ForeignKeyViolation`]).
    /// Deleting a supplier clears it from its products.
    pub async fn delete(&self, id: &P::Id) -> DbResult<()> {
        debug!(role = P::ROLE.label(), id = %id, "Deleting party");

        let result = sqlx::query("DELETE FROM parties WHERE id = ?1 AND role = ?2")
            .bind(id.as_ref())
            .bind(P::ROLE)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(P::ROLE.label(), id.as_ref()));
        }

        Ok(())
    }
}

fn normalized(details: &PartyDetails) -> PartyDetails {
    PartyDetails {
        name: details.name.trim().to_string(),
        phone: details.phone.trim().to_string(),
        email: details.email.trim().to_string(),
        address_id: details.address_id.clone(),
    }
}
