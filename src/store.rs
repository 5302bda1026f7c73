use chrono::{TimeZone, Utc};
use sqlx::migrate::MigrateError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::domain::page_request::PageRequest;
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;

/// Persistent subscriber table backed by SQLite.
///
/// The store is shared by every protocol adapter. Concurrent callers are
/// serialized by the pool and by SQLite's own locking; the store itself
/// takes no locks.
#[derive(Clone, Debug)]
pub struct Store {
    db_pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: i64,
    email: String,
    confirmed_at: Option<i64>,
    opt_out: bool,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = sqlx::Error;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        let email =
            SubscriberEmail::parse(row.email).map_err(|err| sqlx::Error::Decode(err.into()))?;
        let confirmed_at = match row.confirmed_at {
            Some(seconds) => Some(Utc.timestamp_opt(seconds, 0).single().ok_or_else(|| {
                sqlx::Error::Decode(format!("{} is not a valid timestamp", seconds).into())
            })?),
            None => None,
        };

        Ok(Subscriber {
            id: row.id,
            email,
            confirmed_at,
            opt_out: row.opt_out,
        })
    }
}

impl Store {
    pub async fn connect(options: SqliteConnectOptions) -> Result<Store, sqlx::Error> {
        let db_pool = SqlitePoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(2))
            .connect_with(options)
            .await?;

        Ok(Self { db_pool })
    }

    /// Creates the subscriber table when it does not exist yet. Safe to run
    /// against an already initialized store.
    #[tracing::instrument(name = "Ensure the subscriber store schema", skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.db_pool).await
    }

    #[tracing::instrument(name = "Read a subscriber from the store", skip(self))]
    pub async fn read(&self, email: &str) -> Result<Option<Subscriber>, sqlx::Error> {
        sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT id, email, confirmed_at, opt_out
            FROM emails
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await?
        .map(Subscriber::try_from)
        .transpose()
    }

    /// Subscribers are listed in insertion order.
    #[tracing::instrument(name = "Read a page of subscribers from the store", skip(self))]
    pub async fn read_page(&self, page: &PageRequest) -> Result<Vec<Subscriber>, sqlx::Error> {
        sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT id, email, confirmed_at, opt_out
            FROM emails
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db_pool)
        .await?
        .into_iter()
        .map(Subscriber::try_from)
        .collect()
    }

    /// Fails with a constraint violation when the address already exists.
    #[tracing::instrument(
        name = "Insert a new subscriber into the store",
        skip(self, email),
        fields(email = %email)
    )]
    pub async fn create(&self, email: &SubscriberEmail) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO emails (email, confirmed_at, opt_out)
            VALUES (?, NULL, 0)
            "#,
        )
        .bind(email.as_ref())
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }

    /// Overwrites the confirmation and opt-out state of the subscriber with
    /// the same address, inserting it when missing. The supplied `id` is
    /// ignored.
    #[tracing::instrument(
        name = "Replace a subscriber in the store",
        skip(self, subscriber),
        fields(email = %subscriber.email)
    )]
    pub async fn replace(&self, subscriber: &Subscriber) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO emails (email, confirmed_at, opt_out)
            VALUES (?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET
                confirmed_at = excluded.confirmed_at,
                opt_out = excluded.opt_out
            "#,
        )
        .bind(subscriber.email.as_ref())
        .bind(subscriber.confirmed_at.map(|confirmed_at| confirmed_at.timestamp()))
        .bind(subscriber.opt_out)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }

    /// Deleting an address that is not stored is not an error.
    #[tracing::instrument(name = "Delete a subscriber from the store", skip(self))]
    pub async fn delete(&self, email: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            DELETE FROM emails
            WHERE email = ?
            "#,
        )
        .bind(email)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
impl Store {
    /// Private in-memory store. A single connection keeps the database alive
    /// for as long as the pool.
    pub(crate) async fn in_memory() -> Store {
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
        let db_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .expect("Failed to open in-memory store.");
        let store = Store { db_pool };

        store
            .ensure_schema()
            .await
            .expect("Failed to run migrations.");

        store
    }
}
