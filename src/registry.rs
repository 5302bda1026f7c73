//! Protocol independent subscriber operations.
//!
//! Every mutation is followed by a separate read of the same address, and the
//! response is built from that read. The two store calls are not wrapped in a
//! transaction: a concurrent writer on the same address can be observed by the
//! read, e.g. a create racing with a delete may answer with no subscriber.
use crate::domain::page_request::PageRequest;
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::store::Store;

#[derive(Clone, Debug)]
pub struct Registry {
    store: Store,
}

#[derive(thiserror::Error)]
pub enum RegistryError {
    #[error("{0}")]
    Validation(String),
    #[error("Failed to execute a subscriber store operation.")]
    Store(#[from] sqlx::Error),
}

impl std::fmt::Debug for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub fn error_chain_fmt(
    err: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}", err)?;
    let mut current = err.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

impl Registry {
    pub fn new(store: Store) -> Registry {
        Registry { store }
    }

    /// An unknown address is answered with `None`, never with an error.
    #[tracing::instrument(name = "Get a subscriber", skip(self))]
    pub async fn get(&self, email: &str) -> Result<Option<Subscriber>, RegistryError> {
        Ok(self.store.read(email).await?)
    }

    #[tracing::instrument(name = "Get a page of subscribers", skip(self))]
    pub async fn get_batch(
        &self,
        page: i64,
        count: i64,
    ) -> Result<Vec<Subscriber>, RegistryError> {
        let page = PageRequest::parse(page, count).map_err(RegistryError::Validation)?;

        Ok(self.store.read_page(&page).await?)
    }

    #[tracing::instrument(name = "Create a subscriber", skip(self))]
    pub async fn create(&self, email: &str) -> Result<Option<Subscriber>, RegistryError> {
        let email =
            SubscriberEmail::parse(email.to_string()).map_err(RegistryError::Validation)?;

        self.store.create(&email).await?;

        self.get(email.as_ref()).await
    }

    #[tracing::instrument(
        name = "Update a subscriber",
        skip(self, subscriber),
        fields(
            email = %subscriber.email,
            confirmed_at = subscriber.confirmed_at_seconds(),
            opt_out = subscriber.opt_out
        )
    )]
    pub async fn update(
        &self,
        subscriber: Subscriber,
    ) -> Result<Option<Subscriber>, RegistryError> {
        self.store.replace(&subscriber).await?;

        self.get(subscriber.email.as_ref()).await
    }

    /// Answers with the current state of the address, which is normally no
    /// subscriber at all. The deleted record is not echoed back.
    #[tracing::instrument(name = "Delete a subscriber", skip(self))]
    pub async fn delete(&self, email: &str) -> Result<Option<Subscriber>, RegistryError> {
        self.store.delete(email).await?;

        self.get(email).await
    }
}
