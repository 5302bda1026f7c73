use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

use crate::domain::subscriber::Subscriber;
use crate::registry::{error_chain_fmt, Registry, RegistryError};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EmailEntryBody {
    #[serde(default)]
    pub id: i64,
    pub email: String,
    // Seconds since the Unix epoch, 0 when unconfirmed
    #[serde(default)]
    pub confirmed_at: i64,
    #[serde(default)]
    pub opt_out: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct EmailResponseBody {
    pub email_entry: Option<EmailEntryBody>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct EmailBatchResponseBody {
    pub email_entries: Vec<EmailEntryBody>,
}

#[derive(Deserialize, Debug)]
pub struct EmailAddress {
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct BatchParameters {
    pub page: i64,
    pub count: i64,
}

impl From<Subscriber> for EmailEntryBody {
    fn from(subscriber: Subscriber) -> Self {
        EmailEntryBody {
            id: subscriber.id,
            confirmed_at: subscriber.confirmed_at_seconds(),
            email: subscriber.email.as_ref().to_string(),
            opt_out: subscriber.opt_out,
        }
    }
}

impl TryFrom<web::Json<EmailEntryBody>> for Subscriber {
    type Error = String;

    fn try_from(body: web::Json<EmailEntryBody>) -> Result<Self, Self::Error> {
        let body = body.into_inner();

        Subscriber::parse(body.id, body.email, body.confirmed_at, body.opt_out)
    }
}

#[derive(thiserror::Error)]
pub enum EmailApiError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Failed to execute a subscriber store operation.")]
    StoreError(#[source] sqlx::Error),
}

impl std::fmt::Debug for EmailApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<RegistryError> for EmailApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Validation(message) => EmailApiError::ValidationError(message),
            RegistryError::Store(err) => EmailApiError::StoreError(err),
        }
    }
}

impl ResponseError for EmailApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            EmailApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            EmailApiError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn email_response(subscriber: Option<Subscriber>) -> HttpResponse {
    HttpResponse::Ok().json(EmailResponseBody {
        email_entry: subscriber.map(EmailEntryBody::from),
    })
}

#[tracing::instrument(
    name = "JSON GetEmail",
    skip(parameters, registry),
    fields(email = %parameters.email)
)]
pub async fn get_email(
    parameters: web::Query<EmailAddress>,
    registry: web::Data<Registry>,
) -> Result<HttpResponse, EmailApiError> {
    let subscriber = registry.get(&parameters.email).await?;

    Ok(email_response(subscriber))
}

#[tracing::instrument(
    name = "JSON GetEmailBatch",
    skip(parameters, registry),
    fields(page = parameters.page, count = parameters.count)
)]
pub async fn get_email_batch(
    parameters: web::Query<BatchParameters>,
    registry: web::Data<Registry>,
) -> Result<HttpResponse, EmailApiError> {
    let subscribers = registry
        .get_batch(parameters.page, parameters.count)
        .await?;

    Ok(HttpResponse::Ok().json(EmailBatchResponseBody {
        email_entries: subscribers.into_iter().map(EmailEntryBody::from).collect(),
    }))
}

#[tracing::instrument(
    name = "JSON CreateEmail",
    skip(body, registry),
    fields(email = %body.email)
)]
pub async fn create_email(
    body: web::Json<EmailAddress>,
    registry: web::Data<Registry>,
) -> Result<HttpResponse, EmailApiError> {
    let subscriber = registry.create(&body.email).await?;

    Ok(email_response(subscriber))
}

#[tracing::instrument(
    name = "JSON UpdateEmail",
    skip(body, registry),
    fields(
        email = %body.email,
        confirmed_at = body.confirmed_at,
        opt_out = body.opt_out
    )
)]
pub async fn update_email(
    body: web::Json<EmailEntryBody>,
    registry: web::Data<Registry>,
) -> Result<HttpResponse, EmailApiError> {
    let subscriber = Subscriber::try_from(body).map_err(EmailApiError::ValidationError)?;
    let subscriber = registry.update(subscriber).await?;

    Ok(email_response(subscriber))
}

#[tracing::instrument(
    name = "JSON DeleteEmail",
    skip(body, registry),
    fields(email = %body.email)
)]
pub async fn delete_email(
    body: web::Json<EmailAddress>,
    registry: web::Data<Registry>,
) -> Result<HttpResponse, EmailApiError> {
    let subscriber = registry.delete(&body.email).await?;

    Ok(email_response(subscriber))
}
