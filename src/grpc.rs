use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};

use crate::domain::subscriber::Subscriber;
use crate::registry::{Registry, RegistryError};

use self::proto::mailing_list_service_server::{MailingListService, MailingListServiceServer};
use self::proto::{
    CreateEmailRequest, DeleteEmailRequest, EmailEntry, EmailResponse, GetEmailBatchRequest,
    GetEmailBatchResponse, GetEmailRequest, UpdateEmailRequest,
};

/// Generated protobuf messages, service trait and client.
pub mod proto {
    #![allow(clippy::all)]
    tonic::include_proto!("mailing_list");
}

pub struct MailServer {
    registry: Registry,
}

impl MailServer {
    pub fn new(registry: Registry) -> MailServer {
        MailServer { registry }
    }
}

impl From<Subscriber> for EmailEntry {
    fn from(subscriber: Subscriber) -> Self {
        EmailEntry {
            id: subscriber.id,
            confirmed_at: subscriber.confirmed_at_seconds(),
            email: subscriber.email.as_ref().to_string(),
            opt_out: subscriber.opt_out,
        }
    }
}

impl TryFrom<EmailEntry> for Subscriber {
    type Error = String;

    fn try_from(entry: EmailEntry) -> Result<Self, Self::Error> {
        Subscriber::parse(entry.id, entry.email, entry.confirmed_at, entry.opt_out)
    }
}

impl From<RegistryError> for Status {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Validation(message) => Status::invalid_argument(message),
            RegistryError::Store(_) => {
                tracing::error!(error.cause_chain = ?err, "gRPC request failed");
                Status::internal("Failed to execute a subscriber store operation.")
            }
        }
    }
}

fn email_response(subscriber: Option<Subscriber>) -> Response<EmailResponse> {
    Response::new(EmailResponse {
        email_entry: subscriber.map(EmailEntry::from),
    })
}

#[tonic::async_trait]
impl MailingListService for MailServer {
    #[tracing::instrument(
        name = "gRPC GetEmail",
        skip(self, request),
        fields(email_addr = %request.get_ref().email_addr)
    )]
    async fn get_email(
        &self,
        request: Request<GetEmailRequest>,
    ) -> Result<Response<EmailResponse>, Status> {
        let subscriber = self.registry.get(&request.get_ref().email_addr).await?;

        Ok(email_response(subscriber))
    }

    #[tracing::instrument(
        name = "gRPC GetEmailBatch",
        skip(self, request),
        fields(
            page = request.get_ref().page,
            count = request.get_ref().count
        )
    )]
    async fn get_email_batch(
        &self,
        request: Request<GetEmailBatchRequest>,
    ) -> Result<Response<GetEmailBatchResponse>, Status> {
        let GetEmailBatchRequest { page, count } = request.into_inner();
        let subscribers = self.registry.get_batch(page.into(), count.into()).await?;

        Ok(Response::new(GetEmailBatchResponse {
            email_entries: subscribers.into_iter().map(EmailEntry::from).collect(),
        }))
    }

    #[tracing::instrument(
        name = "gRPC CreateEmail",
        skip(self, request),
        fields(email_addr = %request.get_ref().email_addr)
    )]
    async fn create_email(
        &self,
        request: Request<CreateEmailRequest>,
    ) -> Result<Response<EmailResponse>, Status> {
        let subscriber = self.registry.create(&request.get_ref().email_addr).await?;

        Ok(email_response(subscriber))
    }

    #[tracing::instrument(name = "gRPC UpdateEmail", skip(self, request))]
    async fn update_email(
        &self,
        request: Request<UpdateEmailRequest>,
    ) -> Result<Response<EmailResponse>, Status> {
        let entry = request
            .into_inner()
            .email_entry
            .ok_or_else(|| Status::invalid_argument("email_entry is required"))?;
        tracing::info!(
            email = %entry.email,
            confirmed_at = entry.confirmed_at,
            opt_out = entry.opt_out,
            "Replacing subscriber"
        );

        let subscriber = Subscriber::try_from(entry).map_err(Status::invalid_argument)?;
        let subscriber = self.registry.update(subscriber).await?;

        Ok(email_response(subscriber))
    }

    #[tracing::instrument(
        name = "gRPC DeleteEmail",
        skip(self, request),
        fields(email_addr = %request.get_ref().email_addr)
    )]
    async fn delete_email(
        &self,
        request: Request<DeleteEmailRequest>,
    ) -> Result<Response<EmailResponse>, Status> {
        let subscriber = self.registry.delete(&request.get_ref().email_addr).await?;

        Ok(email_response(subscriber))
    }
}

/// Serves the mailing list gRPC API on an already bound listener until the
/// transport fails.
pub async fn run(
    listener: TcpListener,
    registry: Registry,
) -> Result<(), tonic::transport::Error> {
    tonic::transport::Server::builder()
        .add_service(MailingListServiceServer::new(MailServer::new(registry)))
        .serve_with_incoming(TcpListenerStream::new(listener))
        .await
}
