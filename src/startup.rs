use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use tokio::task::JoinError;
use tracing_actix_web::TracingLogger;

use crate::config::Settings;
use crate::grpc;
use crate::registry::{error_chain_fmt, Registry};
use crate::routes::{
    create_email, delete_email, get_email, get_email_batch, health_check, update_email,
};
use crate::store::Store;

/// Failures that bring the whole process down. Nothing here is retried and
/// no adapter outlives the other.
#[derive(thiserror::Error)]
pub enum StartupError {
    #[error("Failed to read the configuration.")]
    Configuration(#[source] config::ConfigError),
    #[error("Failed to open the subscriber store at {0}.")]
    OpenStore(String, #[source] sqlx::Error),
    #[error("Failed to prepare the subscriber store schema.")]
    Schema(#[source] sqlx::migrate::MigrateError),
    #[error("Failed to bind the {0} listener on {1}.")]
    Bind(&'static str, String, #[source] std::io::Error),
    #[error("The JSON API server failed.")]
    JsonServer(#[source] std::io::Error),
    #[error("The gRPC API server failed.")]
    GrpcServer(#[source] tonic::transport::Error),
    #[error("The {0} task failed to complete.")]
    Task(&'static str, #[source] JoinError),
}

impl std::fmt::Debug for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub struct Application {
    json_port: u16,
    grpc_port: u16,
    json_server: Server,
    grpc_listener: tokio::net::TcpListener,
    registry: Registry,
}

impl Application {
    /// Opens the store, prepares its schema and binds both listeners.
    pub async fn build(config: Settings) -> Result<Self, StartupError> {
        tracing::info!("Using subscriber store '{}'", config.db);
        let store = Store::connect(config.get_store_options())
            .await
            .map_err(|err| StartupError::OpenStore(config.db.clone(), err))?;
        store.ensure_schema().await.map_err(StartupError::Schema)?;
        let registry = Registry::new(store);

        let json_address = config.get_json_address();
        let json_listener = TcpListener::bind(&json_address)
            .map_err(|err| StartupError::Bind("JSON API", json_address.clone(), err))?;
        let json_port = json_listener
            .local_addr()
            .map_err(|err| StartupError::Bind("JSON API", json_address.clone(), err))?
            .port();
        let json_server = run(json_listener, registry.clone())
            .map_err(|err| StartupError::Bind("JSON API", json_address.clone(), err))?;

        let grpc_address = config.get_grpc_address();
        let grpc_listener = tokio::net::TcpListener::bind(&grpc_address)
            .await
            .map_err(|err| StartupError::Bind("gRPC API", grpc_address.clone(), err))?;
        let grpc_port = grpc_listener
            .local_addr()
            .map_err(|err| StartupError::Bind("gRPC API", grpc_address.clone(), err))?
            .port();

        tracing::info!("JSON API server listening on {}", json_address);
        tracing::info!("gRPC API server listening on {}", grpc_address);

        Ok(Self {
            json_port,
            grpc_port,
            json_server,
            grpc_listener,
            registry,
        })
    }

    pub fn get_json_port(&self) -> u16 {
        self.json_port
    }

    pub fn get_grpc_port(&self) -> u16 {
        self.grpc_port
    }

    /// Runs both adapters as independent tasks over the same store. A server
    /// failing ends the process with its error, while a server stopping
    /// cleanly leaves the other one running.
    pub async fn run_until_stopped(self) -> Result<(), StartupError> {
        let json_server = self.json_server;
        let mut json_task = tokio::spawn(async move {
            tracing::info!("Starting JSON API server...");
            json_server.await.map_err(StartupError::JsonServer)
        });
        let grpc_listener = self.grpc_listener;
        let registry = self.registry;
        let mut grpc_task = tokio::spawn(async move {
            tracing::info!("Starting gRPC API server...");
            grpc::run(grpc_listener, registry)
                .await
                .map_err(StartupError::GrpcServer)
        });

        tokio::select! {
            outcome = &mut json_task => {
                if let Err(err) = report_exit("JSON API", outcome) {
                    grpc_task.abort();
                    return Err(err);
                }
                report_exit("gRPC API", grpc_task.await)
            }
            outcome = &mut grpc_task => {
                if let Err(err) = report_exit("gRPC API", outcome) {
                    json_task.abort();
                    return Err(err);
                }
                report_exit("JSON API", json_task.await)
            }
        }
    }
}

fn report_exit(
    task_name: &'static str,
    outcome: Result<Result<(), StartupError>, JoinError>,
) -> Result<(), StartupError> {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name);
            Ok(())
        }
        Ok(Err(err)) => {
            tracing::error!(
                error.cause_chain = ?err,
                error.message = %err,
                "{} failed",
                task_name
            );
            Err(err)
        }
        Err(err) => {
            tracing::error!(
                error.cause_chain = ?err,
                error.message = %err,
                "{} task failed to complete",
                task_name
            );
            Err(StartupError::Task(task_name, err))
        }
    }
}

pub fn run(listener: TcpListener, registry: Registry) -> Result<Server, std::io::Error> {
    let registry = web::Data::new(registry);

    let server = HttpServer::new(move || {
        App::new()
            // Request logging with a span per request
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/email/get", web::get().to(get_email))
            .route("/email/get_batch", web::get().to(get_email_batch))
            .route("/email/create", web::post().to(create_email))
            .route("/email/update", web::put().to(update_email))
            .route("/email/delete", web::post().to(delete_email))
            .app_data(registry.clone())
    })
    // The process only ends through a server failure or a signal
    .disable_signals()
    .listen(listener)?
    .run();

    Ok(server)
}
