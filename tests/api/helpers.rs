use reqwest::Response;
use std::path::PathBuf;
use tonic::transport::Channel;
use uuid::Uuid;

use subscriber_registry::{
    config::{get_configuration, CliArgs, Settings},
    grpc::proto::mailing_list_service_client::MailingListServiceClient,
    routes::{EmailBatchResponseBody, EmailResponseBody},
    startup::Application,
};

pub struct TestApp {
    pub config: Settings,
    pub json_address: String,
    pub grpc_address: String,
    pub db_path: PathBuf,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        let mut config = get_configuration(&CliArgs::default()).expect("Missing configuration file.");
        // Every test gets its own throwaway database file
        let db_test_name = format!("db_{}.db", Uuid::new_v4().to_string().replace('-', "_"));
        let db_path = std::env::temp_dir().join(db_test_name);

        // Port 0 lets the OS pick a free port for each test
        config.set_db(db_path.display().to_string());
        config.set_bind_json(String::from("127.0.0.1:0"));
        config.set_bind_grpc(String::from("127.0.0.1:0"));

        let application = Application::build(config.clone())
            .await
            .expect("Failed to build application.");

        let json_address = format!("http://127.0.0.1:{}", application.get_json_port());
        let grpc_address = format!("http://127.0.0.1:{}", application.get_grpc_port());

        tokio::spawn(application.run_until_stopped());

        TestApp {
            config,
            json_address,
            grpc_address,
            db_path,
            api_client: reqwest::Client::new(),
        }
    }

    pub async fn grpc_client(&self) -> MailingListServiceClient<Channel> {
        MailingListServiceClient::connect(self.grpc_address.clone())
            .await
            .expect("Failed to connect to the gRPC API.")
    }

    pub async fn get_email(&self, email: &str) -> Response {
        self.api_client
            .get(&format!("{}/email/get", self.json_address))
            .query(&[("email", email)])
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_email_batch(&self, page: i64, count: i64) -> Response {
        self.api_client
            .get(&format!("{}/email/get_batch", self.json_address))
            .query(&[("page", page), ("count", count)])
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_create_email(&self, body: serde_json::Value) -> Response {
        self.api_client
            .post(&format!("{}/email/create", self.json_address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn put_update_email(&self, body: serde_json::Value) -> Response {
        self.api_client
            .put(&format!("{}/email/update", self.json_address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_delete_email(&self, body: serde_json::Value) -> Response {
        self.api_client
            .post(&format!("{}/email/delete", self.json_address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub async fn email_response(response: Response) -> EmailResponseBody {
    assert_eq!(response.status().as_u16(), 200);

    response
        .json()
        .await
        .expect("Failed to parse the email response.")
}

pub async fn email_batch_response(response: Response) -> EmailBatchResponseBody {
    assert_eq!(response.status().as_u16(), 200);

    response
        .json()
        .await
        .expect("Failed to parse the email batch response.")
}
