use serde_json::json;

use subscriber_registry::grpc::proto::{
    EmailEntry, GetEmailBatchRequest, GetEmailRequest, UpdateEmailRequest,
};

use crate::helpers::{email_batch_response, email_response, TestApp};

// Both adapters share one store, so a write through either one is visible
// through the other.

#[tokio::test]
async fn subscriber_created_over_json_is_visible_over_grpc() {
    let test_app = TestApp::spawn_app().await;
    let mut client = test_app.grpc_client().await;

    let created = email_response(
        test_app
            .post_create_email(json!({ "email": "a@example.com" }))
            .await,
    )
    .await
    .email_entry
    .unwrap();

    let entry = client
        .get_email(GetEmailRequest {
            email_addr: "a@example.com".into(),
        })
        .await
        .unwrap()
        .into_inner()
        .email_entry
        .unwrap();

    assert_eq!(entry.id, created.id);
    assert_eq!(entry.email, created.email);
    assert_eq!(entry.confirmed_at, created.confirmed_at);
    assert_eq!(entry.opt_out, created.opt_out);
}

#[tokio::test]
async fn update_over_grpc_is_visible_over_json() {
    let test_app = TestApp::spawn_app().await;
    let mut client = test_app.grpc_client().await;
    let created = email_response(
        test_app
            .post_create_email(json!({ "email": "a@example.com" }))
            .await,
    )
    .await
    .email_entry
    .unwrap();

    client
        .update_email(UpdateEmailRequest {
            email_entry: Some(EmailEntry {
                id: created.id,
                email: "a@example.com".into(),
                confirmed_at: 1_650_000_000,
                opt_out: true,
            }),
        })
        .await
        .unwrap();

    let entry = email_response(test_app.get_email("a@example.com").await)
        .await
        .email_entry
        .unwrap();
    assert_eq!(entry.confirmed_at, 1_650_000_000);
    assert!(entry.opt_out);
}

#[tokio::test]
async fn delete_over_json_is_visible_over_grpc() {
    let test_app = TestApp::spawn_app().await;
    let mut client = test_app.grpc_client().await;
    test_app
        .post_create_email(json!({ "email": "a@example.com" }))
        .await;

    test_app
        .post_delete_email(json!({ "email": "a@example.com" }))
        .await;

    let response = client
        .get_email(GetEmailRequest {
            email_addr: "a@example.com".into(),
        })
        .await
        .unwrap()
        .into_inner();
    assert!(response.email_entry.is_none());
}

#[tokio::test]
async fn both_adapters_list_the_same_pages() {
    let test_app = TestApp::spawn_app().await;
    let mut client = test_app.grpc_client().await;
    for address in ["a@example.com", "b@example.com", "c@example.com"] {
        test_app.post_create_email(json!({ "email": address })).await;
    }

    for page in 0..3 {
        let over_json = email_batch_response(test_app.get_email_batch(page, 2).await).await;
        let over_grpc = client
            .get_email_batch(GetEmailBatchRequest {
                page: page as i32,
                count: 2,
            })
            .await
            .unwrap()
            .into_inner();

        let json_emails: Vec<(i64, String)> = over_json
            .email_entries
            .into_iter()
            .map(|entry| (entry.id, entry.email))
            .collect();
        let grpc_emails: Vec<(i64, String)> = over_grpc
            .email_entries
            .into_iter()
            .map(|entry| (entry.id, entry.email))
            .collect();
        assert_eq!(json_emails, grpc_emails, "Page {} differs", page);
    }
}
