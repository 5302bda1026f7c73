use crate::helpers::TestApp;

#[tokio::test]
async fn health_check_works() {
    let test_app = TestApp::spawn_app().await;
    let url = format!("{}/health_check", test_app.json_address);
    let response = test_app
        .api_client
        .get(url)
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length())
}

#[tokio::test]
async fn store_file_is_created_on_startup() {
    let test_app = TestApp::spawn_app().await;

    assert!(test_app.db_path.exists());
    assert_eq!(test_app.config.db, test_app.db_path.display().to_string());
}
