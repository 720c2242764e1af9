mod common;

use common::*;

use http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_delete_image_happy_path() {
    let setup = TestSetup::strict();
    let url = setup.upload_one("cat.png", &[bearer()]).await;
    assert_eq!(setup.store.len(), 1);

    let response = setup
        .send_delete(json!({ "publicUrl": url }), &[bearer()])
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(
        body["message"],
        json!(format!("File with URL {url} deleted successfully"))
    );
    assert!(setup.store.is_empty());
}

#[tokio::test]
async fn test_delete_image_in_folder() {
    let setup = TestSetup::strict();
    let form = MultipartForm::new()
        .file("file", "cat.png", "image/png", &[1])
        .text("path", "pets/cats");
    let response = setup.post_multipart("/images", form, &[bearer()]).await;
    let url = parse_response_body(response).await["url"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(url.contains("/o/pets%2Fcats%2F"));

    let response = setup
        .send_delete(json!({ "publicUrl": url }), &[bearer()])
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(setup.store.is_empty());
}

#[tokio::test]
async fn test_delete_image_requires_credential_even_when_uploads_are_tiered() {
    let setup = TestSetup::tiered();
    let url = setup.upload_one("cat.png", &[from_ip("192.0.2.60")]).await;

    let response = setup
        .send_delete(json!({ "publicUrl": url }), &[from_ip("192.0.2.60")])
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = parse_response_body(response).await;
    assert_eq!(body, json!({ "success": false, "error": "Unauthorized" }));
    assert_eq!(setup.store.remove_calls(), 0);
    assert_eq!(setup.store.len(), 1);
}

#[tokio::test]
async fn test_delete_image_checks_auth_before_payload() {
    let setup = TestSetup::strict();

    let response = setup.send_delete(json!({}), &[]).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete_image_missing_url() {
    let setup = TestSetup::strict();

    for payload in [json!({}), json!({ "publicUrl": "" })] {
        let response = setup.send_delete(payload, &[bearer()]).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_response_body(response).await;
        assert_eq!(
            body,
            json!({ "success": false, "error": "Missing publicUrl" })
        );
    }
}

#[tokio::test]
async fn test_delete_image_malformed_url_never_reaches_store() {
    let setup = TestSetup::strict();

    let response = setup
        .send_delete(
            json!({ "publicUrl": "https://storage.test/images/cat.png" }),
            &[bearer()],
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid URL format"));
    assert_eq!(setup.store.remove_calls(), 0);
}

#[tokio::test]
async fn test_delete_image_unknown_object_is_storage_failure() {
    let setup = TestSetup::strict();

    let response = setup
        .send_delete(
            json!({ "publicUrl": format!("{PUBLIC_BASE}/o/gone.png?alt=media") }),
            &[bearer()],
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(setup.store.remove_calls(), 1);
}

#[tokio::test]
async fn test_delete_image_invalid_json() {
    let setup = TestSetup::strict();
    let request = axum::http::Request::builder()
        .uri("/images")
        .method("DELETE")
        .header("authorization", format!("Bearer {TEST_SECRET}"))
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = setup.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], json!("Invalid JSON payload"));
}

#[tokio::test]
async fn test_delete_does_not_touch_quota() {
    let setup = TestSetup::tiered();
    let headers = [bearer(), from_ip("192.0.2.61")];
    let url = setup.upload_one("cat.png", &headers).await;

    let response = setup
        .send_delete(json!({ "publicUrl": url }), &headers)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let quota = parse_response_body(setup.send_get("/images/quota", &headers).await).await;
    assert_eq!(quota["remaining"], json!(10));
}
