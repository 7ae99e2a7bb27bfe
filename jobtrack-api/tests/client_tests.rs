use jobtrack_api::endpoints::ApplicationId;
use jobtrack_api::endpoints::job_applications::ApplicationStatus;
use jobtrack_api::{Client, ErrorKind, Method, Request, StaticCredential};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

fn client_for(server: &MockServer, credential: StaticCredential) -> Client {
    Client::builder(Arc::new(credential))
        .base_url(format!("{}/api", server.uri()))
        .userinfo_url(format!("{}/oauth2/v3/userinfo", server.uri()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn patch_status_returns_the_response_object() {
    let server = MockServer::start().await;
    let updated = json!({"id": 5, "status": "interview", "company_name": "Acme", "position": "Engineer"});

    Mock::given(matchers::method("PATCH"))
        .and(matchers::path("/api/job_applications/5/"))
        .and(matchers::header("Authorization", "Bearer stored-token"))
        .and(matchers::body_json(json!({"status": "interview"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&updated))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, StaticCredential::new("stored-token"));
    let body = json!({"status": "interview"});
    let result = client
        .send(Method::Patch, "/job_applications/5/", Some(&body), None)
        .await
        .unwrap();

    assert_eq!(result, updated);
}

#[tokio::test]
async fn no_authorization_header_without_credential() {
    let server = MockServer::start().await;

    Mock::given(matchers::method("GET"))
        .and(matchers::path("/api/job_applications/"))
        .and(matchers::header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/api/job_applications/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0, "next": null, "previous": null, "results": []})))
        .mount(&server)
        .await;

    let client = client_for(&server, StaticCredential::anonymous());
    let result = client
        .send(Method::Get, "job_applications/", None, None)
        .await
        .unwrap();

    assert_eq!(result["count"], 0);
}

#[tokio::test]
async fn extra_headers_are_forwarded() {
    let server = MockServer::start().await;

    Mock::given(matchers::method("DELETE"))
        .and(matchers::path("/api/job_applications/9/"))
        .and(matchers::header("X-Request-Source", "cli"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, StaticCredential::new("t"));
    let mut headers = HeaderMap::new();
    headers.insert("X-Request-Source", HeaderValue::from_static("cli"));

    let result = client
        .send(Method::Delete, "/job_applications/9/", None, Some(headers))
        .await
        .unwrap();

    assert!(result.is_null());
}

#[tokio::test]
async fn extra_headers_cannot_replace_the_credential() {
    let server = MockServer::start().await;

    Mock::given(matchers::method("GET"))
        .and(matchers::path("/api/job_applications/"))
        .and(matchers::header("Authorization", "Bearer real"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0, "results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, StaticCredential::new("real"));
    let mut headers = HeaderMap::new();
    headers.insert("Authorization", HeaderValue::from_static("Bearer forged"));

    client
        .send(Method::Get, "/job_applications/", None, Some(headers))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let values: Vec<&str> = requests[0]
        .headers
        .get_all("authorization")
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(values, vec!["Bearer real"]);
}

#[tokio::test]
async fn token_invalid_response_is_classified() {
    let server = MockServer::start().await;

    Mock::given(matchers::any())
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Given token not valid", "code": "token_not_valid"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, StaticCredential::new("old"));
    let err = client
        .send(Method::Get, "/job_applications/", None, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TokenExpired);
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn validation_errors_carry_details() {
    let server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": "Invalid application data",
            "details": {"position": ["Position is required"]}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, StaticCredential::new("t"));
    let err = client
        .request(Request::job_applications().create("Acme", ""))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.message(), "Invalid application data");
    assert!(err.details().unwrap().contains_key("position"));
}

#[tokio::test]
async fn malformed_success_body_is_unknown() {
    let server = MockServer::start().await;

    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server, StaticCredential::new("t"));
    let err = client
        .send(Method::Get, "/job_applications/", None, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unknown);
}

#[tokio::test]
async fn unexpected_response_shape_is_unknown() {
    let server = MockServer::start().await;

    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let client = client_for(&server, StaticCredential::new("t"));
    let err = client
        .request(Request::job_applications().list())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unknown);
}

#[tokio::test]
async fn unreachable_server_is_network() {
    // Bind then release a port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let client = Client::builder(Arc::new(StaticCredential::new("t")))
        .base_url(format!("http://{}/api", address))
        .build()
        .unwrap();

    let err = client
        .send(Method::Get, "/job_applications/", None, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn slow_response_times_out_as_network() {
    let server = MockServer::start().await;

    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = Client::builder(Arc::new(StaticCredential::new("t")))
        .base_url(server.uri())
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = client
        .send(Method::Get, "/job_applications/", None, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn list_sends_filters_and_decodes_page() {
    let server = MockServer::start().await;

    Mock::given(matchers::method("GET"))
        .and(matchers::path("/api/job_applications/"))
        .and(matchers::query_param("page", "2"))
        .and(matchers::query_param("status", "applied,interviewing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 11,
            "next": null,
            "previous": "http://localhost:8000/api/job_applications/?page=1",
            "results": [
                {"id": 11, "company_name": "Acme", "position": "Engineer", "status": "applied"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, StaticCredential::new("t"));
    let page = client
        .request(
            Request::job_applications()
                .list()
                .page(2u32)
                .statuses(vec![ApplicationStatus::Applied, ApplicationStatus::Interviewing]),
        )
        .await
        .unwrap();

    assert_eq!(page.count, 11);
    assert_eq!(page.results[0].id, ApplicationId::new(11));
    assert!(page.previous.is_some());
}

#[tokio::test]
async fn process_emails_posts_query() {
    let server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path("/api/job_applications/process_emails/"))
        .and(matchers::body_json(json!({"query": "subject:application", "max_results": 25})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"processed": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, StaticCredential::new("t"));
    let summary = client
        .request(
            Request::job_applications()
                .process_emails("subject:application")
                .max_results(25u32),
        )
        .await
        .unwrap();

    assert_eq!(summary["processed"], 3);
}

#[tokio::test]
async fn fetch_user_profile_maps_userinfo() {
    let server = MockServer::start().await;

    Mock::given(matchers::method("GET"))
        .and(matchers::path("/oauth2/v3/userinfo"))
        .and(matchers::header("Authorization", "Bearer google-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sub": "1093",
            "email": "ada@example.com",
            "name": "Ada Lovelace",
            "picture": "https://example.com/ada.png"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, StaticCredential::new("google-token"));
    let profile = client.fetch_user_profile().await.unwrap();

    assert_eq!(profile.id, "1093");
    assert_eq!(profile.name, "Ada Lovelace");
}

#[tokio::test]
async fn fetch_user_profile_without_credential_skips_the_network() {
    let server = MockServer::start().await;

    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, StaticCredential::anonymous());
    let err = client.fetch_user_profile().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}
