//! Integration tests using wiremock to simulate HTTP servers.

use quester::{Client, Context, Error, ResponseBody};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestData {
    id: u32,
    name: String,
}

fn test_data() -> TestData {
    TestData {
        id: 7,
        name: "Test".to_string(),
    }
}

async fn client_for(mock_server: &MockServer) -> Client {
    Client::new(mock_server.uri()).unwrap()
}

#[tokio::test]
async fn test_get_with_query_decodes_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(test_data()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let response = client
        .request()
        .path("/users")
        .query("id", "7")
        .execute::<TestData>()
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.status_text, "200 OK");
    assert_eq!(response.data(), Some(&test_data()));
}

#[tokio::test]
async fn test_json_body_sets_content_type() {
    let mock_server = MockServer::start().await;
    let body = serde_json::json!({ "name": "a" });

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("content-type", "application/json"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let response = client
        .request()
        .method("post")
        .path("/users")
        .json(&body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 201);
    assert_eq!(response.body, ResponseBody::Unread);

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received[0].body, serde_json::to_vec(&body).unwrap());
}

#[tokio::test]
async fn test_explicit_content_type_survives_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(header("content-type", "application/vnd.api+json"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    client
        .request()
        .method("PUT")
        .path("/users/7")
        .header("Content-Type", "application/vnd.api+json")
        .json(&test_data())
        .send()
        .await
        .unwrap();

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received[0].headers.get_all("content-type").iter().count(), 1);
}

#[tokio::test]
async fn test_raw_body_is_sent_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    client
        .request()
        .method("POST")
        .path("/upload")
        .body("line one\nline two")
        .send()
        .await
        .unwrap();

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received[0].body, b"line one\nline two");
    assert!(received[0].headers.get("content-type").is_none());
}

#[tokio::test]
async fn test_request_header_beats_default_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .default_header("X-Team", "core")
        .unwrap()
        .default_header("X-Region", "eu")
        .unwrap()
        .build()
        .unwrap();

    client
        .request()
        .path("/teams")
        .header("x-team", "edge")
        .send()
        .await
        .unwrap();

    let received = mock_server.received_requests().await.unwrap();
    let headers = &received[0].headers;
    let team: Vec<_> = headers.get_all("x-team").iter().collect();
    assert_eq!(team, vec!["edge"]);
    assert_eq!(headers.get("x-region").unwrap(), "eu");
    assert!(headers
        .get("user-agent")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("quester/"));
}

#[tokio::test]
async fn test_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(header("authorization", "Bearer s3cr3t"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    client
        .request()
        .bearer_token("s3cr3t")
        .send()
        .await
        .unwrap();
}

#[tokio::test]
async fn test_basic_auth_takes_precedence_over_bearer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    client
        .request()
        .bearer_token("s3cr3t")
        .basic_auth("aladdin", "opensesame")
        .send()
        .await
        .unwrap();

    let received = mock_server.received_requests().await.unwrap();
    let auth: Vec<_> = received[0].headers.get_all("authorization").iter().collect();
    assert_eq!(auth, vec!["Basic YWxhZGRpbjpvcGVuc2VzYW1l"]);
}

#[tokio::test]
async fn test_explicit_authorization_suppresses_bearer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    client
        .request()
        .header("Authorization", "Token abc")
        .bearer_token("s3cr3t")
        .send()
        .await
        .unwrap();

    let received = mock_server.received_requests().await.unwrap();
    let auth: Vec<_> = received[0].headers.get_all("authorization").iter().collect();
    assert_eq!(auth, vec!["Token abc"]);
}

#[tokio::test]
async fn test_basic_auth_is_written_before_explicit_authorization() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    client
        .request()
        .header("Authorization", "Token abc")
        .basic_auth("user", "")
        .send()
        .await
        .unwrap();

    let received = mock_server.received_requests().await.unwrap();
    let first = received[0].headers.get("authorization").unwrap();
    assert_eq!(first, "Basic dXNlcjo=");
}

#[tokio::test]
async fn test_charset_suffix_still_decodes_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"id":7,"name":"Test"}"#, "application/json; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let response = client.request().execute::<TestData>().await.unwrap();
    assert_eq!(response.into_data(), Some(test_data()));
}

#[tokio::test]
async fn test_xml_body_decodes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<user><id>7</id><name>Test</name></user>",
            "text/xml; charset=utf-8",
        ))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let response = client
        .request()
        .path("/users/7")
        .execute::<TestData>()
        .await
        .unwrap();
    assert_eq!(response.data(), Some(&test_data()));
}

#[tokio::test]
async fn test_unrecognised_content_type_keeps_raw_bytes() {
    let mock_server = MockServer::start().await;
    let payload: Vec<u8> = vec![0x00, 0xff, b'a', b'\n', 0x7f];

    Mock::given(path("/blob"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(payload.clone(), "image/png"))
        .mount(&mock_server)
        .await;
    Mock::given(path("/bare"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    for p in ["/blob", "/bare"] {
        let response = client
            .request()
            .path(p)
            .execute::<TestData>()
            .await
            .unwrap();
        assert!(response.data().is_none());
        assert_eq!(response.raw_bytes(), Some(payload.as_slice()));
    }
}

#[tokio::test]
async fn test_decode_error_keeps_status_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(502)
                .set_body_raw("not json", "application/json")
                .insert_header("x-upstream", "billing"),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let result = client.request().execute::<TestData>().await;

    match result {
        Err(Error::Decode { response, source }) => {
            assert_eq!(response.status.as_u16(), 502);
            assert_eq!(response.status_text, "502 Bad Gateway");
            assert_eq!(response.header("x-upstream"), Some("billing"));
            assert_eq!(response.raw_bytes(), Some(&b"not json"[..]));
            assert!(matches!(source, quester::DecodeError::Json(_)));
        }
        other => panic!("Expected Decode error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_status_is_not_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(test_data()))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let response = client.request().execute::<TestData>().await.unwrap();
    assert_eq!(response.status.as_u16(), 404);
    assert!(!response.is_success());
    assert_eq!(response.data(), Some(&test_data()));
}

#[tokio::test]
async fn test_timeout_fails_with_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let result = client
        .request()
        .timeout(Duration::from_millis(50))
        .send()
        .await;

    match result {
        Err(e) => {
            assert!(e.is_timeout());
            assert!(matches!(e, Error::Timeout));
        }
        Ok(r) => panic!("Expected timeout, got status {}", r.status),
    }
}

#[tokio::test]
async fn test_cancelled_context() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let client = client_for(&mock_server).await;
    let result = client
        .request()
        .context(Context::with_cancellation(token))
        .timeout(Duration::from_secs(30))
        .send()
        .await;

    assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Bind then drop a listener to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = Client::new(format!("http://{}", addr)).unwrap();
    let result = client.request().path("/").send().await;
    assert!(matches!(result, Err(Error::Network(_))));
}

/// Serves a response head immediately, then a fragment of the promised body,
/// then stalls. Returns the base URL.
async fn stalling_body_server() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let head = "HTTP/1.1 200 OK\r\n\
                            content-type: application/json\r\n\
                            content-length: 64\r\n\
                            x-slow: yes\r\n\r\n{\"id\":";
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_secs(5)).await;
            });
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_stalled_body_read_hits_deadline() {
    let client = Client::new(stalling_body_server().await).unwrap();

    let result = client
        .request()
        .timeout(Duration::from_millis(200))
        .execute::<TestData>()
        .await;

    match result {
        Err(Error::Decode { response, source }) => {
            assert!(matches!(source, quester::DecodeError::Timeout));
            assert_eq!(response.status.as_u16(), 200);
            assert_eq!(response.header("x-slow"), Some("yes"));
            assert!(matches!(response.body, ResponseBody::Unread));
        }
        other => panic!("Expected body-read timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_stalled_body_read_is_cancelled() {
    let client = Client::new(stalling_body_server().await).unwrap();

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let result = client
        .request()
        .context(Context::with_cancellation(token))
        .execute::<TestData>()
        .await;

    match result {
        Err(Error::Decode { response, source }) => {
            assert!(matches!(source, quester::DecodeError::Cancelled));
            assert_eq!(response.status.as_u16(), 200);
            assert_eq!(response.header("x-slow"), Some("yes"));
        }
        other => panic!("Expected body-read cancellation, got {:?}", other),
    }
}
