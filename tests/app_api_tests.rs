//! App API tests: transactional sends and segment management.

use chrono::{DateTime, Utc};
use customerio::{
    ApiClient, CreateSegmentRequest, Device, Error, Identifier, Region, Segment, SegmentState,
    SegmentType, SendEmailRequest, SendPushRequest, SendSmsRequest,
};
use serde_json::{json, Value};
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DELIVERY_ID: &str = "ABCDEFG";
const QUEUED_AT: i64 = 1500111111;

fn client(server: &MockServer) -> ApiClient {
    ApiClient::builder("myKey")
        .base_url(server.uri())
        .build()
        .unwrap()
}

fn queued() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(json!({"delivery_id": DELIVERY_ID, "queued_at": QUEUED_AT}))
}

#[tokio::test]
async fn test_send_email() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/send/email"))
        .and(header("authorization", "Bearer myKey"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "transactional_message_id": "welcome",
            "identifiers": {"id": "customer_1"},
            "to": "customer@example.com",
            "from": "business@example.com",
            "subject": "hello, {{ trigger.name }}",
            "message_data": {"client": "Rust", "name": "ferris"},
            "attachments": {"sample.pdf": "JVBERg=="}
        })))
        .respond_with(queued())
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut request = SendEmailRequest {
        transactional_message_id: Some("welcome".to_string()),
        to: Some("customer@example.com".to_string()),
        from: Some("business@example.com".to_string()),
        subject: Some("hello, {{ trigger.name }}".to_string()),
        message_data: json!({"client": "Rust", "name": "ferris"})
            .as_object()
            .cloned(),
        ..SendEmailRequest::new(Identifier::id("customer_1"))
    };
    request.attach_bytes("sample.pdf", b"%PDF").unwrap();
    assert!(matches!(
        request.attach_bytes("sample.pdf", b"other"),
        Err(Error::AttachmentExists(_))
    ));

    let response = client(&mock_server).send_email(&request).await.unwrap();

    assert_eq!(response.delivery_id, DELIVERY_ID);
    assert_eq!(
        response.queued_at,
        DateTime::<Utc>::from_timestamp(QUEUED_AT, 0).unwrap()
    );
    assert_eq!(response.recipient, None);
}

#[tokio::test]
async fn test_send_push_uses_token_for_device() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/send/push"))
        .and(body_json(json!({
            "identifiers": {"id": "customer_1"},
            "title": "hello",
            "message": "from the Rust client",
            "custom_device": {
                "token": "device-id",
                "platform": "ios",
                "attributes": {"attr1": "value1"}
            }
        })))
        .respond_with(queued())
        .expect(1)
        .mount(&mock_server)
        .await;

    let device = Device::new(
        "device-id",
        "ios",
        json!({"attr1": "value1"}).as_object().cloned().unwrap(),
    )
    .unwrap();

    let request = SendPushRequest {
        title: Some("hello".to_string()),
        message: Some("from the Rust client".to_string()),
        device: Some(device),
        ..SendPushRequest::new(Identifier::id("customer_1"))
    };

    let response = client(&mock_server).send_push(&request).await.unwrap();
    assert_eq!(response.delivery_id, DELIVERY_ID);
    assert_eq!(response.queued_at.timestamp(), QUEUED_AT);
}

#[tokio::test]
async fn test_send_sms() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/send/sms"))
        .and(body_json(json!({
            "transactional_message_id": "otp",
            "identifiers": {"email": "a@example.com"},
            "to": "+15555550100"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "delivery_id": "sms-1",
            "queued_at": QUEUED_AT,
            "recipient": "+15555550100"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = SendSmsRequest {
        transactional_message_id: Some("otp".to_string()),
        to: Some("+15555550100".to_string()),
        ..SendSmsRequest::new(Identifier::email("a@example.com"))
    };

    let response = client(&mock_server).send_sms(&request).await.unwrap();
    assert_eq!(response.recipient.as_deref(), Some("+15555550100"));
}

#[tokio::test]
async fn test_transactional_error_uses_meta_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/send/email"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"meta": {"error": "transactional_message_id is invalid"}})),
        )
        .mount(&mock_server)
        .await;

    let request = SendEmailRequest::new(Identifier::id("customer_1"));
    let result = client(&mock_server).send_email(&request).await;

    match result {
        Err(Error::Transactional { status, message }) => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(message, "transactional_message_id is invalid");
        }
        other => panic!("Expected Transactional error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transactional_error_falls_back_to_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/send/sms"))
        .respond_with(ResponseTemplate::new(503).set_body_string("service unavailable"))
        .mount(&mock_server)
        .await;

    let request = SendSmsRequest::new(Identifier::id("customer_1"));
    let err = client(&mock_server).send_sms(&request).await.unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(503));
    assert_eq!(err.to_string(), "service unavailable");
}

#[tokio::test]
async fn test_success_with_bad_body_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/send/email"))
        .respond_with(ResponseTemplate::new(200).set_body_string("invalid json"))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/send/push"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);

    let result = client
        .send_email(&SendEmailRequest::new(Identifier::id("1")))
        .await;
    match result {
        Err(Error::DeserializationFailed {
            raw_response,
            status,
            ..
        }) => {
            assert_eq!(status.as_u16(), 200);
            assert_eq!(raw_response, "invalid json");
        }
        other => panic!("Expected DeserializationFailed, got {:?}", other),
    }

    let result = client
        .send_push(&SendPushRequest::new(Identifier::id("1")))
        .await;
    assert!(matches!(result, Err(Error::DeserializationFailed { .. })));
}

#[tokio::test]
async fn test_queued_at_must_be_epoch_seconds() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "delivery_id": DELIVERY_ID,
            "queued_at": "2017-07-15T09:31:51Z"
        })))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .send_sms(&SendSmsRequest::new(Identifier::id("1")))
        .await;
    assert!(matches!(result, Err(Error::DeserializationFailed { .. })));
}

#[tokio::test]
async fn test_blank_identifiers_send_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(queued())
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .send_email(&SendEmailRequest::new(Identifier::email("  ")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingParameter { param: "identifiers" }));
}

#[tokio::test]
async fn test_create_segment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/segments"))
        .and(header("authorization", "Bearer myKey"))
        .and(body_json(json!({
            "segment": {"name": "name", "description": "description", "tags": ["tags"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "segment": {
                "id": 1,
                "deduplicate_id": "1:1500111111",
                "name": "name",
                "description": "description",
                "state": "build_queued",
                "type": "manual",
                "tags": ["tags"]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = CreateSegmentRequest {
        segment: Segment {
            name: "name".to_string(),
            description: "description".to_string(),
            tags: vec!["tags".to_string()],
            ..Segment::default()
        },
    };

    let segment = client(&mock_server).create_segment(&request).await.unwrap();

    assert_eq!(segment.id, 1);
    assert_eq!(segment.deduplicate_id, "1:1500111111");
    assert_eq!(segment.state, Some(SegmentState::BuildQueued));
    assert_eq!(segment.segment_type, Some(SegmentType::Manual));
}

#[tokio::test]
async fn test_create_segment_error_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/segments"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let request = CreateSegmentRequest {
        segment: Segment::default(),
    };
    let result = client(&mock_server).create_segment(&request).await;

    match result {
        Err(Error::Api { status, url, .. }) => {
            assert_eq!(status.as_u16(), 502);
            assert_eq!(url.path(), "/v1/segments");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_and_get_segments() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/segments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "segments": [
                {"id": 1, "name": "a", "description": "", "state": "finished", "type": "dynamic"},
                {"id": 2, "name": "b", "description": "", "state": "events", "progress": 40, "type": "manual"}
            ]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/segments/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "segment": {"id": 2, "name": "b", "description": "", "state": "events", "progress": 40, "type": "manual"}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/segments/3"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);

    let segments = client.list_segments().await.unwrap();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].state, Some(SegmentState::Finished));

    let segment = client.get_segment(2).await.unwrap();
    assert_eq!(segment.progress, Some(40));

    let err = client.get_segment(3).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
    assert_eq!(err.raw_response(), Some("not found"));
}

#[tokio::test]
async fn test_delete_segment_expects_no_content() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/segments/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1/segments/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    client.delete_segment(1).await.unwrap();

    let err = client.delete_segment(2).await.unwrap_err();
    assert!(matches!(err, Error::Api { .. }));
    assert_eq!(err.status().map(|s| s.as_u16()), Some(200));
}

#[tokio::test]
async fn test_segment_dependencies_and_count() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/segments/5/used_by"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "used_by": {"campaigns": [1, 2], "sent_newsletters": [3], "draft_newsletters": []}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/segments/5/customer_count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 42})))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);

    let dependencies = client.get_segment_dependencies(5).await.unwrap();
    assert_eq!(dependencies.used_by.campaigns, vec![1, 2]);
    assert_eq!(dependencies.used_by.sent_newsletters, vec![3]);
    assert!(dependencies.used_by.draft_newsletters.is_empty());

    let count = client.get_segment_customer_count(5).await.unwrap();
    assert_eq!(count.count, 42);
}

#[tokio::test]
async fn test_list_customers_in_segment_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/segments/5/membership"))
        .and(query_param("start", "cursor-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ids": ["3"],
            "identifiers": [{"email": "c@example.com", "id": 3, "cio_id": "c3"}],
            "next": ""
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/segments/5/membership"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ids": ["1", "2"],
            "identifiers": [
                {"email": "a@example.com", "id": "1", "cio_id": "c1"},
                {"email": null, "id": 2, "cio_id": "c2"}
            ],
            "next": "cursor-2"
        })))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);

    let first = client.list_customers_in_segment(5, None).await.unwrap();
    assert_eq!(first.ids, vec!["1", "2"]);
    assert_eq!(first.identifiers[1].id.as_deref(), Some("2"));
    assert_eq!(first.identifiers[1].email, None);

    let second = client
        .list_customers_in_segment(5, first.next.as_deref())
        .await
        .unwrap();
    assert_eq!(second.identifiers[0].cio_id.as_deref(), Some("c3"));
}

#[tokio::test]
async fn test_zero_segment_id_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    for err in [
        client.get_segment(0).await.unwrap_err(),
        client.delete_segment(0).await.unwrap_err(),
        client.get_segment_customer_count(0).await.unwrap_err(),
    ] {
        assert!(matches!(err, Error::MissingParameter { param: "segment_id" }));
    }
}

#[tokio::test]
async fn test_raw_call_for_unwrapped_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-request-id", "req-1")
                .set_body_json(json!({"messages": []})),
        )
        .mount(&mock_server)
        .await;

    let metadata = customerio::metadata::RequestMetadata::new(http::Method::GET, ["v1", "messages"]);
    let response = client(&mock_server)
        .inner()
        .call::<(), Value>(metadata, None)
        .await
        .unwrap();

    assert_eq!(response.data, json!({"messages": []}));
    assert_eq!(response.header("x-request-id"), Some("req-1"));
    assert_eq!(response.status.as_u16(), 200);
}

#[test]
fn test_app_region_urls() {
    let us = ApiClient::new("key").unwrap();
    let eu = ApiClient::builder("key").region(Region::Eu).build().unwrap();

    assert_eq!(us.base_url().as_str(), "https://api.customer.io/");
    assert_eq!(eu.base_url().as_str(), "https://api-eu.customer.io/");
}
