use datagate_core::domain::{Dataset, Options, Role, Sample};
use datagate_core::progress::{CollectingProgressSink, Reporter};
use datagate_core::remote::{RemoteItemValidator, RemoteValidator};
use datagate_core::validation::{ValidationStatus, Validator};
use datagate_core::validators::LinkAvailabilityValidator;
use httpmock::prelude::*;
use std::sync::Arc;

fn qa(question: &str, answer: &str) -> Sample {
    Sample::from_turns([(Role::User, question), (Role::Assistant, answer)])
}

fn remote_options(server: &MockServer, path: &str) -> Options {
    Options::new().with("endpoint", server.url(path))
}

#[tokio::test]
async fn remote_bulk_pass_round_trip() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/validate");
        then.status(200)
            .json_body(serde_json::json!({"status": "pass"}));
    });

    let v = RemoteValidator::new(
        remote_options(&server, "/validate"),
        Reporter::disabled("remote"),
    )
    .unwrap();
    let data: Dataset = vec![qa("hi", "hello")];
    let result = v.validate(&data).await;
    mock.assert();
    assert_eq!(result.status, ValidationStatus::Pass);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn remote_bulk_wraps_string_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/validate");
        then.status(200)
            .json_body(serde_json::json!({"status": "fail", "errors": ["bad item"]}));
    });

    let v = RemoteValidator::new(
        remote_options(&server, "/validate"),
        Reporter::disabled("remote"),
    )
    .unwrap();
    let result = v.validate(&vec![qa("q", "a")]).await;
    assert_eq!(result.status, ValidationStatus::Fail);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].error, "bad item");
    assert_eq!(result.errors[0].code.as_deref(), Some("remote_error"));
}

#[tokio::test]
async fn remote_bulk_keeps_well_formed_details_and_wraps_odd_objects() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/validate");
        then.status(200).json_body(serde_json::json!({
            "status": "fail",
            "errors": [
                {"error": "bad role", "index": 4, "code": "schema_validation"},
                {"reason": "something unexpected"}
            ]
        }));
    });

    let v = RemoteValidator::new(
        remote_options(&server, "/validate"),
        Reporter::disabled("remote"),
    )
    .unwrap();
    let result = v.validate(&vec![qa("q", "a")]).await;
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.errors[0].error, "bad role");
    assert_eq!(result.errors[0].index, Some(4));
    assert_eq!(result.errors[1].code.as_deref(), Some("remote_error_parse"));
    assert!(result.errors[1].error.contains("something unexpected"));
}

#[tokio::test]
async fn remote_bulk_reports_http_error_with_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/validate");
        then.status(503).body("maintenance window");
    });

    let v = RemoteValidator::new(
        remote_options(&server, "/validate"),
        Reporter::disabled("remote"),
    )
    .unwrap();
    let result = v.validate(&vec![qa("q", "a")]).await;
    assert_eq!(result.status, ValidationStatus::Fail);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code.as_deref(), Some("remote_http_error"));
    assert!(result.errors[0].error.contains("503"));
    assert!(result.errors[0].error.contains("maintenance window"));
}

#[tokio::test]
async fn remote_bulk_reports_unparseable_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/validate");
        then.status(200).body("plain text, not json");
    });

    let v = RemoteValidator::new(
        remote_options(&server, "/validate"),
        Reporter::disabled("remote"),
    )
    .unwrap();
    let result = v.validate(&vec![qa("q", "a")]).await;
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code.as_deref(), Some("remote_error_parse"));
}

#[tokio::test]
async fn remote_bulk_contains_transport_failure() {
    // Nothing listens on this port; connection is refused.
    let v = RemoteValidator::new(
        Options::new().with("endpoint", "http://127.0.0.1:9/validate"),
        Reporter::disabled("remote"),
    )
    .unwrap();
    let result = v.validate(&vec![qa("q", "a")]).await;
    assert_eq!(result.status, ValidationStatus::Fail);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].error.contains("remote request failed"));
}

#[tokio::test]
async fn remote_item_tags_errors_with_request_index() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/item");
        then.status(200).json_body(serde_json::json!({
            "status": "fail",
            "errors": [{"error": "too short"}, "raw note"]
        }));
    });

    let v = RemoteItemValidator::new(
        remote_options(&server, "/item"),
        Reporter::disabled("remote_item"),
    )
    .unwrap();
    let data: Dataset = vec![qa("a", "b"), qa("c", "d")];
    let result = v.validate(&data).await;
    assert_eq!(result.errors.len(), 4);

    let detail_indices: Vec<usize> = result
        .errors
        .iter()
        .filter(|e| e.error == "too short")
        .map(|e| e.index.unwrap())
        .collect();
    assert_eq!(detail_indices, vec![0, 1]);

    let raw_notes: Vec<&datagate_core::validation::ValidationErrorDetail> = result
        .errors
        .iter()
        .filter(|e| e.error == "raw note")
        .collect();
    assert_eq!(raw_notes.len(), 2);
    assert!(raw_notes
        .iter()
        .all(|e| e.code.as_deref() == Some("remote_item_error")));
}

#[tokio::test]
async fn remote_item_prefers_index_from_payload() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/item");
        then.status(200).json_body(serde_json::json!({
            "status": "fail",
            "errors": [{"error": "cross reference", "index": 41}]
        }));
    });

    let v = RemoteItemValidator::new(
        remote_options(&server, "/item"),
        Reporter::disabled("remote_item"),
    )
    .unwrap();
    let result = v.validate(&vec![qa("a", "b")]).await;
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].index, Some(41));
}

#[tokio::test]
async fn remote_item_http_failures_do_not_abort_remaining_items() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/item");
        then.status(500).body("worker crashed");
    });

    let v = RemoteItemValidator::new(
        remote_options(&server, "/item"),
        Reporter::disabled("remote_item"),
    )
    .unwrap();
    let data: Dataset = vec![qa("a", "b"), qa("c", "d"), qa("e", "f")];
    let result = v.validate(&data).await;
    assert_eq!(mock.hits(), 3);
    assert_eq!(result.errors.len(), 3);
    for (i, detail) in result.errors.iter().enumerate() {
        assert_eq!(detail.index, Some(i));
        assert_eq!(detail.code.as_deref(), Some("remote_http_error"));
        assert!(detail.error.contains("worker crashed"));
    }
}

#[tokio::test]
async fn availability_flags_broken_and_unreachable_urls() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/ok");
        then.status(200);
    });
    server.mock(|when, then| {
        when.method(GET).path("/missing");
        then.status(404);
    });

    let data: Dataset = vec![
        qa(
            &format!("see {}", server.url("/ok")),
            &format!("broken: {}", server.url("/missing")),
        ),
        qa("dead: http://127.0.0.1:9/gone", "no links here"),
    ];

    let v = LinkAvailabilityValidator::new(Reporter::disabled("link_availability"));
    let result = v.validate(&data).await;
    assert_eq!(result.status, ValidationStatus::Fail);
    assert_eq!(result.errors.len(), 2);

    let unavailable = result
        .errors
        .iter()
        .find(|e| e.code.as_deref() == Some("unavailable_url"))
        .unwrap();
    assert_eq!(unavailable.index, Some(0));
    assert_eq!(unavailable.field.as_deref(), Some("messages[1].content"));
    assert!(unavailable.error.contains("404"));

    let fetch_error = result
        .errors
        .iter()
        .find(|e| e.code.as_deref() == Some("fetch_error"))
        .unwrap();
    assert_eq!(fetch_error.index, Some(1));
    assert_eq!(fetch_error.field.as_deref(), Some("messages[0].content"));
}

#[tokio::test]
async fn availability_progress_counts_messages_not_urls() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/a");
        then.status(200);
    });

    // Three messages total; one carries two URLs, one carries none.
    let data: Dataset = vec![
        qa(
            &format!("{} and {}", server.url("/a"), server.url("/a")),
            "no links",
        ),
        Sample::from_turns([(Role::User, "still no links".to_string())]),
    ];

    let sink = Arc::new(CollectingProgressSink::new());
    let reporter = Reporter::new(
        "link_availability",
        Some(sink.clone()),
        std::sync::Arc::new(datagate_core::logging::NoopEventLogger),
    );
    let v = LinkAvailabilityValidator::new(reporter);
    assert!(v.validate(&data).await.passed());

    let events = sink.events();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.total == Some(3)));
    let currents: Vec<usize> = events.iter().map(|e| e.current.unwrap()).collect();
    assert_eq!(currents, vec![1, 2, 3]);
}
