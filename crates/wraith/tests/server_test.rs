//! End-to-end tests driving a running server over the wire with reqwest.

use serde_json::{json, Value};
use wraith::{
    AppResponse, RequestPattern, ServerOptions, VerificationCriteria, Wraith,
};

async fn start() -> (Wraith, String) {
    let server = Wraith::start(ServerOptions::default())
        .await
        .expect("server starts on an ephemeral port");
    let base = format!("http://127.0.0.1:{}", server.http_port());
    (server, base)
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

async fn prime_over_wire(base: &str, priming: Value) -> reqwest::Response {
    client()
        .post(base)
        .header("zombie", "priming")
        .json(&priming)
        .send()
        .await
        .expect("priming request succeeds")
}

#[tokio::test]
async fn primed_response_is_delivered_once_then_misses() {
    let (_server, base) = start().await;

    let created = prime_over_wire(
        &base,
        json!({
            "request": {"method": "GET", "path": "/greet"},
            "response": {"statusCode": 200, "body": {"hello": "world"}}
        }),
    )
    .await;
    assert_eq!(created.status(), 201);

    let hit = client().get(format!("{base}/greet")).send().await.unwrap();
    assert_eq!(hit.status(), 200);
    assert_eq!(
        hit.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    assert_eq!(hit.json::<Value>().await.unwrap(), json!({"hello": "world"}));

    let miss = client().get(format!("{base}/greet")).send().await.unwrap();
    assert_eq!(miss.status(), 404);
}

#[tokio::test]
async fn default_priming_serves_indefinitely() {
    let (_server, base) = start().await;

    let created = client()
        .post(&base)
        .header("zombie", "priming-default")
        .json(&json!({
            "request": {"method": "GET", "path": "/always"},
            "response": {"statusCode": 418}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);

    for _ in 0..3 {
        let hit = client().get(format!("{base}/always")).send().await.unwrap();
        assert_eq!(hit.status(), 418);
    }
}

#[tokio::test]
async fn priming_inherits_method_and_path_from_upload() {
    let (_server, base) = start().await;

    prime_over_wire(&base, json!({"request": {}, "response": {"statusCode": 204}})).await;

    // The upload was a POST to /, so that is what got primed.
    let hit = client().post(&base).send().await.unwrap();
    assert_eq!(hit.status(), 204);
}

#[tokio::test]
async fn history_and_failed_requests_are_inspectable_over_wire() {
    let (_server, base) = start().await;

    prime_over_wire(
        &base,
        json!({
            "request": {"method": "GET", "path": "/known"},
            "response": {"statusCode": 200}
        }),
    )
    .await;

    client().get(format!("{base}/known")).send().await.unwrap();
    client().get(format!("{base}/unknown")).send().await.unwrap();

    let history: Value = client()
        .get(&base)
        .header("zombie", "history")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["request"]["path"], "/known");
    assert_eq!(history[0]["response"]["statusCode"], 200);

    let failed: Value = client()
        .get(&base)
        .header("zombie", "failed")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(failed.as_array().unwrap().len(), 1);
    assert_eq!(failed[0]["path"], "/unknown");
}

#[tokio::test]
async fn current_priming_lists_remaining_queues() {
    let (_server, base) = start().await;

    for _ in 0..2 {
        prime_over_wire(
            &base,
            json!({
                "request": {"method": "GET", "path": "/a"},
                "response": {"statusCode": 200}
            }),
        )
        .await;
    }

    let current: Value = client()
        .get(&base)
        .header("zombie", "current")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current.as_array().unwrap().len(), 1);
    assert_eq!(current[0]["responses"]["primed"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn count_reports_invocations_for_a_posted_pattern() {
    let (_server, base) = start().await;

    prime_over_wire(
        &base,
        json!({
            "request": {"method": "GET", "path": "/counted"},
            "response": {"statusCode": 200}
        }),
    )
    .await;
    client().get(format!("{base}/counted")).send().await.unwrap();

    let count: Value = client()
        .post(&base)
        .header("zombie", "count")
        .json(&json!({"method": "GET", "path": "/counted"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count, json!({"count": 1}));
}

#[tokio::test]
async fn reset_restores_a_pristine_server() {
    let (server, base) = start().await;

    prime_over_wire(
        &base,
        json!({
            "request": {"method": "GET", "path": "/a"},
            "response": {"statusCode": 200}
        }),
    )
    .await;
    client().get(format!("{base}/a")).send().await.unwrap();
    client().get(format!("{base}/gone")).send().await.unwrap();

    let reset = client()
        .delete(&base)
        .header("zombie", "reset")
        .send()
        .await
        .unwrap();
    assert_eq!(reset.status(), 200);

    assert!(server.current_priming().is_empty());
    assert!(server.history().is_empty());
    assert!(server.failed_requests().is_empty());

    // Idempotent on an already-pristine server.
    let again = client()
        .delete(&base)
        .header("zombie", "reset")
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 200);
}

#[tokio::test]
async fn unknown_zombie_operation_is_a_400_and_not_an_app_request() {
    let (server, base) = start().await;

    let response = client()
        .get(&base)
        .header("zombie", "explode")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("unknown zombie operation"));
    assert!(server.failed_requests().is_empty());
}

#[tokio::test]
async fn malformed_priming_is_rejected() {
    let (_server, base) = start().await;

    let response = client()
        .post(&base)
        .header("zombie", "priming")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn templated_body_renders_against_the_live_request() {
    let (_server, base) = start().await;

    prime_over_wire(
        &base,
        json!({
            "request": {"method": "GET", "path": "/echo"},
            "response": {
                "statusCode": 200,
                "body": {"you asked for": "${request.path}", "q": "${request.query.q}"},
                "templated": true
            }
        }),
    )
    .await;

    let hit: Value = client()
        .get(format!("{base}/echo?q=42"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(hit, json!({"you asked for": "/echo", "q": "42"}));
}

#[tokio::test]
async fn delayed_response_waits_before_delivering() {
    let (_server, base) = start().await;

    prime_over_wire(
        &base,
        json!({
            "request": {"method": "GET", "path": "/slow"},
            "response": {"statusCode": 200, "body": {"done": true}, "delay": 200}
        }),
    )
    .await;

    let started = std::time::Instant::now();
    let hit = client().get(format!("{base}/slow")).send().await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(hit.status(), 200);
    assert_eq!(hit.json::<Value>().await.unwrap(), json!({"done": true}));
    assert!(
        elapsed >= std::time::Duration::from_millis(200),
        "delivery took {elapsed:?}, expected at least the primed delay"
    );
}

#[tokio::test]
async fn up_answers_while_the_server_runs() {
    let (_server, base) = start().await;
    let response = client()
        .get(&base)
        .header("zombie", "up")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn in_process_priming_and_verification() {
    let (server, base) = start().await;

    server.prime(
        RequestPattern::get("/in-process"),
        AppResponse::ok().with_json_body(json!({"source": "embedded"})),
    );

    let hit = client()
        .get(format!("{base}/in-process"))
        .send()
        .await
        .unwrap();
    assert_eq!(hit.status(), 200);

    assert_eq!(server.count(&RequestPattern::get("/in-process")), 1);
    server
        .verify(&RequestPattern::get("/in-process"), &VerificationCriteria::equal_to(1))
        .expect("called exactly once");
    let err = server
        .verify(&RequestPattern::get("/in-process"), &VerificationCriteria::equal_to(2))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "expected call count to be equal to 2 but was 1"
    );
}

#[tokio::test]
async fn bulk_priming_upload_over_wire() {
    let (_server, base) = start().await;

    let response = client()
        .post(&base)
        .header("zombie", "priming-file")
        .json(&json!([
            {"request": {"method": "GET", "path": "/a"},
             "responses": {"primed": [{"statusCode": 200}], "default": {"statusCode": 503}}},
            {"request": {"method": "GET", "path": "/b"},
             "responses": {"primed": [{"statusCode": 201}]}}
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    assert_eq!(response.json::<Value>().await.unwrap(), json!({"primed": 2}));

    assert_eq!(client().get(format!("{base}/a")).send().await.unwrap().status(), 200);
    assert_eq!(client().get(format!("{base}/a")).send().await.unwrap().status(), 503);
    assert_eq!(client().get(format!("{base}/b")).send().await.unwrap().status(), 201);
}
