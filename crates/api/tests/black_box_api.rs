use std::sync::Arc;

use async_trait::async_trait;
use registry_api::app::{self, AppServices};
use registry_core::FieldMap;
use registry_infra::store::{HashStore, InMemoryHashStore, StoreError, StoreResult};
use reqwest::StatusCode;
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(services: AppServices) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = app::build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    async fn in_memory() -> Self {
        Self::spawn(AppServices::in_memory()).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Every store call fails, as if the backing server went away.
struct UnreachableStore;

fn unreachable() -> StoreError {
    StoreError::Connection("ECONNREFUSED 127.0.0.1:6379".to_string())
}

#[async_trait]
impl HashStore for UnreachableStore {
    async fn set_fields(&self, _key: &str, _fields: &[(String, String)]) -> StoreResult<()> {
        Err(unreachable())
    }

    async fn get_all(&self, _key: &str) -> StoreResult<FieldMap> {
        Err(unreachable())
    }

    async fn delete(&self, _key: &str) -> StoreResult<()> {
        Err(unreachable())
    }

    async fn keys(&self, _pattern: &str) -> StoreResult<Vec<String>> {
        Err(unreachable())
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(unreachable())
    }
}

fn resident(id: &str) -> Value {
    json!({
        "id": id,
        "firstname": "Grace",
        "lastname": "Hopper",
        "dateofbirth": "1906-12-09",
        "sex": "F",
        "householdID": "HH-12",
        "employmentStatus": "Employed",
        "occupation": "Engineer",
        "income": "85000",
    })
}

async fn message_of(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["message"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn resident_lifecycle_create_update_delete() {
    let srv = TestServer::in_memory().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/residents"))
        .json(&resident("1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(message_of(res).await, "Saved successfully");

    let res = client.get(srv.url("/residents/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fields: Value = res.json().await.unwrap();
    let mut expected = resident("1");
    expected.as_object_mut().unwrap().remove("id");
    assert_eq!(fields, expected);

    let res = client
        .put(srv.url("/residents/1"))
        .json(&json!({ "occupation": "Teacher" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(message_of(res).await, "Resident updated successfully");

    let fields: Value = client
        .get(srv.url("/residents/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    expected["occupation"] = json!("Teacher");
    assert_eq!(fields, expected);

    let res = client.delete(srv.url("/residents/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(message_of(res).await, "Resident deleted successfully");

    let res = client.get(srv.url("/residents/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "Resident not found");
}

#[tokio::test]
async fn create_rejects_missing_or_falsy_fields() {
    let srv = TestServer::in_memory().await;
    let client = reqwest::Client::new();

    let mut missing = resident("2");
    missing.as_object_mut().unwrap().remove("sex");
    let res = client.post(srv.url("/residents")).json(&missing).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message_of(res).await, "All fields are required");

    let mut zero_income = resident("2");
    zero_income["income"] = json!(0);
    let res = client.post(srv.url("/residents")).json(&zero_income).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.post(srv.url("/residents")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(srv.url("/residents/2")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn second_create_with_same_id_overwrites_fields() {
    let store = Arc::new(InMemoryHashStore::new());
    let srv = TestServer::spawn(AppServices::new(store.clone())).await;
    let client = reqwest::Client::new();

    client.post(srv.url("/residents")).json(&resident("3")).send().await.unwrap();
    // A field outside the eight attributes, written behind the API's back.
    store
        .set_fields("resident:3", &[("notes".to_string(), "legacy".to_string())])
        .await
        .unwrap();

    let mut second = resident("3");
    second["firstname"] = json!("Ada");
    second["income"] = json!(120000);
    let res = client.post(srv.url("/residents")).json(&second).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let fields: Value = client
        .get(srv.url("/residents/3"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fields["firstname"], "Ada");
    assert_eq!(fields["income"], "120000");
    assert_eq!(fields["lastname"], "Hopper");
    // Fields are set, not replaced wholesale.
    assert_eq!(fields["notes"], "legacy");
}

#[tokio::test]
async fn delete_of_unknown_id_succeeds() {
    let srv = TestServer::in_memory().await;
    let res = reqwest::Client::new()
        .delete(srv.url("/residents/never-existed"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn update_requires_a_field_and_an_existing_resident() {
    let srv = TestServer::in_memory().await;
    let client = reqwest::Client::new();

    for body in [json!({}), json!({ "firstname": "", "income": 0 }), json!({ "id": "4" })] {
        let res = client.put(srv.url("/residents/4")).json(&body).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(message_of(res).await, "At least one field is required to update");
    }

    let res = client.put(srv.url("/residents/4")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .put(srv.url("/residents/4"))
        .json(&json!({ "occupation": "Pilot" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The failed update must not have created the record.
    let res = client.get(srv.url("/residents/4")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_skips_falsy_values() {
    let srv = TestServer::in_memory().await;
    let client = reqwest::Client::new();
    client.post(srv.url("/residents")).json(&resident("5")).send().await.unwrap();

    let res = client
        .put(srv.url("/residents/5"))
        .json(&json!({ "sex": "", "income": 0, "lastname": "Murray" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let fields: Value = client
        .get(srv.url("/residents/5"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fields["lastname"], "Murray");
    assert_eq!(fields["sex"], "F");
    assert_eq!(fields["income"], "85000");
}

#[tokio::test]
async fn bulk_rejects_empty_or_non_list_input() {
    let srv = TestServer::in_memory().await;
    let client = reqwest::Client::new();

    for body in [json!({ "residents": [] }), json!({ "residents": "x" }), json!({})] {
        let res = client.post(srv.url("/residents/bulk")).json(&body).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(message_of(res).await, "No residents provided");
    }
}

#[tokio::test]
async fn bulk_writes_every_record_including_malformed_ones() {
    let srv = TestServer::in_memory().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/residents/bulk"))
        .json(&json!({ "residents": [resident("10"), { "id": "11", "firstname": "Lin" }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(message_of(res).await, "Residents added successfully");

    let fields: Value = client
        .get(srv.url("/residents/11"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fields["firstname"], "Lin");
    assert_eq!(fields["occupation"], "");
}

#[tokio::test]
async fn bulk_keeps_zero_and_false_values() {
    let srv = TestServer::in_memory().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/residents/bulk"))
        .json(&json!({ "residents": [{ "id": 12, "income": 0, "employmentStatus": false }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let fields: Value = client
        .get(srv.url("/residents/12"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fields["income"], "0");
    assert_eq!(fields["employmentStatus"], "false");
    assert_eq!(fields["firstname"], "");
}

#[tokio::test]
async fn bulk_record_without_id_is_stored_under_undefined() {
    let srv = TestServer::in_memory().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/residents/bulk"))
        .json(&json!({ "residents": [{ "firstname": "Nameless" }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client.get(srv.url("/residents/undefined")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fields: Value = res.json().await.unwrap();
    assert_eq!(fields["firstname"], "Nameless");

    let res = client.delete(srv.url("/residents/undefined")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client.get(srv.url("/residents/undefined")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn resident_with_id_bulk_is_addressable() {
    let srv = TestServer::in_memory().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/residents/bulk")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(srv.url("/residents"))
        .json(&resident("bulk"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client.get(srv.url("/residents/bulk")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fields: Value = res.json().await.unwrap();
    assert_eq!(fields["lastname"], "Hopper");

    let res = client
        .put(srv.url("/residents/bulk"))
        .json(&json!({ "occupation": "Admiral" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(message_of(res).await, "Resident updated successfully");

    let fields: Value = client
        .get(srv.url("/residents/bulk"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fields["occupation"], "Admiral");

    let res = client.delete(srv.url("/residents/bulk")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(message_of(res).await, "Resident deleted successfully");

    let res = client.get(srv.url("/residents/bulk")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_returns_one_entry_per_resident_with_its_id() {
    let srv = TestServer::in_memory().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/residents")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!([]));

    for id in ["20", "21", "22"] {
        client.post(srv.url("/residents")).json(&resident(id)).send().await.unwrap();
    }
    client.delete(srv.url("/residents/21")).send().await.unwrap();

    let items: Vec<Value> = client
        .get(srv.url("/residents"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mut ids: Vec<&str> = items.iter().map(|r| r["id"].as_str().unwrap()).collect();
    ids.sort();
    assert_eq!(ids, vec!["20", "22"]);
    assert!(items.iter().all(|r| r["lastname"] == "Hopper"));
}

#[tokio::test]
async fn store_failures_become_generic_500s() {
    let srv = TestServer::spawn(AppServices::new(Arc::new(UnreachableStore))).await;
    let client = reqwest::Client::new();

    let cases = [
        (client.post(srv.url("/residents")).json(&resident("1")), "Failed to save resident"),
        (
            client
                .post(srv.url("/residents/bulk"))
                .json(&json!({ "residents": [resident("1")] })),
            "Failed to save bulk residents",
        ),
        (client.get(srv.url("/residents/1")), "Failed to fetch resident"),
        (client.get(srv.url("/residents")), "Failed to fetch residents"),
        (
            client.put(srv.url("/residents/1")).json(&json!({ "sex": "M" })),
            "Failed to update resident",
        ),
        (client.delete(srv.url("/residents/1")), "Failed to delete resident"),
    ];

    for (req, expected) in cases {
        let res = req.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "store_error");
        assert_eq!(body["message"], expected);
        assert!(!body.to_string().contains("ECONNREFUSED"));
    }
}

#[tokio::test]
async fn validation_still_wins_over_a_broken_store() {
    let srv = TestServer::spawn(AppServices::new(Arc::new(UnreachableStore))).await;
    let res = reqwest::Client::new()
        .put(srv.url("/residents/1"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_store_reachability() {
    let srv = TestServer::in_memory().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let broken = TestServer::spawn(AppServices::new(Arc::new(UnreachableStore))).await;
    let res = reqwest::get(broken.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn cross_origin_requests_are_allowed() {
    let srv = TestServer::in_memory().await;
    let res = reqwest::Client::new()
        .get(srv.url("/residents"))
        .header("Origin", "http://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
