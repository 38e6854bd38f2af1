use joinboard::cascade::delete_task;
use joinboard::error::Error;
use joinboard::model::{Category, Contact, Task};
use joinboard::store::{fetch_all, fetch_one, DocumentStore, RestStore};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_flattens_object_tables() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contacts.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "c1": { "firstname": "Ada", "lastname": "Lovelace" },
            "c2": { "id": "c2", "firstname": "Grace" }
        })))
        .mount(&server)
        .await;

    let store = RestStore::new(server.uri()).expect("store");
    let mut contacts: Vec<Contact> = fetch_all(&store).await.expect("contacts");
    contacts.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts[0].id, "c1");
    assert_eq!(contacts[0].full_name(), "Ada Lovelace");

    let grace = fetch_one::<Contact>(&store, "c2").await.expect("lookup");
    assert_eq!(grace.map(|c| c.firstname), Some("Grace".to_string()));
}

#[tokio::test]
async fn empty_table_is_no_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
        .mount(&server)
        .await;

    let store = RestStore::new(server.uri()).expect("store");
    let tasks: Vec<Task> = fetch_all(&store).await.expect("tasks");
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn writes_use_row_paths_and_auth_token() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/tasks/t1.json"))
        .and(query_param("auth", "secret"))
        .and(body_json(json!({ "id": "t1", "title": "Ship" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "t1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/tasks/t1.json"))
        .and(query_param("auth", "secret"))
        .and(body_json(json!({ "stateCategory": "done" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/tasks/t1.json"))
        .and(query_param("auth", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
        .expect(1)
        .mount(&server)
        .await;

    let store = RestStore::new(server.uri())
        .expect("store")
        .with_auth_token("secret");
    store
        .put("tasks/t1", json!({ "id": "t1", "title": "Ship" }))
        .await
        .expect("put");
    store
        .update("tasks/t1", json!({ "stateCategory": "done" }))
        .await
        .expect("patch");
    store.delete("tasks/t1").await.expect("delete");
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contacts.json"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Permission denied" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks.json"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let store = RestStore::new(server.uri()).expect("store");
    let denied = store.get("contacts").await.expect_err("401");
    assert!(matches!(denied, Error::PermissionDenied(ref msg) if msg.contains("Permission denied")));
    assert_eq!(denied.exit_code(), 3);

    let down = store.get("tasks").await.expect_err("503");
    assert!(matches!(down, Error::StoreUnavailable(_)));
    assert_eq!(down.exit_code(), 4);
}

#[tokio::test]
async fn invalid_paths_never_reach_the_server() {
    let server = MockServer::start().await;
    let store = RestStore::new(server.uri()).expect("store");
    let err = store.put("tasks/a.b", json!({})).await.expect_err("bad key");
    assert!(matches!(err, Error::InvalidArgument(_)));
    let received = server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[tokio::test]
async fn array_tables_decode_rows_without_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/categories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            null,
            { "name": "Technical Task", "colorTag": "#1fd7c1" },
            { "name": "User Story", "colorTag": "#0038ff" }
        ])))
        .mount(&server)
        .await;

    let store = RestStore::new(server.uri()).expect("store");
    let categories: Vec<Category> = fetch_all(&store).await.expect("categories");
    let ids: Vec<&str> = categories.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn deleting_an_unknown_task_is_not_found() {
    let server = MockServer::start().await;
    for table in ["/taskContactAssigned.json", "/taskSubtask.json", "/tasks.json"] {
        Mock::given(method("GET"))
            .and(path(table))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
            .mount(&server)
            .await;
    }
    // the database acknowledges deletes of paths that never existed
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
        .expect(0)
        .mount(&server)
        .await;

    let store = RestStore::new(server.uri()).expect("store");
    let err = delete_task(&store, "ghost").await.expect_err("unknown task");
    assert!(matches!(err, Error::TaskNotFound(ref id) if id == "ghost"));
}
