//! `HttpBoardApi` against a mock board server.

use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Duration;
use taskboard::api::{BoardApi, HttpBoardApi, NewTask, TaskUpdate};
use taskboard::error::ApiError;
use taskboard::model::Column;

const HTTP_OK: usize = 200;
const HTTP_CREATED: usize = 201;
const HTTP_NOT_FOUND: usize = 404;
const HTTP_INTERNAL_SERVER_ERROR: usize = 500;

fn client(server: &Server) -> HttpBoardApi {
    HttpBoardApi::new(&server.url(), Duration::from_secs(2)).unwrap()
}

fn board_body() -> String {
    json!({
        "project": {"id": 1, "code": "FAB-01", "name": "Mi Primer Proyecto Kanban"},
        "tasks": [
            {"id": 1, "title": "Configurar el entorno", "description": "Instalar Python",
             "column": "Por Hacer", "position": 0,
             "assigned_user": {"id": 1, "username": "fabricio"}, "tags": []},
            {"id": 2, "title": "Diseñar el esquema", "description": null,
             "column": "En Progreso", "position": 0, "assigned_user": null,
             "tags": [
                {"id": 2, "name": "feature", "color": "#0366d6"},
                {"id": 2, "name": "feature", "color": "#0366d6"}
             ]}
        ]
    })
    .to_string()
}

#[tokio::test]
async fn fetch_board_decodes_snapshot() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/projects/FAB-01")
        .with_status(HTTP_OK)
        .with_header("content-type", "application/json")
        .with_body(board_body())
        .create_async()
        .await;

    let snapshot = client(&server).fetch_board("FAB-01").await.unwrap();

    mock.assert_async().await;
    assert_eq!(snapshot.project.id, 1);
    assert_eq!(snapshot.tasks.len(), 2);
    assert_eq!(snapshot.tasks[0].column, Column::ToDo);
    assert_eq!(snapshot.tasks[1].tags.len(), 1, "duplicate tag ids are dropped");
}

#[tokio::test]
async fn fetch_board_maps_not_found() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/projects/NOPE")
        .with_status(HTTP_NOT_FOUND)
        .expect(1)
        .create_async()
        .await;

    let err = client(&server).fetch_board("NOPE").await.unwrap_err();

    mock.assert_async().await;
    match err {
        ApiError::Status { status, method, .. } => {
            assert_eq!(status, 404);
            assert_eq!(method, "GET");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_board_rejects_unknown_column() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/projects/FAB-01")
        .with_status(HTTP_OK)
        .with_body(
            json!({
                "project": {"id": 1, "code": "FAB-01"},
                "tasks": [{"id": 1, "title": "x", "column": "Backlog", "tags": []}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = client(&server).fetch_board("FAB-01").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }), "got {err:?}");
}

#[tokio::test]
async fn update_task_puts_partial_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/api/tasks/3")
        .match_body(Matcher::Json(json!({"column": "Hecho", "position": 1})))
        .with_status(HTTP_OK)
        .create_async()
        .await;

    client(&server)
        .update_task(3, &TaskUpdate::moved(Column::Done, 1))
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn clearing_assignment_sends_null() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/api/tasks/3")
        .match_body(Matcher::Json(json!({"assigned_user_id": null})))
        .with_status(HTTP_OK)
        .create_async()
        .await;

    client(&server)
        .update_task(3, &TaskUpdate::assign(None))
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn create_task_accepts_created() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/tasks")
        .match_body(Matcher::Json(
            json!({"title": "Buy milk", "project_id": 1, "column": "Por Hacer"}),
        ))
        .with_status(HTTP_CREATED)
        .create_async()
        .await;

    let task = NewTask {
        title: "Buy milk".into(),
        project_id: 1,
        column: Column::ToDo,
    };
    client(&server).create_task(&task).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn delete_task_reports_server_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/api/tasks/9")
        .with_status(HTTP_INTERNAL_SERVER_ERROR)
        .create_async()
        .await;

    let err = client(&server).delete_task(9).await.unwrap_err();
    mock.assert_async().await;
    assert!(matches!(err, ApiError::Status { status: 500, .. }));
}

#[tokio::test]
async fn tag_endpoints() {
    let mut server = Server::new_async().await;
    let add = server
        .mock("POST", "/api/tasks/4/tags")
        .match_body(Matcher::Json(json!({"tag_id": 2})))
        .with_status(HTTP_OK)
        .create_async()
        .await;
    let remove = server
        .mock("DELETE", "/api/tasks/4/tags/2")
        .with_status(HTTP_OK)
        .create_async()
        .await;

    let api = client(&server);
    api.add_tag(4, 2).await.unwrap();
    api.remove_tag(4, 2).await.unwrap();
    add.assert_async().await;
    remove.assert_async().await;
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let api = HttpBoardApi::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
    let err = api.fetch_board("FAB-01").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport { .. }), "got {err:?}");
}
