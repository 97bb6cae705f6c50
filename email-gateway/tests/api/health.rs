use crate::helpers::spawn_app;

#[tokio::test]
async fn health_returns_ok_without_touching_collaborators() {
    let app = spawn_app().await;

    let response = app.get_health().await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(app.secret_store.calls(), 0);
    assert_eq!(app.queue.calls(), 0);
}
