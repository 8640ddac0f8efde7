use anyhow::Result;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use room_relay::{api, message::Message, relay::Relay};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn get(app: Router, uri: &str) -> Result<(StatusCode, Value)> {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&body)?))
}

#[tokio::test]
async fn empty_relay_reports_no_rooms() -> Result<()> {
    let relay = Relay::default();

    let (status, body) = get(api::router(relay), "/rooms").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "No rooms exist" }));
    Ok(())
}

#[tokio::test]
async fn rooms_lists_every_room_with_history() -> Result<()> {
    let relay = Relay::default();
    let (alice, _alice_inbox) = relay.connect().await;
    relay.create_room(alice, Some("abc")).await;
    relay.join_room(alice, "def").await;
    relay.send_message("abc", Message::new("a", "hi")).await;

    let (status, body) = get(api::router(relay), "/rooms").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "id": "abc", "messages": [{ "user": "a", "content": "hi" }] },
            { "id": "def", "messages": [] },
        ])
    );
    Ok(())
}

#[tokio::test]
async fn messages_returns_room_history() -> Result<()> {
    let relay = Relay::default();
    let (alice, _alice_inbox) = relay.connect().await;
    relay.join_room(alice, "abc").await;
    relay.send_message("abc", Message::new("a", "one")).await;
    relay.send_message("abc", Message::new("b", "two")).await;

    let (status, body) = get(api::router(relay), "/messages/abc").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "user": "a", "content": "one" },
            { "user": "b", "content": "two" },
        ])
    );
    Ok(())
}

#[tokio::test]
async fn messages_for_missing_room_is_not_found() -> Result<()> {
    let relay = Relay::default();

    let (status, body) = get(api::router(relay), "/messages/ghost").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "This room does not exist" }));
    Ok(())
}

#[tokio::test]
async fn evicted_room_disappears_from_listing() -> Result<()> {
    let relay = Relay::default();
    let (alice, _alice_inbox) = relay.connect().await;
    relay.join_room(alice, "abc").await;
    relay.leave_room(alice, "abc").await;

    let (status, _) = get(api::router(relay.clone()), "/messages/abc").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(api::router(relay), "/rooms").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_not_found() -> Result<()> {
    let (status, body) = get(api::router(Relay::default()), "/nope").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Route does not exist" }));
    Ok(())
}
