use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{token, TestApp};

#[tokio::test]
async fn admin_routes_require_the_capability() {
    let app = TestApp::new().await;
    let root = token("root");

    let (_, body) = app.get("/api/me/capabilities", &root).await;
    assert_eq!(body["data"]["isAdmin"], false);
    let (status, body) = app.get("/api/admin/stats", &root).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");

    app.grant_admin("root").await;

    let (_, body) = app.get("/api/me", &root).await;
    assert_eq!(body["data"]["isAdmin"], true);
    assert_eq!(body["data"]["email"], "root@example.com");
    let (status, body) = app.get("/api/admin/stats", &root).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalUsers"], 1);
}

#[tokio::test]
async fn user_listing_counts_content() {
    let app = TestApp::new().await;
    let root = token("root");
    app.grant_admin("root").await;

    let alice = token("alice");
    app.post("/api/words", &alice, json!({ "english": "cat", "armenian": "կատու" }))
        .await;
    app.post("/api/texts", &alice, json!({ "title": "t", "content": "c" }))
        .await;

    let (status, body) = app.get("/api/admin/users", &root).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    let alice_row = users.iter().find(|user| user["id"] == "alice").unwrap();
    assert_eq!(alice_row["wordCount"], 1);
    assert_eq!(alice_row["textCount"], 1);
    assert_eq!(alice_row["isAdmin"], false);
    let root_row = users.iter().find(|user| user["id"] == "root").unwrap();
    assert_eq!(root_row["isAdmin"], true);
}

#[tokio::test]
async fn group_texts_are_only_visible_to_members() {
    let app = TestApp::new().await;
    let root = token("root");
    app.grant_admin("root").await;
    let alice = token("alice");
    let bob = token("bob");
    // Profiles exist once each user has signed in.
    app.get("/api/me", &alice).await;
    app.get("/api/me", &bob).await;

    let (status, body) = app
        .post("/api/admin/groups", &root, json!({ "name": " Class A ", "description": "" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "Class A");
    let group_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = app
        .get(&format!("/api/admin/groups/{group_id}/available-users"), &root)
        .await;
    assert!(body["data"].as_array().unwrap().iter().any(|user| user["id"] == "alice"));

    let (_, body) = app
        .post(
            &format!("/api/admin/groups/{group_id}/members"),
            &root,
            json!({ "userId": "alice" }),
        )
        .await;
    assert_eq!(body["data"]["changed"], true);

    let (status, _) = app
        .post(
            "/api/admin/public-texts",
            &root,
            json!({ "title": "Secret", "body": "for the class", "visibility": "groups" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            "/api/admin/public-texts",
            &root,
            json!({
                "title": "Secret",
                "body": "for the class",
                "visibility": "groups",
                "groupIds": [group_id]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["groups"], json!(["Class A"]));
    let secret_id = body["data"]["id"].as_str().unwrap().to_string();

    app.post(
        "/api/admin/public-texts",
        &root,
        json!({ "title": "Open", "body": "for everyone" }),
    )
    .await;

    let (_, body) = app.get("/api/public-texts", &alice).await;
    let visible = body["data"].as_array().unwrap();
    assert_eq!(visible.len(), 2);
    for text in visible {
        assert_eq!(text["groups"], json!([]));
        assert_eq!(text["groupIds"], json!([]));
    }
    let (_, body) = app.get("/api/public-texts", &bob).await;
    let titles: Vec<_> = body["data"].as_array().unwrap().iter().map(|t| t["title"].clone()).collect();
    assert_eq!(titles, vec![json!("Open")]);

    let (status, _) = app
        .post(&format!("/api/public-texts/{secret_id}/save"), &bob, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app
        .post(&format!("/api/public-texts/{secret_id}/save"), &alice, json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["text"]["content"], "for the class");

    let (status, body) = app
        .put(
            &format!("/api/admin/public-texts/{secret_id}"),
            &root,
            json!({ "title": "Secret", "body": "now open", "visibility": "public", "groupIds": [group_id] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["groupIds"], json!([]));
    let (_, body) = app.get("/api/public-texts", &bob).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = app
        .delete(&format!("/api/admin/groups/{group_id}/members/alice"), &root)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/admin/groups", &root).await;
    assert_eq!(body["data"][0]["memberCount"], 0);

    let (status, _) = app.delete(&format!("/api/admin/groups/{group_id}"), &root).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.delete(&format!("/api/admin/groups/{group_id}"), &root).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
