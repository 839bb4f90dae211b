mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    let app = common::setup().await?;
    let (status, body) = app.send(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn sign_up_login_and_me() -> Result<()> {
    let app = common::setup().await?;

    let (status, body) = app
        .send(Method::POST, "/api/v1/members", None, Some(json!({"nickname": "author", "password": "pw1234"})))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = app
        .send(Method::POST, "/api/v1/members", None, Some(json!({"nickname": "author", "password": "pw1234"})))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "M002");

    let (status, body) = app
        .send(Method::POST, "/api/v1/members/login", None, Some(json!({"nickname": "author", "password": "bad"})))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, body) = app
        .send(Method::POST, "/api/v1/members/login", None, Some(json!({"nickname": "author", "password": "pw1234"})))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["access_token"].as_str().unwrap_or_default().to_string();

    let (status, body) = app.send(Method::GET, "/api/v1/members/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nickname"], "author");
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() -> Result<()> {
    let app = common::setup().await?;
    let body = json!({"title": "t", "content": "c", "tagIds": [1]});

    let (status, _) = app.send(Method::POST, "/api/v1/posts", None, Some(body.clone())).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::POST, "/api/v1/posts", Some("garbage"), Some(body)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::GET, "/api/v1/members/me", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn post_lifecycle_over_http() -> Result<()> {
    let app = common::setup().await?;
    let author = app.member("author").await?;
    let other = app.member("other").await?;
    let author_token = app.token(&author)?;
    let other_token = app.token(&other)?;
    let java = app.tag("Java").await?;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/posts",
            Some(&author_token),
            Some(json!({"title": "Review request", "content": "body", "tagIds": [java]})),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "UNSOLVED");
    assert_eq!(body["data"]["tags"][0]["name"], "Java");
    let post_id = body["data"]["id"].as_i64().unwrap_or_default();
    let status_uri = format!("/api/v1/posts/{}/status", post_id);

    let (status, body) = app
        .send(Method::PATCH, &status_uri, Some(&other_token), Some(json!({"status": "SOLVED"})))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "P002");

    let (status, body) = app
        .send(Method::PATCH, &status_uri, Some(&author_token), Some(json!({"status": "SOLVED"})))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "SOLVED");

    let (status, body) = app
        .send(Method::GET, "/api/v1/posts?status=SOLVED&keyword=Review", None, None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_elements"], 1);
    assert_eq!(body["data"]["content"][0]["member"]["nickname"], "author");

    let post_uri = format!("/api/v1/posts/{}", post_id);
    let (status, _) = app.send(Method::DELETE, &post_uri, Some(&author_token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.send(Method::GET, &post_uri, None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "P001");
    Ok(())
}

#[tokio::test]
async fn comments_over_http() -> Result<()> {
    let app = common::setup().await?;
    let author = app.member("author").await?;
    let reviewer = app.member("reviewer").await?;
    let post = app.post(&author, "Review request", "body", &["Rust"]).await?;
    let reviewer_token = app.token(&reviewer)?;
    let author_token = app.token(&author)?;

    let comments_uri = format!("/api/v1/posts/{}/comments", post.id);
    let (status, body) = app
        .send(Method::POST, &comments_uri, Some(&reviewer_token), Some(json!({"content": "Nice"})))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["modified"], false);
    let comment_uri = format!("/api/v1/comments/{}", body["data"]["id"]);

    let (status, body) = app
        .send(Method::PUT, &comment_uri, Some(&author_token), Some(json!({"content": "Mine now"})))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "C002");

    let (status, body) = app
        .send(Method::PUT, &comment_uri, Some(&reviewer_token), Some(json!({"content": "Nice work"})))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["modified"], true);

    let (status, body) = app.send(Method::GET, &comments_uri, None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, _) = app.send(Method::DELETE, &comment_uri, Some(&reviewer_token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = app.send(Method::DELETE, &comment_uri, Some(&reviewer_token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "C001");
    Ok(())
}

#[tokio::test]
async fn validation_and_tag_errors_map_to_client_errors() -> Result<()> {
    let app = common::setup().await?;
    let author = app.member("author").await?;
    let token = app.token(&author)?;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/posts",
            Some(&token),
            Some(json!({"title": " ", "content": "body", "tagIds": [1]})),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"].get("title").is_some());

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/posts",
            Some(&token),
            Some(json!({"title": "t", "content": "body", "tagIds": [424242]})),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "T001");
    Ok(())
}

#[tokio::test]
async fn tags_filter_by_category() -> Result<()> {
    let app = common::setup().await?;

    let (status, body) = app.send(Method::GET, "/api/v1/tags", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(22));

    let (status, body) = app.send(Method::GET, "/api/v1/tags?category=FRAMEWORK", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    let tags = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(tags.len(), 9);
    assert!(tags.iter().all(|t| t["category"] == "FRAMEWORK"));
    Ok(())
}

#[tokio::test]
async fn account_deletion_over_http() -> Result<()> {
    let app = common::setup().await?;
    let author = app.member("author").await?;
    let token = app.token(&author)?;

    let (status, body) = app
        .send(Method::PATCH, "/api/v1/members/me", Some(&token), Some(json!({"nickname": "renamed"})))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nickname"], "renamed");

    let (status, _) = app.send(Method::DELETE, "/api/v1/members/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The token still verifies but the member is gone
    let (status, body) = app.send(Method::GET, "/api/v1/members/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "M001");
    Ok(())
}

#[tokio::test]
async fn malformed_requests_get_the_validation_envelope() -> Result<()> {
    let app = common::setup().await?;
    let author = app.member("author").await?;
    let token = app.token(&author)?;
    let post = app.post(&author, "Review request", "body", &["Java"]).await?;

    let status_uri = format!("/api/v1/posts/{}/status", post.id);
    let (status, body) = app
        .send(Method::PATCH, &status_uri, Some(&token), Some(json!({"status": "DONE"})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app.send(Method::GET, "/api/v1/posts?status=DONE", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .send(Method::POST, "/api/v1/posts", Some(&token), Some(json!({"title": "t"})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap_or_default().contains("content"));

    let comments_uri = format!("/api/v1/posts/{}/comments", post.id);
    let (status, body) = app.send(Method::POST, &comments_uri, Some(&token), Some(json!({}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app.send(Method::GET, "/api/v1/posts/abc", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // Nothing was written by the rejected requests
    let stored = app.services.posts.get_post(post.id).await?;
    assert_eq!(stored.status.as_str(), "UNSOLVED");
    assert!(app.services.comments.list_comments(post.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn public_profile_lookup() -> Result<()> {
    let app = common::setup().await?;
    let author = app.member("author").await?;
    let uri = format!("/api/v1/members/{}", author.id);

    let (status, body) = app.send(Method::GET, &uri, None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nickname"], "author");
    assert!(body["data"].get("password_hash").is_none());

    app.services.members.delete_member(author.id).await?;
    let (status, body) = app.send(Method::GET, &uri, None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "M001");

    let (status, body) = app.send(Method::GET, "/api/v1/members/999", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "M001");
    Ok(())
}
