//! Store scenarios against a live Postgres. Every test returns early when
//! `DATABASE_URL` is unset.

mod common;

use anyhow::Result;
use common::PgApp;
use review_board::database::models::{PostStatus, DEFAULT_TAGS};
use review_board::database::EntityStore;
use review_board::error::CoreError;
use review_board::filter::PageRequest;
use review_board::types::EntityKind;

fn first_page() -> PageRequest {
    PageRequest { page: 0, size: 10 }
}

fn tag_names(tags: &[review_board::database::models::Tag]) -> Vec<&str> {
    tags.iter().map(|t| t.name.as_str()).collect()
}

#[tokio::test]
async fn update_replaces_the_tag_set() -> Result<()> {
    let Some(app) = PgApp::seeded().await? else { return Ok(()) };
    let author = app.member("author").await?;
    let post = app.post(&author, "Review request", "body", &["Java", "Spring"]).await?;
    assert_eq!(tag_names(&post.tags), vec!["Java", "Spring"]);

    let go = app.tag("Go").await?;
    let updated = app
        .services
        .posts
        .update_post(author.id, post.id, "Review request", "body", &[go, go])
        .await?;
    assert_eq!(tag_names(&updated.tags), vec!["Go"]);

    let reread = app.services.posts.get_post(post.id).await?;
    assert_eq!(tag_names(&reread.tags), vec!["Go"]);
    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM post_tags WHERE post_id = $1")
        .bind(post.id)
        .fetch_one(&app.pool)
        .await?;
    assert_eq!(rows, 1);

    app.teardown().await
}

#[tokio::test]
async fn unknown_tag_rolls_back_the_whole_update() -> Result<()> {
    let Some(app) = PgApp::seeded().await? else { return Ok(()) };
    let author = app.member("author").await?;
    let post = app.post(&author, "Review request", "body", &["Java"]).await?;
    let go = app.tag("Go").await?;

    let err = app
        .services
        .posts
        .update_post(author.id, post.id, "New title", "new body", &[go, 9999])
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(EntityKind::Tag)));

    let reread = app.services.posts.get_post(post.id).await?;
    assert_eq!(reread.title, "Review request");
    assert_eq!(tag_names(&reread.tags), vec!["Java"]);
    assert_eq!(reread.updated_at, post.updated_at);

    let err = app
        .services
        .posts
        .create_post(author.id, "Another", "body", &[9999])
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(EntityKind::Tag)));
    let (posts,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts").fetch_one(&app.pool).await?;
    assert_eq!(posts, 1);

    app.teardown().await
}

#[tokio::test]
async fn non_owner_is_denied_and_the_row_is_unchanged() -> Result<()> {
    let Some(app) = PgApp::seeded().await? else { return Ok(()) };
    let author = app.member("author").await?;
    let other = app.member("other").await?;
    let post = app.post(&author, "Review request", "body", &["Java"]).await?;
    let rust = app.tag("Rust").await?;

    let posts = &app.services.posts;
    let attempts = [
        posts.update_post(other.id, post.id, "Hijacked", "x", &[rust]).await.map(|_| ()),
        posts.update_status(other.id, post.id, PostStatus::Solved).await.map(|_| ()),
        posts.delete_post(other.id, post.id).await,
    ];
    for attempt in attempts {
        assert!(matches!(attempt, Err(CoreError::AccessDenied(EntityKind::Post))));
    }

    let reread = posts.get_post(post.id).await?;
    assert_eq!(reread.title, "Review request");
    assert_eq!(reread.status, PostStatus::Unsolved);
    assert_eq!(tag_names(&reread.tags), vec!["Java"]);
    assert_eq!(reread.updated_at, post.updated_at);

    let comment = app.services.comments.create_comment(author.id, post.id, "note").await?;
    let err = app
        .services
        .comments
        .update_comment(other.id, comment.id, "edited")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::AccessDenied(EntityKind::Comment)));

    // Owner can flip the status both ways
    let solved = posts.update_status(author.id, post.id, PostStatus::Solved).await?;
    assert_eq!(solved.status, PostStatus::Solved);
    let reopened = posts.update_status(author.id, post.id, PostStatus::Unsolved).await?;
    assert_eq!(reopened.status, PostStatus::Unsolved);
    assert!(reopened.updated_at > solved.updated_at);

    app.teardown().await
}

#[tokio::test]
async fn nickname_is_unique_among_live_members_only() -> Result<()> {
    let Some(app) = PgApp::seeded().await? else { return Ok(()) };
    let members = &app.services.members;
    let author = app.member("author").await?;
    let other = app.member("other").await?;

    let err = members.sign_up("author", "pw1234").await.unwrap_err();
    assert!(matches!(err, CoreError::DuplicateNickname(_)));
    let err = members.update_nickname(other.id, "author").await.unwrap_err();
    assert!(matches!(err, CoreError::DuplicateNickname(_)));
    // Re-submitting one's own nickname is accepted
    assert_eq!(members.update_nickname(author.id, "author").await?.nickname, "author");

    members.delete_member(author.id).await?;
    assert!(matches!(
        members.get_member(author.id).await,
        Err(CoreError::NotFound(EntityKind::Member))
    ));
    assert!(app.store.find_member_by_nickname("author").await?.is_none());

    let reborn = app.member("author").await?;
    assert_ne!(reborn.id, author.id);
    assert!(members.login("author", "pw1234").await.is_ok());

    app.teardown().await
}

#[tokio::test]
async fn comments_of_a_deleted_post_are_hidden() -> Result<()> {
    let Some(app) = PgApp::seeded().await? else { return Ok(()) };
    let author = app.member("author").await?;
    let reviewer = app.member("reviewer").await?;
    let post = app.post(&author, "Review request", "body", &["Rust"]).await?;
    let comment = app.services.comments.create_comment(reviewer.id, post.id, "nit").await?;

    app.services.posts.delete_post(author.id, post.id).await?;

    let comments = &app.services.comments;
    assert!(matches!(comments.list_comments(post.id).await, Err(CoreError::NotFound(EntityKind::Post))));
    assert!(matches!(
        app.store.find_comment(comment.id).await,
        Err(CoreError::NotFound(EntityKind::Comment))
    ));
    assert!(matches!(
        comments.update_comment(reviewer.id, comment.id, "edit").await,
        Err(CoreError::NotFound(EntityKind::Comment))
    ));
    assert!(matches!(
        comments.delete_comment(reviewer.id, comment.id).await,
        Err(CoreError::NotFound(EntityKind::Comment))
    ));

    // The comment's own flag is untouched
    let (deleted,): (bool,) = sqlx::query_as("SELECT deleted FROM comments WHERE id = $1")
        .bind(comment.id)
        .fetch_one(&app.pool)
        .await?;
    assert!(!deleted);

    app.teardown().await
}

#[tokio::test]
async fn listing_filters_and_counts_visible_comments() -> Result<()> {
    let Some(app) = PgApp::seeded().await? else { return Ok(()) };
    let author = app.member("author").await?;
    let reviewer = app.member("reviewer").await?;
    let leaver = app.member("leaver").await?;

    let target = app.post(&author, "Java streams", "body", &["Java"]).await?;
    let unsolved = app.post(&author, "Java generics", "body", &["Java"]).await?;
    let other = app.post(&author, "Kotlin", "100% idiomatic?", &["Kotlin"]).await?;
    let posts = &app.services.posts;
    posts.update_status(author.id, target.id, PostStatus::Solved).await?;
    posts.update_status(author.id, other.id, PostStatus::Solved).await?;

    let comments = &app.services.comments;
    comments.create_comment(reviewer.id, target.id, "kept").await?;
    let removed = comments.create_comment(reviewer.id, target.id, "removed").await?;
    comments.delete_comment(reviewer.id, removed.id).await?;
    comments.create_comment(leaver.id, target.id, "author leaves").await?;
    app.services.members.delete_member(leaver.id).await?;

    let page = posts.list_posts(Some(PostStatus::Solved), Some("Java"), first_page()).await?;
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].id, target.id);
    assert_eq!(page.content[0].comment_count, 1);
    assert_eq!(page.content[0].member.nickname, "author");

    // LIKE metacharacters are literal
    let page = posts.list_posts(None, Some("100%"), first_page()).await?;
    assert_eq!(page.content.iter().map(|p| p.id).collect::<Vec<_>>(), vec![other.id]);
    let page = posts.list_posts(None, Some("Java_"), first_page()).await?;
    assert_eq!(page.total_elements, 0);

    // Newest update first
    let page = posts.list_posts(None, None, first_page()).await?;
    assert_eq!(
        page.content.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![other.id, target.id, unsolved.id]
    );

    let page = posts.list_my_posts(reviewer.id, first_page()).await?;
    assert_eq!(page.total_elements, 0);

    app.services.members.delete_member(author.id).await?;
    let page = posts.list_posts(None, None, first_page()).await?;
    assert_eq!(page.total_elements, 0);

    app.teardown().await
}

#[tokio::test]
async fn concurrent_seeding_inserts_the_catalog_once() -> Result<()> {
    let Some(app) = PgApp::connect().await? else { return Ok(()) };

    let (first, second) = tokio::join!(app.store.seed_tags(DEFAULT_TAGS), app.store.seed_tags(DEFAULT_TAGS));
    assert_eq!(first? + second?, DEFAULT_TAGS.len());
    assert_eq!(app.store.seed_tags(DEFAULT_TAGS).await?, 0);
    assert_eq!(app.services.tags.list_tags(None).await?.len(), DEFAULT_TAGS.len());

    app.teardown().await
}
