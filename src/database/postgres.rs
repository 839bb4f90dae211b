use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use tracing::debug;

use super::manager::{DatabaseError, DatabaseManager, NICKNAME_UNIQUE_INDEX};
use super::models::{
    Comment, CommentDetail, CommentMutation, Member, MemberSummary, Post, PostDetail, PostDraft,
    PostMutation, PostRow, PostStatus, PostSummary, Tag, TagCategory, TagRow,
};
use super::query_builder;
use super::store::EntityStore;
use crate::error::CoreError;
use crate::filter::{Page, PageRequest, PostFilter};
use crate::ownership;
use crate::tagging;
use crate::types::{next_timestamp, CommentId, EntityKind, MemberId, PostId, TagId};

// Visibility predicates. Every statement below composes one of these
// explicitly; nothing relies on an implicit row filter.
const VISIBLE_MEMBER: &str = "deleted = FALSE";
const VISIBLE_POST: &str =
    "p.deleted = FALSE AND p.member_id IN (SELECT id FROM members WHERE deleted = FALSE)";
const VISIBLE_COMMENT: &str = "c.deleted = FALSE \
     AND c.member_id IN (SELECT id FROM members WHERE deleted = FALSE) \
     AND c.post_id IN (SELECT p.id FROM posts p WHERE p.deleted = FALSE \
         AND p.member_id IN (SELECT id FROM members WHERE deleted = FALSE))";

/// Postgres-backed store. Guarded mutations lock the target row with
/// `SELECT ... FOR UPDATE`, check ownership, then write, all inside one
/// transaction; returning early drops the transaction and rolls it back.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode_post(row: PostRow) -> Result<Post, CoreError> {
    Post::try_from(row).map_err(|e| CoreError::from(DatabaseError::QueryError(e)))
}

fn decode_tags(rows: Vec<TagRow>) -> Result<Vec<Tag>, CoreError> {
    rows.into_iter()
        .map(|row| Tag::try_from(row).map_err(|e| CoreError::from(DatabaseError::QueryError(e))))
        .collect()
}

fn nickname_conflict(err: sqlx::Error, nickname: &str) -> CoreError {
    if DatabaseManager::is_unique_violation(&err, NICKNAME_UNIQUE_INDEX) {
        CoreError::DuplicateNickname(nickname.to_string())
    } else {
        CoreError::from(err)
    }
}

async fn visible_member(conn: &mut PgConnection, id: MemberId) -> Result<Member, CoreError> {
    let sql = format!("SELECT * FROM members WHERE id = $1 AND {}", VISIBLE_MEMBER);
    sqlx::query_as::<_, Member>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(CoreError::NotFound(EntityKind::Member))
}

async fn member_summaries(
    conn: &mut PgConnection,
    ids: &[MemberId],
) -> Result<HashMap<MemberId, MemberSummary>, CoreError> {
    let sql = format!("SELECT * FROM members WHERE id = ANY($1) AND {}", VISIBLE_MEMBER);
    let members = sqlx::query_as::<_, Member>(&sql)
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;
    Ok(members.iter().map(|m| (m.id, m.summary())).collect())
}

async fn visible_post(conn: &mut PgConnection, id: PostId, lock: bool) -> Result<Post, CoreError> {
    let sql = format!(
        "SELECT p.* FROM posts p WHERE p.id = $1 AND {}{}",
        VISIBLE_POST,
        if lock { " FOR UPDATE" } else { "" }
    );
    let row = sqlx::query_as::<_, PostRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(CoreError::NotFound(EntityKind::Post))?;
    decode_post(row)
}

async fn visible_comment(conn: &mut PgConnection, id: CommentId, lock: bool) -> Result<Comment, CoreError> {
    let sql = format!(
        "SELECT c.* FROM comments c WHERE c.id = $1 AND {}{}",
        VISIBLE_COMMENT,
        if lock { " FOR UPDATE" } else { "" }
    );
    sqlx::query_as::<_, Comment>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(CoreError::NotFound(EntityKind::Comment))
}

async fn resolve_tags(conn: &mut PgConnection, tag_ids: &[TagId]) -> Result<Vec<Tag>, CoreError> {
    let rows = sqlx::query_as::<_, TagRow>("SELECT id, name, category FROM tags WHERE id = ANY($1)")
        .bind(tag_ids)
        .fetch_all(&mut *conn)
        .await?;
    tagging::resolve(tag_ids, decode_tags(rows)?)
}

async fn post_tags(conn: &mut PgConnection, post_id: PostId) -> Result<Vec<Tag>, CoreError> {
    let rows = sqlx::query_as::<_, TagRow>(
        "SELECT t.id, t.name, t.category FROM post_tags pt \
         JOIN tags t ON t.id = pt.tag_id WHERE pt.post_id = $1 ORDER BY pt.id",
    )
    .bind(post_id)
    .fetch_all(&mut *conn)
    .await?;
    decode_tags(rows)
}

/// Clears the post's associations and writes `tags` in order
async fn replace_post_tags(conn: &mut PgConnection, post_id: PostId, tags: &[Tag]) -> Result<(), CoreError> {
    sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;
    for tag in tags {
        sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2)")
            .bind(post_id)
            .bind(tag.id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn post_detail(conn: &mut PgConnection, post: Post) -> Result<PostDetail, CoreError> {
    let member = visible_member(conn, post.member_id).await?.summary();
    let tags = post_tags(conn, post.id).await?;
    Ok(PostDetail::new(post, member, tags))
}

#[async_trait]
impl EntityStore for PgStore {
    async fn health_check(&self) -> Result<(), CoreError> {
        Ok(DatabaseManager::health_check(&self.pool).await?)
    }

    async fn insert_member(&self, nickname: &str, password_hash: &str) -> Result<Member, CoreError> {
        let now = Utc::now();
        sqlx::query_as::<_, Member>(
            "INSERT INTO members (nickname, password_hash, deleted, created_at, updated_at) \
             VALUES ($1, $2, FALSE, $3, $3) RETURNING *",
        )
        .bind(nickname)
        .bind(password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| nickname_conflict(e, nickname))
    }

    async fn find_member(&self, id: MemberId) -> Result<Member, CoreError> {
        let mut conn = self.pool.acquire().await?;
        visible_member(&mut conn, id).await
    }

    async fn find_member_by_nickname(&self, nickname: &str) -> Result<Option<Member>, CoreError> {
        let sql = format!("SELECT * FROM members WHERE nickname = $1 AND {}", VISIBLE_MEMBER);
        Ok(sqlx::query_as::<_, Member>(&sql)
            .bind(nickname)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn rename_member(&self, id: MemberId, nickname: &str) -> Result<Member, CoreError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!("SELECT * FROM members WHERE id = $1 AND {} FOR UPDATE", VISIBLE_MEMBER);
        let member = sqlx::query_as::<_, Member>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound(EntityKind::Member))?;
        if member.nickname == nickname {
            return Ok(member);
        }

        let updated = sqlx::query_as::<_, Member>(
            "UPDATE members SET nickname = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(nickname)
        .bind(next_timestamp(member.updated_at))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| nickname_conflict(e, nickname))?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn soft_delete_member(&self, id: MemberId) -> Result<(), CoreError> {
        let sql = format!(
            "UPDATE members SET deleted = TRUE, updated_at = $2 WHERE id = $1 AND {}",
            VISIBLE_MEMBER
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(EntityKind::Member));
        }
        Ok(())
    }

    async fn list_tags(&self, category: Option<TagCategory>) -> Result<Vec<Tag>, CoreError> {
        let rows = match category {
            Some(category) => {
                sqlx::query_as::<_, TagRow>("SELECT id, name, category FROM tags WHERE category = $1 ORDER BY id")
                    .bind(category.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as::<_, TagRow>("SELECT id, name, category FROM tags ORDER BY id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        decode_tags(rows)
    }

    async fn seed_tags(&self, catalog: &[(&str, TagCategory)]) -> Result<usize, CoreError> {
        let mut tx = self.pool.begin().await?;
        // Serializes concurrent seeders started against the same database
        sqlx::query("LOCK TABLE tags IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;
        let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags")
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            return Ok(0);
        }
        for (name, category) in catalog {
            sqlx::query("INSERT INTO tags (name, category) VALUES ($1, $2)")
                .bind(*name)
                .bind(category.as_str())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(catalog.len())
    }

    async fn create_post(&self, owner: MemberId, draft: &PostDraft) -> Result<PostDetail, CoreError> {
        let mut tx = self.pool.begin().await?;
        let member = visible_member(&mut tx, owner).await?;
        let tags = resolve_tags(&mut tx, &draft.tag_ids).await?;

        let now = Utc::now();
        let row = sqlx::query_as::<_, PostRow>(
            "INSERT INTO posts (member_id, title, content, status, deleted, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, FALSE, $5, $5) RETURNING *",
        )
        .bind(owner)
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(PostStatus::Unsolved.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        let post = decode_post(row)?;
        replace_post_tags(&mut tx, post.id, &tags).await?;
        tx.commit().await?;

        Ok(PostDetail::new(post, member.summary(), tags))
    }

    async fn find_post(&self, id: PostId) -> Result<PostDetail, CoreError> {
        let mut conn = self.pool.acquire().await?;
        let post = visible_post(&mut conn, id, false).await?;
        post_detail(&mut conn, post).await
    }

    async fn mutate_post(
        &self,
        requester: MemberId,
        id: PostId,
        mutation: &PostMutation,
    ) -> Result<PostDetail, CoreError> {
        let mut tx = self.pool.begin().await?;
        let post = visible_post(&mut tx, id, true).await?;
        ownership::authorize(EntityKind::Post, post.member_id, requester)?;

        let updated_at = next_timestamp(post.updated_at);
        let row = match mutation {
            PostMutation::Edit(draft) => {
                let tags = resolve_tags(&mut tx, &draft.tag_ids).await?;
                let row = sqlx::query_as::<_, PostRow>(
                    "UPDATE posts SET title = $2, content = $3, updated_at = $4 WHERE id = $1 RETURNING *",
                )
                .bind(id)
                .bind(&draft.title)
                .bind(&draft.content)
                .bind(updated_at)
                .fetch_one(&mut *tx)
                .await?;
                replace_post_tags(&mut tx, id, &tags).await?;
                row
            }
            PostMutation::ChangeStatus(status) => {
                sqlx::query_as::<_, PostRow>("UPDATE posts SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *")
                    .bind(id)
                    .bind(status.as_str())
                    .bind(updated_at)
                    .fetch_one(&mut *tx)
                    .await?
            }
            PostMutation::Delete => {
                sqlx::query_as::<_, PostRow>("UPDATE posts SET deleted = TRUE, updated_at = $2 WHERE id = $1 RETURNING *")
                    .bind(id)
                    .bind(updated_at)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };
        let detail = post_detail(&mut tx, decode_post(row)?).await?;
        tx.commit().await?;
        debug!("Applied post mutation {} to post {}", mutation.name(), id);
        Ok(detail)
    }

    async fn list_posts(&self, filter: &PostFilter, page: PageRequest) -> Result<Page<PostSummary>, CoreError> {
        let mut conn = self.pool.acquire().await?;
        let total = query_builder::fetch_count(&mut conn, &filter.to_count_sql()?).await?;
        let rows: Vec<PostRow> = query_builder::fetch_all_as(&mut conn, &filter.to_sql(page)?).await?;
        let posts = rows.into_iter().map(decode_post).collect::<Result<Vec<_>, _>>()?;

        let post_ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();
        let member_ids: Vec<MemberId> = posts.iter().map(|p| p.member_id).collect();
        let members = member_summaries(&mut conn, &member_ids).await?;

        let counts: HashMap<PostId, i64> = sqlx::query_as::<_, (PostId, i64)>(
            "SELECT c.post_id, COUNT(*) FROM comments c WHERE c.post_id = ANY($1) \
             AND c.deleted = FALSE AND c.member_id IN (SELECT id FROM members WHERE deleted = FALSE) \
             GROUP BY c.post_id",
        )
            .bind(&post_ids)
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .collect();

        let content = posts
            .into_iter()
            .map(|post| -> Result<PostSummary, CoreError> {
                let member = members
                    .get(&post.member_id)
                    .cloned()
                    .ok_or(CoreError::NotFound(EntityKind::Member))?;
                Ok(PostSummary {
                    id: post.id,
                    title: post.title,
                    status: post.status,
                    member,
                    comment_count: counts.get(&post.id).copied().unwrap_or(0),
                    updated_at: post.updated_at,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(content, page, total))
    }

    async fn create_comment(&self, owner: MemberId, post_id: PostId, content: &str) -> Result<CommentDetail, CoreError> {
        let mut tx = self.pool.begin().await?;
        let member = visible_member(&mut tx, owner).await?;
        // Share lock keeps the post from being deleted under the new comment
        let sql = format!("SELECT p.* FROM posts p WHERE p.id = $1 AND {} FOR SHARE", VISIBLE_POST);
        sqlx::query_as::<_, PostRow>(&sql)
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound(EntityKind::Post))?;

        let now = Utc::now();
        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (member_id, post_id, content, deleted, created_at, updated_at) \
             VALUES ($1, $2, $3, FALSE, $4, $4) RETURNING *",
        )
        .bind(owner)
        .bind(post_id)
        .bind(content)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(CommentDetail::new(comment, member.summary()))
    }

    async fn find_comment(&self, id: CommentId) -> Result<CommentDetail, CoreError> {
        let mut conn = self.pool.acquire().await?;
        let comment = visible_comment(&mut conn, id, false).await?;
        let member = visible_member(&mut conn, comment.member_id).await?;
        Ok(CommentDetail::new(comment, member.summary()))
    }

    async fn mutate_comment(
        &self,
        requester: MemberId,
        id: CommentId,
        mutation: &CommentMutation,
    ) -> Result<CommentDetail, CoreError> {
        let mut tx = self.pool.begin().await?;
        let comment = visible_comment(&mut tx, id, true).await?;
        ownership::authorize(EntityKind::Comment, comment.member_id, requester)?;

        let updated_at = next_timestamp(comment.updated_at);
        let updated = match mutation {
            CommentMutation::Edit(content) => {
                sqlx::query_as::<_, Comment>("UPDATE comments SET content = $2, updated_at = $3 WHERE id = $1 RETURNING *")
                    .bind(id)
                    .bind(content)
                    .bind(updated_at)
                    .fetch_one(&mut *tx)
                    .await?
            }
            CommentMutation::Delete => {
                sqlx::query_as::<_, Comment>(
                    "UPDATE comments SET deleted = TRUE, updated_at = $2 WHERE id = $1 RETURNING *",
                )
                .bind(id)
                .bind(updated_at)
                .fetch_one(&mut *tx)
                .await?
            }
        };
        let member = visible_member(&mut tx, updated.member_id).await?;
        tx.commit().await?;
        Ok(CommentDetail::new(updated, member.summary()))
    }

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<CommentDetail>, CoreError> {
        let mut conn = self.pool.acquire().await?;
        visible_post(&mut conn, post_id, false).await?;

        let sql = format!(
            "SELECT c.* FROM comments c WHERE c.post_id = $1 AND {} ORDER BY c.created_at ASC, c.id ASC",
            VISIBLE_COMMENT
        );
        let comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(post_id)
            .fetch_all(&mut *conn)
            .await?;

        let member_ids: Vec<MemberId> = comments.iter().map(|c| c.member_id).collect();
        let members = member_summaries(&mut conn, &member_ids).await?;
        comments
            .into_iter()
            .map(|comment| -> Result<CommentDetail, CoreError> {
                let member = members
                    .get(&comment.member_id)
                    .cloned()
                    .ok_or(CoreError::NotFound(EntityKind::Member))?;
                Ok(CommentDetail::new(comment, member))
            })
            .collect()
    }
}
