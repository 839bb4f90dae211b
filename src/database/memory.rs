use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::{
    Comment, CommentDetail, CommentMutation, Member, Post, PostDetail, PostDraft, PostMutation,
    PostStatus, PostSummary, Tag, TagCategory,
};
use super::store::EntityStore;
use crate::error::CoreError;
use crate::filter::{Page, PageRequest, PostFilter};
use crate::ownership;
use crate::tagging;
use crate::types::{next_timestamp, CommentId, EntityKind, MemberId, PostId, TagId};

#[derive(Debug, Clone, Default)]
struct Sequences {
    member: i64,
    post: i64,
    comment: i64,
    tag: i64,
}

fn allocate(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    members: BTreeMap<MemberId, Member>,
    posts: BTreeMap<PostId, Post>,
    /// Tag ids per post in association order
    post_tags: BTreeMap<PostId, Vec<TagId>>,
    comments: BTreeMap<CommentId, Comment>,
    tags: BTreeMap<TagId, Tag>,
    sequences: Sequences,
}

impl MemoryState {
    fn visible_member(&self, id: MemberId) -> Result<&Member, CoreError> {
        self.members
            .get(&id)
            .filter(|m| !m.deleted)
            .ok_or(CoreError::NotFound(EntityKind::Member))
    }

    fn is_member_visible(&self, id: MemberId) -> bool {
        self.visible_member(id).is_ok()
    }

    fn nickname_holder(&self, nickname: &str) -> Option<&Member> {
        self.members.values().find(|m| !m.deleted && m.nickname == nickname)
    }

    fn visible_post(&self, id: PostId) -> Result<&Post, CoreError> {
        self.posts
            .get(&id)
            .filter(|p| !p.deleted && self.is_member_visible(p.member_id))
            .ok_or(CoreError::NotFound(EntityKind::Post))
    }

    fn visible_comment(&self, id: CommentId) -> Result<&Comment, CoreError> {
        self.comments
            .get(&id)
            .filter(|c| !c.deleted && self.is_member_visible(c.member_id) && self.visible_post(c.post_id).is_ok())
            .ok_or(CoreError::NotFound(EntityKind::Comment))
    }

    fn resolve_tags(&self, tag_ids: &[TagId]) -> Result<Vec<Tag>, CoreError> {
        let found = tag_ids.iter().filter_map(|id| self.tags.get(id).cloned()).collect();
        tagging::resolve(tag_ids, found)
    }

    fn post_detail(&self, post: &Post) -> Result<PostDetail, CoreError> {
        let member = self.visible_member(post.member_id)?.summary();
        let tags = self
            .post_tags
            .get(&post.id)
            .map(|ids| ids.iter().filter_map(|id| self.tags.get(id).cloned()).collect())
            .unwrap_or_default();
        Ok(PostDetail::new(post.clone(), member, tags))
    }

    fn comment_detail(&self, comment: &Comment) -> Result<CommentDetail, CoreError> {
        let member = self.visible_member(comment.member_id)?.summary();
        Ok(CommentDetail::new(comment.clone(), member))
    }

    fn comment_count(&self, post_id: PostId) -> i64 {
        self.comments
            .values()
            .filter(|c| c.post_id == post_id && !c.deleted && self.is_member_visible(c.member_id))
            .count() as i64
    }

    fn apply_post_mutation(&mut self, requester: MemberId, id: PostId, mutation: &PostMutation) -> Result<Post, CoreError> {
        let owner = self.visible_post(id)?.member_id;
        ownership::authorize(EntityKind::Post, owner, requester)?;

        let resolved = match mutation {
            PostMutation::Edit(draft) => Some(self.resolve_tags(&draft.tag_ids)?),
            _ => None,
        };

        let post = self.posts.get_mut(&id).ok_or(CoreError::NotFound(EntityKind::Post))?;
        match mutation {
            PostMutation::Edit(draft) => {
                post.title = draft.title.clone();
                post.content = draft.content.clone();
            }
            PostMutation::ChangeStatus(status) => post.status = *status,
            PostMutation::Delete => post.deleted = true,
        }
        post.updated_at = next_timestamp(post.updated_at);
        let updated = post.clone();

        if let Some(tags) = resolved {
            self.post_tags.insert(id, tags.iter().map(|t| t.id).collect());
        }
        Ok(updated)
    }

    fn apply_comment_mutation(
        &mut self,
        requester: MemberId,
        id: CommentId,
        mutation: &CommentMutation,
    ) -> Result<Comment, CoreError> {
        let owner = self.visible_comment(id)?.member_id;
        ownership::authorize(EntityKind::Comment, owner, requester)?;

        let comment = self.comments.get_mut(&id).ok_or(CoreError::NotFound(EntityKind::Comment))?;
        match mutation {
            CommentMutation::Edit(content) => comment.content = content.clone(),
            CommentMutation::Delete => comment.deleted = true,
        }
        comment.updated_at = next_timestamp(comment.updated_at);
        Ok(comment.clone())
    }
}

/// In-process store with the same visibility and atomicity rules as
/// `PgStore`. Each mutation runs against a staged copy of the state that
/// replaces the live state only when the whole operation succeeds.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn transaction<T>(&self, f: impl FnOnce(&mut MemoryState) -> Result<T, CoreError>) -> Result<T, CoreError> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();
        let result = f(&mut staged)?;
        *state = staged;
        Ok(result)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn insert_member(&self, nickname: &str, password_hash: &str) -> Result<Member, CoreError> {
        self.transaction(|state| {
            if state.nickname_holder(nickname).is_some() {
                return Err(CoreError::DuplicateNickname(nickname.to_string()));
            }
            let now = Utc::now();
            let member = Member {
                id: allocate(&mut state.sequences.member),
                nickname: nickname.to_string(),
                password_hash: password_hash.to_string(),
                profile_image: None,
                deleted: false,
                created_at: now,
                updated_at: now,
            };
            state.members.insert(member.id, member.clone());
            Ok(member)
        })
        .await
    }

    async fn find_member(&self, id: MemberId) -> Result<Member, CoreError> {
        let state = self.state.read().await;
        state.visible_member(id).cloned()
    }

    async fn find_member_by_nickname(&self, nickname: &str) -> Result<Option<Member>, CoreError> {
        let state = self.state.read().await;
        Ok(state.nickname_holder(nickname).cloned())
    }

    async fn rename_member(&self, id: MemberId, nickname: &str) -> Result<Member, CoreError> {
        self.transaction(|state| {
            state.visible_member(id)?;
            if let Some(holder) = state.nickname_holder(nickname) {
                if holder.id != id {
                    return Err(CoreError::DuplicateNickname(nickname.to_string()));
                }
            }
            let member = state.members.get_mut(&id).ok_or(CoreError::NotFound(EntityKind::Member))?;
            if member.nickname != nickname {
                member.nickname = nickname.to_string();
                member.updated_at = next_timestamp(member.updated_at);
            }
            Ok(member.clone())
        })
        .await
    }

    async fn soft_delete_member(&self, id: MemberId) -> Result<(), CoreError> {
        self.transaction(|state| {
            state.visible_member(id)?;
            let member = state.members.get_mut(&id).ok_or(CoreError::NotFound(EntityKind::Member))?;
            member.deleted = true;
            member.updated_at = next_timestamp(member.updated_at);
            Ok(())
        })
        .await
    }

    async fn list_tags(&self, category: Option<TagCategory>) -> Result<Vec<Tag>, CoreError> {
        let state = self.state.read().await;
        Ok(state
            .tags
            .values()
            .filter(|t| category.map_or(true, |c| t.category == c))
            .cloned()
            .collect())
    }

    async fn seed_tags(&self, catalog: &[(&str, TagCategory)]) -> Result<usize, CoreError> {
        self.transaction(|state| {
            if !state.tags.is_empty() {
                return Ok(0);
            }
            for (name, category) in catalog {
                let id = allocate(&mut state.sequences.tag);
                state.tags.insert(id, Tag { id, name: name.to_string(), category: *category });
            }
            Ok(catalog.len())
        })
        .await
    }

    async fn create_post(&self, owner: MemberId, draft: &PostDraft) -> Result<PostDetail, CoreError> {
        self.transaction(|state| {
            state.visible_member(owner)?;
            let tags = state.resolve_tags(&draft.tag_ids)?;

            let now = Utc::now();
            let post = Post {
                id: allocate(&mut state.sequences.post),
                member_id: owner,
                title: draft.title.clone(),
                content: draft.content.clone(),
                status: PostStatus::Unsolved,
                deleted: false,
                created_at: now,
                updated_at: now,
            };
            state.posts.insert(post.id, post.clone());
            state.post_tags.insert(post.id, tags.iter().map(|t| t.id).collect());
            state.post_detail(&post)
        })
        .await
    }

    async fn find_post(&self, id: PostId) -> Result<PostDetail, CoreError> {
        let state = self.state.read().await;
        let post = state.visible_post(id)?;
        state.post_detail(post)
    }

    async fn mutate_post(
        &self,
        requester: MemberId,
        id: PostId,
        mutation: &PostMutation,
    ) -> Result<PostDetail, CoreError> {
        self.transaction(|state| {
            let post = state.apply_post_mutation(requester, id, mutation)?;
            state.post_detail(&post)
        })
        .await
    }

    async fn list_posts(&self, filter: &PostFilter, page: PageRequest) -> Result<Page<PostSummary>, CoreError> {
        let state = self.state.read().await;
        let mut matching: Vec<&Post> = state
            .posts
            .values()
            .filter(|p| filter.matches(p) && state.is_member_visible(p.member_id))
            .collect();
        matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let content = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .map(|post| -> Result<PostSummary, CoreError> {
                Ok(PostSummary {
                    id: post.id,
                    title: post.title.clone(),
                    status: post.status,
                    member: state.visible_member(post.member_id)?.summary(),
                    comment_count: state.comment_count(post.id),
                    updated_at: post.updated_at,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(content, page, total))
    }

    async fn create_comment(&self, owner: MemberId, post_id: PostId, content: &str) -> Result<CommentDetail, CoreError> {
        self.transaction(|state| {
            state.visible_member(owner)?;
            state.visible_post(post_id)?;

            let now = Utc::now();
            let comment = Comment {
                id: allocate(&mut state.sequences.comment),
                member_id: owner,
                post_id,
                content: content.to_string(),
                deleted: false,
                created_at: now,
                updated_at: now,
            };
            state.comments.insert(comment.id, comment.clone());
            state.comment_detail(&comment)
        })
        .await
    }

    async fn find_comment(&self, id: CommentId) -> Result<CommentDetail, CoreError> {
        let state = self.state.read().await;
        let comment = state.visible_comment(id)?;
        state.comment_detail(comment)
    }

    async fn mutate_comment(
        &self,
        requester: MemberId,
        id: CommentId,
        mutation: &CommentMutation,
    ) -> Result<CommentDetail, CoreError> {
        self.transaction(|state| {
            let comment = state.apply_comment_mutation(requester, id, mutation)?;
            state.comment_detail(&comment)
        })
        .await
    }

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<CommentDetail>, CoreError> {
        let state = self.state.read().await;
        state.visible_post(post_id)?;
        let mut comments: Vec<&Comment> = state
            .comments
            .values()
            .filter(|c| c.post_id == post_id && !c.deleted && state.is_member_visible(c.member_id))
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        comments.into_iter().map(|c| state.comment_detail(c)).collect()
    }
}
