//! Forum use-case service.
//!
//! # Responsibility
//! - Gate post/comment use-cases on the request context.
//! - Resolve raw paging and sort input before hitting storage.
//!
//! # Invariants
//! - Public listings only show posts/comments that passed moderation.
//! - An unmoderated post is visible only to its author and admins.
//! - Guard checks run before any mutation.
//! - Likes and comments target only posts the caller can see.

use crate::context::RequestContext;
use crate::model::post::{
    normalize_tags, split_tags, CommentId, CommentRecord, NewComment, NewPost, PostId, PostRecord,
};
use crate::model::user::UserId;
use crate::query::page::{Page, PageLimits, PageRequest, Paginated};
use crate::repo::post_repo::{CommentListQuery, PostListQuery, PostRepository, COMMENT_SORT, POST_SORT};
use crate::repo::reaction::ReactionOutcome;
use crate::service::error::{ServiceError, ServiceResult};

/// Forum service facade over a post repository.
pub struct ForumService<R: PostRepository> {
    repo: R,
    limits: PageLimits,
}

impl<R: PostRepository> ForumService<R> {
    pub fn new(repo: R, limits: PageLimits) -> Self {
        Self { repo, limits }
    }

    /// Lists moderated posts.
    pub fn list_posts(
        &self,
        ctx: &RequestContext,
        page: PageRequest,
        sort_type: Option<&str>,
    ) -> ServiceResult<Paginated<PostRecord>> {
        let query = PostListQuery {
            page: Page::resolve(page, self.limits),
            sort: POST_SORT.resolve(sort_type),
            viewer: ctx.viewer(),
        };
        Ok(self.repo.list_posts(&query)?)
    }

    /// Loads one post.
    ///
    /// # Errors
    /// - `NotFound` when the post is missing, or unmoderated and the caller is
    ///   neither its author nor an admin.
    pub fn get_post(&self, ctx: &RequestContext, post_id: PostId) -> ServiceResult<PostRecord> {
        self.visible_post(ctx, post_id)
    }

    /// Creates a post from raw client fields. `tags` is a separator-joined
    /// string.
    pub fn create_post(
        &self,
        ctx: &RequestContext,
        title: Option<String>,
        content: String,
        tags: Option<&str>,
    ) -> ServiceResult<PostId> {
        let user = ctx.require_user()?;
        let tags = tags
            .map(|raw| normalize_tags(&split_tags(raw)))
            .unwrap_or_default();
        let post = NewPost {
            create_user: user.id,
            title: title
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            content,
            tags,
        };
        Ok(self.repo.create_post(&post)?)
    }

    pub fn create_comment(
        &self,
        ctx: &RequestContext,
        post_id: PostId,
        content: String,
        reply_to_user: Option<UserId>,
    ) -> ServiceResult<CommentId> {
        let user = ctx.require_user()?;
        self.visible_post(ctx, post_id)?;
        let comment = NewComment {
            post_id,
            create_user: user.id,
            content,
            reply_to_user,
        };
        Ok(self.repo.create_comment(&comment)?)
    }

    /// Lists moderated comments of a visible post.
    pub fn list_comments(
        &self,
        ctx: &RequestContext,
        post_id: PostId,
        page: PageRequest,
        sort_type: Option<&str>,
    ) -> ServiceResult<Paginated<CommentRecord>> {
        self.visible_post(ctx, post_id)?;
        let query = CommentListQuery {
            post_id,
            page: Page::resolve(page, self.limits),
            sort: COMMENT_SORT.resolve(sort_type),
            viewer: ctx.viewer(),
        };
        Ok(self.repo.list_comments(&query)?)
    }

    pub fn like_post(
        &self,
        ctx: &RequestContext,
        post_id: PostId,
        is_good: bool,
    ) -> ServiceResult<ReactionOutcome> {
        let user = ctx.require_user()?;
        self.visible_post(ctx, post_id)?;
        Ok(self.repo.set_post_like(post_id, user.id, is_good)?)
    }

    pub fn like_comment(
        &self,
        ctx: &RequestContext,
        comment_id: CommentId,
        is_good: bool,
    ) -> ServiceResult<ReactionOutcome> {
        let user = ctx.require_user()?;
        let comment = self
            .repo
            .get_comment(comment_id, None)?
            .ok_or(ServiceError::NotFound {
                kind: "comment",
                id: comment_id,
            })?;
        self.visible_post(ctx, comment.post_id)?;
        Ok(self.repo.set_comment_like(comment_id, user.id, is_good)?)
    }

    /// Sets the moderation flag. Admin only.
    pub fn check_post(
        &self,
        ctx: &RequestContext,
        post_id: PostId,
        passed: bool,
    ) -> ServiceResult<()> {
        ctx.require_admin("post_check")?;
        Ok(self.repo.set_post_check_status(post_id, passed)?)
    }

    fn visible_post(&self, ctx: &RequestContext, post_id: PostId) -> ServiceResult<PostRecord> {
        let privileged = |post: &PostRecord| {
            ctx.user
                .as_ref()
                .is_some_and(|user| user.is_admin() || user.id == post.create_user)
        };
        self.repo
            .get_post(post_id, ctx.viewer())?
            .filter(|post| post.check_status || privileged(post))
            .ok_or(ServiceError::NotFound {
                kind: "post",
                id: post_id,
            })
    }
}
