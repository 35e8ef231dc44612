//! Forum handlers: posts, comments, likes, moderation.

use super::{respond, Ack, Backend, Envelope};
use crate::context::RequestContext;
use crate::model::post::{CommentId, CommentRecord, PostId, PostRecord};
use crate::model::user::UserId;
use crate::query::page::PageRequest;
use crate::repo::post_repo::SqlitePostRepository;
use crate::repo::reaction::ReactionOutcome;
use crate::service::forum_service::ForumService;
use crate::service::ServiceResult;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostListRequest {
    pub page_num: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostNewRequest {
    pub post_title: Option<String>,
    pub post_content: String,
    /// Separator-joined tag names.
    pub tags: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNewRequest {
    pub post_id: PostId,
    pub comment_content: String,
    pub reply_to_user_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentListRequest {
    pub post_id: PostId,
    pub page_num: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_type: Option<String>,
}

/// One row of the post browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostListItem {
    pub post_id: PostId,
    pub post_title: Option<String>,
    pub user_id: UserId,
    pub user_name: String,
    pub like_count: i64,
    pub comment_count: i64,
    pub create_time: i64,
    /// `None` for anonymous callers.
    pub like_status: Option<bool>,
}

impl From<PostRecord> for PostListItem {
    fn from(post: PostRecord) -> Self {
        Self {
            post_id: post.id,
            post_title: post.title,
            user_id: post.create_user,
            user_name: post.user_name,
            like_count: post.like_count,
            comment_count: post.comment_count,
            create_time: post.create_time,
            like_status: post.like_status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostListPayload {
    pub count: u64,
    pub posts: Vec<PostListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInformation {
    pub post_id: PostId,
    pub post_title: Option<String>,
    pub post_content: String,
    pub like_count: i64,
    pub comment_count: i64,
    pub create_time: i64,
    pub user_name: String,
    pub tags: Vec<String>,
    pub like_status: Option<bool>,
}

impl From<PostRecord> for PostInformation {
    fn from(post: PostRecord) -> Self {
        Self {
            post_id: post.id,
            post_title: post.title,
            post_content: post.content,
            like_count: post.like_count,
            comment_count: post.comment_count,
            create_time: post.create_time,
            user_name: post.user_name,
            tags: post.tags,
            like_status: post.like_status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCreated {
    pub post_id: PostId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentCreated {
    pub comment_id: CommentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentItem {
    pub comment_id: CommentId,
    pub user_id: UserId,
    pub user_name: String,
    pub avatar: Option<String>,
    pub like_status: Option<bool>,
    pub comment_content: String,
    pub like_count: i64,
    pub create_time: i64,
    pub reply_to_id: Option<UserId>,
    pub reply_to_name: Option<String>,
}

impl From<CommentRecord> for CommentItem {
    fn from(comment: CommentRecord) -> Self {
        Self {
            comment_id: comment.id,
            user_id: comment.create_user,
            user_name: comment.user_name,
            avatar: comment.avatar,
            like_status: comment.like_status,
            comment_content: comment.content,
            like_count: comment.like_count,
            create_time: comment.create_time,
            reply_to_id: comment.reply_to_user,
            reply_to_name: comment.reply_to_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentListPayload {
    pub count: u64,
    pub comments: Vec<CommentItem>,
}

/// Reaction state after a like/star call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionPayload {
    pub status: bool,
    pub count: i64,
}

impl From<ReactionOutcome> for ReactionPayload {
    fn from(outcome: ReactionOutcome) -> Self {
        Self {
            status: outcome.reacted,
            count: outcome.count,
        }
    }
}

impl Backend<'_> {
    pub fn post_list(
        &self,
        ctx: &RequestContext,
        request: &PostListRequest,
    ) -> Envelope<PostListPayload> {
        let result = self.with_forum(|service| {
            let posts = service.list_posts(
                ctx,
                PageRequest {
                    page_num: request.page_num,
                    page_size: request.page_size,
                },
                request.sort_type.as_deref(),
            )?;
            Ok(PostListPayload {
                count: posts.count,
                posts: posts.items.into_iter().map(PostListItem::from).collect(),
            })
        });
        respond("post_list", ctx, result)
    }

    pub fn post_information(
        &self,
        ctx: &RequestContext,
        post_id: PostId,
    ) -> Envelope<PostInformation> {
        let result = self.with_forum(|service| Ok(service.get_post(ctx, post_id)?.into()));
        respond("post_information", ctx, result)
    }

    pub fn post_new(&self, ctx: &RequestContext, request: PostNewRequest) -> Envelope<PostCreated> {
        let result = self.with_forum(|service| {
            let post_id = service.create_post(
                ctx,
                request.post_title,
                request.post_content,
                request.tags.as_deref(),
            )?;
            info!(
                "event=post_create module=api status=ok request_id={} post_id={post_id}",
                ctx.request_id
            );
            Ok(PostCreated { post_id })
        });
        respond("post_new", ctx, result)
    }

    pub fn post_comment_new(
        &self,
        ctx: &RequestContext,
        request: CommentNewRequest,
    ) -> Envelope<CommentCreated> {
        let result = self.with_forum(|service| {
            let comment_id = service.create_comment(
                ctx,
                request.post_id,
                request.comment_content,
                request.reply_to_user_id,
            )?;
            info!(
                "event=comment_create module=api status=ok request_id={} post_id={} comment_id={comment_id}",
                ctx.request_id, request.post_id
            );
            Ok(CommentCreated { comment_id })
        });
        respond("post_comment_new", ctx, result)
    }

    pub fn post_comments(
        &self,
        ctx: &RequestContext,
        request: &CommentListRequest,
    ) -> Envelope<CommentListPayload> {
        let result = self.with_forum(|service| {
            let comments = service.list_comments(
                ctx,
                request.post_id,
                PageRequest {
                    page_num: request.page_num,
                    page_size: request.page_size,
                },
                request.sort_type.as_deref(),
            )?;
            Ok(CommentListPayload {
                count: comments.count,
                comments: comments.items.into_iter().map(CommentItem::from).collect(),
            })
        });
        respond("post_comments", ctx, result)
    }

    pub fn post_good(
        &self,
        ctx: &RequestContext,
        post_id: PostId,
        is_good: bool,
    ) -> Envelope<ReactionPayload> {
        let result = self.with_forum(|service| {
            let outcome = service.like_post(ctx, post_id, is_good)?;
            log_reaction(ctx, "post", post_id, &outcome);
            Ok(outcome.into())
        });
        respond("post_good", ctx, result)
    }

    pub fn comment_good(
        &self,
        ctx: &RequestContext,
        comment_id: CommentId,
        is_good: bool,
    ) -> Envelope<ReactionPayload> {
        let result = self.with_forum(|service| {
            let outcome = service.like_comment(ctx, comment_id, is_good)?;
            log_reaction(ctx, "comment", comment_id, &outcome);
            Ok(outcome.into())
        });
        respond("comment_good", ctx, result)
    }

    /// Admin moderation.
    pub fn post_check(&self, ctx: &RequestContext, post_id: PostId, passed: bool) -> Envelope<Ack> {
        let result = self.with_forum(|service| {
            service.check_post(ctx, post_id, passed)?;
            info!(
                "event=post_check module=api status=ok request_id={} post_id={post_id} passed={passed}",
                ctx.request_id
            );
            Ok(Ack {})
        });
        respond("post_check", ctx, result)
    }

    fn with_forum<T>(
        &self,
        f: impl FnOnce(&ForumService<SqlitePostRepository<'_>>) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let repo = SqlitePostRepository::try_new(self.conn())?;
        let service = ForumService::new(repo, self.config().page_limits);
        f(&service)
    }
}

pub(crate) fn log_reaction(
    ctx: &RequestContext,
    kind: &'static str,
    entity_id: i64,
    outcome: &ReactionOutcome,
) {
    info!(
        "event=reaction_set module=api status=ok request_id={} kind={kind} id={entity_id} change={:?} count={}",
        ctx.request_id, outcome.change, outcome.count
    );
}
