//! Problem list handlers.

use super::problem::ProblemBrief;
use super::{respond, Backend, Envelope};
use crate::context::RequestContext;
use crate::model::lifecycle::Disposition;
use crate::model::problem::{ProblemId, ProblemListId, ProblemListRecord};
use crate::model::user::UserId;
use crate::query::page::PageRequest;
use crate::repo::problem_list_repo::{ItemsUpdate, SqliteProblemListRepository};
use crate::service::problem_list_service::{ProblemListEntry, ProblemListService};
use crate::service::ServiceResult;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemListNewRequest {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemListsRequest {
    pub keyword: Option<String>,
    pub sort_type: Option<String>,
    pub page_num: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemListItemsRequest {
    pub problemlist_id: ProblemListId,
    pub problem_ids: Vec<ProblemId>,
    pub is_add: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemListCreated {
    pub problemlist_id: ProblemListId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemListSummary {
    pub id: ProblemListId,
    pub title: String,
    pub summary: String,
    pub user_id: UserId,
    pub user_name: String,
    pub star_count: i64,
    pub problem_count: i64,
    pub create_time: i64,
    /// `None` for anonymous callers.
    pub pass_count: Option<u64>,
}

impl From<ProblemListEntry> for ProblemListSummary {
    fn from(entry: ProblemListEntry) -> Self {
        let ProblemListEntry { list, pass_count } = entry;
        Self {
            id: list.id,
            title: list.title,
            summary: list.summary,
            user_id: list.create_user,
            user_name: list.user_name,
            star_count: list.star_count,
            problem_count: list.problem_count,
            create_time: list.create_time,
            pass_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemListsPayload {
    pub count: u64,
    pub problemlists: Vec<ProblemListSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemListDetailPayload {
    pub id: ProblemListId,
    pub title: String,
    pub summary: String,
    pub is_public: bool,
    pub user_id: UserId,
    pub user_name: String,
    pub star_count: i64,
    pub create_time: i64,
    pub star_status: bool,
    pub problems: Vec<ProblemBrief>,
}

/// Outcome of an item edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsChanged {
    pub changed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarPayload {
    pub star_status: bool,
    pub star_count: i64,
    /// The list was pending deletion and is now gone.
    pub destroyed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Removed now.
    Destroyed,
    /// Hidden until the remaining stars are removed.
    PendingDeletion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePayload {
    pub outcome: DeleteOutcome,
}

impl Backend<'_> {
    pub fn problem_list_new(
        &self,
        ctx: &RequestContext,
        request: ProblemListNewRequest,
    ) -> Envelope<ProblemListCreated> {
        let result = self.with_problem_lists(|service| {
            let problemlist_id =
                service.create_list(ctx, request.title, request.summary, request.is_public)?;
            info!(
                "event=problem_list_create module=api status=ok request_id={} problemlist_id={problemlist_id}",
                ctx.request_id
            );
            Ok(ProblemListCreated { problemlist_id })
        });
        respond("problem_list_new", ctx, result)
    }

    pub fn problem_lists(
        &self,
        ctx: &RequestContext,
        request: &ProblemListsRequest,
    ) -> Envelope<ProblemListsPayload> {
        let result = self.with_problem_lists(|service| {
            let lists = service.browse(
                ctx,
                request.keyword.clone(),
                request.sort_type.as_deref(),
                PageRequest {
                    page_num: request.page_num,
                    page_size: request.page_size,
                },
            )?;
            Ok(ProblemListsPayload {
                count: lists.count,
                problemlists: lists
                    .items
                    .into_iter()
                    .map(ProblemListSummary::from)
                    .collect(),
            })
        });
        respond("problem_lists", ctx, result)
    }

    pub fn problem_list_detail(
        &self,
        ctx: &RequestContext,
        problemlist_id: ProblemListId,
    ) -> Envelope<ProblemListDetailPayload> {
        let result = self.with_problem_lists(|service| {
            let detail = service.detail(ctx, problemlist_id)?;
            Ok(detail_payload(
                detail.list,
                detail.star_status,
                detail.problems.into_iter().map(ProblemBrief::from).collect(),
            ))
        });
        respond("problem_list_detail", ctx, result)
    }

    /// Owner only.
    pub fn problem_list_items(
        &self,
        ctx: &RequestContext,
        request: &ProblemListItemsRequest,
    ) -> Envelope<ItemsChanged> {
        let result = self.with_problem_lists(|service| {
            let update = service.update_items(
                ctx,
                request.problemlist_id,
                &request.problem_ids,
                request.is_add,
            )?;
            let changed = match update {
                ItemsUpdate::Added(count) | ItemsUpdate::Removed(count) => count,
                ItemsUpdate::AlreadyPresent | ItemsUpdate::NonePresent => 0,
            };
            info!(
                "event=problem_list_items module=api status=ok request_id={} problemlist_id={} is_add={} changed={changed}",
                ctx.request_id, request.problemlist_id, request.is_add
            );
            Ok(ItemsChanged { changed })
        });
        respond("problem_list_items", ctx, result)
    }

    pub fn problem_list_star(
        &self,
        ctx: &RequestContext,
        problemlist_id: ProblemListId,
    ) -> Envelope<StarPayload> {
        let result = self.with_problem_lists(|service| {
            let update = service.toggle_star(ctx, problemlist_id)?;
            info!(
                "event=reaction_set module=api status=ok request_id={} kind=problem_list id={problemlist_id} change={:?} count={} destroyed={}",
                ctx.request_id, update.outcome.change, update.outcome.count, update.destroyed
            );
            Ok(StarPayload {
                star_status: update.outcome.reacted,
                star_count: update.outcome.count,
                destroyed: update.destroyed,
            })
        });
        respond("problem_list_star", ctx, result)
    }

    /// Owner only.
    pub fn problem_list_delete(
        &self,
        ctx: &RequestContext,
        problemlist_id: ProblemListId,
    ) -> Envelope<DeletePayload> {
        let result = self.with_problem_lists(|service| {
            let outcome = match service.delete(ctx, problemlist_id)? {
                Disposition::Destroy => DeleteOutcome::Destroyed,
                Disposition::Retain(_) => DeleteOutcome::PendingDeletion,
            };
            info!(
                "event=problem_list_delete module=api status=ok request_id={} problemlist_id={problemlist_id} outcome={outcome:?}",
                ctx.request_id
            );
            Ok(DeletePayload { outcome })
        });
        respond("problem_list_delete", ctx, result)
    }

    fn with_problem_lists<T>(
        &self,
        f: impl FnOnce(&ProblemListService<SqliteProblemListRepository<'_>>) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let repo = SqliteProblemListRepository::try_new(self.conn())?;
        let service = ProblemListService::new(repo, self.config().page_limits);
        f(&service)
    }
}

fn detail_payload(
    list: ProblemListRecord,
    star_status: bool,
    problems: Vec<ProblemBrief>,
) -> ProblemListDetailPayload {
    ProblemListDetailPayload {
        id: list.id,
        title: list.title,
        summary: list.summary,
        is_public: list.is_public,
        user_id: list.create_user,
        user_name: list.user_name,
        star_count: list.star_count,
        create_time: list.create_time,
        star_status,
        problems,
    }
}
