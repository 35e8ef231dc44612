//! Problem list use-case service.
//!
//! # Responsibility
//! - Browse public lists with per-viewer pass counts.
//! - Owner-gated item edits and deletion.
//! - Star toggling, which may finish a pending deletion.
//!
//! # Invariants
//! - Deleted lists behave as missing for every caller-facing read.
//! - Private lists are visible to their owner only.

use crate::context::RequestContext;
use crate::model::lifecycle::Disposition;
use crate::model::problem::{
    NewProblemList, ProblemId, ProblemListId, ProblemListRecord, ProblemSummary,
};
use crate::query::page::{Page, PageLimits, PageRequest, Paginated};
use crate::repo::problem_list_repo::{
    ItemsUpdate, OwnedMutation, ProblemListQuery, ProblemListRepository, StarUpdate,
    PROBLEM_LIST_SORT,
};
use crate::service::error::{ServiceError, ServiceResult};

/// One row of the public list browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemListEntry {
    pub list: ProblemListRecord,
    /// Problems of the list the caller passed; `None` when anonymous.
    pub pass_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemListDetail {
    pub list: ProblemListRecord,
    pub star_status: bool,
    pub problems: Vec<ProblemSummary>,
}

pub struct ProblemListService<R: ProblemListRepository> {
    repo: R,
    limits: PageLimits,
}

impl<R: ProblemListRepository> ProblemListService<R> {
    pub fn new(repo: R, limits: PageLimits) -> Self {
        Self { repo, limits }
    }

    pub fn create_list(
        &self,
        ctx: &RequestContext,
        title: String,
        summary: String,
        is_public: bool,
    ) -> ServiceResult<ProblemListId> {
        let user = ctx.require_user()?;
        let list = NewProblemList {
            create_user: user.id,
            title,
            summary,
            is_public,
        };
        Ok(self.repo.create_list(&list)?)
    }

    /// Public lists matching `keyword`. Authenticated callers do not see
    /// their own lists.
    pub fn browse(
        &self,
        ctx: &RequestContext,
        keyword: Option<String>,
        sort_type: Option<&str>,
        page: PageRequest,
    ) -> ServiceResult<Paginated<ProblemListEntry>> {
        let viewer = ctx.viewer();
        let query = ProblemListQuery {
            keyword,
            exclude_owner: viewer,
            sort: PROBLEM_LIST_SORT.resolve(sort_type),
            page: Page::resolve(page, self.limits),
        };
        let lists = self.repo.list_public(&query)?;

        let mut entries = Vec::with_capacity(lists.items.len());
        for list in lists.items {
            let pass_count = match viewer {
                Some(user_id) => Some(self.repo.pass_count(list.id, user_id)?),
                None => None,
            };
            entries.push(ProblemListEntry { list, pass_count });
        }
        Ok(Paginated {
            count: lists.count,
            items: entries,
        })
    }

    pub fn detail(
        &self,
        ctx: &RequestContext,
        list_id: ProblemListId,
    ) -> ServiceResult<ProblemListDetail> {
        let user = ctx.require_user()?;
        let list = self
            .repo
            .get_list(list_id, false)?
            .filter(|list| list.is_public || list.create_user == user.id)
            .ok_or(ServiceError::NotFound {
                kind: "problem list",
                id: list_id,
            })?;
        let star_status = self.repo.is_starred(list_id, user.id)?;
        let problems = self.repo.list_problems(list_id, Some(user.id))?;
        Ok(ProblemListDetail {
            list,
            star_status,
            problems,
        })
    }

    /// Adds or removes problems. Owner only.
    ///
    /// # Errors
    /// - `Conflict` when adding ids that are all present, or removing ids
    ///   none of which are present.
    pub fn update_items(
        &self,
        ctx: &RequestContext,
        list_id: ProblemListId,
        problem_ids: &[ProblemId],
        is_add: bool,
    ) -> ServiceResult<ItemsUpdate> {
        let user = ctx.require_user()?;
        if problem_ids.is_empty() {
            return Err(ServiceError::ValidationFailed(
                "`problem_ids` must not be empty".to_string(),
            ));
        }
        match self
            .repo
            .update_items(list_id, user.id, problem_ids, is_add)?
        {
            OwnedMutation::NotOwner => Err(ServiceError::PermissionDenied("problem_list_items")),
            OwnedMutation::Applied(ItemsUpdate::AlreadyPresent) => Err(ServiceError::Conflict(
                "problem list already contains these problems",
            )),
            OwnedMutation::Applied(ItemsUpdate::NonePresent) => {
                Err(ServiceError::Conflict("problems are not in the problem list"))
            }
            OwnedMutation::Applied(update) => Ok(update),
        }
    }

    /// Flips the caller's star.
    pub fn toggle_star(
        &self,
        ctx: &RequestContext,
        list_id: ProblemListId,
    ) -> ServiceResult<StarUpdate> {
        let user = ctx.require_user()?;
        Ok(self.repo.toggle_star(list_id, user.id)?)
    }

    /// Deletes now, or parks the list until its stars drain. Owner only.
    pub fn delete(
        &self,
        ctx: &RequestContext,
        list_id: ProblemListId,
    ) -> ServiceResult<Disposition> {
        let user = ctx.require_user()?;
        match self.repo.request_delete(list_id, user.id)? {
            OwnedMutation::NotOwner => Err(ServiceError::PermissionDenied("problem_list_delete")),
            OwnedMutation::Applied(disposition) => Ok(disposition),
        }
    }
}
