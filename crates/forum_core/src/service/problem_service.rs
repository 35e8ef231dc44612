//! Problem-set use-case service.
//!
//! # Responsibility
//! - Problem detail with per-viewer flags and similar problems.
//! - Solution browsing with plain-text previews.
//! - Admin-only problem and tag authoring.

use crate::config::ForumConfig;
use crate::context::RequestContext;
use crate::model::problem::{
    derive_plain_preview, Difficulty, NewProblem, NewSolution, ProblemId, ProblemRecord,
    ProblemSummary, SolutionId, SolutionRecord, Tag, TagId,
};
use crate::query::page::{Page, PageRequest, Paginated};
use crate::repo::problem_repo::{ProblemRepository, SolutionListQuery, SOLUTION_SORT};
use crate::repo::reaction::ReactionOutcome;
use crate::service::error::{ServiceError, ServiceResult};

pub const SIMILAR_PROBLEM_LIMIT: u32 = 5;

/// Problem detail with its neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemDetail {
    pub problem: ProblemRecord,
    pub similar_problems: Vec<ProblemSummary>,
}

/// Filters accepted by the solution browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionFilter {
    pub keyword: Option<String>,
    pub tag_ids: Vec<TagId>,
    pub sort_type: Option<String>,
    pub page: PageRequest,
}

pub struct ProblemService<R: ProblemRepository> {
    repo: R,
    config: ForumConfig,
}

impl<R: ProblemRepository> ProblemService<R> {
    pub fn new(repo: R, config: ForumConfig) -> Self {
        Self { repo, config }
    }

    pub fn problem_detail(
        &self,
        ctx: &RequestContext,
        problem_id: ProblemId,
    ) -> ServiceResult<ProblemDetail> {
        let problem = self.require_problem(ctx, problem_id)?;
        let similar_problems =
            self.repo
                .similar_problems(problem_id, ctx.viewer(), SIMILAR_PROBLEM_LIMIT)?;
        Ok(ProblemDetail {
            problem,
            similar_problems,
        })
    }

    /// Admin only.
    pub fn create_problem(
        &self,
        ctx: &RequestContext,
        title: String,
        content: String,
        difficulty: &str,
        tag_ids: Vec<TagId>,
    ) -> ServiceResult<ProblemId> {
        ctx.require_admin("problem_new")?;
        let difficulty = Difficulty::parse(difficulty).ok_or_else(|| {
            ServiceError::ValidationFailed(format!("invalid `difficulty` value `{difficulty}`"))
        })?;
        let problem = NewProblem {
            title,
            content,
            difficulty,
            tag_ids,
        };
        Ok(self.repo.create_problem(&problem)?)
    }

    /// Admin only. Returns the existing tag for a duplicate name.
    pub fn create_tag(&self, ctx: &RequestContext, name: &str) -> ServiceResult<Tag> {
        ctx.require_admin("tag_new")?;
        Ok(self.repo.create_tag(name)?)
    }

    pub fn list_tags(&self) -> ServiceResult<Vec<Tag>> {
        Ok(self.repo.list_tags()?)
    }

    pub fn star_problem(
        &self,
        ctx: &RequestContext,
        problem_id: ProblemId,
        is_star: bool,
    ) -> ServiceResult<ReactionOutcome> {
        let user = ctx.require_user()?;
        Ok(self.repo.set_problem_star(problem_id, user.id, is_star)?)
    }

    pub fn record_submission(
        &self,
        ctx: &RequestContext,
        problem_id: ProblemId,
        passed: bool,
    ) -> ServiceResult<()> {
        let user = ctx.require_user()?;
        Ok(self.repo.record_submission(problem_id, user.id, passed)?)
    }

    /// Lists solutions of a problem with content cut to a plain-text preview.
    /// `count` is the filtered total.
    pub fn list_solutions(
        &self,
        ctx: &RequestContext,
        problem_id: ProblemId,
        filter: &SolutionFilter,
    ) -> ServiceResult<Paginated<SolutionRecord>> {
        self.require_problem(ctx, problem_id)?;
        let query = SolutionListQuery {
            problem_id,
            keyword: filter.keyword.clone(),
            tag_ids: filter.tag_ids.clone(),
            sort: SOLUTION_SORT.resolve(filter.sort_type.as_deref()),
            page: Page::resolve(filter.page, self.config.page_limits),
        };
        let preview_chars = self.config.solution_preview_chars;
        let solutions = self.repo.list_solutions(&query)?;
        Ok(solutions.map(|mut solution| {
            solution.content = derive_plain_preview(&solution.content, preview_chars);
            solution
        }))
    }

    /// Full solution. It must belong to `problem_id`.
    pub fn solution_detail(
        &self,
        problem_id: ProblemId,
        solution_id: SolutionId,
    ) -> ServiceResult<SolutionRecord> {
        self.repo
            .get_solution(problem_id, solution_id)?
            .ok_or(ServiceError::NotFound {
                kind: "solution",
                id: solution_id,
            })
    }

    pub fn create_solution(
        &self,
        ctx: &RequestContext,
        problem_id: ProblemId,
        content: String,
        tag_ids: Vec<TagId>,
    ) -> ServiceResult<SolutionId> {
        let user = ctx.require_user()?;
        let solution = NewSolution {
            problem_id,
            create_user: user.id,
            content,
            tag_ids,
        };
        Ok(self.repo.create_solution(&solution)?)
    }

    fn require_problem(
        &self,
        ctx: &RequestContext,
        problem_id: ProblemId,
    ) -> ServiceResult<ProblemRecord> {
        self.repo
            .get_problem(problem_id, ctx.viewer())?
            .ok_or(ServiceError::NotFound {
                kind: "problem",
                id: problem_id,
            })
    }
}
