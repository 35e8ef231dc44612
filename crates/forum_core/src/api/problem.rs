//! Problem-set handlers: problems, stars, submissions, solutions, tags.

use super::forum::{log_reaction, ReactionPayload};
use super::{respond, Ack, Backend, Envelope};
use crate::context::RequestContext;
use crate::model::problem::{
    Difficulty, ProblemId, ProblemRecord, ProblemSummary, SolutionId, SolutionRecord, Tag, TagId,
};
use crate::model::user::UserId;
use crate::query::page::PageRequest;
use crate::repo::problem_repo::SqliteProblemRepository;
use crate::service::problem_service::{ProblemService, SolutionFilter};
use crate::service::ServiceResult;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemNewRequest {
    pub title: String,
    pub content: String,
    /// `easy|medium|hard`.
    pub difficulty: String,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionListRequest {
    pub problem_id: ProblemId,
    pub keyword: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagId>,
    pub sort_type: Option<String>,
    pub page_num: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionCreateRequest {
    pub problem_id: ProblemId,
    pub content: String,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemBrief {
    pub id: ProblemId,
    pub title: String,
    pub difficulty: Difficulty,
    pub pass_status: Option<bool>,
}

impl From<ProblemSummary> for ProblemBrief {
    fn from(problem: ProblemSummary) -> Self {
        Self {
            id: problem.id,
            title: problem.title,
            difficulty: problem.difficulty,
            pass_status: problem.pass_status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDescription {
    pub id: ProblemId,
    pub title: String,
    pub content: String,
    pub difficulty: Difficulty,
    pub tags: Vec<Tag>,
    pub star_count: i64,
    pub create_time: i64,
    pub pass_status: Option<bool>,
    pub star_status: Option<bool>,
    pub similar_problems: Vec<ProblemBrief>,
}

impl ProblemDescription {
    fn new(problem: ProblemRecord, similar: Vec<ProblemSummary>) -> Self {
        Self {
            id: problem.id,
            title: problem.title,
            content: problem.content,
            difficulty: problem.difficulty,
            tags: problem.tags,
            star_count: problem.star_count,
            create_time: problem.create_time,
            pass_status: problem.pass_status,
            star_status: problem.star_status,
            similar_problems: similar.into_iter().map(ProblemBrief::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemCreated {
    pub problem_id: ProblemId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionItem {
    pub id: SolutionId,
    pub user_id: UserId,
    pub user_name: String,
    pub content: String,
    pub tags: Vec<Tag>,
    pub like_count: i64,
    pub comment_count: i64,
    pub create_time: i64,
    pub last_update_time: i64,
}

impl From<SolutionRecord> for SolutionItem {
    fn from(solution: SolutionRecord) -> Self {
        Self {
            id: solution.id,
            user_id: solution.create_user,
            user_name: solution.user_name,
            content: solution.content,
            tags: solution.tags,
            like_count: solution.like_count,
            comment_count: solution.comment_count,
            create_time: solution.create_time,
            last_update_time: solution.last_update_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionListPayload {
    pub count: u64,
    pub solutions: Vec<SolutionItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionCreated {
    pub solution_id: SolutionId,
}

impl Backend<'_> {
    pub fn problem_description(
        &self,
        ctx: &RequestContext,
        problem_id: ProblemId,
    ) -> Envelope<ProblemDescription> {
        let result = self.with_problems(|service| {
            let detail = service.problem_detail(ctx, problem_id)?;
            Ok(ProblemDescription::new(
                detail.problem,
                detail.similar_problems,
            ))
        });
        respond("problem_description", ctx, result)
    }

    /// Admin only.
    pub fn problem_new(
        &self,
        ctx: &RequestContext,
        request: ProblemNewRequest,
    ) -> Envelope<ProblemCreated> {
        let result = self.with_problems(|service| {
            let problem_id = service.create_problem(
                ctx,
                request.title,
                request.content,
                &request.difficulty,
                request.tag_ids,
            )?;
            info!(
                "event=problem_create module=api status=ok request_id={} problem_id={problem_id}",
                ctx.request_id
            );
            Ok(ProblemCreated { problem_id })
        });
        respond("problem_new", ctx, result)
    }

    pub fn problem_star(
        &self,
        ctx: &RequestContext,
        problem_id: ProblemId,
        is_star: bool,
    ) -> Envelope<ReactionPayload> {
        let result = self.with_problems(|service| {
            let outcome = service.star_problem(ctx, problem_id, is_star)?;
            log_reaction(ctx, "problem", problem_id, &outcome);
            Ok(outcome.into())
        });
        respond("problem_star", ctx, result)
    }

    pub fn problem_submission_record(
        &self,
        ctx: &RequestContext,
        problem_id: ProblemId,
        passed: bool,
    ) -> Envelope<Ack> {
        let result = self.with_problems(|service| {
            service.record_submission(ctx, problem_id, passed)?;
            Ok(Ack {})
        });
        respond("problem_submission_record", ctx, result)
    }

    pub fn problem_solutions(
        &self,
        ctx: &RequestContext,
        request: &SolutionListRequest,
    ) -> Envelope<SolutionListPayload> {
        let result = self.with_problems(|service| {
            let filter = SolutionFilter {
                keyword: request.keyword.clone(),
                tag_ids: request.tags.clone(),
                sort_type: request.sort_type.clone(),
                page: PageRequest {
                    page_num: request.page_num,
                    page_size: request.page_size,
                },
            };
            let solutions = service.list_solutions(ctx, request.problem_id, &filter)?;
            Ok(SolutionListPayload {
                count: solutions.count,
                solutions: solutions.items.into_iter().map(SolutionItem::from).collect(),
            })
        });
        respond("problem_solutions", ctx, result)
    }

    pub fn problem_solution_detail(
        &self,
        ctx: &RequestContext,
        problem_id: ProblemId,
        solution_id: SolutionId,
    ) -> Envelope<SolutionItem> {
        let result = self.with_problems(|service| {
            Ok(service.solution_detail(problem_id, solution_id)?.into())
        });
        respond("problem_solution_detail", ctx, result)
    }

    pub fn problem_solution_create(
        &self,
        ctx: &RequestContext,
        request: SolutionCreateRequest,
    ) -> Envelope<SolutionCreated> {
        let result = self.with_problems(|service| {
            let solution_id =
                service.create_solution(ctx, request.problem_id, request.content, request.tag_ids)?;
            info!(
                "event=solution_create module=api status=ok request_id={} problem_id={} solution_id={solution_id}",
                ctx.request_id, request.problem_id
            );
            Ok(SolutionCreated { solution_id })
        });
        respond("problem_solution_create", ctx, result)
    }

    pub fn tag_list(&self, ctx: &RequestContext) -> Envelope<Vec<Tag>> {
        let result = self.with_problems(|service| service.list_tags());
        respond("tag_list", ctx, result)
    }

    /// Admin only.
    pub fn tag_new(&self, ctx: &RequestContext, name: &str) -> Envelope<Tag> {
        let result = self.with_problems(|service| service.create_tag(ctx, name));
        respond("tag_new", ctx, result)
    }

    fn with_problems<T>(
        &self,
        f: impl FnOnce(&ProblemService<SqliteProblemRepository<'_>>) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let repo = SqliteProblemRepository::try_new(self.conn())?;
        let service = ProblemService::new(repo, *self.config());
        f(&service)
    }
}
