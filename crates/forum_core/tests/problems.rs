mod common;

use common::{as_user, create_admin, create_user, set_create_time};
use forum_core::api::problem::{ProblemNewRequest, SolutionCreateRequest, SolutionListRequest};
use forum_core::config::SOLUTION_PREVIEW_CHARS_KEY;
use forum_core::db::open_db_in_memory;
use forum_core::repo::config_repo::{ConfigRepository, SqliteConfigRepository};
use forum_core::{Backend, RequestContext};
use serde_json::json;

fn new_problem(
    backend: &Backend<'_>,
    admin: &RequestContext,
    title: &str,
    tag_ids: Vec<i64>,
) -> i64 {
    backend
        .problem_new(
            admin,
            ProblemNewRequest {
                title: title.to_string(),
                content: format!("## {title}\n\nGiven an array..."),
                difficulty: "Medium".to_string(),
                tag_ids,
            },
        )
        .data
        .unwrap()
        .problem_id
}

fn new_solution(
    backend: &Backend<'_>,
    ctx: &RequestContext,
    problem_id: i64,
    content: &str,
    tag_ids: Vec<i64>,
) -> i64 {
    backend
        .problem_solution_create(
            ctx,
            SolutionCreateRequest {
                problem_id,
                content: content.to_string(),
                tag_ids,
            },
        )
        .data
        .unwrap()
        .solution_id
}

fn solutions_request(problem_id: i64) -> SolutionListRequest {
    SolutionListRequest {
        problem_id,
        keyword: None,
        tags: Vec::new(),
        sort_type: None,
        page_num: None,
        page_size: None,
    }
}

#[test]
fn only_admins_publish_problems() {
    let conn = open_db_in_memory().unwrap();
    let backend = Backend::new(&conn).unwrap();
    let user = as_user(&create_user(&conn, "user"));

    let request = ProblemNewRequest {
        title: "two sum".to_string(),
        content: "find two numbers".to_string(),
        difficulty: "easy".to_string(),
        tag_ids: Vec::new(),
    };
    let denied = backend.problem_new(&user, request.clone());
    assert_eq!(denied.err.as_deref(), Some("permission denied: problem_new"));

    let admin = as_user(&create_admin(&conn, "root"));
    let bad_difficulty = backend.problem_new(
        &admin,
        ProblemNewRequest {
            difficulty: "impossible".to_string(),
            ..request.clone()
        },
    );
    assert_eq!(
        bad_difficulty.err.as_deref(),
        Some("invalid `difficulty` value `impossible`")
    );
    assert!(backend.problem_new(&admin, request).is_ok());
}

#[test]
fn description_reports_viewer_flags_and_similar_problems() {
    let conn = open_db_in_memory().unwrap();
    let backend = Backend::new(&conn).unwrap();
    let admin = as_user(&create_admin(&conn, "root"));
    let solver = as_user(&create_user(&conn, "solver"));
    let graph = backend.tag_new(&admin, "graph").data.unwrap();
    let dp = backend.tag_new(&admin, "dp").data.unwrap();

    let target = new_problem(&backend, &admin, "shortest path", vec![graph.id]);
    let mut similar = Vec::new();
    for index in 0..6 {
        similar.push(new_problem(
            &backend,
            &admin,
            &format!("graph {index}"),
            vec![graph.id, dp.id],
        ));
    }
    new_problem(&backend, &admin, "unrelated", vec![dp.id]);

    backend
        .problem_submission_record(&solver, target, true)
        .data
        .unwrap();
    backend.problem_star(&solver, target, true).data.unwrap();

    let seen = backend.problem_description(&solver, target).data.unwrap();
    assert_eq!(seen.pass_status, Some(true));
    assert_eq!(seen.star_status, Some(true));
    assert_eq!(seen.star_count, 1);
    assert_eq!(
        seen.similar_problems
            .iter()
            .map(|problem| problem.id)
            .collect::<Vec<_>>(),
        similar[..5].to_vec()
    );
    assert!(seen
        .similar_problems
        .iter()
        .all(|problem| problem.pass_status == Some(false)));

    let anonymous = backend
        .problem_description(&RequestContext::anonymous(), target)
        .data
        .unwrap();
    assert_eq!(anonymous.pass_status, None);
    assert_eq!(anonymous.star_status, None);

    let missing = backend.problem_description(&solver, 999);
    assert_eq!(missing.err.as_deref(), Some("problem not found: 999"));
}

#[test]
fn problem_star_counter_tracks_distinct_users() {
    let conn = open_db_in_memory().unwrap();
    let backend = Backend::new(&conn).unwrap();
    let admin = as_user(&create_admin(&conn, "root"));
    let alice = as_user(&create_user(&conn, "alice"));
    let problem_id = new_problem(&backend, &admin, "heap", Vec::new());

    assert_eq!(backend.problem_star(&alice, problem_id, true).data.unwrap().count, 1);
    assert_eq!(backend.problem_star(&alice, problem_id, true).data.unwrap().count, 1);
    assert_eq!(backend.problem_star(&admin, problem_id, true).data.unwrap().count, 2);
    assert_eq!(backend.problem_star(&alice, problem_id, false).data.unwrap().count, 1);
}

#[test]
fn solution_listing_filters_and_counts_the_filtered_set() {
    let conn = open_db_in_memory().unwrap();
    let backend = Backend::new(&conn).unwrap();
    let admin = as_user(&create_admin(&conn, "root"));
    let alice = as_user(&create_user(&conn, "alice"));
    let greedy = backend.tag_new(&admin, "greedy").data.unwrap();
    let problem_id = new_problem(&backend, &admin, "intervals", Vec::new());
    let other_problem = new_problem(&backend, &admin, "other", Vec::new());

    for index in 0..5 {
        let tags = if index % 2 == 0 { vec![greedy.id] } else { Vec::new() };
        let solution_id = new_solution(
            &backend,
            &alice,
            problem_id,
            &format!("approach {index}: sort by end"),
            tags,
        );
        set_create_time(&conn, "solutions", solution_id, 1_000 + index);
    }
    new_solution(&backend, &alice, other_problem, "sort by end elsewhere", Vec::new());

    let all = backend
        .problem_solutions(&alice, &solutions_request(problem_id))
        .data
        .unwrap();
    assert_eq!(all.count, 5);
    assert!(all.solutions[0].content.starts_with("approach 4"));

    let tagged = backend
        .problem_solutions(
            &alice,
            &SolutionListRequest {
                tags: vec![greedy.id],
                page_size: Some(2),
                ..solutions_request(problem_id)
            },
        )
        .data
        .unwrap();
    assert_eq!(tagged.count, 3);
    assert_eq!(tagged.solutions.len(), 2);

    let keyword = backend
        .problem_solutions(
            &alice,
            &SolutionListRequest {
                keyword: Some("APPROACH 3".to_string()),
                ..solutions_request(problem_id)
            },
        )
        .data
        .unwrap();
    assert_eq!(keyword.count, 1);

    let ascending = backend
        .problem_solutions(
            &alice,
            &SolutionListRequest {
                sort_type: Some("timeAsc".to_string()),
                ..solutions_request(problem_id)
            },
        )
        .data
        .unwrap();
    assert!(ascending.solutions[0].content.starts_with("approach 0"));
}

#[test]
fn listing_shows_plain_preview_and_detail_shows_full_content() {
    let conn = open_db_in_memory().unwrap();
    let backend = Backend::new(&conn).unwrap();
    let admin = as_user(&create_admin(&conn, "root"));
    let alice = as_user(&create_user(&conn, "alice"));
    let problem_id = new_problem(&backend, &admin, "strings", Vec::new());
    let other_problem = new_problem(&backend, &admin, "other", Vec::new());

    let long_body = format!(
        "# Idea\n\n![diagram](img.png) Use **two pointers**.\n\n```rust\n{}\n```",
        "x".repeat(400)
    );
    let solution_id = new_solution(&backend, &alice, problem_id, &long_body, Vec::new());

    let listed = backend
        .problem_solutions(&alice, &solutions_request(problem_id))
        .data
        .unwrap();
    let preview = &listed.solutions[0].content;
    assert_eq!(preview.chars().count(), 200);
    assert!(preview.starts_with("Idea Use two pointers."));
    assert!(!preview.contains("img.png"));

    let detail = backend
        .problem_solution_detail(&alice, problem_id, solution_id)
        .data
        .unwrap();
    assert_eq!(detail.content, long_body);
    assert_eq!(detail.create_time, detail.last_update_time);

    let wrong_problem = backend.problem_solution_detail(&alice, other_problem, solution_id);
    assert_eq!(
        wrong_problem.err.as_deref(),
        Some(format!("solution not found: {solution_id}").as_str())
    );
}

#[test]
fn preview_length_follows_stored_configuration() {
    let conn = open_db_in_memory().unwrap();
    SqliteConfigRepository::try_new(&conn)
        .unwrap()
        .set_value(SOLUTION_PREVIEW_CHARS_KEY, &json!(10))
        .unwrap();
    let backend = Backend::new(&conn).unwrap();
    let admin = as_user(&create_admin(&conn, "root"));
    let problem_id = new_problem(&backend, &admin, "config", Vec::new());
    new_solution(&backend, &admin, problem_id, "abcdefghijklmnop", Vec::new());

    let listed = backend
        .problem_solutions(&admin, &solutions_request(problem_id))
        .data
        .unwrap();
    assert_eq!(listed.solutions[0].content, "abcdefghij");
}

#[test]
fn solution_creation_ignores_unknown_tags_and_requires_problem() {
    let conn = open_db_in_memory().unwrap();
    let backend = Backend::new(&conn).unwrap();
    let admin = as_user(&create_admin(&conn, "root"));
    let alice = as_user(&create_user(&conn, "alice"));
    let tag = backend.tag_new(&admin, "math").data.unwrap();
    let problem_id = new_problem(&backend, &admin, "gcd", Vec::new());

    let solution_id = new_solution(&backend, &alice, problem_id, "euclid", vec![tag.id, 999]);
    let detail = backend
        .problem_solution_detail(&alice, problem_id, solution_id)
        .data
        .unwrap();
    assert_eq!(detail.tags, vec![tag]);

    let missing = backend.problem_solution_create(
        &alice,
        SolutionCreateRequest {
            problem_id: 999,
            content: "lost".to_string(),
            tag_ids: Vec::new(),
        },
    );
    assert_eq!(missing.err.as_deref(), Some("problem not found: 999"));

    let anonymous = backend.problem_solution_create(
        &RequestContext::anonymous(),
        SolutionCreateRequest {
            problem_id,
            content: "sneaky".to_string(),
            tag_ids: Vec::new(),
        },
    );
    assert_eq!(anonymous.err.as_deref(), Some("authentication required"));
}

#[test]
fn tag_list_is_ordered_by_name_and_deduplicated() {
    let conn = open_db_in_memory().unwrap();
    let backend = Backend::new(&conn).unwrap();
    let admin = as_user(&create_admin(&conn, "root"));
    let first = backend.tag_new(&admin, "Tree").data.unwrap();
    backend.tag_new(&admin, "array").data.unwrap();
    let duplicate = backend.tag_new(&admin, "tree").data.unwrap();
    assert_eq!(first.id, duplicate.id);

    let names = backend
        .tag_list(&RequestContext::anonymous())
        .data
        .unwrap()
        .into_iter()
        .map(|tag| tag.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["array", "Tree"]);
}
