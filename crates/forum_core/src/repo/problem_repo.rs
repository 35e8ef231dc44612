//! Problem/solution/tag repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist problems, tags, solutions and submission results.
//! - Compute per-viewer `pass_status` / `star_status` at read time.
//! - Serve filtered, sorted, paginated solution listings.
//!
//! # Invariants
//! - Unknown tag ids are silently dropped when linking tags.
//! - Solution listing `count` is computed with the same filter as the page.

use crate::model::problem::{
    Difficulty, NewProblem, NewSolution, ProblemId, ProblemRecord, ProblemSummary, SolutionId,
    SolutionRecord, Tag, TagId,
};
use crate::model::user::UserId;
use crate::model::validation::require_text;
use crate::query::contains_pattern;
use crate::query::page::{Page, Paginated};
use crate::query::sort::{SortColumns, SortKey};
use crate::repo::reaction::{ProblemStar, ReactionLedger, ReactionOutcome};
use crate::repo::{ensure_schema_ready, flag_to_db, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

/// Sortable columns of the solution listing.
pub const SOLUTION_SORT: SortColumns = SortColumns {
    id: "s.id",
    time: "s.create_time",
    likes: Some("s.like_count"),
    comments: Some("s.comment_count"),
    default: SortKey::TimeDesc,
};

/// Per-viewer pass flag over alias `p`; binds the viewer id twice.
pub(crate) const PASS_STATUS_SQL: &str = "CASE WHEN ? IS NULL THEN NULL ELSE EXISTS(
        SELECT 1 FROM submissions sub
        WHERE sub.problem_id = p.id AND sub.user_id = ? AND sub.passed = 1
    ) END";

const SOLUTION_SELECT_SQL: &str = "SELECT
    s.id,
    s.problem_id,
    s.create_user_id,
    u.username AS user_name,
    s.content,
    s.like_count,
    s.comment_count,
    s.create_time,
    s.last_update_time
FROM solutions s
INNER JOIN users u ON u.id = s.create_user_id";

/// Query options for one problem's solution listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionListQuery {
    pub problem_id: ProblemId,
    /// Literal substring of the solution content.
    pub keyword: Option<String>,
    /// Matches solutions carrying any of these tags.
    pub tag_ids: Vec<TagId>,
    pub sort: SortKey,
    pub page: Page,
}

/// Repository interface for problem-set data.
pub trait ProblemRepository {
    /// Creates a tag, or returns the existing one with the same name.
    fn create_tag(&self, name: &str) -> RepoResult<Tag>;
    /// All tags ordered by name.
    fn list_tags(&self) -> RepoResult<Vec<Tag>>;
    fn create_problem(&self, problem: &NewProblem) -> RepoResult<ProblemId>;
    fn get_problem(
        &self,
        id: ProblemId,
        viewer: Option<UserId>,
    ) -> RepoResult<Option<ProblemRecord>>;
    /// Other problems sharing at least one tag, by ascending id.
    fn similar_problems(
        &self,
        id: ProblemId,
        viewer: Option<UserId>,
        limit: u32,
    ) -> RepoResult<Vec<ProblemSummary>>;
    fn set_problem_star(
        &self,
        id: ProblemId,
        user_id: UserId,
        want_starred: bool,
    ) -> RepoResult<ReactionOutcome>;
    /// Stores one judged result.
    fn record_submission(
        &self,
        problem_id: ProblemId,
        user_id: UserId,
        passed: bool,
    ) -> RepoResult<()>;
    fn create_solution(&self, solution: &NewSolution) -> RepoResult<SolutionId>;
    /// Loads a solution only when it belongs to `problem_id`.
    fn get_solution(
        &self,
        problem_id: ProblemId,
        solution_id: SolutionId,
    ) -> RepoResult<Option<SolutionRecord>>;
    fn list_solutions(&self, query: &SolutionListQuery) -> RepoResult<Paginated<SolutionRecord>>;
}

/// SQLite-backed problem repository.
pub struct SqliteProblemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProblemRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProblemRepository for SqliteProblemRepository<'_> {
    fn create_tag(&self, name: &str) -> RepoResult<Tag> {
        require_text("name", name)?;
        let name = name.trim();
        self.conn
            .execute("INSERT OR IGNORE INTO tags (name) VALUES (?1);", [name])?;
        let tag = self.conn.query_row(
            "SELECT id, name FROM tags WHERE name = ?1;",
            [name],
            |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )?;
        Ok(tag)
    }

    fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tags ORDER BY name COLLATE NOCASE ASC, id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
            });
        }
        Ok(tags)
    }

    fn create_problem(&self, problem: &NewProblem) -> RepoResult<ProblemId> {
        problem.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO problems (title, content, difficulty) VALUES (?1, ?2, ?3);",
            params![
                problem.title.trim(),
                problem.content.as_str(),
                problem.difficulty.as_db()
            ],
        )?;
        let problem_id = tx.last_insert_rowid();
        link_tags(&tx, "problem_tags", "problem_id", problem_id, &problem.tag_ids)?;
        tx.commit()?;

        Ok(problem_id)
    }

    fn get_problem(
        &self,
        id: ProblemId,
        viewer: Option<UserId>,
    ) -> RepoResult<Option<ProblemRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT
                p.id,
                p.title,
                p.content,
                p.difficulty,
                p.star_count,
                p.create_time,
                {PASS_STATUS_SQL} AS pass_status,
                CASE WHEN ? IS NULL THEN NULL ELSE EXISTS(
                    SELECT 1 FROM problem_stars ps WHERE ps.problem_id = p.id AND ps.user_id = ?
                ) END AS star_status
             FROM problems p
             WHERE p.id = ?;"
        ))?;
        let mut rows = stmt.query(params![viewer, viewer, viewer, viewer, id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        Ok(Some(ProblemRecord {
            id,
            title: row.get("title")?,
            content: row.get("content")?,
            difficulty: parse_difficulty(row)?,
            tags: load_tags(self.conn, "problem_tags", "problem_id", id)?,
            star_count: row.get("star_count")?,
            create_time: row.get("create_time")?,
            pass_status: row.get("pass_status")?,
            star_status: row.get("star_status")?,
        }))
    }

    fn similar_problems(
        &self,
        id: ProblemId,
        viewer: Option<UserId>,
        limit: u32,
    ) -> RepoResult<Vec<ProblemSummary>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT p.id, p.title, p.difficulty, {PASS_STATUS_SQL} AS pass_status
             FROM problems p
             WHERE p.id <> ?
               AND EXISTS (
                   SELECT 1
                   FROM problem_tags mine
                   INNER JOIN problem_tags theirs ON theirs.tag_id = mine.tag_id
                   WHERE mine.problem_id = ? AND theirs.problem_id = p.id
               )
             ORDER BY p.id ASC
             LIMIT ?;"
        ))?;
        let mut rows = stmt.query(params![viewer, viewer, id, id, i64::from(limit)])?;
        let mut problems = Vec::new();
        while let Some(row) = rows.next()? {
            problems.push(parse_problem_summary(row)?);
        }
        Ok(problems)
    }

    fn set_problem_star(
        &self,
        id: ProblemId,
        user_id: UserId,
        want_starred: bool,
    ) -> RepoResult<ReactionOutcome> {
        ReactionLedger::<ProblemStar>::new(self.conn).set(id, user_id, want_starred)
    }

    fn record_submission(
        &self,
        problem_id: ProblemId,
        user_id: UserId,
        passed: bool,
    ) -> RepoResult<()> {
        if !problem_exists(self.conn, problem_id)? {
            return Err(RepoError::NotFound {
                kind: "problem",
                id: problem_id,
            });
        }
        self.conn.execute(
            "INSERT INTO submissions (problem_id, user_id, passed) VALUES (?1, ?2, ?3);",
            params![problem_id, user_id, flag_to_db(passed)],
        )?;
        Ok(())
    }

    fn create_solution(&self, solution: &NewSolution) -> RepoResult<SolutionId> {
        solution.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !problem_exists(&tx, solution.problem_id)? {
            return Err(RepoError::NotFound {
                kind: "problem",
                id: solution.problem_id,
            });
        }
        tx.execute(
            "INSERT INTO solutions (problem_id, create_user_id, content) VALUES (?1, ?2, ?3);",
            params![
                solution.problem_id,
                solution.create_user,
                solution.content.as_str()
            ],
        )?;
        let solution_id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE solutions SET last_update_time = create_time WHERE id = ?1;",
            [solution_id],
        )?;
        link_tags(
            &tx,
            "solution_tags",
            "solution_id",
            solution_id,
            &solution.tag_ids,
        )?;
        tx.commit()?;

        Ok(solution_id)
    }

    fn get_solution(
        &self,
        problem_id: ProblemId,
        solution_id: SolutionId,
    ) -> RepoResult<Option<SolutionRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SOLUTION_SELECT_SQL} WHERE s.id = ?1 AND s.problem_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![solution_id, problem_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_solution_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_solutions(&self, query: &SolutionListQuery) -> RepoResult<Paginated<SolutionRecord>> {
        let mut filter = String::from(" WHERE s.problem_id = ?");
        let mut bind_values = vec![Value::Integer(query.problem_id)];

        if let Some(keyword) = query
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
        {
            filter.push_str(" AND s.content LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(contains_pattern(keyword)));
        }

        if !query.tag_ids.is_empty() {
            let placeholders = vec!["?"; query.tag_ids.len()].join(", ");
            filter.push_str(&format!(
                " AND EXISTS (
                    SELECT 1 FROM solution_tags st
                    WHERE st.solution_id = s.id AND st.tag_id IN ({placeholders})
                )"
            ));
            bind_values.extend(query.tag_ids.iter().copied().map(Value::Integer));
        }

        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM solutions s{filter};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;

        let mut sql = format!(
            "{SOLUTION_SELECT_SQL}{filter} ORDER BY {}",
            SOLUTION_SORT.order_by(query.sort)
        );
        query.page.push_sql(&mut sql, &mut bind_values);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut solutions = Vec::new();
        while let Some(row) = rows.next()? {
            solutions.push(parse_solution_row(self.conn, row)?);
        }

        Ok(Paginated {
            count: count as u64,
            items: solutions,
        })
    }
}

pub(crate) fn problem_exists(conn: &Connection, id: ProblemId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM problems WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn parse_problem_summary(row: &Row<'_>) -> RepoResult<ProblemSummary> {
    Ok(ProblemSummary {
        id: row.get("id")?,
        title: row.get("title")?,
        difficulty: parse_difficulty(row)?,
        pass_status: row.get("pass_status")?,
    })
}

fn parse_difficulty(row: &Row<'_>) -> RepoResult<Difficulty> {
    let value: String = row.get("difficulty")?;
    Difficulty::parse(&value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid difficulty `{value}` in problems.difficulty"))
    })
}

fn parse_solution_row(conn: &Connection, row: &Row<'_>) -> RepoResult<SolutionRecord> {
    let id: SolutionId = row.get("id")?;
    Ok(SolutionRecord {
        id,
        problem_id: row.get("problem_id")?,
        create_user: row.get("create_user_id")?,
        user_name: row.get("user_name")?,
        content: row.get("content")?,
        tags: load_tags(conn, "solution_tags", "solution_id", id)?,
        like_count: row.get("like_count")?,
        comment_count: row.get("comment_count")?,
        create_time: row.get("create_time")?,
        last_update_time: row.get("last_update_time")?,
    })
}

fn link_tags(
    conn: &Connection,
    link_table: &'static str,
    owner_column: &'static str,
    owner_id: i64,
    tag_ids: &[TagId],
) -> RepoResult<()> {
    let sql = format!(
        "INSERT OR IGNORE INTO {link_table} ({owner_column}, tag_id)
         SELECT ?1, id FROM tags WHERE id = ?2;"
    );
    for tag_id in tag_ids {
        conn.execute(&sql, params![owner_id, tag_id])?;
    }
    Ok(())
}

fn load_tags(
    conn: &Connection,
    link_table: &'static str,
    owner_column: &'static str,
    owner_id: i64,
) -> RepoResult<Vec<Tag>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT t.id, t.name
         FROM {link_table} link
         INNER JOIN tags t ON t.id = link.tag_id
         WHERE link.{owner_column} = ?1
         ORDER BY t.name COLLATE NOCASE ASC, t.id ASC;"
    ))?;
    let mut rows = stmt.query([owner_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(Tag {
            id: row.get(0)?,
            name: row.get(1)?,
        });
    }
    Ok(tags)
}
