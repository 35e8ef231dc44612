//! Problem list repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist curated problem lists and their items.
//! - Drive the soft-delete lifecycle against the star reference count.
//! - Keep ownership checks and the guarded mutation in one transaction.
//!
//! # Invariants
//! - Normal reads (`get_list(.., false)`, `list_public`) skip deleted lists.
//! - A pending list whose star set drains is destroyed in the same
//!   transaction that removed the last star.
//! - A pending list cannot gain new stars, nor can another user's private
//!   list.

use crate::model::lifecycle::{Disposition, Lifecycle};
use crate::model::problem::{
    NewProblemList, ProblemId, ProblemListId, ProblemListRecord, ProblemSummary,
};
use crate::model::user::UserId;
use crate::query::contains_pattern;
use crate::query::page::{Page, Paginated};
use crate::query::sort::{SortColumns, SortKey};
use crate::repo::problem_repo::{parse_problem_summary, PASS_STATUS_SQL};
use crate::repo::reaction::{ProblemListStar, ReactionLedger, ReactionOutcome};
use crate::repo::{ensure_schema_ready, flag_from_db, flag_to_db, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

/// Sortable columns of the public list browser.
pub const PROBLEM_LIST_SORT: SortColumns = SortColumns {
    id: "l.id",
    time: "l.create_time",
    likes: Some("l.star_count"),
    comments: None,
    default: SortKey::TimeDesc,
};

const PROBLEM_LIST_SELECT_SQL: &str = "SELECT
    l.id,
    l.title,
    l.summary,
    l.is_public,
    l.create_user_id,
    u.username AS user_name,
    l.star_count,
    l.is_deleted,
    l.create_time,
    (SELECT COUNT(*) FROM problem_list_items i WHERE i.problem_list_id = l.id) AS problem_count
FROM problem_lists l
INNER JOIN users u ON u.id = l.create_user_id";

/// Query options for browsing public lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemListQuery {
    /// Case-insensitive substring of title or summary.
    pub keyword: Option<String>,
    /// Hides lists created by this user.
    pub exclude_owner: Option<UserId>,
    pub sort: SortKey,
    pub page: Page,
}

/// Result of an owner-gated mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnedMutation<T> {
    /// Requester does not own the list; nothing changed.
    NotOwner,
    Applied(T),
}

/// Result of adding/removing list items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemsUpdate {
    /// Number of problems newly added.
    Added(usize),
    /// Number of problems removed.
    Removed(usize),
    /// Add requested but every id is already in the list.
    AlreadyPresent,
    /// Remove requested but no id is in the list.
    NonePresent,
}

/// Result of a star change on a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarUpdate {
    pub outcome: ReactionOutcome,
    /// The list was pending deletion and lost its last star.
    pub destroyed: bool,
}

/// Repository interface for problem lists.
pub trait ProblemListRepository {
    fn create_list(&self, list: &NewProblemList) -> RepoResult<ProblemListId>;
    /// Loads one list; deleted lists only when `include_deleted`.
    fn get_list(
        &self,
        id: ProblemListId,
        include_deleted: bool,
    ) -> RepoResult<Option<ProblemListRecord>>;
    /// Public, non-deleted lists.
    fn list_public(&self, query: &ProblemListQuery) -> RepoResult<Paginated<ProblemListRecord>>;
    /// Problems of one list by ascending id, with viewer pass flags.
    fn list_problems(
        &self,
        id: ProblemListId,
        viewer: Option<UserId>,
    ) -> RepoResult<Vec<ProblemSummary>>;
    /// Number of problems of the list passed by `user_id`.
    fn pass_count(&self, id: ProblemListId, user_id: UserId) -> RepoResult<u64>;
    fn is_starred(&self, id: ProblemListId, user_id: UserId) -> RepoResult<bool>;
    fn update_items(
        &self,
        id: ProblemListId,
        requester: UserId,
        problem_ids: &[ProblemId],
        is_add: bool,
    ) -> RepoResult<OwnedMutation<ItemsUpdate>>;
    /// Soft- or hard-deletes depending on remaining stars.
    fn request_delete(
        &self,
        id: ProblemListId,
        requester: UserId,
    ) -> RepoResult<OwnedMutation<Disposition>>;
    /// Flips the caller's star. Private lists of other users behave as
    /// missing for new stars.
    fn toggle_star(&self, id: ProblemListId, user_id: UserId) -> RepoResult<StarUpdate>;
}

/// SQLite-backed problem list repository.
pub struct SqliteProblemListRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProblemListRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProblemListRepository for SqliteProblemListRepository<'_> {
    fn create_list(&self, list: &NewProblemList) -> RepoResult<ProblemListId> {
        list.validate()?;
        self.conn.execute(
            "INSERT INTO problem_lists (title, summary, is_public, create_user_id)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                list.title.trim(),
                list.summary.trim(),
                flag_to_db(list.is_public),
                list.create_user
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_list(
        &self,
        id: ProblemListId,
        include_deleted: bool,
    ) -> RepoResult<Option<ProblemListRecord>> {
        load_list(self.conn, id, include_deleted)
    }

    fn list_public(&self, query: &ProblemListQuery) -> RepoResult<Paginated<ProblemListRecord>> {
        let mut filter = String::from(" WHERE l.is_deleted = 0 AND l.is_public = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(keyword) = query
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
        {
            filter.push_str(" AND (l.title LIKE ? ESCAPE '\\' OR l.summary LIKE ? ESCAPE '\\')");
            let pattern = contains_pattern(keyword);
            bind_values.push(Value::Text(pattern.clone()));
            bind_values.push(Value::Text(pattern));
        }

        if let Some(owner) = query.exclude_owner {
            filter.push_str(" AND l.create_user_id <> ?");
            bind_values.push(Value::Integer(owner));
        }

        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM problem_lists l{filter};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;

        let mut sql = format!(
            "{PROBLEM_LIST_SELECT_SQL}{filter} ORDER BY {}",
            PROBLEM_LIST_SORT.order_by(query.sort)
        );
        query.page.push_sql(&mut sql, &mut bind_values);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(parse_list_row(row)?);
        }

        Ok(Paginated {
            count: count as u64,
            items: lists,
        })
    }

    fn list_problems(
        &self,
        id: ProblemListId,
        viewer: Option<UserId>,
    ) -> RepoResult<Vec<ProblemSummary>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT p.id, p.title, p.difficulty, {PASS_STATUS_SQL} AS pass_status
             FROM problem_list_items i
             INNER JOIN problems p ON p.id = i.problem_id
             WHERE i.problem_list_id = ?
             ORDER BY p.id ASC;"
        ))?;
        let mut rows = stmt.query(params![viewer, viewer, id])?;
        let mut problems = Vec::new();
        while let Some(row) = rows.next()? {
            problems.push(parse_problem_summary(row)?);
        }
        Ok(problems)
    }

    fn pass_count(&self, id: ProblemListId, user_id: UserId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM problem_list_items i
             WHERE i.problem_list_id = ?1
               AND EXISTS (
                   SELECT 1 FROM submissions sub
                   WHERE sub.problem_id = i.problem_id AND sub.user_id = ?2 AND sub.passed = 1
               );",
            params![id, user_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn is_starred(&self, id: ProblemListId, user_id: UserId) -> RepoResult<bool> {
        ReactionLedger::<ProblemListStar>::new(self.conn).is_member(id, user_id)
    }

    fn update_items(
        &self,
        id: ProblemListId,
        requester: UserId,
        problem_ids: &[ProblemId],
        is_add: bool,
    ) -> RepoResult<OwnedMutation<ItemsUpdate>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let list = load_list(&tx, id, false)?.ok_or(RepoError::NotFound {
            kind: "problem list",
            id,
        })?;
        if list.create_user != requester {
            return Ok(OwnedMutation::NotOwner);
        }

        let requested = problem_ids.iter().copied().collect::<BTreeSet<_>>();
        let mut present = 0_usize;
        for problem_id in &requested {
            if list_contains(&tx, id, *problem_id)? {
                present += 1;
            }
        }

        let update = if is_add {
            if present == requested.len() {
                ItemsUpdate::AlreadyPresent
            } else {
                let mut added = 0_usize;
                for problem_id in &requested {
                    added += tx.execute(
                        "INSERT OR IGNORE INTO problem_list_items (problem_list_id, problem_id)
                         SELECT ?1, id FROM problems WHERE id = ?2;",
                        params![id, problem_id],
                    )?;
                }
                ItemsUpdate::Added(added)
            }
        } else if present == 0 {
            ItemsUpdate::NonePresent
        } else {
            let mut removed = 0_usize;
            for problem_id in &requested {
                removed += tx.execute(
                    "DELETE FROM problem_list_items WHERE problem_list_id = ?1 AND problem_id = ?2;",
                    params![id, problem_id],
                )?;
            }
            ItemsUpdate::Removed(removed)
        };

        tx.commit()?;
        Ok(OwnedMutation::Applied(update))
    }

    fn request_delete(
        &self,
        id: ProblemListId,
        requester: UserId,
    ) -> RepoResult<OwnedMutation<Disposition>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let list = load_list(&tx, id, true)?.ok_or(RepoError::NotFound {
            kind: "problem list",
            id,
        })?;
        if list.create_user != requester {
            return Ok(OwnedMutation::NotOwner);
        }

        let references = ReactionLedger::<ProblemListStar>::new(&tx).count(id)?;
        let disposition = list
            .lifecycle
            .on_delete_requested(u64::try_from(references).unwrap_or(0));
        apply_disposition(&tx, id, disposition)?;
        tx.commit()?;

        Ok(OwnedMutation::Applied(disposition))
    }

    fn toggle_star(&self, id: ProblemListId, user_id: UserId) -> RepoResult<StarUpdate> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let not_found = RepoError::NotFound {
            kind: "problem list",
            id,
        };
        let Some(list) = load_list(&tx, id, true)? else {
            return Err(not_found);
        };

        let ledger = ReactionLedger::<ProblemListStar>::new(&tx);
        let want_starred = !ledger.is_member(id, user_id)?;
        let hidden = !list.is_public && list.create_user != user_id;
        if want_starred && (list.lifecycle.is_deleted() || hidden) {
            return Err(not_found);
        }

        let outcome = ledger.apply(id, user_id, want_starred)?;
        let mut destroyed = false;
        if !want_starred {
            let remaining = u64::try_from(outcome.count).unwrap_or(0);
            let disposition = list.lifecycle.on_reference_removed(remaining);
            destroyed = apply_disposition(&tx, id, disposition)?;
        }
        tx.commit()?;

        Ok(StarUpdate { outcome, destroyed })
    }
}

/// Persists a lifecycle decision. Returns whether the row was destroyed.
fn apply_disposition(
    conn: &Connection,
    id: ProblemListId,
    disposition: Disposition,
) -> RepoResult<bool> {
    match disposition {
        Disposition::Destroy => {
            conn.execute("DELETE FROM problem_lists WHERE id = ?1;", [id])?;
            Ok(true)
        }
        Disposition::Retain(state) => {
            conn.execute(
                "UPDATE problem_lists SET is_deleted = ?2 WHERE id = ?1;",
                params![id, flag_to_db(state.is_deleted())],
            )?;
            Ok(false)
        }
    }
}

fn load_list(
    conn: &Connection,
    id: ProblemListId,
    include_deleted: bool,
) -> RepoResult<Option<ProblemListRecord>> {
    let mut stmt = conn.prepare(&format!(
        "{PROBLEM_LIST_SELECT_SQL} WHERE l.id = ?1 AND (?2 = 1 OR l.is_deleted = 0);"
    ))?;
    let mut rows = stmt.query(params![id, flag_to_db(include_deleted)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_list_row(row)?));
    }
    Ok(None)
}

fn list_contains(conn: &Connection, id: ProblemListId, problem_id: ProblemId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM problem_list_items WHERE problem_list_id = ?1 AND problem_id = ?2
        );",
        params![id, problem_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_list_row(row: &Row<'_>) -> RepoResult<ProblemListRecord> {
    let is_deleted = flag_from_db("problem_lists.is_deleted", row.get("is_deleted")?)?;
    Ok(ProblemListRecord {
        id: row.get("id")?,
        title: row.get("title")?,
        summary: row.get("summary")?,
        is_public: flag_from_db("problem_lists.is_public", row.get("is_public")?)?,
        create_user: row.get("create_user_id")?,
        user_name: row.get("user_name")?,
        star_count: row.get("star_count")?,
        problem_count: row.get("problem_count")?,
        lifecycle: Lifecycle::from_deleted_flag(is_deleted),
        create_time: row.get("create_time")?,
    })
}
