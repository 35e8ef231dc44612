//! Generic "reactor set + counter" ledger.
//!
//! # Responsibility
//! - Add/remove one user in an entity's reactor set (likes, stars).
//! - Keep the entity's denormalized counter equal to the set size.
//!
//! # Invariants
//! - A user appears at most once per set (composite primary key).
//! - Membership and counter change inside one transaction; a no-op change
//!   touches neither.
//! - Every call reports the counter value read back inside the transaction.

use crate::model::user::UserId;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::marker::PhantomData;

/// Storage shape of one reaction kind.
///
/// All names are trusted SQL identifiers.
pub trait ReactionTarget {
    /// Entity kind used in errors and log events.
    const KIND: &'static str;
    const ENTITY_TABLE: &'static str;
    const COUNTER_COLUMN: &'static str;
    const MEMBERSHIP_TABLE: &'static str;
    /// Membership column referencing `ENTITY_TABLE.id`.
    const MEMBERSHIP_COLUMN: &'static str;
}

/// Likes on posts.
pub enum PostLike {}

impl ReactionTarget for PostLike {
    const KIND: &'static str = "post";
    const ENTITY_TABLE: &'static str = "posts";
    const COUNTER_COLUMN: &'static str = "like_count";
    const MEMBERSHIP_TABLE: &'static str = "post_likes";
    const MEMBERSHIP_COLUMN: &'static str = "post_id";
}

/// Likes on comments.
pub enum CommentLike {}

impl ReactionTarget for CommentLike {
    const KIND: &'static str = "comment";
    const ENTITY_TABLE: &'static str = "comments";
    const COUNTER_COLUMN: &'static str = "like_count";
    const MEMBERSHIP_TABLE: &'static str = "comment_likes";
    const MEMBERSHIP_COLUMN: &'static str = "comment_id";
}

/// Stars on problems.
pub enum ProblemStar {}

impl ReactionTarget for ProblemStar {
    const KIND: &'static str = "problem";
    const ENTITY_TABLE: &'static str = "problems";
    const COUNTER_COLUMN: &'static str = "star_count";
    const MEMBERSHIP_TABLE: &'static str = "problem_stars";
    const MEMBERSHIP_COLUMN: &'static str = "problem_id";
}

/// Stars on problem lists.
pub enum ProblemListStar {}

impl ReactionTarget for ProblemListStar {
    const KIND: &'static str = "problem list";
    const ENTITY_TABLE: &'static str = "problem_lists";
    const COUNTER_COLUMN: &'static str = "star_count";
    const MEMBERSHIP_TABLE: &'static str = "problem_list_stars";
    const MEMBERSHIP_COLUMN: &'static str = "problem_list_id";
}

/// Effect of one ledger call on the reactor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionChange {
    Added,
    Removed,
    /// Requested state already held.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionOutcome {
    pub change: ReactionChange,
    /// Membership after the call.
    pub reacted: bool,
    /// Counter after the call.
    pub count: i64,
}

/// Reaction ledger bound to one connection and one reaction kind.
pub struct ReactionLedger<'conn, T: ReactionTarget> {
    conn: &'conn Connection,
    _target: PhantomData<T>,
}

impl<'conn, T: ReactionTarget> ReactionLedger<'conn, T> {
    /// Binds a ledger to a connection or an open transaction.
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _target: PhantomData,
        }
    }

    /// Sets membership of `user_id` to `want_reacted` in its own
    /// `IMMEDIATE` transaction.
    ///
    /// Must not be called while the connection already has an open
    /// transaction; use [`ReactionLedger::apply`] there.
    pub fn set(
        &self,
        entity_id: i64,
        user_id: UserId,
        want_reacted: bool,
    ) -> RepoResult<ReactionOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let outcome = ReactionLedger::<T>::new(&tx).apply(entity_id, user_id, want_reacted)?;
        tx.commit()?;
        Ok(outcome)
    }

    /// Sets membership inside the caller's transaction.
    pub fn apply(
        &self,
        entity_id: i64,
        user_id: UserId,
        want_reacted: bool,
    ) -> RepoResult<ReactionOutcome> {
        if !self.entity_exists(entity_id)? {
            return Err(RepoError::NotFound {
                kind: T::KIND,
                id: entity_id,
            });
        }

        let change = if want_reacted {
            let inserted = self.conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO {} ({}, user_id) VALUES (?1, ?2);",
                    T::MEMBERSHIP_TABLE,
                    T::MEMBERSHIP_COLUMN
                ),
                params![entity_id, user_id],
            )?;
            if inserted == 1 {
                self.shift_counter(entity_id, 1)?;
                ReactionChange::Added
            } else {
                ReactionChange::Unchanged
            }
        } else {
            let deleted = self.conn.execute(
                &format!(
                    "DELETE FROM {} WHERE {} = ?1 AND user_id = ?2;",
                    T::MEMBERSHIP_TABLE,
                    T::MEMBERSHIP_COLUMN
                ),
                params![entity_id, user_id],
            )?;
            if deleted == 1 {
                self.shift_counter(entity_id, -1)?;
                ReactionChange::Removed
            } else {
                ReactionChange::Unchanged
            }
        };

        Ok(ReactionOutcome {
            change,
            reacted: want_reacted,
            count: self.count(entity_id)?,
        })
    }

    /// Flips the membership of `user_id` inside the caller's transaction.
    pub fn toggle(&self, entity_id: i64, user_id: UserId) -> RepoResult<ReactionOutcome> {
        let reacted = self.is_member(entity_id, user_id)?;
        self.apply(entity_id, user_id, !reacted)
    }

    pub fn is_member(&self, entity_id: i64, user_id: UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1 AND user_id = ?2);",
                T::MEMBERSHIP_TABLE,
                T::MEMBERSHIP_COLUMN
            ),
            params![entity_id, user_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    /// Denormalized counter value.
    pub fn count(&self, entity_id: i64) -> RepoResult<i64> {
        let count = self.conn.query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1;",
                T::COUNTER_COLUMN,
                T::ENTITY_TABLE
            ),
            [entity_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Reactor ids in ascending order.
    pub fn members(&self, entity_id: i64) -> RepoResult<Vec<UserId>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT user_id FROM {} WHERE {} = ?1 ORDER BY user_id ASC;",
            T::MEMBERSHIP_TABLE,
            T::MEMBERSHIP_COLUMN
        ))?;
        let mut rows = stmt.query([entity_id])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(row.get(0)?);
        }
        Ok(members)
    }

    fn entity_exists(&self, entity_id: i64) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);",
                T::ENTITY_TABLE
            ),
            [entity_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn shift_counter(&self, entity_id: i64, delta: i64) -> RepoResult<()> {
        self.conn.execute(
            &format!(
                "UPDATE {table} SET {counter} = {counter} + ?2 WHERE id = ?1;",
                table = T::ENTITY_TABLE,
                counter = T::COUNTER_COLUMN
            ),
            params![entity_id, delta],
        )?;
        Ok(())
    }
}
