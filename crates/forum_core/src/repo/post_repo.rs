//! Post/comment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist posts, post tags and comments.
//! - Serve paginated, sorted post and comment listings.
//! - Route like toggles through the shared reaction ledger.
//!
//! # Invariants
//! - Listings only return rows with `check_status = 1`.
//! - Comment insert and `posts.comment_count` increment share one transaction.
//! - Listing order always ends with an id tie-break.

use crate::model::post::{CommentId, CommentRecord, NewComment, NewPost, PostId, PostRecord};
use crate::model::user::UserId;
use crate::query::page::{Page, Paginated};
use crate::query::sort::{SortColumns, SortKey};
use crate::repo::reaction::{CommentLike, PostLike, ReactionLedger, ReactionOutcome};
use crate::repo::{ensure_schema_ready, flag_from_db, flag_to_db, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

/// Sortable columns of the post listing.
pub const POST_SORT: SortColumns = SortColumns {
    id: "p.id",
    time: "p.create_time",
    likes: Some("p.like_count"),
    comments: Some("p.comment_count"),
    default: SortKey::TimeDesc,
};

/// Sortable columns of the comment listing. Conversation order by default.
pub const COMMENT_SORT: SortColumns = SortColumns {
    id: "c.id",
    time: "c.create_time",
    likes: Some("c.like_count"),
    comments: None,
    default: SortKey::TimeAsc,
};

// Leading `?` binds are the viewer id, bound twice.
const POST_SELECT_SQL: &str = "SELECT
    p.id,
    p.title,
    p.content,
    p.create_user_id,
    u.username AS user_name,
    p.like_count,
    p.comment_count,
    p.check_status,
    p.create_time,
    CASE WHEN ? IS NULL THEN NULL ELSE EXISTS(
        SELECT 1 FROM post_likes pl WHERE pl.post_id = p.id AND pl.user_id = ?
    ) END AS like_status
FROM posts p
INNER JOIN users u ON u.id = p.create_user_id";

const COMMENT_SELECT_SQL: &str = "SELECT
    c.id,
    c.post_id,
    c.create_user_id,
    u.username AS user_name,
    u.avatar,
    c.content,
    c.like_count,
    c.reply_to_user_id,
    r.username AS reply_to_name,
    c.check_status,
    c.create_time,
    CASE WHEN ? IS NULL THEN NULL ELSE EXISTS(
        SELECT 1 FROM comment_likes cl WHERE cl.comment_id = c.id AND cl.user_id = ?
    ) END AS like_status
FROM comments c
INNER JOIN users u ON u.id = c.create_user_id
LEFT JOIN users r ON r.id = c.reply_to_user_id";

/// Query options for the post listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostListQuery {
    pub page: Page,
    pub sort: SortKey,
    pub viewer: Option<UserId>,
}

/// Query options for one post's comment listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentListQuery {
    pub post_id: PostId,
    pub page: Page,
    pub sort: SortKey,
    pub viewer: Option<UserId>,
}

/// Repository interface for forum posts and comments.
pub trait PostRepository {
    /// Inserts a post with its tags and returns its id.
    fn create_post(&self, post: &NewPost) -> RepoResult<PostId>;
    /// Loads one post regardless of moderation state.
    fn get_post(&self, id: PostId, viewer: Option<UserId>) -> RepoResult<Option<PostRecord>>;
    fn list_posts(&self, query: &PostListQuery) -> RepoResult<Paginated<PostRecord>>;
    /// Sets the moderation flag.
    fn set_post_check_status(&self, id: PostId, passed: bool) -> RepoResult<()>;
    fn set_post_like(
        &self,
        id: PostId,
        user_id: UserId,
        want_liked: bool,
    ) -> RepoResult<ReactionOutcome>;
    /// Inserts a comment and bumps the post's comment counter.
    fn create_comment(&self, comment: &NewComment) -> RepoResult<CommentId>;
    fn get_comment(
        &self,
        id: CommentId,
        viewer: Option<UserId>,
    ) -> RepoResult<Option<CommentRecord>>;
    fn list_comments(&self, query: &CommentListQuery) -> RepoResult<Paginated<CommentRecord>>;
    fn set_comment_like(
        &self,
        id: CommentId,
        user_id: UserId,
        want_liked: bool,
    ) -> RepoResult<ReactionOutcome>;
}

/// SQLite-backed post repository.
pub struct SqlitePostRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePostRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn create_post(&self, post: &NewPost) -> RepoResult<PostId> {
        post.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO posts (title, content, create_user_id) VALUES (?1, ?2, ?3);",
            params![
                post.title.as_deref().map(str::trim),
                post.content.as_str(),
                post.create_user
            ],
        )?;
        let post_id = tx.last_insert_rowid();
        for tag in &post.tags {
            tx.execute(
                "INSERT OR IGNORE INTO post_tags (post_id, name) VALUES (?1, ?2);",
                params![post_id, tag.as_str()],
            )?;
        }
        tx.commit()?;

        Ok(post_id)
    }

    fn get_post(&self, id: PostId, viewer: Option<UserId>) -> RepoResult<Option<PostRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{POST_SELECT_SQL} WHERE p.id = ?;"))?;
        let mut rows = stmt.query(params![viewer, viewer, id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_post_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_posts(&self, query: &PostListQuery) -> RepoResult<Paginated<PostRecord>> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE check_status = 1;",
            [],
            |row| row.get(0),
        )?;

        let mut sql = format!(
            "{POST_SELECT_SQL} WHERE p.check_status = 1 ORDER BY {}",
            POST_SORT.order_by(query.sort)
        );
        let mut bind_values = viewer_binds(query.viewer);
        query.page.push_sql(&mut sql, &mut bind_values);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(self.conn, row)?);
        }

        Ok(Paginated {
            count: count as u64,
            items: posts,
        })
    }

    fn set_post_check_status(&self, id: PostId, passed: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE posts SET check_status = ?2 WHERE id = ?1;",
            params![id, flag_to_db(passed)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { kind: "post", id });
        }
        Ok(())
    }

    fn set_post_like(
        &self,
        id: PostId,
        user_id: UserId,
        want_liked: bool,
    ) -> RepoResult<ReactionOutcome> {
        ReactionLedger::<PostLike>::new(self.conn).set(id, user_id, want_liked)
    }

    fn create_comment(&self, comment: &NewComment) -> RepoResult<CommentId> {
        comment.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "posts", comment.post_id)? {
            return Err(RepoError::NotFound {
                kind: "post",
                id: comment.post_id,
            });
        }
        if let Some(reply_to) = comment.reply_to_user {
            if !row_exists(&tx, "users", reply_to)? {
                return Err(RepoError::NotFound {
                    kind: "user",
                    id: reply_to,
                });
            }
        }

        tx.execute(
            "INSERT INTO comments (post_id, create_user_id, content, reply_to_user_id)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                comment.post_id,
                comment.create_user,
                comment.content.as_str(),
                comment.reply_to_user
            ],
        )?;
        let comment_id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE posts SET comment_count = comment_count + 1 WHERE id = ?1;",
            [comment.post_id],
        )?;
        tx.commit()?;

        Ok(comment_id)
    }

    fn get_comment(
        &self,
        id: CommentId,
        viewer: Option<UserId>,
    ) -> RepoResult<Option<CommentRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMMENT_SELECT_SQL} WHERE c.id = ?;"))?;
        let mut rows = stmt.query(params![viewer, viewer, id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_comment_row(row)?));
        }
        Ok(None)
    }

    fn list_comments(&self, query: &CommentListQuery) -> RepoResult<Paginated<CommentRecord>> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?1 AND check_status = 1;",
            [query.post_id],
            |row| row.get(0),
        )?;

        let mut sql = format!(
            "{COMMENT_SELECT_SQL} WHERE c.post_id = ? AND c.check_status = 1 ORDER BY {}",
            COMMENT_SORT.order_by(query.sort)
        );
        let mut bind_values = viewer_binds(query.viewer);
        bind_values.push(Value::Integer(query.post_id));
        query.page.push_sql(&mut sql, &mut bind_values);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }

        Ok(Paginated {
            count: count as u64,
            items: comments,
        })
    }

    fn set_comment_like(
        &self,
        id: CommentId,
        user_id: UserId,
        want_liked: bool,
    ) -> RepoResult<ReactionOutcome> {
        ReactionLedger::<CommentLike>::new(self.conn).set(id, user_id, want_liked)
    }
}

fn viewer_binds(viewer: Option<UserId>) -> Vec<Value> {
    let value = viewer.map_or(Value::Null, Value::Integer);
    vec![value.clone(), value]
}

pub(crate) fn row_exists(conn: &Connection, table: &'static str, id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_post_row(conn: &Connection, row: &Row<'_>) -> RepoResult<PostRecord> {
    let id: PostId = row.get("id")?;
    Ok(PostRecord {
        id,
        title: row.get("title")?,
        content: row.get("content")?,
        tags: load_post_tags(conn, id)?,
        create_user: row.get("create_user_id")?,
        user_name: row.get("user_name")?,
        like_count: row.get("like_count")?,
        comment_count: row.get("comment_count")?,
        check_status: flag_from_db("posts.check_status", row.get("check_status")?)?,
        create_time: row.get("create_time")?,
        like_status: row.get("like_status")?,
    })
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<CommentRecord> {
    Ok(CommentRecord {
        id: row.get("id")?,
        post_id: row.get("post_id")?,
        create_user: row.get("create_user_id")?,
        user_name: row.get("user_name")?,
        avatar: row.get("avatar")?,
        content: row.get("content")?,
        like_count: row.get("like_count")?,
        reply_to_user: row.get("reply_to_user_id")?,
        reply_to_name: row.get("reply_to_name")?,
        check_status: flag_from_db("comments.check_status", row.get("check_status")?)?,
        create_time: row.get("create_time")?,
        like_status: row.get("like_status")?,
    })
}

fn load_post_tags(conn: &Connection, post_id: PostId) -> RepoResult<Vec<String>> {
    let mut stmt =
        conn.prepare_cached("SELECT name FROM post_tags WHERE post_id = ?1 ORDER BY name ASC;")?;
    let mut rows = stmt.query([post_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}
