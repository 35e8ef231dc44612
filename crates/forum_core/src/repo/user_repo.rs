//! User repository contracts and SQLite implementation.

use crate::model::user::{NewUser, User, UserId, UserType};
use crate::repo::{ensure_schema_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, username, email, avatar, user_type, create_time FROM users";

/// Repository interface for user lookups.
pub trait UserRepository {
    /// Inserts one user and returns the stored row.
    fn create_user(&self, user: &NewUser) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        user.validate()?;
        self.conn.execute(
            "INSERT INTO users (username, email, avatar, user_type) VALUES (?1, ?2, ?3, ?4);",
            params![
                user.username.trim(),
                user.email.as_deref(),
                user.avatar.as_deref(),
                user.user_type.as_db(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_user(id)?
            .ok_or(RepoError::NotFound { kind: "user", id })
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_user_row,
            )
            .optional()?;
        user.transpose()
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<RepoResult<User>> {
    let user_type_text: String = row.get("user_type")?;
    let Some(user_type) = UserType::parse(&user_type_text) else {
        return Ok(Err(RepoError::InvalidData(format!(
            "invalid user type `{user_type_text}` in users.user_type"
        ))));
    };

    Ok(Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        avatar: row.get("avatar")?,
        user_type,
        create_time: row.get("create_time")?,
    }))
}
