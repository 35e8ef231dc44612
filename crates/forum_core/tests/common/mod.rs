#![allow(dead_code)]

use forum_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use forum_core::{NewUser, RequestContext, User};
use rusqlite::{params, Connection};

pub fn create_user(conn: &Connection, username: &str) -> User {
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .create_user(&NewUser::normal(username))
        .unwrap()
}

pub fn create_admin(conn: &Connection, username: &str) -> User {
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .create_user(&NewUser::admin(username))
        .unwrap()
}

pub fn as_user(user: &User) -> RequestContext {
    RequestContext::authenticated(user.clone())
}

/// Pins `create_time` so ordering tests do not depend on the clock.
pub fn set_create_time(conn: &Connection, table: &str, id: i64, create_time: i64) {
    conn.execute(
        &format!("UPDATE {table} SET create_time = ?2 WHERE id = ?1;"),
        params![id, create_time],
    )
    .unwrap();
}
