mod common;

use common::create_user;
use forum_core::db::{open_db, open_db_in_memory};
use forum_core::model::post::NewPost;
use forum_core::repo::post_repo::{PostRepository, SqlitePostRepository};
use forum_core::repo::reaction::{PostLike, ProblemStar, ReactionChange, ReactionLedger};
use forum_core::RepoError;

#[test]
fn counter_matches_reactor_set_after_every_call() {
    let conn = open_db_in_memory().unwrap();
    let users = (0..4)
        .map(|index| create_user(&conn, &format!("user{index}")).id)
        .collect::<Vec<_>>();
    let post_id = SqlitePostRepository::try_new(&conn)
        .unwrap()
        .create_post(&NewPost {
            create_user: users[0],
            title: None,
            content: "body".to_string(),
            tags: Vec::new(),
        })
        .unwrap();

    let ledger = ReactionLedger::<PostLike>::new(&conn);
    let script = [
        (0, true),
        (1, true),
        (1, true),
        (2, false),
        (0, false),
        (3, true),
        (0, false),
        (2, true),
    ];
    for (user_index, want) in script {
        let outcome = ledger.set(post_id, users[user_index], want).unwrap();
        let members = ledger.members(post_id).unwrap();
        assert_eq!(outcome.count, members.len() as i64);
        assert_eq!(outcome.reacted, want);
        assert_eq!(ledger.is_member(post_id, users[user_index]).unwrap(), want);
    }
    assert_eq!(ledger.members(post_id).unwrap(), vec![users[1], users[2], users[3]]);
}

#[test]
fn repeated_requests_report_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let user = create_user(&conn, "alice").id;
    conn.execute(
        "INSERT INTO problems (title, content) VALUES ('p', 'c');",
        [],
    )
    .unwrap();
    let problem_id = conn.last_insert_rowid();
    let ledger = ReactionLedger::<ProblemStar>::new(&conn);

    assert_eq!(
        ledger.set(problem_id, user, false).unwrap().change,
        ReactionChange::Unchanged
    );
    assert_eq!(
        ledger.set(problem_id, user, true).unwrap().change,
        ReactionChange::Added
    );
    assert_eq!(
        ledger.set(problem_id, user, true).unwrap().change,
        ReactionChange::Unchanged
    );

    let tx = conn.unchecked_transaction().unwrap();
    let flipped = ReactionLedger::<ProblemStar>::new(&tx)
        .toggle(problem_id, user)
        .unwrap();
    tx.commit().unwrap();
    assert_eq!(flipped.change, ReactionChange::Removed);
    assert_eq!(ledger.count(problem_id).unwrap(), 0);
}

#[test]
fn missing_entity_is_not_found_and_leaves_no_membership() {
    let conn = open_db_in_memory().unwrap();
    let user = create_user(&conn, "alice").id;
    let ledger = ReactionLedger::<PostLike>::new(&conn);

    match ledger.set(42, user, true) {
        Err(RepoError::NotFound { kind, id }) => {
            assert_eq!(kind, "post");
            assert_eq!(id, 42);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM post_likes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn concurrent_toggles_from_separate_connections_keep_counter_exact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forum.sqlite3");
    let conn = open_db(&path).unwrap();
    let users = (0..8)
        .map(|index| create_user(&conn, &format!("user{index}")).id)
        .collect::<Vec<_>>();
    let post_id = SqlitePostRepository::try_new(&conn)
        .unwrap()
        .create_post(&NewPost {
            create_user: users[0],
            title: None,
            content: "busy".to_string(),
            tags: Vec::new(),
        })
        .unwrap();

    std::thread::scope(|scope| {
        for &user_id in &users {
            let path = &path;
            scope.spawn(move || {
                let worker = open_db(path).unwrap();
                let ledger = ReactionLedger::<PostLike>::new(&worker);
                for round in 0..51 {
                    ledger.set(post_id, user_id, round % 2 == 0).unwrap();
                }
            });
        }
    });

    let ledger = ReactionLedger::<PostLike>::new(&conn);
    let members = ledger.members(post_id).unwrap();
    assert_eq!(members.len(), users.len());
    assert_eq!(ledger.count(post_id).unwrap(), members.len() as i64);
}
