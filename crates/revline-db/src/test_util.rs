use crate::Database;
use crate::models::NewUser;

pub(crate) fn test_db() -> Database {
    Database::open_in_memory().unwrap()
}

pub(crate) fn insert_user(db: &Database, username: &str, email: &str) -> i64 {
    db.create_user(&NewUser {
        username,
        email,
        password_hash: "argon2-hash",
        display_name: username,
    })
    .unwrap()
}
