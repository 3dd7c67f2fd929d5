use rusqlite::{Connection, OptionalExtension};

use crate::error::is_constraint_violation;
use crate::models::{NewUser, ProfileUpdate, UserRow, UserSummaryRow};
use crate::{Database, Result, StoreError};

impl Database {
    pub fn create_user(&self, user: &NewUser) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, display_name) VALUES (?1, ?2, ?3, ?4)",
                (user.username, user.email, user.password_hash, user.display_name),
            )
            .map_err(|e| {
                if is_constraint_violation(&e, "users.") {
                    StoreError::DuplicateUser
                } else {
                    e.into()
                }
            })?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    /// Partial profile update: `None` fields keep their stored value. The
    /// optional-field handling is structural (COALESCE over bound
    /// parameters), never assembled SQL text.
    pub fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> Result<UserRow> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET
                    display_name = COALESCE(?1, display_name),
                    bio = COALESCE(?2, bio),
                    avatar_url = COALESCE(?3, avatar_url),
                    updated_at = datetime('now')
                 WHERE id = ?4",
                (update.display_name, update.bio, update.avatar_url, user_id),
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            query_user(conn, "id = ?1", user_id)?.ok_or(StoreError::NotFound)
        })
    }

    /// Case-insensitive substring match over usernames and display names.
    /// Callers short-circuit empty queries before reaching the store.
    pub fn search_users(&self, query: &str) -> Result<Vec<UserSummaryRow>> {
        let pattern = like_pattern(query);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, display_name, avatar_url FROM users
                 WHERE username LIKE ?1 ESCAPE '\\' OR display_name LIKE ?1 ESCAPE '\\'
                 ORDER BY username",
            )?;
            let rows = stmt
                .query_map([&pattern], |row| {
                    Ok(UserSummaryRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        display_name: row.get(2)?,
                        avatar_url: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

/// `%query%` with LIKE metacharacters escaped so user input stays literal.
pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn query_user<P: rusqlite::ToSql>(
    conn: &Connection,
    predicate: &str,
    param: P,
) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, email, password, display_name, bio, avatar_url, created_at
         FROM users WHERE {predicate}"
    );
    let row = conn
        .query_row(&sql, [&param], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                display_name: row.get(4)?,
                bio: row.get(5)?,
                avatar_url: row.get(6)?,
                created_at: row.get(7)?,
            })
        })
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{insert_user, test_db};

    #[test]
    fn duplicate_username_and_email_are_conflicts() {
        let db = test_db();
        insert_user(&db, "abc", "a@b.com");

        let same_name = db.create_user(&NewUser {
            username: "abc",
            email: "other@b.com",
            password_hash: "h",
            display_name: "abc",
        });
        assert!(matches!(same_name, Err(StoreError::DuplicateUser)));

        let same_email = db.create_user(&NewUser {
            username: "xyz",
            email: "a@b.com",
            password_hash: "h",
            display_name: "xyz",
        });
        assert!(matches!(same_email, Err(StoreError::DuplicateUser)));
    }

    #[test]
    fn profile_update_keeps_unset_fields() {
        let db = test_db();
        let id = insert_user(&db, "driver", "d@x.com");

        db.update_profile(
            id,
            &ProfileUpdate {
                display_name: Some("The Driver"),
                bio: Some("Track days"),
                avatar_url: None,
            },
        )
        .unwrap();

        let user = db
            .update_profile(
                id,
                &ProfileUpdate {
                    display_name: None,
                    bio: None,
                    avatar_url: Some("/uploads/a.png"),
                },
            )
            .unwrap();

        assert_eq!(user.display_name, "The Driver");
        assert_eq!(user.bio.as_deref(), Some("Track days"));
        assert_eq!(user.avatar_url.as_deref(), Some("/uploads/a.png"));
    }

    #[test]
    fn profile_update_for_missing_user_is_not_found() {
        let db = test_db();
        let res = db.update_profile(
            999,
            &ProfileUpdate {
                display_name: Some("x"),
                bio: None,
                avatar_url: None,
            },
        );
        assert!(matches!(res, Err(StoreError::NotFound)));
    }

    #[test]
    fn search_matches_username_and_display_name_case_insensitively() {
        let db = test_db();
        insert_user(&db, "GarageKing", "g@x.com");
        let id = insert_user(&db, "quietone", "q@x.com");
        db.update_profile(
            id,
            &ProfileUpdate {
                display_name: Some("King of Drift"),
                bio: None,
                avatar_url: None,
            },
        )
        .unwrap();

        let hits = db.search_users("king").unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn search_treats_like_metacharacters_literally() {
        let db = test_db();
        insert_user(&db, "percent", "p@x.com");
        assert!(db.search_users("%").unwrap().is_empty());
        assert!(db.search_users("_").unwrap().is_empty());
    }
}
