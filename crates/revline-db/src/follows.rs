use crate::error::{is_constraint_violation, is_foreign_key_violation};
use crate::models::UserSummaryRow;
use crate::{Database, Result, StoreError};

impl Database {
    pub fn follow(&self, follower_id: i64, followed_id: i64) -> Result<()> {
        if follower_id == followed_id {
            return Err(StoreError::SelfFollow);
        }
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO follows (follower_id, followed_id) VALUES (?1, ?2)",
                (follower_id, followed_id),
            )
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::NotFound
                } else if is_constraint_violation(&e, "follows") {
                    StoreError::AlreadyFollowing
                } else {
                    e.into()
                }
            })?;
            Ok(())
        })
    }

    pub fn unfollow(&self, follower_id: i64, followed_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                (follower_id, followed_id),
            )?;
            if removed == 0 {
                return Err(StoreError::NotFollowing);
            }
            Ok(())
        })
    }

    pub fn is_following(&self, viewer_id: i64, target_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                (viewer_id, target_id),
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    pub fn list_followers(&self, user_id: i64) -> Result<Vec<UserSummaryRow>> {
        self.follow_edge_users(
            user_id,
            "SELECT u.id, u.username, u.display_name, u.avatar_url
             FROM follows f JOIN users u ON f.follower_id = u.id
             WHERE f.followed_id = ?1 ORDER BY f.created_at DESC, f.id DESC",
        )
    }

    pub fn list_following(&self, user_id: i64) -> Result<Vec<UserSummaryRow>> {
        self.follow_edge_users(
            user_id,
            "SELECT u.id, u.username, u.display_name, u.avatar_url
             FROM follows f JOIN users u ON f.followed_id = u.id
             WHERE f.follower_id = ?1 ORDER BY f.created_at DESC, f.id DESC",
        )
    }

    fn follow_edge_users(&self, user_id: i64, sql: &str) -> Result<Vec<UserSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map([user_id], |row| {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{insert_user, test_db};

    #[test]
    fn self_follow_is_always_rejected() {
        let db = test_db();
        let uid = insert_user(&db, "alex", "a@x.com");
        assert!(matches!(db.follow(uid, uid), Err(StoreError::SelfFollow)));
    }

    #[test]
    fn duplicate_edge_is_a_conflict() {
        let db = test_db();
        let a = insert_user(&db, "alex", "a@x.com");
        let b = insert_user(&db, "pat", "p@x.com");

        db.follow(a, b).unwrap();
        assert!(matches!(db.follow(a, b), Err(StoreError::AlreadyFollowing)));

        // The reverse direction is a distinct edge.
        db.follow(b, a).unwrap();
    }

    #[test]
    fn following_a_missing_user_is_not_found() {
        let db = test_db();
        let a = insert_user(&db, "alex", "a@x.com");
        assert!(matches!(db.follow(a, 999), Err(StoreError::NotFound)));
    }

    #[test]
    fn unfollow_of_missing_edge_reports_not_following() {
        let db = test_db();
        let a = insert_user(&db, "alex", "a@x.com");
        let b = insert_user(&db, "pat", "p@x.com");

        assert!(matches!(db.unfollow(a, b), Err(StoreError::NotFollowing)));

        db.follow(a, b).unwrap();
        db.unfollow(a, b).unwrap();
        assert!(!db.is_following(a, b).unwrap());
    }

    #[test]
    fn follower_and_following_lists_are_denormalized() {
        let db = test_db();
        let a = insert_user(&db, "alex", "a@x.com");
        let b = insert_user(&db, "pat", "p@x.com");
        let c = insert_user(&db, "sam", "s@x.com");

        db.follow(a, c).unwrap();
        db.follow(b, c).unwrap();
        db.follow(c, a).unwrap();

        let followers = db.list_followers(c).unwrap();
        let mut names: Vec<_> = followers.iter().map(|u| u.username.as_str()).collect();
        names.sort();
        assert_eq!(names, ["alex", "pat"]);

        let following = db.list_following(c).unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].username, "alex");
        assert_eq!(following[0].display_name, "alex");
    }
}
