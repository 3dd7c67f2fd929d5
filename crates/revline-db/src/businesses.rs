use rusqlite::{OptionalExtension, Row};

use crate::models::{BusinessRow, ReviewRow};
use crate::{Database, Result, StoreError};

fn business_from_row(row: &Row) -> rusqlite::Result<BusinessRow> {
    Ok(BusinessRow {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        address: row.get(3)?,
        phone: row.get(4)?,
        website: row.get(5)?,
        description: row.get(6)?,
    })
}

const BUSINESS_COLS: &str = "id, name, category, address, phone, website, description";

impl Database {
    pub fn list_businesses(&self) -> Result<Vec<BusinessRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BUSINESS_COLS} FROM businesses ORDER BY name"
            ))?;
            let rows = stmt
                .query_map([], business_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_business_by_name(&self, name: &str) -> Result<Option<BusinessRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {BUSINESS_COLS} FROM businesses WHERE name = ?1"),
                    [name],
                    business_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Reviews joined with reviewer identity, newest first.
    pub fn list_reviews(&self, business_id: i64) -> Result<Vec<ReviewRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.business_id, r.user_id, u.username, u.avatar_url,
                        r.rating, r.comment, r.created_at
                 FROM business_reviews r
                 JOIN users u ON r.user_id = u.id
                 WHERE r.business_id = ?1
                 ORDER BY r.created_at DESC, r.id DESC",
            )?;
            let rows = stmt
                .query_map([business_id], |row| {
                    Ok(ReviewRow {
                        id: row.get(0)?,
                        business_id: row.get(1)?,
                        user_id: row.get(2)?,
                        username: row.get(3)?,
                        avatar_url: row.get(4)?,
                        rating: row.get(5)?,
                        comment: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// One review per (business, user): duplicates are caught by a pre-check
    /// inside the transaction rather than parsed out of constraint text.
    pub fn create_review(
        &self,
        business_id: i64,
        user_id: i64,
        rating: i64,
        comment: Option<&str>,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let business_exists: i64 = tx.query_row(
                "SELECT COUNT(*) FROM businesses WHERE id = ?1",
                [business_id],
                |row| row.get(0),
            )?;
            if business_exists == 0 {
                return Err(StoreError::NotFound);
            }

            let already: i64 = tx.query_row(
                "SELECT COUNT(*) FROM business_reviews WHERE business_id = ?1 AND user_id = ?2",
                (business_id, user_id),
                |row| row.get(0),
            )?;
            if already > 0 {
                return Err(StoreError::DuplicateReview);
            }

            tx.execute(
                "INSERT INTO business_reviews (business_id, user_id, rating, comment)
                 VALUES (?1, ?2, ?3, ?4)",
                (business_id, user_id, rating, comment),
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(id)
        })
    }

    pub fn update_review(
        &self,
        review_id: i64,
        caller_id: i64,
        rating: i64,
        comment: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let owner: Option<i64> = tx
                .query_row(
                    "SELECT user_id FROM business_reviews WHERE id = ?1",
                    [review_id],
                    |row| row.get(0),
                )
                .optional()?;
            let owner = owner.ok_or(StoreError::NotFound)?;
            if owner != caller_id {
                return Err(StoreError::NotOwner);
            }

            tx.execute(
                "UPDATE business_reviews SET rating = ?1, comment = ?2 WHERE id = ?3",
                (rating, comment, review_id),
            )?;
            tx.commit()?;
            Ok(())
        })
    }
}
