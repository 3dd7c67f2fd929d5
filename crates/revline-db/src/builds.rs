use rusqlite::{Connection, OptionalExtension, ToSql, Transaction, TransactionBehavior};

use crate::models::{
    BuildDetail, BuildRow, BuildScalars, BuildSummaryRow, BuildUpdate, ModRow, NewBuild, NewMod,
};
use crate::users::like_pattern;
use crate::{Database, Result, StoreError};

impl Database {
    pub fn list_builds(&self) -> Result<Vec<BuildSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{BUILD_SUMMARY_SELECT} ORDER BY b.created_at DESC, b.id DESC"
            ))?;
            let rows = stmt
                .query_map([], build_summary_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Case-insensitive substring match over build names, makes, and models.
    pub fn search_builds(&self, query: &str) -> Result<Vec<BuildSummaryRow>> {
        let pattern = like_pattern(query);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{BUILD_SUMMARY_SELECT}
                 WHERE b.name LIKE ?1 ESCAPE '\\'
                    OR b.make LIKE ?1 ESCAPE '\\'
                    OR b.model LIKE ?1 ESCAPE '\\'
                 ORDER BY b.created_at DESC, b.id DESC"
            ))?;
            let rows = stmt
                .query_map([&pattern], build_summary_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_build(&self, build_id: i64) -> Result<Option<BuildDetail>> {
        self.with_conn(|conn| {
            let build = conn
                .query_row(
                    "SELECT b.id, b.user_id, u.username, b.name, b.make, b.model, b.year, b.trim,
                            b.ownership_status, b.horsepower, b.torque, b.description,
                            b.cover_image_url, b.cover_image_url_2, b.created_at
                     FROM builds b
                     JOIN users u ON b.user_id = u.id
                     WHERE b.id = ?1",
                    [build_id],
                    |row| {
                        Ok(BuildRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            username: row.get(2)?,
                            name: row.get(3)?,
                            make: row.get(4)?,
                            model: row.get(5)?,
                            year: row.get(6)?,
                            trim: row.get(7)?,
                            ownership_status: row.get(8)?,
                            horsepower: row.get(9)?,
                            torque: row.get(10)?,
                            description: row.get(11)?,
                            cover_image_url: row.get(12)?,
                            cover_image_url_2: row.get(13)?,
                            created_at: row.get(14)?,
                        })
                    },
                )
                .optional()?;

            let Some(build) = build else { return Ok(None) };
            let gallery = query_gallery(conn, build_id)?;
            let mods = query_mods(conn, build_id)?;
            Ok(Some(BuildDetail { build, gallery, mods }))
        })
    }

    /// Insert a build with its gallery and mods in one transaction.
    pub fn create_build(&self, user_id: i64, build: &NewBuild) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let inserted = tx.execute(
                "INSERT INTO builds (user_id, name, make, model, year, trim, ownership_status,
                                     horsepower, torque, description, cover_image_url, cover_image_url_2)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                (
                    user_id,
                    &build.scalars.name,
                    &build.scalars.make,
                    &build.scalars.model,
                    build.scalars.year,
                    &build.scalars.trim,
                    &build.scalars.ownership_status,
                    build.scalars.horsepower,
                    build.scalars.torque,
                    &build.scalars.description,
                    &build.cover_image_url,
                    &build.cover_image_url_2,
                ),
            )?;
            if inserted == 0 {
                return Err(StoreError::InsertFailed("build"));
            }
            let build_id = tx.last_insert_rowid();

            insert_gallery(&tx, build_id, &build.gallery)?;
            insert_mods(&tx, build_id, &build.mods)?;

            tx.commit()?;
            Ok(build_id)
        })
    }

    /// Full reconciliation under an immediate transaction: ownership check,
    /// scalar overwrite, cover replacement, gallery diff against the retain
    /// set, then mods dropped and re-inserted in caller order.
    pub fn update_build(&self, build_id: i64, caller_id: i64, update: &BuildUpdate) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            check_owner(&tx, build_id, caller_id)?;

            tx.execute(
                "UPDATE builds SET name = ?1, make = ?2, model = ?3, year = ?4, trim = ?5,
                        ownership_status = ?6, horsepower = ?7, torque = ?8, description = ?9,
                        cover_image_url = ?10, cover_image_url_2 = ?11,
                        updated_at = datetime('now')
                 WHERE id = ?12",
                (
                    &update.scalars.name,
                    &update.scalars.make,
                    &update.scalars.model,
                    update.scalars.year,
                    &update.scalars.trim,
                    &update.scalars.ownership_status,
                    update.scalars.horsepower,
                    update.scalars.torque,
                    &update.scalars.description,
                    &update.cover_image_url,
                    &update.cover_image_url_2,
                    build_id,
                ),
            )?;

            // Gallery: drop rows outside the retain set, then append uploads.
            if update.keep_gallery.is_empty() {
                tx.execute("DELETE FROM build_gallery WHERE build_id = ?1", [build_id])?;
            } else {
                let placeholders: Vec<String> =
                    (2..=update.keep_gallery.len() + 1).map(|i| format!("?{i}")).collect();
                let sql = format!(
                    "DELETE FROM build_gallery WHERE build_id = ?1 AND image_url NOT IN ({})",
                    placeholders.join(", ")
                );
                let mut params: Vec<&dyn ToSql> = vec![&build_id];
                for url in &update.keep_gallery {
                    params.push(url);
                }
                tx.execute(&sql, params.as_slice())?;
            }
            insert_gallery(&tx, build_id, &update.new_gallery)?;

            // Mods: full replacement in caller order.
            tx.execute("DELETE FROM build_mods WHERE build_id = ?1", [build_id])?;
            insert_mods(&tx, build_id, &update.mods)?;

            tx.commit()?;
            Ok(())
        })
    }

    /// Children are removed before the parent so they never outlive it.
    pub fn delete_build(&self, build_id: i64, caller_id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            check_owner(&tx, build_id, caller_id)?;

            tx.execute("DELETE FROM build_gallery WHERE build_id = ?1", [build_id])?;
            tx.execute("DELETE FROM build_mods WHERE build_id = ?1", [build_id])?;
            tx.execute("DELETE FROM builds WHERE id = ?1", [build_id])?;

            tx.commit()?;
            Ok(())
        })
    }
}

const BUILD_SUMMARY_SELECT: &str =
    "SELECT b.id, b.user_id, u.username, b.name, b.make, b.model, b.year,
            b.ownership_status, b.cover_image_url
     FROM builds b
     JOIN users u ON b.user_id = u.id";

fn build_summary_from_row(row: &rusqlite::Row) -> rusqlite::Result<BuildSummaryRow> {
    Ok(BuildSummaryRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        name: row.get(3)?,
        make: row.get(4)?,
        model: row.get(5)?,
        year: row.get(6)?,
        ownership_status: row.get(7)?,
        cover_image_url: row.get(8)?,
    })
}

fn check_owner(tx: &Transaction, build_id: i64, caller_id: i64) -> Result<()> {
    let owner: Option<i64> = tx
        .query_row("SELECT user_id FROM builds WHERE id = ?1", [build_id], |row| row.get(0))
        .optional()?;
    let owner = owner.ok_or(StoreError::NotFound)?;
    if owner != caller_id {
        return Err(StoreError::NotOwner);
    }
    Ok(())
}

fn insert_gallery(tx: &Transaction, build_id: i64, urls: &[String]) -> Result<()> {
    for url in urls {
        tx.execute(
            "INSERT INTO build_gallery (build_id, image_url) VALUES (?1, ?2)",
            (build_id, url),
        )?;
    }
    Ok(())
}

fn insert_mods(tx: &Transaction, build_id: i64, mods: &[NewMod]) -> Result<()> {
    for (position, m) in mods.iter().enumerate() {
        tx.execute(
            "INSERT INTO build_mods (build_id, category, sub_category, name, image_url, note, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                build_id,
                &m.category,
                &m.sub_category,
                &m.name,
                &m.image_url,
                &m.note,
                position as i64,
            ),
        )?;
    }
    Ok(())
}

fn query_gallery(conn: &Connection, build_id: i64) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT image_url FROM build_gallery WHERE build_id = ?1 ORDER BY id")?;
    let rows = stmt
        .query_map([build_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_mods(conn: &Connection, build_id: i64) -> Result<Vec<ModRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, category, sub_category, name, image_url, note
         FROM build_mods WHERE build_id = ?1 ORDER BY position",
    )?;
    let rows = stmt
        .query_map([build_id], |row| {
            Ok(ModRow {
                id: row.get(0)?,
                category: row.get(1)?,
                sub_category: row.get(2)?,
                name: row.get(3)?,
                image_url: row.get(4)?,
                note: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{insert_user, test_db};

    fn scalars(name: &str) -> BuildScalars {
        BuildScalars {
            name: name.into(),
            make: "Nissan".into(),
            model: "240SX".into(),
            year: 1995,
            trim: Some("SE".into()),
            ownership_status: "current".into(),
            horsepower: Some(320),
            torque: Some(280),
            description: None,
        }
    }

    fn simple_mod(name: &str, image_url: Option<&str>) -> NewMod {
        NewMod {
            category: "Engine".into(),
            sub_category: None,
            name: name.into(),
            image_url: image_url.map(Into::into),
            note: None,
        }
    }

    fn create_sample(db: &Database, user_id: i64, gallery: &[&str], mods: Vec<NewMod>) -> i64 {
        db.create_build(
            user_id,
            &NewBuild {
                scalars: scalars("Drift Missile"),
                cover_image_url: Some("/uploads/cover1.jpg".into()),
                cover_image_url_2: None,
                gallery: gallery.iter().map(|s| s.to_string()).collect(),
                mods,
            },
        )
        .unwrap()
    }

    fn update_with(mods: Vec<NewMod>, keep: &[&str], new: &[&str]) -> BuildUpdate {
        BuildUpdate {
            scalars: scalars("Drift Missile"),
            cover_image_url: Some("/uploads/cover1.jpg".into()),
            cover_image_url_2: None,
            keep_gallery: keep.iter().map(|s| s.to_string()).collect(),
            new_gallery: new.iter().map(|s| s.to_string()).collect(),
            mods,
        }
    }

    #[test]
    fn create_persists_parent_gallery_and_mods_in_order() {
        let db = test_db();
        let uid = insert_user(&db, "alex", "a@x.com");
        let id = create_sample(
            &db,
            uid,
            &["/uploads/g1.jpg", "/uploads/g2.jpg"],
            vec![simple_mod("Turbo", None), simple_mod("Coilovers", None)],
        );

        let detail = db.get_build(id).unwrap().unwrap();
        assert_eq!(detail.build.username, "alex");
        assert_eq!(detail.gallery.len(), 2);
        assert_eq!(detail.mods[0].name, "Turbo");
        assert_eq!(detail.mods[1].name, "Coilovers");
    }

    #[test]
    fn child_insert_failure_rolls_back_everything() {
        let db = test_db();
        let uid = insert_user(&db, "alex", "a@x.com");
        db.with_conn(|conn| {
            conn.execute_batch("DROP TABLE build_mods")?;
            Ok(())
        })
        .unwrap();

        let res = db.create_build(
            uid,
            &NewBuild {
                scalars: scalars("Doomed"),
                cover_image_url: None,
                cover_image_url_2: None,
                gallery: vec!["/uploads/g1.jpg".into()],
                mods: vec![simple_mod("Turbo", None)],
            },
        );
        assert!(res.is_err());

        let builds: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM builds", [], |r| r.get(0))?))
            .unwrap();
        let gallery: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM build_gallery", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(builds, 0);
        assert_eq!(gallery, 0);
    }

    #[test]
    fn mod_update_always_leaves_exactly_the_new_list() {
        let db = test_db();
        let uid = insert_user(&db, "alex", "a@x.com");
        let id = create_sample(
            &db,
            uid,
            &[],
            vec![
                simple_mod("Turbo", None),
                simple_mod("Coilovers", None),
                simple_mod("Exhaust", None),
            ],
        );

        db.update_build(id, uid, &update_with(vec![simple_mod("Wing", Some("/uploads/w.jpg"))], &[], &[]))
            .unwrap();

        let detail = db.get_build(id).unwrap().unwrap();
        assert_eq!(detail.mods.len(), 1);
        assert_eq!(detail.mods[0].name, "Wing");
        assert_eq!(detail.mods[0].image_url.as_deref(), Some("/uploads/w.jpg"));
    }

    #[test]
    fn gallery_reconciliation_keeps_retained_and_appends_new() {
        let db = test_db();
        let uid = insert_user(&db, "alex", "a@x.com");
        let id = create_sample(&db, uid, &["/u/a.jpg", "/u/b.jpg", "/u/c.jpg"], vec![]);

        db.update_build(id, uid, &update_with(vec![], &["/u/b.jpg"], &["/u/d.jpg"]))
            .unwrap();

        let detail = db.get_build(id).unwrap().unwrap();
        assert_eq!(detail.gallery, vec!["/u/b.jpg".to_string(), "/u/d.jpg".to_string()]);
    }

    #[test]
    fn empty_retain_set_deletes_the_whole_gallery() {
        let db = test_db();
        let uid = insert_user(&db, "alex", "a@x.com");
        let id = create_sample(&db, uid, &["/u/a.jpg", "/u/b.jpg"], vec![]);

        db.update_build(id, uid, &update_with(vec![], &[], &[])).unwrap();

        let detail = db.get_build(id).unwrap().unwrap();
        assert!(detail.gallery.is_empty());
    }

    #[test]
    fn update_by_non_owner_is_forbidden() {
        let db = test_db();
        let owner = insert_user(&db, "alex", "a@x.com");
        let stranger = insert_user(&db, "pat", "p@x.com");
        let id = create_sample(&db, owner, &[], vec![]);

        let res = db.update_build(id, stranger, &update_with(vec![], &[], &[]));
        assert!(matches!(res, Err(StoreError::NotOwner)));

        let res = db.update_build(999, stranger, &update_with(vec![], &[], &[]));
        assert!(matches!(res, Err(StoreError::NotFound)));
    }

    #[test]
    fn delete_removes_children_with_the_parent() {
        let db = test_db();
        let uid = insert_user(&db, "alex", "a@x.com");
        let id = create_sample(&db, uid, &["/u/a.jpg"], vec![simple_mod("Turbo", None)]);

        db.delete_build(id, uid).unwrap();
        assert!(db.get_build(id).unwrap().is_none());

        let orphans: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT (SELECT COUNT(*) FROM build_gallery) + (SELECT COUNT(*) FROM build_mods)",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn delete_by_non_owner_is_forbidden() {
        let db = test_db();
        let owner = insert_user(&db, "alex", "a@x.com");
        let stranger = insert_user(&db, "pat", "p@x.com");
        let id = create_sample(&db, owner, &[], vec![]);

        assert!(matches!(db.delete_build(id, stranger), Err(StoreError::NotOwner)));
        assert!(db.get_build(id).unwrap().is_some());
    }

    #[test]
    fn search_matches_name_make_and_model() {
        let db = test_db();
        let uid = insert_user(&db, "alex", "a@x.com");
        create_sample(&db, uid, &[], vec![]);

        assert_eq!(db.search_builds("drift").unwrap().len(), 1);
        assert_eq!(db.search_builds("nissan").unwrap().len(), 1);
        assert_eq!(db.search_builds("240").unwrap().len(), 1);
        assert!(db.search_builds("miata").unwrap().is_empty());
    }
}
