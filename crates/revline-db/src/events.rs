use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use crate::error::{is_constraint_violation, is_foreign_key_violation};
use crate::models::{CarRow, EventRow, NewCar, NewRegistration, RegistrationRow, RegistrationUpdate};
use crate::{Database, Result, StoreError};

impl Database {
    pub fn list_events(&self) -> Result<Vec<EventRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, location, event_date, description FROM Events ORDER BY event_date",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(EventRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        location: row.get(2)?,
                        event_date: row.get(3)?,
                        description: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn is_registered(&self, event_id: i64, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM event_registrations WHERE event_id = ?1 AND email = ?2",
                (event_id, email),
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    /// Insert a registration and its cars in one transaction. Either the
    /// parent and all cars persist, or nothing does.
    pub fn create_registration(&self, reg: &NewRegistration) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let inserted = tx
                .execute(
                    "INSERT INTO event_registrations (event_id, user_id, name, email, phone)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    (reg.event_id, reg.user_id, &reg.name, &reg.email, &reg.phone),
                )
                .map_err(|e| {
                    if is_foreign_key_violation(&e) {
                        StoreError::NotFound
                    } else if is_constraint_violation(&e, "event_registrations") {
                        StoreError::DuplicateRegistration
                    } else {
                        e.into()
                    }
                })?;
            if inserted == 0 {
                return Err(StoreError::InsertFailed("event registration"));
            }
            let reg_id = tx.last_insert_rowid();

            insert_cars(&tx, reg_id, &reg.cars)?;

            tx.commit()?;
            Ok(reg_id)
        })
    }

    /// Caller-scoped read: another user's registration for the same event is
    /// reported as absent, never revealed.
    pub fn get_registration_for_user(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<(RegistrationRow, Vec<CarRow>)>> {
        self.with_conn(|conn| {
            let reg = conn
                .query_row(
                    "SELECT id, event_id, user_id, name, email, phone
                     FROM event_registrations WHERE event_id = ?1 AND user_id = ?2",
                    (event_id, user_id),
                    |row| {
                        Ok(RegistrationRow {
                            id: row.get(0)?,
                            event_id: row.get(1)?,
                            user_id: row.get(2)?,
                            name: row.get(3)?,
                            email: row.get(4)?,
                            phone: row.get(5)?,
                        })
                    },
                )
                .optional()?;

            let Some(reg) = reg else { return Ok(None) };
            let cars = query_cars(conn, reg.id)?;
            Ok(Some((reg, cars)))
        })
    }

    /// Full replace: registrant fields are overwritten and the car set is
    /// dropped and re-inserted. Ownership is checked under an immediate
    /// transaction so a concurrent writer cannot slip between check and
    /// mutation.
    pub fn update_registration(
        &self,
        reg_id: i64,
        caller_id: i64,
        update: &RegistrationUpdate,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let owner: Option<i64> = tx
                .query_row(
                    "SELECT user_id FROM event_registrations WHERE id = ?1",
                    [reg_id],
                    |row| row.get(0),
                )
                .optional()?;
            let owner = owner.ok_or(StoreError::NotFound)?;
            if owner != caller_id {
                return Err(StoreError::NotOwner);
            }

            tx.execute(
                "UPDATE event_registrations SET name = ?1, email = ?2, phone = ?3 WHERE id = ?4",
                (&update.name, &update.email, &update.phone, reg_id),
            )
            .map_err(|e| {
                if is_constraint_violation(&e, "event_registrations") {
                    StoreError::DuplicateRegistration
                } else {
                    e.into()
                }
            })?;

            tx.execute(
                "DELETE FROM registered_cars WHERE registration_id = ?1",
                [reg_id],
            )?;
            insert_cars(&tx, reg_id, &update.cars)?;

            tx.commit()?;
            Ok(())
        })
    }
}

fn insert_cars(tx: &rusqlite::Transaction, reg_id: i64, cars: &[NewCar]) -> Result<()> {
    for car in cars {
        tx.execute(
            "INSERT INTO registered_cars (registration_id, make, model, year, color, mileage, modifications)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                reg_id,
                &car.make,
                &car.model,
                car.year,
                &car.color,
                car.mileage,
                &car.modifications,
            ),
        )?;
    }
    Ok(())
}

fn query_cars(conn: &Connection, reg_id: i64) -> Result<Vec<CarRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, make, model, year, color, mileage, modifications
         FROM registered_cars WHERE registration_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map([reg_id], |row| {
            Ok(CarRow {
                id: row.get(0)?,
                make: row.get(1)?,
                model: row.get(2)?,
                year: row.get(3)?,
                color: row.get(4)?,
                mileage: row.get(5)?,
                modifications: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
