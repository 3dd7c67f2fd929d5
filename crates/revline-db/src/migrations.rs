use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            username        TEXT NOT NULL UNIQUE,
            email           TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL,
            display_name    TEXT NOT NULL,
            bio             TEXT,
            avatar_url      TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS Events (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            location        TEXT NOT NULL,
            event_date      TEXT NOT NULL,
            description     TEXT
        );

        CREATE TABLE IF NOT EXISTS event_registrations (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id        INTEGER NOT NULL REFERENCES Events(id),
            user_id         INTEGER NOT NULL REFERENCES users(id),
            name            TEXT NOT NULL,
            email           TEXT NOT NULL,
            phone           TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(event_id, email)
        );

        CREATE TABLE IF NOT EXISTS registered_cars (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            registration_id INTEGER NOT NULL REFERENCES event_registrations(id),
            make            TEXT NOT NULL,
            model           TEXT NOT NULL,
            year            INTEGER NOT NULL,
            color           TEXT,
            mileage         INTEGER,
            modifications   TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_cars_registration
            ON registered_cars(registration_id);

        CREATE TABLE IF NOT EXISTS businesses (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL UNIQUE,
            category        TEXT,
            address         TEXT,
            phone           TEXT,
            website         TEXT,
            description     TEXT
        );

        CREATE TABLE IF NOT EXISTS business_reviews (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            business_id     INTEGER NOT NULL REFERENCES businesses(id),
            user_id         INTEGER NOT NULL REFERENCES users(id),
            rating          INTEGER NOT NULL CHECK(rating BETWEEN 1 AND 5),
            comment         TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(business_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_reviews_business
            ON business_reviews(business_id, created_at);

        CREATE TABLE IF NOT EXISTS builds (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id             INTEGER NOT NULL REFERENCES users(id),
            name                TEXT NOT NULL,
            make                TEXT NOT NULL,
            model               TEXT NOT NULL,
            year                INTEGER NOT NULL,
            trim                TEXT,
            ownership_status    TEXT NOT NULL CHECK(ownership_status IN ('current', 'previous')),
            horsepower          INTEGER,
            torque              INTEGER,
            description         TEXT,
            cover_image_url     TEXT,
            cover_image_url_2   TEXT,
            created_at          TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_builds_user
            ON builds(user_id);

        CREATE TABLE IF NOT EXISTS build_gallery (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            build_id    INTEGER NOT NULL REFERENCES builds(id),
            image_url   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_gallery_build
            ON build_gallery(build_id);

        CREATE TABLE IF NOT EXISTS build_mods (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            build_id        INTEGER NOT NULL REFERENCES builds(id),
            category        TEXT NOT NULL,
            sub_category    TEXT,
            name            TEXT NOT NULL,
            image_url       TEXT,
            note            TEXT,
            position        INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_mods_build
            ON build_mods(build_id, position);

        CREATE TABLE IF NOT EXISTS follows (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            follower_id     INTEGER NOT NULL REFERENCES users(id),
            followed_id     INTEGER NOT NULL REFERENCES users(id),
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(follower_id, followed_id),
            CHECK(follower_id != followed_id)
        );

        CREATE INDEX IF NOT EXISTS idx_follows_followed
            ON follows(followed_id);

        -- Seed reference data (read-only in the API)
        INSERT OR IGNORE INTO Events (id, name, location, event_date, description) VALUES
            (1, 'Cars & Coffee Spring Meet', 'Riverside Fairgrounds', '2025-04-12', 'Open meet, all makes welcome'),
            (2, 'Midnight Touge Run', 'Angeles Crest Highway', '2025-06-21', 'Spirited drive, radios required'),
            (3, 'Import Showcase', 'Convention Center Hall B', '2025-09-06', 'Judged show with rolling entry');

        INSERT OR IGNORE INTO businesses (id, name, category, address, phone, website, description) VALUES
            (1, 'Apex Performance', 'Tuning', '1204 Industrial Way', '555-0134', 'https://apexperf.example', 'Dyno tuning and ECU calibration'),
            (2, 'Redline Detailing', 'Detailing', '88 Harbor Blvd', '555-0178', NULL, 'Paint correction and ceramic coating'),
            (3, 'Torque House Fabrication', 'Fabrication', '417 Foundry St', NULL, NULL, 'Custom exhaust and roll cages');
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
