//! Database row and write-input types. These map directly to SQLite rows and
//! are distinct from the revline-types API models to keep the DB layer
//! independent of the wire format.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

/// Denormalized identity shape used by follow lists and search results.
pub struct UserSummaryRow {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
}

/// Optional profile fields; `None` leaves the stored value untouched.
pub struct ProfileUpdate<'a> {
    pub display_name: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
}

pub struct EventRow {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub event_date: String,
    pub description: Option<String>,
}

pub struct RegistrationRow {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

pub struct CarRow {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub color: Option<String>,
    pub mileage: Option<i64>,
    pub modifications: Option<String>,
}

pub struct NewCar {
    pub make: String,
    pub model: String,
    pub year: i64,
    pub color: Option<String>,
    pub mileage: Option<i64>,
    pub modifications: Option<String>,
}

pub struct NewRegistration {
    pub event_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cars: Vec<NewCar>,
}

pub struct RegistrationUpdate {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cars: Vec<NewCar>,
}

pub struct BusinessRow {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
}

pub struct ReviewRow {
    pub id: i64,
    pub business_id: i64,
    pub user_id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
}

pub struct BuildRow {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub name: String,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub trim: Option<String>,
    pub ownership_status: String,
    pub horsepower: Option<i64>,
    pub torque: Option<i64>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub cover_image_url_2: Option<String>,
    pub created_at: String,
}

pub struct BuildSummaryRow {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub name: String,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub ownership_status: String,
    pub cover_image_url: Option<String>,
}

pub struct ModRow {
    pub id: i64,
    pub category: String,
    pub sub_category: Option<String>,
    pub name: String,
    pub image_url: Option<String>,
    pub note: Option<String>,
}

pub struct BuildDetail {
    pub build: BuildRow,
    pub gallery: Vec<String>,
    pub mods: Vec<ModRow>,
}

/// Mod write shape. The API layer resolves each entry's image (new upload,
/// reused URL, or none) before the row hits the store.
pub struct NewMod {
    pub category: String,
    pub sub_category: Option<String>,
    pub name: String,
    pub image_url: Option<String>,
    pub note: Option<String>,
}

pub struct BuildScalars {
    pub name: String,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub trim: Option<String>,
    pub ownership_status: String,
    pub horsepower: Option<i64>,
    pub torque: Option<i64>,
    pub description: Option<String>,
}

pub struct NewBuild {
    pub scalars: BuildScalars,
    pub cover_image_url: Option<String>,
    pub cover_image_url_2: Option<String>,
    pub gallery: Vec<String>,
    pub mods: Vec<NewMod>,
}

pub struct BuildUpdate {
    pub scalars: BuildScalars,
    pub cover_image_url: Option<String>,
    pub cover_image_url_2: Option<String>,
    /// Gallery URLs to retain; existing rows outside this set are deleted.
    pub keep_gallery: Vec<String>,
    pub new_gallery: Vec<String>,
    /// Full replacement mod list, in caller order.
    pub mods: Vec<NewMod>,
}
