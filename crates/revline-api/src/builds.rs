use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use revline_db::models::{
    BuildDetail, BuildScalars, BuildSummaryRow, BuildUpdate, NewBuild, NewMod,
};
use revline_types::api::{
    BuildDto, BuildResponse, BuildSummaryDto, BuildsResponse, Claims, CreateBuildRequest,
    MessageResponse, ModDto, ReconcileModInput, UpdateBuildRequest,
};

use crate::auth::AppState;
use crate::error::{ApiError, join_error};
use crate::extract::ApiJson;
use crate::middleware::MaybeClaims;
use crate::uploads::{save_image, save_images};

pub async fn list_builds(
    State(state): State<AppState>,
    Extension(_viewer): Extension<MaybeClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let builds = tokio::task::spawn_blocking(move || db.db.list_builds())
        .await
        .map_err(join_error)??;

    Ok(Json(BuildsResponse {
        success: true,
        builds: builds.into_iter().map(build_summary_dto).collect(),
    }))
}

/// Build detail is not access-restricted; the viewer only influences the
/// `isOwner` flag.
pub async fn get_build(
    State(state): State<AppState>,
    Path(build_id): Path<i64>,
    Extension(viewer): Extension<MaybeClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let detail = tokio::task::spawn_blocking(move || db.db.get_build(build_id))
        .await
        .map_err(join_error)??
        .ok_or(ApiError::NotFound("build not found"))?;

    let viewer_id = viewer.0.map(|claims| claims.sub);
    Ok(Json(BuildResponse { success: true, build: build_dto(detail, viewer_id) }))
}

pub async fn create_build(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateBuildRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let scalars = validated_scalars(
        req.name,
        req.make,
        req.model,
        req.year,
        req.trim,
        req.ownership_status,
        req.horsepower,
        req.torque,
        req.description,
    )?;

    let covers = save_images(&state.upload_dir, &req.cover_images).await?;
    let (cover_image_url, cover_image_url_2) = cover_slots(&[], &covers);
    let gallery = save_images(&state.upload_dir, &req.gallery_images).await?;

    let mut mods = Vec::with_capacity(req.mods.len());
    for m in req.mods {
        let image_url = match m.image {
            Some(payload) => Some(save_image(&state.upload_dir, &payload).await?),
            None => None,
        };
        mods.push(NewMod {
            category: m.category,
            sub_category: m.sub_category,
            name: m.name,
            image_url,
            note: m.note,
        });
    }

    let build = NewBuild { scalars, cover_image_url, cover_image_url_2, gallery, mods };

    let db = state.clone();
    let owner_id = claims.sub;
    let detail = tokio::task::spawn_blocking(move || {
        let build_id = db.db.create_build(owner_id, &build)?;
        db.db.get_build(build_id)
    })
    .await
    .map_err(join_error)??
    .ok_or(ApiError::Internal)?;

    Ok((
        StatusCode::CREATED,
        Json(BuildResponse { success: true, build: build_dto(detail, Some(claims.sub)) }),
    ))
}

pub async fn update_build(
    State(state): State<AppState>,
    Path(build_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UpdateBuildRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let scalars = validated_scalars(
        req.name,
        req.make,
        req.model,
        req.year,
        req.trim,
        req.ownership_status,
        req.horsepower,
        req.torque,
        req.description,
    )?;

    let new_covers = save_images(&state.upload_dir, &req.new_cover_images).await?;
    let (cover_image_url, cover_image_url_2) = cover_slots(&req.kept_cover_urls, &new_covers);

    let new_gallery = save_images(&state.upload_dir, &req.new_gallery_images).await?;
    let new_mod_urls = save_images(&state.upload_dir, &req.new_mod_images).await?;
    let mods = resolve_mod_images(req.mods, &new_mod_urls);

    let update = BuildUpdate {
        scalars,
        cover_image_url,
        cover_image_url_2,
        keep_gallery: req.kept_gallery_urls,
        new_gallery,
        mods,
    };

    let db = state.clone();
    let caller_id = claims.sub;
    let detail = tokio::task::spawn_blocking(move || {
        db.db.update_build(build_id, caller_id, &update)?;
        db.db.get_build(build_id)
    })
    .await
    .map_err(join_error)??
    .ok_or(ApiError::Internal)?;

    Ok(Json(BuildResponse { success: true, build: build_dto(detail, Some(claims.sub)) }))
}

pub async fn delete_build(
    State(state): State<AppState>,
    Path(build_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.delete_build(build_id, claims.sub))
        .await
        .map_err(join_error)??;

    Ok(Json(MessageResponse { success: true, message: "build deleted".into() }))
}

#[allow(clippy::too_many_arguments)]
fn validated_scalars(
    name: String,
    make: String,
    model: String,
    year: i64,
    trim: Option<String>,
    ownership_status: String,
    horsepower: Option<i64>,
    torque: Option<i64>,
    description: Option<String>,
) -> Result<BuildScalars, ApiError> {
    if name.trim().is_empty() || make.trim().is_empty() || model.trim().is_empty() {
        return Err(ApiError::Validation("name, make, and model are required".into()));
    }
    if ownership_status != "current" && ownership_status != "previous" {
        return Err(ApiError::Validation(
            "ownership status must be 'current' or 'previous'".into(),
        ));
    }
    Ok(BuildScalars {
        name,
        make,
        model,
        year,
        trim,
        ownership_status,
        horsepower,
        torque,
        description,
    })
}

/// The two cover slots hold caller-retained URLs in order, then new uploads
/// in order; anything past the second slot is silently dropped.
fn cover_slots(kept: &[String], new: &[String]) -> (Option<String>, Option<String>) {
    let mut combined = kept.iter().chain(new.iter()).cloned();
    let first = combined.next();
    let second = combined.next();
    (first, second)
}

/// Pair uploads to mod entries by position: each entry flagged
/// `has_new_image` consumes the next unconsumed upload in transmission
/// order; unflagged entries reuse their existing URL if any. When flags
/// outnumber uploads, trailing flagged entries stay imageless rather than
/// erroring.
fn resolve_mod_images(mods: Vec<ReconcileModInput>, new_urls: &[String]) -> Vec<NewMod> {
    let mut uploads = new_urls.iter();
    mods.into_iter()
        .map(|m| {
            let image_url = if m.has_new_image {
                uploads.next().cloned()
            } else {
                m.existing_image_url
            };
            NewMod {
                category: m.category,
                sub_category: m.sub_category,
                name: m.name,
                image_url,
                note: m.note,
            }
        })
        .collect()
}

pub(crate) fn build_summary_dto(row: BuildSummaryRow) -> BuildSummaryDto {
    BuildSummaryDto {
        id: row.id,
        user_id: row.user_id,
        username: row.username,
        name: row.name,
        make: row.make,
        model: row.model,
        year: row.year,
        ownership_status: row.ownership_status,
        cover_image_url: row.cover_image_url,
    }
}

pub(crate) fn build_dto(detail: BuildDetail, viewer_id: Option<i64>) -> BuildDto {
    let build = detail.build;
    BuildDto {
        id: build.id,
        user_id: build.user_id,
        username: build.username,
        name: build.name,
        make: build.make,
        model: build.model,
        year: build.year,
        trim: build.trim,
        ownership_status: build.ownership_status,
        horsepower: build.horsepower,
        torque: build.torque,
        description: build.description,
        cover_image_url: build.cover_image_url,
        cover_image_url_2: build.cover_image_url_2,
        gallery: detail.gallery,
        mods: detail
            .mods
            .into_iter()
            .map(|m| ModDto {
                id: m.id,
                category: m.category,
                sub_category: m.sub_category,
                name: m.name,
                image_url: m.image_url,
                note: m.note,
            })
            .collect(),
        is_owner: viewer_id == Some(build.user_id),
        created_at: build.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn entry(name: &str, has_new_image: bool, existing: Option<&str>) -> ReconcileModInput {
        ReconcileModInput {
            category: "Engine".into(),
            sub_category: None,
            name: name.into(),
            note: None,
            has_new_image,
            existing_image_url: existing.map(Into::into),
        }
    }

    #[test]
    fn cover_slots_keep_retained_before_new_and_drop_the_rest() {
        let (a, b) = cover_slots(&urls(&["/u/kept.jpg"]), &urls(&["/u/new1.jpg", "/u/new2.jpg"]));
        assert_eq!(a.as_deref(), Some("/u/kept.jpg"));
        assert_eq!(b.as_deref(), Some("/u/new1.jpg"));

        let (a, b) = cover_slots(&[], &[]);
        assert!(a.is_none() && b.is_none());

        let (a, b) = cover_slots(&urls(&["/u/1.jpg", "/u/2.jpg", "/u/3.jpg"]), &[]);
        assert_eq!(a.as_deref(), Some("/u/1.jpg"));
        assert_eq!(b.as_deref(), Some("/u/2.jpg"));
    }

    #[test]
    fn flagged_mods_consume_uploads_in_transmission_order() {
        let mods = vec![
            entry("Turbo", true, None),
            entry("Coilovers", false, Some("/u/old.jpg")),
            entry("Exhaust", true, None),
        ];
        let resolved = resolve_mod_images(mods, &urls(&["/u/n1.jpg", "/u/n2.jpg"]));

        assert_eq!(resolved[0].image_url.as_deref(), Some("/u/n1.jpg"));
        assert_eq!(resolved[1].image_url.as_deref(), Some("/u/old.jpg"));
        assert_eq!(resolved[2].image_url.as_deref(), Some("/u/n2.jpg"));
    }

    // Positional pairing is order-dependent by contract: when flagged entries
    // outnumber uploads, the trailing ones stay imageless instead of failing.
    #[test]
    fn missing_uploads_leave_trailing_flagged_entries_imageless() {
        let mods = vec![
            entry("Turbo", true, None),
            entry("Wing", true, None),
            entry("Splitter", true, Some("/u/fallback.jpg")),
        ];
        let resolved = resolve_mod_images(mods, &urls(&["/u/only.jpg"]));

        assert_eq!(resolved[0].image_url.as_deref(), Some("/u/only.jpg"));
        assert!(resolved[1].image_url.is_none());
        // Flagged entries never fall back to an existing URL.
        assert!(resolved[2].image_url.is_none());
    }

    #[test]
    fn extra_uploads_are_ignored() {
        let mods = vec![entry("Turbo", true, None)];
        let resolved = resolve_mod_images(mods, &urls(&["/u/n1.jpg", "/u/n2.jpg"]));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].image_url.as_deref(), Some("/u/n1.jpg"));
    }

    #[test]
    fn unflagged_mods_without_existing_url_stay_imageless() {
        let resolved = resolve_mod_images(vec![entry("Tune", false, None)], &urls(&["/u/n1.jpg"]));
        assert!(resolved[0].image_url.is_none());
    }

    #[test]
    fn ownership_status_must_be_current_or_previous() {
        let ok = validated_scalars(
            "Missile".into(),
            "Nissan".into(),
            "240SX".into(),
            1995,
            None,
            "previous".into(),
            None,
            None,
            None,
        );
        assert!(ok.is_ok());

        let bad = validated_scalars(
            "Missile".into(),
            "Nissan".into(),
            "240SX".into(),
            1995,
            None,
            "sold".into(),
            None,
            None,
            None,
        );
        assert!(matches!(bad, Err(ApiError::Validation(_))));
    }
}
