use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::instrument;

use crate::middleware::auth::{RequireMoviesRead, RequireMoviesWrite};
use crate::modules::movies::model::{CreateMovieDto, ListMoviesQuery, UpdateMovieDto};
use crate::modules::movies::service::MovieService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

/// Parses a positive id out of the path. Anything else is indistinguishable
/// from a missing resource.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id >= 1)
        .ok_or_else(AppError::not_found)
}

#[instrument(skip(state))]
pub async fn list_movies(
    State(state): State<AppState>,
    _perm: RequireMoviesRead,
    Query(query): Query<ListMoviesQuery>,
) -> Result<Json<Value>, AppError> {
    let filters = query.into_filters()?;
    let movies = MovieService::list(&state.db, &filters).await?;

    Ok(Json(json!({ "movies": movies })))
}

#[instrument(skip(state, dto))]
pub async fn create_movie(
    State(state): State<AppState>,
    _perm: RequireMoviesWrite,
    ValidatedJson(dto): ValidatedJson<CreateMovieDto>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let movie = MovieService::insert(&state.db, dto).await?;

    Ok((StatusCode::CREATED, Json(json!({ "movie": movie }))))
}

#[instrument(skip(state))]
pub async fn show_movie(
    State(state): State<AppState>,
    _perm: RequireMoviesRead,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let movie = MovieService::get(&state.db, id).await?;

    Ok(Json(json!({ "movie": movie })))
}

#[instrument(skip(state, dto))]
pub async fn update_movie(
    State(state): State<AppState>,
    _perm: RequireMoviesWrite,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateMovieDto>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let mut movie = MovieService::get(&state.db, id).await?;

    if let Some(title) = dto.title {
        movie.title = title;
    }
    if let Some(year) = dto.year {
        movie.year = year;
    }
    if let Some(runtime) = dto.runtime {
        movie.runtime = runtime;
    }
    if let Some(genres) = dto.genres {
        movie.genres = genres;
    }

    let movie = MovieService::update(&state.db, &movie).await?;

    Ok(Json(json!({ "movie": movie })))
}

#[instrument(skip(state))]
pub async fn delete_movie(
    State(state): State<AppState>,
    _perm: RequireMoviesWrite,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    MovieService::delete(&state.db, id).await?;

    Ok(Json(json!({ "message": "movie successfully deleted" })))
}
