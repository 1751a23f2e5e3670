use sqlx::PgPool;
use tracing::instrument;

use crate::modules::movies::model::{CreateMovieDto, Filters, Movie};
use crate::utils::errors::AppError;

const MOVIE_COLUMNS: &str = "id, created_at, title, year, runtime, genres, version";

pub struct MovieService;

impl MovieService {
    #[instrument(skip(db, dto))]
    pub async fn insert(db: &PgPool, dto: CreateMovieDto) -> Result<Movie, AppError> {
        let query = format!(
            "INSERT INTO movies (title, year, runtime, genres)
             VALUES ($1, $2, $3, $4)
             RETURNING {MOVIE_COLUMNS}"
        );

        let movie = sqlx::query_as::<_, Movie>(&query)
            .bind(&dto.title)
            .bind(dto.year)
            .bind(dto.runtime)
            .bind(&dto.genres)
            .fetch_one(db)
            .await?;

        Ok(movie)
    }

    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, id: i64) -> Result<Movie, AppError> {
        let query = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1");

        sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(AppError::not_found)
    }

    /// Lists movies matching the validated filters.
    ///
    /// The ORDER BY clause is assembled from the typed sort value, which can
    /// only name a safelisted column; every client-supplied value is bound as
    /// a parameter.
    #[instrument(skip(db, filters))]
    pub async fn list(db: &PgPool, filters: &Filters) -> Result<Vec<Movie>, AppError> {
        let query = format!(
            "SELECT {MOVIE_COLUMNS}
             FROM movies
             WHERE (to_tsvector('simple', title) @@ plainto_tsquery('simple', $1) OR $1 = '')
               AND (genres @> $2 OR $2 = '{{}}')
             ORDER BY {} {}, id ASC
             LIMIT $3 OFFSET $4",
            filters.sort.column.as_sql(),
            filters.sort.direction(),
        );

        let movies = sqlx::query_as::<_, Movie>(&query)
            .bind(&filters.title)
            .bind(&filters.genres)
            .bind(filters.limit())
            .bind(filters.offset())
            .fetch_all(db)
            .await?;

        Ok(movies)
    }

    /// Persists an updated movie under optimistic locking: the row is only
    /// touched if its version still matches, otherwise the caller raced a
    /// concurrent update and gets an edit conflict.
    #[instrument(skip(db, movie))]
    pub async fn update(db: &PgPool, movie: &Movie) -> Result<Movie, AppError> {
        let query = format!(
            "UPDATE movies
             SET title = $1, year = $2, runtime = $3, genres = $4, version = version + 1
             WHERE id = $5 AND version = $6
             RETURNING {MOVIE_COLUMNS}"
        );

        sqlx::query_as::<_, Movie>(&query)
            .bind(&movie.title)
            .bind(movie.year)
            .bind(movie.runtime)
            .bind(&movie.genres)
            .bind(movie.id)
            .bind(movie.version)
            .fetch_optional(db)
            .await?
            .ok_or_else(AppError::edit_conflict)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }
}
