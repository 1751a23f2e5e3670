use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::utils::errors::AppError;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub year: i32,
    /// Runtime in minutes.
    pub runtime: i32,
    pub genres: Vec<String>,
    /// Incremented on every update; drives edit-conflict detection.
    pub version: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMovieDto {
    #[validate(length(min = 1, max = 500, message = "must be between 1 and 500 bytes long"))]
    pub title: String,
    #[validate(custom(function = validate_year))]
    pub year: i32,
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub runtime: i32,
    #[validate(custom(function = validate_genres))]
    pub genres: Vec<String>,
}

/// Partial update; absent fields keep their current values.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMovieDto {
    #[validate(length(min = 1, max = 500, message = "must be between 1 and 500 bytes long"))]
    pub title: Option<String>,
    #[validate(custom(function = validate_year))]
    pub year: Option<i32>,
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub runtime: Option<i32>,
    #[validate(custom(function = validate_genres))]
    pub genres: Option<Vec<String>>,
}

fn validate_year(year: i32) -> Result<(), ValidationError> {
    if year < 1888 {
        return Err(ValidationError::new("year").with_message("must be greater than 1888".into()));
    }
    if year > Utc::now().year() {
        return Err(ValidationError::new("year").with_message("must not be in the future".into()));
    }
    Ok(())
}

fn validate_genres(genres: &[String]) -> Result<(), ValidationError> {
    if genres.is_empty() {
        return Err(
            ValidationError::new("genres").with_message("must contain at least 1 genre".into())
        );
    }
    if genres.len() > 5 {
        return Err(ValidationError::new("genres")
            .with_message("must not contain more than 5 genres".into()));
    }
    let unique: HashSet<&String> = genres.iter().collect();
    if unique.len() != genres.len() {
        return Err(ValidationError::new("genres")
            .with_message("must not contain duplicate values".into()));
    }
    Ok(())
}

/// Column a movie listing may be ordered by.
///
/// Client sort values are parsed exactly once, during query validation, into
/// this type; SQL generation can only ever see a safelisted column name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Title,
    Year,
    Runtime,
}

impl SortColumn {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Title => "title",
            SortColumn::Year => "year",
            SortColumn::Runtime => "runtime",
        }
    }
}

/// A validated sort order: a safelisted column plus a direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sort {
    pub column: SortColumn,
    pub descending: bool,
}

impl Sort {
    /// Parses a client-supplied sort value (`title`, `-year`, ...) against
    /// the safelist. Anything not on it yields `None`.
    pub fn parse(value: &str) -> Option<Sort> {
        let (descending, column) = match value.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, value),
        };

        let column = match column {
            "id" => SortColumn::Id,
            "title" => SortColumn::Title,
            "year" => SortColumn::Year,
            "runtime" => SortColumn::Runtime,
            _ => return None,
        };

        Some(Sort { column, descending })
    }

    pub fn direction(self) -> &'static str {
        if self.descending { "DESC" } else { "ASC" }
    }
}

/// Raw query parameters for `GET /v1/movies`, before validation.
#[derive(Debug, Default, Deserialize)]
pub struct ListMoviesQuery {
    pub title: Option<String>,
    /// Comma-separated genre list; all must be present on a match.
    pub genres: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort: Option<String>,
}

/// Validated listing filters, safe to hand to SQL generation.
#[derive(Clone, Debug)]
pub struct Filters {
    pub title: String,
    pub genres: Vec<String>,
    pub page: i64,
    pub page_size: i64,
    pub sort: Sort,
}

impl Filters {
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

impl ListMoviesQuery {
    pub fn into_filters(self) -> Result<Filters, AppError> {
        let mut errors: HashMap<String, String> = HashMap::new();

        let page = self.page.unwrap_or(1);
        if !(1..=10_000_000).contains(&page) {
            errors.insert(
                "page".to_string(),
                "must be between 1 and 10 million".to_string(),
            );
        }

        let page_size = self.page_size.unwrap_or(20);
        if !(1..=100).contains(&page_size) {
            errors.insert(
                "page_size".to_string(),
                "must be between 1 and 100".to_string(),
            );
        }

        let sort_value = self.sort.unwrap_or_else(|| "id".to_string());
        let sort = match Sort::parse(&sort_value) {
            Some(sort) => sort,
            None => {
                errors.insert("sort".to_string(), "invalid sort value".to_string());
                Sort {
                    column: SortColumn::Id,
                    descending: false,
                }
            }
        };

        if !errors.is_empty() {
            return Err(AppError::failed_validation(errors));
        }

        Ok(Filters {
            title: self.title.unwrap_or_default(),
            genres: self
                .genres
                .map(|genres| {
                    genres
                        .split(',')
                        .map(|genre| genre.trim().to_string())
                        .filter(|genre| !genre.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            page,
            page_size,
            sort,
        })
    }
}
