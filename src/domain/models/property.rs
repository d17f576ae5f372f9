use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use crate::error::AppError;

pub const DEFAULT_SEARCH_LIMIT: i64 = 50;
pub const MAX_SEARCH_LIMIT: i64 = 100;

/// A listing. `price_per_night` is in minor currency units.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Property {
    pub id: String,
    pub host_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price_per_night: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewPropertyParams {
    pub host_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price_per_night: i64,
}

impl Property {
    pub fn new(params: NewPropertyParams) -> Result<Self, AppError> {
        validate_price(params.price_per_night)?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            host_id: params.host_id,
            title: params.title,
            description: params.description,
            location: params.location,
            price_per_night: params.price_per_night,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.host_id == user_id
    }
}

/// Folded form of a location stored alongside it for search. SQLite's
/// `lower()` only folds ASCII, so the folding happens here.
pub fn location_search_key(location: &str) -> String {
    location.trim().to_lowercase()
}

pub fn validate_price(price_per_night: i64) -> Result<(), AppError> {
    if price_per_night <= 0 {
        return Err(AppError::Validation("price_per_night must be greater than zero".into()));
    }
    Ok(())
}

#[derive(Debug, Serialize, FromRow, Clone, Default)]
pub struct ReviewSummary {
    pub review_count: i64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PropertyDetails {
    #[serde(flatten)]
    pub property: Property,
    #[serde(flatten)]
    pub reviews: ReviewSummary,
}

/// Filters for the public listing search. `check_in`/`check_out` only apply together.
#[derive(Debug, Clone)]
pub struct PropertySearch {
    pub location: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub host_id: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for PropertySearch {
    fn default() -> Self {
        Self {
            location: None,
            min_price: None,
            max_price: None,
            check_in: None,
            check_out: None,
            host_id: None,
            limit: DEFAULT_SEARCH_LIMIT,
            offset: 0,
        }
    }
}

impl PropertySearch {
    /// `%needle%` pattern matched against `location_search` with `ESCAPE '\'`.
    /// LIKE metacharacters in the input match literally.
    pub fn location_pattern(&self) -> Option<String> {
        self.location.as_deref()
            .map(location_search_key)
            .filter(|l| !l.is_empty())
            .map(|l| {
                let escaped = l.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
                format!("%{}%", escaped)
            })
    }

    pub fn stay_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.check_in, self.check_out) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}
