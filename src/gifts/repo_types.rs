use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Gift listing as stored and served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Gift {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub posted_by: Option<String>,
    pub zipcode: Option<String>,
    pub date_added: Option<i64>, // unix seconds
    pub age_days: Option<i32>,
    pub age_years: Option<f64>,
    pub description: Option<String>,
    pub image: Option<String>,
}
