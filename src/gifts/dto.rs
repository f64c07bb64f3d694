use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::gifts::repo_types::Gift;

/// Body of `POST /gifts`. Missing `id` and `date_added` are filled by the server.
#[derive(Debug, Deserialize)]
pub struct CreateGiftRequest {
    pub id: Option<String>,
    pub name: String,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub posted_by: Option<String>,
    pub zipcode: Option<String>,
    pub date_added: Option<i64>,
    pub age_days: Option<i32>,
    pub age_years: Option<f64>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl CreateGiftRequest {
    pub fn into_gift(self) -> Gift {
        Gift {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: self.name,
            category: self.category,
            condition: self.condition,
            posted_by: self.posted_by,
            zipcode: self.zipcode,
            date_added: Some(
                self.date_added
                    .unwrap_or_else(|| OffsetDateTime::now_utc().unix_timestamp()),
            ),
            age_days: self.age_days,
            age_years: self.age_years,
            description: self.description,
            image: self.image,
        }
    }
}
