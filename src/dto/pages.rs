use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Page;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreatePageRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Lowercase letters, digits, `-` and `_`
    #[validate(length(min = 1, max = 50))]
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdatePageRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub slug: Option<String>,
    pub content: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct PageList {
    #[schema(value_type = Vec<Page>)]
    pub items: Vec<Page>,
}
