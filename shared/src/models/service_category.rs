//! Service categories businesses list themselves under

use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceInput {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(length(max = 1000, message = "Description is too long"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceInput {
    #[validate(length(min = 1, max = 100, message = "Name should not be empty"))]
    pub name: Option<String>,
    #[validate(length(max = 1000, message = "Description is too long"))]
    pub description: Option<String>,
}

impl UpdateServiceInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}
