use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrationRequest {
    #[serde(rename = "workshopId", default)]
    pub workshop_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub age: Option<Value>,
    #[serde(default)]
    pub governorate: Option<String>,
    #[serde(default)]
    pub program_title: Option<String>,
    #[serde(default)]
    pub group_link: Option<String>,
}
