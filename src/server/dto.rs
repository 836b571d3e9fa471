use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GroupNameRequest {
    pub name: String,
}
