use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct RecalibrateRequest {
    #[serde(default)]
    pub days: Option<Vec<i64>>,
}
