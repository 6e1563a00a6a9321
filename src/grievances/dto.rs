use serde::Deserialize;

/// Partial update from a handler: `null` and absent both mean "leave the
/// field unchanged".
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrievanceUpdate {
    pub status: Option<String>,
    pub resolution_notes: Option<String>,
}
