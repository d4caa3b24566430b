use serde::Deserialize;
use utoipa::IntoParams;

/// Pagination parameters for list operations. `skip`/`limit` with no upper
/// bound enforced.
#[derive(Debug, Deserialize, IntoParams)]
pub struct PaginationParams {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    100
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}
