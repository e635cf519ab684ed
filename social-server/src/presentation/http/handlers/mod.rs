use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::error::DomainError;
use crate::domain::pagination::PageRequest;

pub(crate) mod posts;
pub(crate) mod system;
pub(crate) mod users;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct ListQuery {
    /// Page number, starting at 1.
    pub(crate) page: Option<u32>,
    /// Items per page (1..=100).
    pub(crate) limit: Option<u32>,
    /// Case-insensitive substring filter.
    pub(crate) search: Option<String>,
}

impl ListQuery {
    pub(crate) fn page_request(&self) -> Result<PageRequest, DomainError> {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct PageQuery {
    /// Page number, starting at 1.
    pub(crate) page: Option<u32>,
    /// Items per page (1..=100).
    pub(crate) limit: Option<u32>,
}

impl PageQuery {
    pub(crate) fn page_request(&self) -> Result<PageRequest, DomainError> {
        PageRequest::new(self.page, self.limit)
    }
}

/// Acting user for operations that carry the caller id in the body.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActorDto {
    pub(crate) user_id: Option<i64>,
}

impl ActorDto {
    pub(crate) fn required(&self) -> Result<i64, DomainError> {
        self.user_id
            .ok_or_else(|| DomainError::bad_request("userId is required"))
    }
}
