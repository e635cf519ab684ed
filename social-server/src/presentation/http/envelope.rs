use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::pagination::Page;

/// Successful response body: `{ "success": true, "data": ... }`.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ApiResponse<T> {
    pub(crate) success: bool,
    pub(crate) data: T,
}

impl<T> ApiResponse<T> {
    pub(crate) fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Failure body shared by every error status.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ApiErrorBody {
    pub(crate) success: bool,
    pub(crate) error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
}

impl ApiErrorBody {
    pub(crate) fn new(error: impl Into<String>, message: Option<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageMetaDto {
    pub(crate) total: u64,
    pub(crate) page: u32,
    pub(crate) limit: u32,
    pub(crate) total_pages: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PageDto<T> {
    pub(crate) items: Vec<T>,
    pub(crate) meta: PageMetaDto,
}

impl<T> PageDto<T> {
    pub(crate) fn from_page<S>(page: Page<S>, convert: impl FnMut(S) -> T) -> Self {
        let meta = PageMetaDto {
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages(),
        };
        Self {
            items: page.map(convert).items,
            meta,
        }
    }
}
