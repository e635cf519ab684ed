use async_trait::async_trait;

use crate::domain::error::DomainError;

#[async_trait]
pub(crate) trait StorageHealth: Send + Sync {
    async fn ping(&self) -> Result<(), DomainError>;
}
