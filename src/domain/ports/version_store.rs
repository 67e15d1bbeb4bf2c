use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Version;

/// Persistence of the data [`Version`] record.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Insert or replace the stored version
    async fn set_version(&self, version: &Version) -> DomainResult<()>;

    /// Stored version; `NotFound` when never set, `Deserialize` when malformed
    async fn version(&self) -> DomainResult<Version>;
}
