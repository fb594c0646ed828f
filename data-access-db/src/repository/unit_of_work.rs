use async_trait::async_trait;
use data_access_api::StoreResult;

use super::factory::RepositoryFactory;

/// Groups the changes made through its repositories into one save
///
/// # Example
/// ```ignore
/// let products = unit_of_work.get_repository::<Product>()?;
/// products.insert(product)?;
/// let written = unit_of_work.save_changes_async().await?;
/// ```
#[async_trait]
pub trait UnitOfWork: RepositoryFactory + Send + Sync {
    /// Save every pending change
    ///
    /// # Returns
    /// * `Ok(usize)` - The number of state entries written
    /// * `Err` - Nothing was written
    fn save_changes(&self) -> StoreResult<usize>;

    async fn save_changes_async(&self) -> StoreResult<usize>;
}
