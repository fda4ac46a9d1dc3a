use std::{cell::OnceCell, collections::BTreeMap};

use common_errors::LendingError;
use common_structs::{BorrowKey, SupplyKey};
use multiversx_sc::{
    api::ManagedTypeApi,
    types::{ManagedDecimal, NumDecimals},
};

pub type ValueMap<K, M> = BTreeMap<K, ManagedDecimal<M, NumDecimals>>;

/// Lazily computed USD values of the stored positions.
///
/// Values are computed on first read and kept until [`MarketCache::invalidate`] runs, which
/// every ledger mutation and every status update does synchronously. The generation counter
/// grows by one on each invalidation.
pub struct MarketCache<M: ManagedTypeApi> {
    generation: u64,
    supply_values: OnceCell<ValueMap<SupplyKey, M>>,
    collateral_values: OnceCell<ValueMap<SupplyKey, M>>,
    borrow_values: OnceCell<ValueMap<BorrowKey, M>>,
}

impl<M: ManagedTypeApi> Default for MarketCache<M> {
    fn default() -> Self {
        MarketCache {
            generation: 0,
            supply_values: OnceCell::new(),
            collateral_values: OnceCell::new(),
            borrow_values: OnceCell::new(),
        }
    }
}

impl<M: ManagedTypeApi> MarketCache<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn invalidate(&mut self) {
        self.supply_values.take();
        self.collateral_values.take();
        self.borrow_values.take();
        self.generation += 1;
    }

    /// Retrieves or computes the value of every supply.
    ///
    /// # Arguments
    /// - `compute`: Builds the map from the ledger, the status and the prices.
    ///
    /// # Returns
    /// - The cached map, or the error raised by `compute`. Failures are not cached.
    pub fn supply_values(
        &self,
        compute: impl FnOnce() -> Result<ValueMap<SupplyKey, M>, LendingError>,
    ) -> Result<&ValueMap<SupplyKey, M>, LendingError> {
        get_or_try_init(&self.supply_values, compute)
    }

    pub fn collateral_values(
        &self,
        compute: impl FnOnce() -> Result<ValueMap<SupplyKey, M>, LendingError>,
    ) -> Result<&ValueMap<SupplyKey, M>, LendingError> {
        get_or_try_init(&self.collateral_values, compute)
    }

    pub fn borrow_values(
        &self,
        compute: impl FnOnce() -> Result<ValueMap<BorrowKey, M>, LendingError>,
    ) -> Result<&ValueMap<BorrowKey, M>, LendingError> {
        get_or_try_init(&self.borrow_values, compute)
    }
}

fn get_or_try_init<T>(
    cell: &OnceCell<T>,
    compute: impl FnOnce() -> Result<T, LendingError>,
) -> Result<&T, LendingError> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = compute()?;
    Ok(cell.get_or_init(|| value))
}
