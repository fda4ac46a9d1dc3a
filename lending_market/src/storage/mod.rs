use std::collections::BTreeMap;

use common_math::{is_zero, ray_zero};
use common_structs::{BorrowInfo, BorrowKey, SupplyInfo, SupplyKey, Token};
use multiversx_sc::{
    api::ManagedTypeApi,
    types::{ManagedDecimal, NumDecimals},
};

/// Supply and borrow positions of the account, stored as RAY based base amounts.
///
/// Every mutator upholds the same rule: an entry whose base amount reaches zero is removed
/// on the spot, so a stored entry always holds a positive base amount.
#[derive(Clone)]
pub struct PositionLedger<M: ManagedTypeApi> {
    supplies: BTreeMap<SupplyKey, SupplyInfo<M>>,
    borrows: BTreeMap<BorrowKey, BorrowInfo<M>>,
}

impl<M: ManagedTypeApi> Default for PositionLedger<M> {
    fn default() -> Self {
        PositionLedger {
            supplies: BTreeMap::new(),
            borrows: BTreeMap::new(),
        }
    }
}

impl<M: ManagedTypeApi> PositionLedger<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn supplies(&self) -> &BTreeMap<SupplyKey, SupplyInfo<M>> {
        &self.supplies
    }

    pub fn borrows(&self) -> &BTreeMap<BorrowKey, BorrowInfo<M>> {
        &self.borrows
    }

    pub fn supply(&self, token: &Token) -> Option<&SupplyInfo<M>> {
        self.supplies.get(token)
    }

    pub fn borrow(&self, key: &BorrowKey) -> Option<&BorrowInfo<M>> {
        self.borrows.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.supplies.is_empty() && self.borrows.is_empty()
    }

    /// Adds `base_amount` to the supply of `token`, creating the entry with `collateral`
    /// when it does not exist yet.
    pub fn add_supply(
        &mut self,
        token: &Token,
        base_amount: ManagedDecimal<M, NumDecimals>,
        collateral: bool,
    ) {
        if is_zero(&base_amount) {
            return;
        }
        match self.supplies.get_mut(token) {
            Some(info) => info.base_amount += base_amount,
            None => {
                self.supplies.insert(
                    token.clone(),
                    SupplyInfo {
                        base_amount,
                        collateral,
                    },
                );
            },
        }
    }

    pub fn add_borrow(&mut self, key: &BorrowKey, base_amount: ManagedDecimal<M, NumDecimals>) {
        if is_zero(&base_amount) {
            return;
        }
        match self.borrows.get_mut(key) {
            Some(info) => info.base_amount += base_amount,
            None => {
                self.borrows.insert(key.clone(), BorrowInfo { base_amount });
            },
        }
    }

    /// Returns whether a stored supply was found.
    pub fn set_collateral(&mut self, token: &Token, collateral: bool) -> bool {
        match self.supplies.get_mut(token) {
            Some(info) => {
                info.collateral = collateral;
                true
            },
            None => false,
        }
    }

    /// Removes up to `base_amount` from the supply of `token`.
    ///
    /// # Returns
    /// - The base amount left in the ledger; zero when the entry was deleted.
    pub fn subtract_supply(
        &mut self,
        token: &Token,
        base_amount: &ManagedDecimal<M, NumDecimals>,
    ) -> ManagedDecimal<M, NumDecimals> {
        let remaining = match self.supplies.get_mut(token) {
            Some(info) if &info.base_amount > base_amount => {
                info.base_amount -= base_amount.clone();
                return info.base_amount.clone();
            },
            Some(_) => ray_zero(),
            None => return ray_zero(),
        };
        self.supplies.remove(token);
        remaining
    }

    /// Removes up to `base_amount` from the debt stored under `key`.
    ///
    /// # Returns
    /// - The base amount left in the ledger; zero when the entry was deleted.
    pub fn subtract_borrow(
        &mut self,
        key: &BorrowKey,
        base_amount: &ManagedDecimal<M, NumDecimals>,
    ) -> ManagedDecimal<M, NumDecimals> {
        let remaining = match self.borrows.get_mut(key) {
            Some(info) if &info.base_amount > base_amount => {
                info.base_amount -= base_amount.clone();
                return info.base_amount.clone();
            },
            Some(_) => ray_zero(),
            None => return ray_zero(),
        };
        self.borrows.remove(key);
        remaining
    }

    pub fn remove_supply(&mut self, token: &Token) -> Option<SupplyInfo<M>> {
        self.supplies.remove(token)
    }

    pub fn remove_borrow(&mut self, key: &BorrowKey) -> Option<BorrowInfo<M>> {
        self.borrows.remove(key)
    }

    /// Puts back a supply entry exactly as it was captured before a tentative change.
    pub fn restore_supply(&mut self, token: &Token, previous: Option<SupplyInfo<M>>) {
        match previous {
            Some(info) => {
                self.supplies.insert(token.clone(), info);
            },
            None => {
                self.supplies.remove(token);
            },
        }
    }
}
