use std::collections::BTreeMap;

use common_errors::{LendingError, Operation, ERROR_INSUFFICIENT_BALANCE, ERROR_PRICE_NOT_FOUND};
use common_math::{rescale_half_up, to_decimal};
use common_rates::{token_value, total_value};
use common_structs::{PriceSnapshot, Token};
use multiversx_sc::{
    api::ManagedTypeApi,
    types::{BigUint, ManagedDecimal, NumDecimals},
};

/// Spendable balances the lending market debits and credits.
pub trait Wallet<M: ManagedTypeApi> {
    fn balance(&self, token: &Token) -> ManagedDecimal<M, NumDecimals>;

    fn credit(&mut self, token: &Token, amount: &ManagedDecimal<M, NumDecimals>);

    /// Fails without touching the balance when it is lower than `amount`.
    fn debit(
        &mut self,
        token: &Token,
        amount: &ManagedDecimal<M, NumDecimals>,
    ) -> Result<(), LendingError>;
}

/// In-memory wallet. Amounts are kept at each token's own precision and never go negative.
#[derive(Clone)]
pub struct AssetWallet<M: ManagedTypeApi> {
    balances: BTreeMap<Token, ManagedDecimal<M, NumDecimals>>,
}

impl<M: ManagedTypeApi> Default for AssetWallet<M> {
    fn default() -> Self {
        AssetWallet {
            balances: BTreeMap::new(),
        }
    }
}

impl<M: ManagedTypeApi> AssetWallet<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, token: &Token, amount: ManagedDecimal<M, NumDecimals>) -> Self {
        self.set_balance(token, amount);
        self
    }

    pub fn set_balance(&mut self, token: &Token, amount: ManagedDecimal<M, NumDecimals>) {
        self.balances
            .insert(token.clone(), rescale_half_up(&amount, token.decimals()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Token, &ManagedDecimal<M, NumDecimals>)> {
        self.balances.iter()
    }

    /// USD value of every held token at `prices`, WAD based.
    pub fn value(
        &self,
        prices: &PriceSnapshot<M>,
    ) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        let mut values = Vec::with_capacity(self.balances.len());
        for (token, amount) in &self.balances {
            if amount.into_raw_units() == &BigUint::zero() {
                continue;
            }
            let price = prices.price(token).ok_or_else(|| {
                LendingError::configuration(Operation::Query, token.symbol(), ERROR_PRICE_NOT_FOUND)
            })?;
            values.push(token_value(amount, price));
        }
        Ok(total_value(values.iter()))
    }
}

impl<M: ManagedTypeApi> Wallet<M> for AssetWallet<M> {
    fn balance(&self, token: &Token) -> ManagedDecimal<M, NumDecimals> {
        match self.balances.get(token) {
            Some(amount) => amount.clone(),
            None => to_decimal(BigUint::zero(), token.decimals()),
        }
    }

    fn credit(&mut self, token: &Token, amount: &ManagedDecimal<M, NumDecimals>) {
        let amount = rescale_half_up(amount, token.decimals());
        match self.balances.get_mut(token) {
            Some(balance) => *balance += amount,
            None => {
                self.balances.insert(token.clone(), amount);
            },
        }
    }

    fn debit(
        &mut self,
        token: &Token,
        amount: &ManagedDecimal<M, NumDecimals>,
    ) -> Result<(), LendingError> {
        let amount = rescale_half_up(amount, token.decimals());
        let balance = self.balance(token);
        if balance < amount {
            return Err(LendingError::insufficient_funds(
                Operation::Transfer,
                token.symbol(),
                ERROR_INSUFFICIENT_BALANCE,
            ));
        }

        self.balances.insert(token.clone(), balance - amount);
        Ok(())
    }
}
