use std::{collections::BTreeMap, fs, path::Path};

use common_constants::{BPS, DEFAULT_LIQUIDATION_PROBABILITY, MAX_LIQUIDATION_BONUS};
use common_errors::{
    ERROR_ASSET_ALREADY_SUPPORTED, ERROR_INVALID_LIQUIDATION_BONUS,
    ERROR_INVALID_LIQUIDATION_PROBABILITY, ERROR_INVALID_LIQUIDATION_THRESHOLD,
    ERROR_INVALID_THRESHOLD_ABOVE_ONE,
};
use common_structs::{AssetConfig, Token};
use multiversx_sc::api::ManagedTypeApi;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read market config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse market config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("asset {symbol}: {reason}")]
    InvalidAsset {
        symbol: String,
        reason: &'static str,
    },
    #[error("market {market}: {reason}")]
    InvalidMarket {
        market: String,
        reason: &'static str,
    },
}

/// One row of the risk parameter source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetConfigRow {
    pub symbol: String,
    pub max_ltv_bps: u64,
    pub liquidation_threshold_bps: u64,
    pub liquidation_bonus_bps: u64,
    #[serde(default)]
    pub can_collateral: bool,
    #[serde(default)]
    pub can_borrow: bool,
    #[serde(default)]
    pub can_borrow_stable: bool,
}

impl AssetConfigRow {
    /// Checks the row against the protocol bounds.
    ///
    /// # Arguments
    /// - `self`: Row as read from the source.
    ///
    /// # Returns
    /// - `Ok(())` when the threshold sits between the loan-to-value and 100% and the bonus
    ///   does not exceed `MAX_LIQUIDATION_BONUS`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason| ConfigError::InvalidAsset {
            symbol: self.symbol.to_uppercase(),
            reason,
        };

        if self.liquidation_threshold_bps < self.max_ltv_bps {
            return Err(invalid(ERROR_INVALID_LIQUIDATION_THRESHOLD));
        }
        if self.liquidation_threshold_bps > BPS as u64 {
            return Err(invalid(ERROR_INVALID_THRESHOLD_ABOVE_ONE));
        }
        if u128::from(self.liquidation_bonus_bps) > MAX_LIQUIDATION_BONUS {
            return Err(invalid(ERROR_INVALID_LIQUIDATION_BONUS));
        }
        Ok(())
    }

    pub fn to_asset_config<M: ManagedTypeApi>(&self) -> AssetConfig<M> {
        AssetConfig::new(
            self.max_ltv_bps,
            self.liquidation_threshold_bps,
            self.liquidation_bonus_bps,
            self.can_collateral,
            self.can_borrow,
            self.can_borrow_stable,
        )
    }
}

/// Static per-token risk parameters, loaded once before the simulation starts.
#[derive(Clone)]
pub struct RiskParameterTable<M: ManagedTypeApi> {
    assets: BTreeMap<String, AssetConfig<M>>,
}

impl<M: ManagedTypeApi> Default for RiskParameterTable<M> {
    fn default() -> Self {
        RiskParameterTable {
            assets: BTreeMap::new(),
        }
    }
}

impl<M: ManagedTypeApi> RiskParameterTable<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows<'a>(
        rows: impl IntoIterator<Item = &'a AssetConfigRow>,
    ) -> Result<Self, ConfigError> {
        let mut table = Self::new();
        for row in rows {
            table.insert_row(row)?;
        }
        Ok(table)
    }

    pub fn insert_row(&mut self, row: &AssetConfigRow) -> Result<(), ConfigError> {
        row.validate()?;

        let symbol = row.symbol.trim().to_uppercase();
        if self.assets.contains_key(&symbol) {
            return Err(ConfigError::InvalidAsset {
                symbol,
                reason: ERROR_ASSET_ALREADY_SUPPORTED,
            });
        }
        self.assets.insert(symbol, row.to_asset_config());
        Ok(())
    }

    pub fn get(&self, token: &Token) -> Option<&AssetConfig<M>> {
        self.assets.get(token.symbol())
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.assets.contains_key(token.symbol())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

fn default_liquidation_probability() -> u64 {
    DEFAULT_LIQUIDATION_PROBABILITY
}

/// TOML description of a lending market.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarketConfig {
    pub name: String,
    /// Chance, in basis points, that a liquidation pass runs on a step.
    #[serde(default = "default_liquidation_probability")]
    pub liquidation_probability_bps: u64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub assets: Vec<AssetConfigRow>,
}

impl MarketConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: MarketConfig = toml::from_str(source)?;
        config.validate()?;

        info!(
            market = %config.name,
            assets = config.assets.len(),
            liquidation_probability_bps = config.liquidation_probability_bps,
            "market config loaded"
        );
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.liquidation_probability_bps > BPS as u64 {
            return Err(ConfigError::InvalidMarket {
                market: self.name.clone(),
                reason: ERROR_INVALID_LIQUIDATION_PROBABILITY,
            });
        }
        for row in &self.assets {
            row.validate()?;
        }
        Ok(())
    }

    pub fn risk_parameters<M: ManagedTypeApi>(&self) -> Result<RiskParameterTable<M>, ConfigError> {
        RiskParameterTable::from_rows(&self.assets)
    }
}
