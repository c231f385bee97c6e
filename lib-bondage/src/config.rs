//! Bonding Service Configuration
//!
//! Loaded from TOML. Every field is optional in the file:
//! ```toml
//! owner = "0x0101...01"
//! service_address = "0x0b0b...0b"
//! arbiter = "0x0707...07"
//! max_dots_per_curve = 1000000
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use lib_types::{Address, DotCount};

use crate::curve::DEFAULT_DOT_CEILING;
use crate::errors::{BondageError, BondageResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BondageConfig {
    /// May set the arbiter
    #[serde(with = "address_hex")]
    pub owner: Address,
    /// Account that holds bonded tokens
    #[serde(with = "address_hex")]
    pub service_address: Address,
    /// Set at startup instead of through `set_arbiter_address`
    #[serde(with = "option_address_hex")]
    pub arbiter: Option<Address>,
    /// Service-wide cap on issuance per curve; a curve's own ceiling wins when lower
    pub max_dots_per_curve: DotCount,
}

impl Default for BondageConfig {
    fn default() -> Self {
        Self {
            owner: Address::zero(),
            service_address: Address::new([0x0b; 32]),
            arbiter: None,
            max_dots_per_curve: DEFAULT_DOT_CEILING,
        }
    }
}

impl BondageConfig {
    pub fn from_toml_str(content: &str) -> BondageResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| BondageError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BondageResult<()> {
        if self.service_address.is_zero() {
            return Err(BondageError::Config(
                "service_address cannot be the zero address".to_string(),
            ));
        }
        if self.max_dots_per_curve == 0 {
            return Err(BondageError::Config(
                "max_dots_per_curve must be positive".to_string(),
            ));
        }
        if self.arbiter.map(|a| a.is_zero()).unwrap_or(false) {
            return Err(BondageError::Config(
                "arbiter cannot be the zero address".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load and validate a config file
pub fn load_config(path: &Path) -> Result<BondageConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = BondageConfig::from_toml_str(&content)
        .with_context(|| format!("Invalid bondage config in {}", path.display()))?;
    tracing::info!(
        "Loaded bondage config from {} (ceiling {})",
        path.display(),
        config.max_dots_per_curve
    );
    Ok(config)
}

mod address_hex {
    use lib_types::Address;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(addr: &Address, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&addr.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

mod option_address_hex {
    use lib_types::Address;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(addr: &Option<Address>, s: S) -> Result<S::Ok, S::Error> {
        match addr {
            Some(addr) => s.serialize_some(&addr.to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Address>, D::Error> {
        let s = Option::<String>::deserialize(d)?;
        s.map(|s| s.parse().map_err(serde::de::Error::custom))
            .transpose()
    }
}
