use aut_base::settings::TracingConfig;
use ethers::types::U256;
use serde::Deserialize;

use crate::denom::parse_wei_representation;
use crate::error::DiagnosticsError;
use crate::synthesizer::SynthesizerConfig;
use crate::template::{TemplateOverrides, TRANSFER_GAS};

/// Prefix of the generator's environment variables, `AUT_DIAG_*`
pub const SETTINGS_PREFIX: &str = "diag";

/// Settings of the transaction generator. Amounts are wei representations
/// such as `"1gwei"` or `"0.5aut"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Transactions per batch
    pub batch_size: usize,
    /// Batches the queue holds before the synthesizer blocks
    pub concurrent_batches: usize,
    /// Batches left in flight before the oldest one is awaited
    pub max_pending_batches: usize,
    /// Value the hub sends to each participant per cycle
    pub hub_unit: String,
    /// Gas limit of each transfer
    pub gas: u64,
    /// Send type 0 transactions instead of EIP-1559 ones
    pub legacy: bool,
    pub gas_price: Option<String>,
    pub max_fee_per_gas: Option<String>,
    pub max_priority_fee_per_gas: Option<String>,
    pub chain_id: Option<u64>,
    /// Stop after this many schedule cycles instead of running forever
    pub cycles: Option<u64>,
    pub tracing: TracingConfig,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            concurrent_batches: 10,
            max_pending_batches: 4,
            hub_unit: "1gwei".to_owned(),
            gas: TRANSFER_GAS,
            legacy: false,
            gas_price: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
            chain_id: None,
            cycles: None,
            tracing: TracingConfig::default(),
        }
    }
}

fn parse_optional_wei(value: &Option<String>) -> Result<Option<U256>, DiagnosticsError> {
    value.as_deref().map(parse_wei_representation).transpose()
}

impl GeneratorSettings {
    pub fn hub_unit(&self) -> Result<U256, DiagnosticsError> {
        parse_wei_representation(&self.hub_unit)
    }

    pub fn template_overrides(&self) -> Result<TemplateOverrides, DiagnosticsError> {
        if self.legacy && (self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some())
        {
            return Err(DiagnosticsError::config(
                "EIP-1559 fees cannot be set for legacy transactions",
            ));
        }
        if !self.legacy && self.gas_price.is_some() {
            return Err(DiagnosticsError::config(
                "A gas price can only be set for legacy transactions",
            ));
        }
        Ok(TemplateOverrides {
            chain_id: self.chain_id,
            gas: Some(self.gas.into()),
            legacy: self.legacy,
            gas_price: parse_optional_wei(&self.gas_price)?,
            max_fee_per_gas: parse_optional_wei(&self.max_fee_per_gas)?,
            max_priority_fee_per_gas: parse_optional_wei(&self.max_priority_fee_per_gas)?,
        })
    }

    pub fn synthesizer_config(&self) -> Result<SynthesizerConfig, DiagnosticsError> {
        Ok(SynthesizerConfig {
            batch_size: self.batch_size,
            hub_unit: self.hub_unit()?,
            cycles: self.cycles,
        })
    }

    /// Check every value before anything touches the node
    pub fn validate(&self) -> Result<(), DiagnosticsError> {
        if self.batch_size == 0 {
            return Err(DiagnosticsError::config("batch_size must be at least 1"));
        }
        if self.concurrent_batches == 0 {
            return Err(DiagnosticsError::config(
                "concurrent_batches must be at least 1",
            ));
        }
        if self.gas == 0 {
            return Err(DiagnosticsError::config("gas must be at least 1"));
        }
        self.hub_unit()?;
        self.template_overrides()?;
        Ok(())
    }
}
