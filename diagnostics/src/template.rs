use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Eip1559TransactionRequest, TransactionRequest, U256};
use tracing::info;

use crate::error::DiagnosticsError;
use crate::rpc::NodeRpc;

/// Gas limit of a plain value transfer
pub const TRANSFER_GAS: u64 = 21_000;

/// Fee fields shared by every synthesized transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeParams {
    /// Type 0 transaction
    Legacy {
        /// Price paid per unit of gas
        gas_price: U256,
    },
    /// Type 2 transaction
    Eip1559 {
        /// Upper bound on the total price per unit of gas
        max_fee_per_gas: U256,
        /// Tip paid to the block proposer per unit of gas
        max_priority_fee_per_gas: U256,
    },
}

/// Template values fixed by configuration. Anything left unset is fetched
/// from the node when the template is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateOverrides {
    pub chain_id: Option<u64>,
    pub gas: Option<U256>,
    pub legacy: bool,
    pub gas_price: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
}

/// Everything a transfer needs besides its parties, nonce and value.
/// Resolved once so building a transaction never waits on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxTemplate {
    chain_id: u64,
    gas: U256,
    fees: FeeParams,
}

impl TxTemplate {
    /// A template with every field given
    pub fn new(chain_id: u64, gas: U256, fees: FeeParams) -> Self {
        Self {
            chain_id,
            gas,
            fees,
        }
    }

    /// Fill in the fields missing from `overrides` by querying the node
    pub async fn resolve(
        rpc: &dyn NodeRpc,
        overrides: &TemplateOverrides,
    ) -> Result<Self, DiagnosticsError> {
        let chain_id = match overrides.chain_id {
            Some(chain_id) => chain_id,
            None => rpc.chain_id().await?,
        };
        let gas = overrides.gas.unwrap_or_else(|| TRANSFER_GAS.into());

        let fees = if overrides.legacy {
            let gas_price = match overrides.gas_price {
                Some(gas_price) => gas_price,
                None => rpc.gas_price().await?,
            };
            FeeParams::Legacy { gas_price }
        } else {
            match (
                overrides.max_fee_per_gas,
                overrides.max_priority_fee_per_gas,
            ) {
                (Some(max_fee_per_gas), Some(max_priority_fee_per_gas)) => FeeParams::Eip1559 {
                    max_fee_per_gas,
                    max_priority_fee_per_gas,
                },
                (max_fee, max_priority_fee) => {
                    let (estimated_max_fee, estimated_priority_fee) = rpc.eip1559_fees().await?;
                    FeeParams::Eip1559 {
                        max_fee_per_gas: max_fee.unwrap_or(estimated_max_fee),
                        max_priority_fee_per_gas: max_priority_fee
                            .unwrap_or(estimated_priority_fee),
                    }
                }
            }
        };

        if let FeeParams::Eip1559 {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        } = fees
        {
            if max_priority_fee_per_gas > max_fee_per_gas {
                return Err(DiagnosticsError::config(format!(
                    "Priority fee {max_priority_fee_per_gas} exceeds max fee {max_fee_per_gas}"
                )));
            }
        }

        let template = Self::new(chain_id, gas, fees);
        info!(?template, "Resolved transaction template");
        Ok(template)
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn fees(&self) -> FeeParams {
        self.fees
    }

    /// Unsigned value transfer from the template
    pub fn build(&self, from: Address, to: Address, nonce: U256, value: U256) -> TypedTransaction {
        match self.fees {
            FeeParams::Legacy { gas_price } => TransactionRequest::new()
                .from(from)
                .to(to)
                .nonce(nonce)
                .value(value)
                .gas(self.gas)
                .gas_price(gas_price)
                .chain_id(self.chain_id)
                .into(),
            FeeParams::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => Eip1559TransactionRequest::new()
                .from(from)
                .to(to)
                .nonce(nonce)
                .value(value)
                .gas(self.gas)
                .max_fee_per_gas(max_fee_per_gas)
                .max_priority_fee_per_gas(max_priority_fee_per_gas)
                .chain_id(self.chain_id)
                .into(),
        }
    }
}
