use crate::BlockInfo;
use alloy_primitives::{Address, B256};

/// The static rollup configuration shared by the submission and derivation
/// sides of the core.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RollupConfig {
    /// The L1 block the rollup starts from.
    pub genesis_l1: BlockInfo,
    /// The L2 block time in seconds.
    pub block_time: u64,
    /// Activation time of the compact attributes format and blob data
    /// sources. `None` means the upgrade never activates.
    pub ecotone_time: Option<u64>,
    /// The address batcher transactions are sent to on L1.
    pub batch_inbox_address: Address,
    /// The address of the deposit contract on L1.
    pub deposit_contract_address: Address,
    /// The chain id of the L1 chain, used for batcher signature recovery.
    pub l1_chain_id: u64,
}

impl RollupConfig {
    /// Returns true if the given timestamp is at or after the Ecotone
    /// activation time.
    pub fn is_ecotone(&self, timestamp: u64) -> bool {
        self.ecotone_time.is_some_and(|t| timestamp >= t)
    }

    /// Returns true if the given timestamp falls on the Ecotone activation
    /// block itself.
    pub fn is_ecotone_activation_block(&self, timestamp: u64) -> bool {
        self.is_ecotone(timestamp)
            && timestamp < self.ecotone_time.unwrap_or_default() + self.block_time
    }

    /// Returns true for blocks subject to the Ecotone attributes format. The
    /// activation block itself still carries the legacy format.
    pub fn is_ecotone_but_not_first_block(&self, timestamp: u64) -> bool {
        self.is_ecotone(timestamp) && !self.is_ecotone_activation_block(timestamp)
    }
}

/// The L1 system configuration values the attributes transaction commits to.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    /// The authorized batcher address.
    pub batcher_address: Address,
    /// The L1 fee overhead, legacy format only.
    pub fee_overhead: B256,
    /// The L1 fee scalar, legacy format only.
    pub fee_scalar: B256,
    /// The base fee scalar, compact format only.
    pub base_fee_scalar: u32,
    /// The blob base fee scalar, compact format only.
    pub blob_base_fee_scalar: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecotone_activation_block_uses_legacy_format() {
        let config = RollupConfig { block_time: 2, ecotone_time: Some(100), ..Default::default() };

        assert!(!config.is_ecotone(99));
        assert!(config.is_ecotone(100));

        // the activation block is not yet subject to the compact format.
        assert!(!config.is_ecotone_but_not_first_block(100));
        assert!(!config.is_ecotone_but_not_first_block(101));
        assert!(config.is_ecotone_but_not_first_block(102));
    }

    #[test]
    fn test_ecotone_disabled_without_activation_time() {
        let config = RollupConfig::default();
        assert!(!config.is_ecotone(u64::MAX));
        assert!(!config.is_ecotone_but_not_first_block(u64::MAX));
    }
}
