//! The L1 attributes transaction: the first transaction of every L2 block,
//! carrying a snapshot of its L1 origin. Two binary generations exist, with
//! the Ecotone fork switching from one-word-per-field to a packed layout.
//! Either generation grows an optional deposit exclusion tail, signalled by a
//! different function selector and detected on decode purely by payload
//! length.

use crate::{
    abi::{
        write_abi_bytes, write_abi_bytes_short, write_address, write_u256, write_u64_word,
        AbiReader,
    },
    Bitmap, CodecError, DepositTransaction, L1InfoDepositSource,
};
use alloy_primitives::{address, keccak256, Address, B256, U256};
use rollup_batcher_primitives::{RollupConfig, SystemConfig};
use std::sync::LazyLock;

const BEDROCK_SIGNATURE: &str =
    "setL1BlockValues(uint64,uint64,uint256,bytes32,uint64,bytes32,uint256,uint256)";
const BEDROCK_EXCLUSIONS_SIGNATURE: &str =
    "setL1BlockValues(uint64,uint64,uint256,bytes32,uint64,bytes32,uint256,uint256,bytes)";
const ECOTONE_SIGNATURE: &str = "setL1BlockValuesEcotone()";
const ECOTONE_EXCLUSIONS_SIGNATURE: &str = "setL1BlockValuesEcotoneExclusions()";

fn selector(signature: &str) -> [u8; 4] {
    keccak256(signature)[..4].try_into().expect("4 bytes")
}

/// Selector of the legacy attributes call without exclusions.
pub static BEDROCK_SELECTOR: LazyLock<[u8; 4]> = LazyLock::new(|| selector(BEDROCK_SIGNATURE));
/// Selector of the legacy attributes call with a deposit exclusion tail.
pub static BEDROCK_EXCLUSIONS_SELECTOR: LazyLock<[u8; 4]> =
    LazyLock::new(|| selector(BEDROCK_EXCLUSIONS_SIGNATURE));
/// Selector of the Ecotone attributes call without exclusions.
pub static ECOTONE_SELECTOR: LazyLock<[u8; 4]> = LazyLock::new(|| selector(ECOTONE_SIGNATURE));
/// Selector of the Ecotone attributes call with a deposit exclusion tail.
pub static ECOTONE_EXCLUSIONS_SELECTOR: LazyLock<[u8; 4]> =
    LazyLock::new(|| selector(ECOTONE_EXCLUSIONS_SIGNATURE));

/// Length of the legacy encoding without the exclusion tail: selector plus
/// eight 32-byte words.
pub const L1_INFO_BEDROCK_LEN: usize = 4 + 32 * 8;
/// Length of the Ecotone encoding without the exclusion tail: selector plus
/// the fields packed into five 32-byte slots.
pub const L1_INFO_ECOTONE_LEN: usize = 4 + 32 * 5;

/// Sender of the attributes transaction.
pub const L1_INFO_DEPOSITER_ADDRESS: Address =
    address!("deaddeaddeaddeaddeaddeaddeaddeaddead0001");
/// The predeploy receiving the attributes call.
pub const L1_BLOCK_ADDRESS: Address = address!("4200000000000000000000000000000000000015");

/// Gas allotted to the attributes transaction.
pub const REGOLITH_SYSTEM_TX_GAS: u64 = 1_000_000;

/// The values delivered by an attributes transaction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct L1BlockInfo {
    /// L1 origin block number.
    pub number: u64,
    /// L1 origin block timestamp.
    pub time: u64,
    /// L1 origin base fee.
    pub base_fee: U256,
    /// L1 origin block hash.
    pub block_hash: B256,
    /// Position of the L2 block within its origin epoch, starting at 0.
    pub sequence_number: u64,
    /// The batcher address authorized to submit batches.
    pub batcher_addr: Address,
    /// Legacy L1 fee overhead, zero after Ecotone.
    pub l1_fee_overhead: B256,
    /// Legacy L1 fee scalar, zero after Ecotone.
    pub l1_fee_scalar: B256,
    /// L1 origin blob base fee, Ecotone only.
    pub blob_base_fee: Option<U256>,
    /// Base fee scalar, Ecotone only.
    pub base_fee_scalar: u32,
    /// Blob base fee scalar, Ecotone only.
    pub blob_base_fee_scalar: u32,
    /// Deposits excluded from the L2 block, by index.
    pub deposit_exclusions: Option<Bitmap>,
}

impl L1BlockInfo {
    fn exclusion_bytes(&self) -> Option<Vec<u8>> {
        self.deposit_exclusions
            .as_ref()
            .filter(|exclusions| exclusions.count() > 0)
            .map(Bitmap::to_bytes)
    }

    /// Encodes the legacy format: selector, eight 32-byte words, and the ABI
    /// bytes exclusion tail when any exclusions are set.
    pub fn encode_bedrock(&self) -> Vec<u8> {
        let exclusions = self.exclusion_bytes();
        let mut buf = Vec::with_capacity(L1_INFO_BEDROCK_LEN);
        buf.extend_from_slice(&match exclusions {
            Some(_) => *BEDROCK_EXCLUSIONS_SELECTOR,
            None => *BEDROCK_SELECTOR,
        });
        write_u64_word(&mut buf, self.number);
        write_u64_word(&mut buf, self.time);
        write_u256(&mut buf, self.base_fee);
        buf.extend_from_slice(self.block_hash.as_slice());
        write_u64_word(&mut buf, self.sequence_number);
        write_address(&mut buf, self.batcher_addr);
        buf.extend_from_slice(self.l1_fee_overhead.as_slice());
        buf.extend_from_slice(self.l1_fee_scalar.as_slice());
        if let Some(exclusions) = exclusions {
            write_abi_bytes(&mut buf, &exclusions, 0x120);
        }
        buf
    }

    /// Decodes the legacy format. The exclusion tail is detected by length
    /// alone; anything shorter than the fixed fields is rejected, as are
    /// bytes left over after the tail.
    pub fn decode_bedrock(data: &[u8]) -> Result<Self, CodecError> {
        let has_exclusions = match data.len() {
            L1_INFO_BEDROCK_LEN => false,
            len if len > L1_INFO_BEDROCK_LEN => true,
            len => return Err(CodecError::UnexpectedLength(len)),
        };
        let mut reader = AbiReader::new(data);
        reader.read_selector(match has_exclusions {
            true => *BEDROCK_EXCLUSIONS_SELECTOR,
            false => *BEDROCK_SELECTOR,
        })?;
        let mut info = Self {
            number: reader.read_u64_word()?,
            time: reader.read_u64_word()?,
            base_fee: reader.read_u256()?,
            block_hash: reader.read_b256()?,
            sequence_number: reader.read_u64_word()?,
            batcher_addr: reader.read_address()?,
            l1_fee_overhead: reader.read_b256()?,
            l1_fee_scalar: reader.read_b256()?,
            ..Self::default()
        };
        if has_exclusions {
            info.deposit_exclusions = Bitmap::from_bytes(&reader.read_abi_bytes()?);
        }
        reader.finish()?;
        Ok(info)
    }

    /// Encodes the Ecotone format: selector, packed scalar and counter
    /// fields, the 32-byte words, and the short exclusion tail when any
    /// exclusions are set.
    pub fn encode_ecotone(&self) -> Vec<u8> {
        let exclusions = self.exclusion_bytes();
        let mut buf = Vec::with_capacity(L1_INFO_ECOTONE_LEN);
        buf.extend_from_slice(&match exclusions {
            Some(_) => *ECOTONE_EXCLUSIONS_SELECTOR,
            None => *ECOTONE_SELECTOR,
        });
        buf.extend_from_slice(&self.base_fee_scalar.to_be_bytes());
        buf.extend_from_slice(&self.blob_base_fee_scalar.to_be_bytes());
        buf.extend_from_slice(&self.sequence_number.to_be_bytes());
        buf.extend_from_slice(&self.time.to_be_bytes());
        buf.extend_from_slice(&self.number.to_be_bytes());
        write_u256(&mut buf, self.base_fee);
        // the minimum blob base fee applies when L1 has no blob market yet.
        write_u256(&mut buf, self.blob_base_fee.unwrap_or(U256::ONE));
        buf.extend_from_slice(self.block_hash.as_slice());
        write_address(&mut buf, self.batcher_addr);
        if let Some(exclusions) = exclusions {
            write_abi_bytes_short(&mut buf, &exclusions);
        }
        buf
    }

    /// Decodes the Ecotone format, with the same length-based tail detection
    /// as [`Self::decode_bedrock`].
    pub fn decode_ecotone(data: &[u8]) -> Result<Self, CodecError> {
        let has_exclusions = match data.len() {
            L1_INFO_ECOTONE_LEN => false,
            len if len > L1_INFO_ECOTONE_LEN => true,
            len => return Err(CodecError::UnexpectedLength(len)),
        };
        let mut reader = AbiReader::new(data);
        reader.read_selector(match has_exclusions {
            true => *ECOTONE_EXCLUSIONS_SELECTOR,
            false => *ECOTONE_SELECTOR,
        })?;
        let mut info = Self {
            base_fee_scalar: reader.read_u32()?,
            blob_base_fee_scalar: reader.read_u32()?,
            sequence_number: reader.read_u64()?,
            time: reader.read_u64()?,
            number: reader.read_u64()?,
            ..Self::default()
        };
        info.base_fee = reader.read_u256()?;
        info.blob_base_fee = Some(reader.read_u256()?);
        info.block_hash = reader.read_b256()?;
        info.batcher_addr = reader.read_address()?;
        if has_exclusions {
            info.deposit_exclusions = Bitmap::from_bytes(&reader.read_abi_bytes_short()?);
        }
        reader.finish()?;
        Ok(info)
    }

    /// Encodes in the format generation active for an L2 block at
    /// `l2_block_time`. The Ecotone activation block itself still uses the
    /// legacy format.
    pub fn to_bytes(&self, config: &RollupConfig, l2_block_time: u64) -> Vec<u8> {
        if config.is_ecotone_but_not_first_block(l2_block_time) {
            self.encode_ecotone()
        } else {
            self.encode_bedrock()
        }
    }

    /// Inverse of [`Self::to_bytes`].
    pub fn from_bytes(
        config: &RollupConfig,
        l2_block_time: u64,
        data: &[u8],
    ) -> Result<Self, CodecError> {
        if config.is_ecotone_but_not_first_block(l2_block_time) {
            Self::decode_ecotone(data)
        } else {
            Self::decode_bedrock(data)
        }
    }
}

/// The subset of an L1 header needed to build an attributes transaction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct L1BlockDetails {
    /// Block number.
    pub number: u64,
    /// Block timestamp.
    pub time: u64,
    /// Block hash.
    pub hash: B256,
    /// Base fee.
    pub base_fee: U256,
    /// Blob base fee, absent before the L1 blob market exists.
    pub blob_base_fee: Option<U256>,
}

/// Builds the attributes deposit transaction for an L2 block: its L1 origin
/// snapshot, position within the origin epoch, and the deposits excluded
/// from it.
pub fn l1_info_deposit(
    config: &RollupConfig,
    sys_config: &SystemConfig,
    seq_number: u64,
    block: &L1BlockDetails,
    l2_block_time: u64,
    exclusions: Option<Bitmap>,
) -> DepositTransaction {
    let mut info = L1BlockInfo {
        number: block.number,
        time: block.time,
        base_fee: block.base_fee,
        block_hash: block.hash,
        sequence_number: seq_number,
        batcher_addr: sys_config.batcher_address,
        deposit_exclusions: exclusions,
        ..L1BlockInfo::default()
    };
    if config.is_ecotone_but_not_first_block(l2_block_time) {
        info.blob_base_fee = Some(block.blob_base_fee.unwrap_or(U256::ONE));
        info.base_fee_scalar = sys_config.base_fee_scalar;
        info.blob_base_fee_scalar = sys_config.blob_base_fee_scalar;
    } else {
        info.l1_fee_overhead = sys_config.fee_overhead;
        info.l1_fee_scalar = sys_config.fee_scalar;
    }

    let source = L1InfoDepositSource { l1_block_hash: block.hash, seq_number };
    DepositTransaction {
        source_hash: source.source_hash(),
        from: L1_INFO_DEPOSITER_ADDRESS,
        to: L1_BLOCK_ADDRESS.into(),
        mint: U256::ZERO,
        value: U256::ZERO,
        gas_limit: REGOLITH_SYSTEM_TX_GAS,
        is_system_transaction: false,
        input: info.to_bytes(config, l2_block_time).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{hex, TxKind};
    use rollup_batcher_primitives::BlockInfo;

    fn sample_info() -> L1BlockInfo {
        L1BlockInfo {
            number: 19_000_000,
            time: 1_700_000_000,
            base_fee: U256::from(30_000_000_000u64),
            block_hash: B256::random(),
            sequence_number: 4,
            batcher_addr: Address::random(),
            ..L1BlockInfo::default()
        }
    }

    fn sample_exclusions() -> Bitmap {
        let mut bitmap = Bitmap::with_capacity(8);
        bitmap.set(1);
        bitmap.set(5);
        bitmap
    }

    fn ecotone_config() -> RollupConfig {
        RollupConfig {
            genesis_l1: BlockInfo::default(),
            block_time: 2,
            ecotone_time: Some(100),
            batch_inbox_address: Address::random(),
            deposit_contract_address: Address::random(),
            l1_chain_id: 1,
        }
    }

    #[test]
    fn test_selectors_match_known_values() {
        // keccak("setL1BlockValuesEcotone()")[..4], cross-checked against the
        // deployed predeploy dispatch table.
        assert_eq!(*ECOTONE_SELECTOR, hex!("440a5e20"));
        assert_eq!(*BEDROCK_SELECTOR, hex!("015d8eb9"));
        assert_ne!(*BEDROCK_EXCLUSIONS_SELECTOR, *BEDROCK_SELECTOR);
        assert_ne!(*ECOTONE_EXCLUSIONS_SELECTOR, *ECOTONE_SELECTOR);
    }

    #[test]
    fn test_bedrock_roundtrip_without_exclusions() {
        let mut info = sample_info();
        info.l1_fee_overhead = B256::with_last_byte(0xbc);
        info.l1_fee_scalar = B256::with_last_byte(0x01);

        let data = info.encode_bedrock();
        assert_eq!(data.len(), L1_INFO_BEDROCK_LEN);
        assert_eq!(data[..4], *BEDROCK_SELECTOR);
        assert_eq!(L1BlockInfo::decode_bedrock(&data).unwrap(), info);
    }

    #[test]
    fn test_bedrock_roundtrip_with_exclusions() {
        let mut info = sample_info();
        info.deposit_exclusions = Some(sample_exclusions());

        let data = info.encode_bedrock();
        assert!(data.len() > L1_INFO_BEDROCK_LEN);
        assert_eq!(data[..4], *BEDROCK_EXCLUSIONS_SELECTOR);
        assert_eq!(L1BlockInfo::decode_bedrock(&data).unwrap(), info);
    }

    #[test]
    fn test_ecotone_roundtrip() {
        let mut info = sample_info();
        info.base_fee_scalar = 1368;
        info.blob_base_fee_scalar = 810949;
        info.blob_base_fee = Some(U256::from(7u64));

        let data = info.encode_ecotone();
        assert_eq!(data.len(), L1_INFO_ECOTONE_LEN);
        assert_eq!(data[..4], *ECOTONE_SELECTOR);
        assert_eq!(L1BlockInfo::decode_ecotone(&data).unwrap(), info);

        info.deposit_exclusions = Some(sample_exclusions());
        let data = info.encode_ecotone();
        assert_eq!(data[..4], *ECOTONE_EXCLUSIONS_SELECTOR);
        assert_eq!(L1BlockInfo::decode_ecotone(&data).unwrap(), info);
    }

    #[test]
    fn test_ecotone_blob_base_fee_defaults_to_minimum() {
        let info = sample_info();
        assert_eq!(info.blob_base_fee, None);
        let decoded = L1BlockInfo::decode_ecotone(&info.encode_ecotone()).unwrap();
        assert_eq!(decoded.blob_base_fee, Some(U256::ONE));
    }

    #[test]
    fn test_zero_count_exclusions_encode_without_tail() {
        let mut info = sample_info();
        info.deposit_exclusions = Some(Bitmap::with_capacity(16));
        assert_eq!(info.encode_bedrock().len(), L1_INFO_BEDROCK_LEN);
        assert_eq!(info.encode_ecotone().len(), L1_INFO_ECOTONE_LEN);
    }

    #[test]
    fn test_decode_rejects_bad_lengths() {
        let info = sample_info();
        let mut data = info.encode_bedrock();
        assert_eq!(
            L1BlockInfo::decode_bedrock(&data[..100]),
            Err(CodecError::UnexpectedLength(100))
        );

        // extra bytes flip the decoder into the exclusions layout, where a
        // malformed tail must surface as an error rather than be ignored.
        data.push(0);
        assert!(L1BlockInfo::decode_bedrock(&data).is_err());

        let data = info.encode_ecotone();
        assert_eq!(
            L1BlockInfo::decode_ecotone(&data[..50]),
            Err(CodecError::UnexpectedLength(50))
        );
    }

    #[test]
    fn test_format_selection_follows_activation_block() {
        let config = ecotone_config();
        let info = sample_info();

        // pre-fork and the activation block itself use the legacy layout.
        assert_eq!(info.to_bytes(&config, 99).len(), L1_INFO_BEDROCK_LEN);
        assert_eq!(info.to_bytes(&config, 100).len(), L1_INFO_BEDROCK_LEN);
        assert_eq!(info.to_bytes(&config, 102).len(), L1_INFO_ECOTONE_LEN);

        let data = info.to_bytes(&config, 102);
        assert_eq!(L1BlockInfo::from_bytes(&config, 102, &data).unwrap().number, info.number);
        assert!(L1BlockInfo::from_bytes(&config, 100, &data).is_err());
    }

    #[test]
    fn test_l1_info_deposit() {
        let config = ecotone_config();
        let sys_config = SystemConfig {
            batcher_address: Address::random(),
            fee_overhead: B256::with_last_byte(0xbc),
            fee_scalar: B256::with_last_byte(0x01),
            base_fee_scalar: 1368,
            blob_base_fee_scalar: 810949,
        };
        let block = L1BlockDetails {
            number: 19_000_000,
            time: 1_700_000_000,
            hash: B256::random(),
            base_fee: U256::from(30_000_000_000u64),
            blob_base_fee: None,
        };

        let deposit = l1_info_deposit(&config, &sys_config, 3, &block, 102, None);
        assert_eq!(deposit.from, L1_INFO_DEPOSITER_ADDRESS);
        assert_eq!(deposit.to, TxKind::Call(L1_BLOCK_ADDRESS));
        assert_eq!(deposit.gas_limit, REGOLITH_SYSTEM_TX_GAS);
        assert!(!deposit.is_system_transaction);
        let source = L1InfoDepositSource { l1_block_hash: block.hash, seq_number: 3 };
        assert_eq!(deposit.source_hash, source.source_hash());

        let info = L1BlockInfo::from_bytes(&config, 102, &deposit.input).unwrap();
        assert_eq!(info.block_hash, block.hash);
        assert_eq!(info.sequence_number, 3);
        assert_eq!(info.base_fee_scalar, 1368);
        assert_eq!(info.blob_base_fee, Some(U256::ONE));

        // recomputing from identical inputs is byte-identical.
        let again = l1_info_deposit(&config, &sys_config, 3, &block, 102, None);
        assert_eq!(again.input, deposit.input);
    }
}
