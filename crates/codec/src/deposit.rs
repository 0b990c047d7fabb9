//! Deposit transactions and the decoding of `TransactionDeposited` log
//! events emitted by the L1 deposit contract.

use crate::{abi::AbiReader, DepositError};
use alloy_consensus::Receipt;
use alloy_primitives::{keccak256, Address, Bytes, Log, TxKind, B256, U256};
use alloy_rlp::{Decodable, RlpDecodable, RlpEncodable};
use std::sync::LazyLock;

/// The EIP-2718 type byte of deposit transactions.
pub const DEPOSIT_TX_TYPE: u8 = 0x7e;

/// The only supported version of the deposit event.
pub const DEPOSIT_EVENT_VERSION_0: U256 = U256::ZERO;

/// The topic hash of `TransactionDeposited(address,address,uint256,bytes)`.
pub static DEPOSIT_EVENT_ABI_HASH: LazyLock<B256> =
    LazyLock::new(|| keccak256("TransactionDeposited(address,address,uint256,bytes)"));

/// A transaction injected into L2 from L1: either the L1 attributes system
/// transaction or a bridged user deposit.
#[derive(Debug, Default, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct DepositTransaction {
    /// The deterministic source hash identifying the deposit origin.
    pub source_hash: B256,
    /// The sender on L2.
    pub from: Address,
    /// The recipient on L2, or a contract creation.
    pub to: TxKind,
    /// The amount of L2 ether minted by the deposit.
    pub mint: U256,
    /// The value transferred on L2.
    pub value: U256,
    /// The gas limit of the L2 transaction.
    pub gas_limit: u64,
    /// Whether the transaction is exempt from L2 gas metering.
    pub is_system_transaction: bool,
    /// The calldata of the L2 transaction.
    pub input: Bytes,
}

impl DepositTransaction {
    /// Returns the EIP-2718 encoding: the deposit type byte followed by the
    /// RLP payload.
    pub fn encoded_2718(&self) -> Bytes {
        let mut buf = vec![DEPOSIT_TX_TYPE];
        buf.extend_from_slice(&alloy_rlp::encode(self));
        buf.into()
    }

    /// Decodes a deposit transaction from its EIP-2718 encoding.
    pub fn decode_2718(mut buf: &[u8]) -> Result<Self, alloy_rlp::Error> {
        match buf.split_first() {
            Some((&DEPOSIT_TX_TYPE, rest)) => {
                buf = rest;
                Self::decode(&mut buf)
            }
            _ => Err(alloy_rlp::Error::Custom("unexpected tx type")),
        }
    }
}

fn source_hash(domain: u64, inner: B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[24..32].copy_from_slice(&domain.to_be_bytes());
    buf[32..].copy_from_slice(inner.as_slice());
    keccak256(buf)
}

/// The source of a user deposit: the L1 block it was included in and the
/// index of its log within that block.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct UserDepositSource {
    /// The hash of the L1 block carrying the deposit log.
    pub l1_block_hash: B256,
    /// The index of the log in the L1 block.
    pub log_index: u64,
}

impl UserDepositSource {
    const DOMAIN: u64 = 0;

    /// Computes the deposit source hash. A pure function of its inputs:
    /// recomputing it from the same block hash and index always matches.
    pub fn source_hash(&self) -> B256 {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(self.l1_block_hash.as_slice());
        buf[56..].copy_from_slice(&self.log_index.to_be_bytes());
        source_hash(Self::DOMAIN, keccak256(buf))
    }
}

/// The source of an L1 attributes deposit: the origin block and the sequence
/// number of the L2 block within the origin epoch.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct L1InfoDepositSource {
    /// The hash of the L1 origin block.
    pub l1_block_hash: B256,
    /// The sequence number of the L2 block.
    pub seq_number: u64,
}

impl L1InfoDepositSource {
    const DOMAIN: u64 = 1;

    /// Computes the attributes deposit source hash.
    pub fn source_hash(&self) -> B256 {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(self.l1_block_hash.as_slice());
        buf[56..].copy_from_slice(&self.seq_number.to_be_bytes());
        source_hash(Self::DOMAIN, keccak256(buf))
    }
}

/// Reconstructs a [`DepositTransaction`] from a `TransactionDeposited` log.
///
/// The log does not self-certify its position: the caller supplies the L1
/// block hash and log index the source hash is derived from.
pub fn decode_deposit_log(
    log: &Log,
    l1_block_hash: B256,
    log_index: u64,
) -> Result<DepositTransaction, DepositError> {
    let topics = log.topics();
    if topics.len() != 4 {
        return Err(DepositError::UnexpectedTopicCount(topics.len()));
    }
    if topics[0] != *DEPOSIT_EVENT_ABI_HASH {
        return Err(DepositError::UnexpectedTopic);
    }
    let from = Address::from_word(topics[1]);
    let to = Address::from_word(topics[2]);
    let version = U256::from_be_bytes(topics[3].0);
    if version != DEPOSIT_EVENT_VERSION_0 {
        return Err(DepositError::InvalidVersion(version));
    }

    // unwrap the ABI bytes envelope around the opaque data.
    let data = log.data.data.as_ref();
    let mut reader = AbiReader::new(data);
    let opaque = reader
        .read_abi_bytes()
        .and_then(|opaque| reader.finish().map(|()| opaque))
        .map_err(|_| DepositError::MalformedEventData(data.len()))?;

    // opaque data: mint(32) ‖ value(32) ‖ gas(8) ‖ is_creation(1) ‖ data.
    let mut reader = AbiReader::new(&opaque);
    let fixed = (|| -> Result<_, crate::CodecError> {
        Ok((reader.read_u256()?, reader.read_u256()?, reader.read_u64()?, reader.read_u8()?))
    })();
    let (mint, value, gas_limit, is_creation) =
        fixed.map_err(|_| DepositError::MalformedOpaqueData(opaque.len()))?;
    let input = reader.rest().to_vec();

    let source = UserDepositSource { l1_block_hash, log_index };
    Ok(DepositTransaction {
        source_hash: source.source_hash(),
        from,
        to: if is_creation == 1 { TxKind::Create } else { TxKind::Call(to) },
        mint,
        value,
        gas_limit,
        is_system_transaction: false,
        input: input.into(),
    })
}

/// Extracts the user deposits from the receipts of one L1 block.
///
/// Only logs of successful receipts are considered; logs of reverted
/// transactions are ignored even when shaped like a deposit event. Malformed
/// deposit logs are collected and returned alongside the valid deposits
/// instead of aborting the whole block.
pub fn user_deposits(
    receipts: &[Receipt<Log>],
    deposit_contract: Address,
    l1_block_hash: B256,
) -> (Vec<DepositTransaction>, Vec<DepositError>) {
    let mut deposits = Vec::new();
    let mut malformed = Vec::new();
    let mut log_index = 0u64;
    for receipt in receipts {
        if !receipt.status.coerce_status() {
            continue;
        }
        for log in &receipt.logs {
            let index = log_index;
            log_index += 1;
            if log.address != deposit_contract
                || log.topics().first() != Some(&*DEPOSIT_EVENT_ABI_HASH)
            {
                continue;
            }
            match decode_deposit_log(log, l1_block_hash, index) {
                Ok(deposit) => deposits.push(deposit),
                Err(err) => malformed.push(err),
            }
        }
    }
    (deposits, malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{write_abi_bytes, write_u256};
    use alloy_consensus::Eip658Value;
    use alloy_primitives::LogData;

    /// Builds the log event for a deposit, the inverse of
    /// [`decode_deposit_log`].
    fn encode_deposit_log(contract: Address, deposit: &DepositTransaction) -> Log {
        let mut opaque = Vec::new();
        write_u256(&mut opaque, deposit.mint);
        write_u256(&mut opaque, deposit.value);
        opaque.extend_from_slice(&deposit.gas_limit.to_be_bytes());
        opaque.push(matches!(deposit.to, TxKind::Create) as u8);
        opaque.extend_from_slice(&deposit.input);

        let mut data = Vec::new();
        write_abi_bytes(&mut data, &opaque, 0x20);

        let to = match deposit.to {
            TxKind::Call(to) => to,
            TxKind::Create => Address::ZERO,
        };
        let topics = vec![
            *DEPOSIT_EVENT_ABI_HASH,
            deposit.from.into_word(),
            to.into_word(),
            B256::from(DEPOSIT_EVENT_VERSION_0.to_be_bytes::<32>()),
        ];
        Log { address: contract, data: LogData::new_unchecked(topics, data.into()) }
    }

    fn random_deposit(source: UserDepositSource) -> DepositTransaction {
        DepositTransaction {
            source_hash: source.source_hash(),
            from: Address::random(),
            to: TxKind::Call(Address::random()),
            mint: U256::from(rand::random::<u64>()),
            value: U256::from(rand::random::<u64>()),
            gas_limit: 100_000,
            is_system_transaction: false,
            input: vec![0xde, 0xad, 0xbe, 0xef].into(),
        }
    }

    #[test]
    fn test_deposit_log_roundtrip() {
        let contract = Address::random();
        for log_index in [0u64, 1, 9999] {
            let source = UserDepositSource { l1_block_hash: B256::random(), log_index };
            let deposit = random_deposit(source);
            let log = encode_deposit_log(contract, &deposit);
            let decoded = decode_deposit_log(&log, source.l1_block_hash, log_index).unwrap();
            assert_eq!(decoded, deposit);
        }
    }

    #[test]
    fn test_deposit_tx_2718_roundtrip() {
        let source = UserDepositSource { l1_block_hash: B256::random(), log_index: 42 };
        let deposit = random_deposit(source);
        let encoded = deposit.encoded_2718();
        assert_eq!(encoded[0], DEPOSIT_TX_TYPE);
        assert_eq!(DepositTransaction::decode_2718(&encoded).unwrap(), deposit);
    }

    #[test]
    fn test_source_hash_deterministic() {
        let source = UserDepositSource { l1_block_hash: B256::repeat_byte(3), log_index: 7 };
        assert_eq!(source.source_hash(), source.source_hash());

        let info = L1InfoDepositSource { l1_block_hash: B256::repeat_byte(3), seq_number: 7 };
        // distinct domains must never collide for the same inputs.
        assert_ne!(source.source_hash(), info.source_hash());
    }

    #[test]
    fn test_user_deposits_filters_reverted_receipts() {
        let contract = Address::random();
        let block_hash = B256::random();
        let other_log = Log {
            address: Address::random(),
            data: LogData::new_unchecked(vec![B256::random()], Bytes::new()),
        };

        // receipt 0: success with one deposit log and one unrelated log.
        let dep0 = random_deposit(UserDepositSource { l1_block_hash: block_hash, log_index: 0 });
        // receipt 1: success with one deposit log.
        let dep1 = random_deposit(UserDepositSource { l1_block_hash: block_hash, log_index: 2 });
        // receipt 2: reverted, its deposit log must be ignored.
        let dep2 = random_deposit(UserDepositSource { l1_block_hash: block_hash, log_index: 3 });

        let receipts = vec![
            Receipt {
                status: Eip658Value::Eip658(true),
                cumulative_gas_used: 0,
                logs: vec![encode_deposit_log(contract, &dep0), other_log.clone()],
            },
            Receipt {
                status: Eip658Value::Eip658(true),
                cumulative_gas_used: 0,
                logs: vec![encode_deposit_log(contract, &dep1)],
            },
            Receipt {
                status: Eip658Value::Eip658(false),
                cumulative_gas_used: 0,
                logs: vec![encode_deposit_log(contract, &dep2)],
            },
            Receipt {
                status: Eip658Value::Eip658(false),
                cumulative_gas_used: 0,
                logs: vec![other_log],
            },
        ];

        let (deposits, malformed) = user_deposits(&receipts, contract, block_hash);
        assert!(malformed.is_empty());
        assert_eq!(deposits, vec![dep0, dep1]);
    }

    #[test]
    fn test_user_deposits_collects_malformed_logs() {
        let contract = Address::random();
        let block_hash = B256::random();
        let good = random_deposit(UserDepositSource { l1_block_hash: block_hash, log_index: 0 });

        // deposit topic but a truncated data section.
        let bad = Log {
            address: contract,
            data: LogData::new_unchecked(
                vec![*DEPOSIT_EVENT_ABI_HASH, B256::ZERO, B256::ZERO, B256::ZERO],
                vec![0u8; 12].into(),
            ),
        };

        let receipts = vec![Receipt {
            status: Eip658Value::Eip658(true),
            cumulative_gas_used: 0,
            logs: vec![encode_deposit_log(contract, &good), bad],
        }];

        let (deposits, malformed) = user_deposits(&receipts, contract, block_hash);
        assert_eq!(deposits, vec![good]);
        assert_eq!(malformed, vec![DepositError::MalformedEventData(12)]);
    }
}
