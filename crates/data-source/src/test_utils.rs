//! Helpers for building signed L1 transactions in tests.

use alloy_consensus::{SignableTransaction, TxEip1559, TxEip4844, TxEip4844Variant, TxEnvelope};
use alloy_primitives::{Address, Bytes, TxKind, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

pub(crate) fn signed_tx(signer: &PrivateKeySigner, to: Address, input: Bytes) -> TxEnvelope {
    let tx = TxEip1559 {
        chain_id: 1,
        nonce: 0,
        gas_limit: 210_000,
        max_fee_per_gas: 100,
        max_priority_fee_per_gas: 1,
        to: TxKind::Call(to),
        value: U256::ZERO,
        access_list: Default::default(),
        input,
    };
    let signature = signer.sign_hash_sync(&tx.signature_hash()).unwrap();
    TxEnvelope::Eip1559(tx.into_signed(signature))
}

pub(crate) fn signed_blob_tx(
    signer: &PrivateKeySigner,
    to: Address,
    blob_hashes: Vec<B256>,
    input: Bytes,
) -> TxEnvelope {
    let tx = TxEip4844 {
        chain_id: 1,
        nonce: 0,
        gas_limit: 210_000,
        max_fee_per_gas: 100,
        max_priority_fee_per_gas: 1,
        to,
        value: U256::ZERO,
        access_list: Default::default(),
        blob_versioned_hashes: blob_hashes,
        max_fee_per_blob_gas: 1,
        input,
    };
    let signature = signer.sign_hash_sync(&tx.signature_hash()).unwrap();
    TxEnvelope::Eip4844(TxEip4844Variant::TxEip4844(tx).into_signed(signature))
}
