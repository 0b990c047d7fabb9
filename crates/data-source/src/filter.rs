use alloy_consensus::{transaction::SignerRecoverable, Transaction, TxEnvelope};
use alloy_primitives::Address;

/// Returns whether the transaction is a valid batcher submission: it must be
/// addressed to the batch inbox and its signature must recover to the
/// batcher address. The signer is only recovered once the cheap destination
/// check passes.
///
/// Anyone can send transactions to the inbox address; failing the predicate
/// is chain noise, not an error.
pub fn is_valid_batch_tx(tx: &TxEnvelope, batch_inbox: Address, batcher: Address) -> bool {
    if tx.to() != Some(batch_inbox) {
        return false;
    }
    let signer = match tx.recover_signer() {
        Ok(signer) => signer,
        Err(err) => {
            tracing::warn!(target: "batcher::data_source", hash = %tx.tx_hash(), %err, "tx in inbox with invalid signature");
            return false;
        }
    };
    if signer != batcher {
        tracing::warn!(target: "batcher::data_source", hash = %tx.tx_hash(), %signer, "tx in inbox with unauthorized submitter");
        return false;
    }
    true
}
