//! The per-block data sources: calldata before the blob upgrade, blob
//! sidecars (with calldata fallback per transaction type) after it.

use crate::{
    backoff_delay, is_valid_batch_tx, DerivationError, Sleeper, TokioSleeper,
    MAX_BLOB_FETCH_ATTEMPTS,
};
use std::collections::VecDeque;

use alloy_consensus::{Transaction, TxEnvelope};
use alloy_eips::eip4844::{
    builder::{SidecarCoder, SimpleCoder},
    Blob,
};
use alloy_primitives::{Address, Bytes};
use rollup_batcher_primitives::{IndexedBlobHash, L1BlockRef, RollupConfig};
use rollup_batcher_providers::{BlobProvider, L1Provider};

/// Opens the appropriate data source for an L1 block: blob-capable once the
/// blob upgrade is active at the block's timestamp, calldata-only before.
#[derive(Debug, Clone)]
pub struct DataSourceFactory<P, B> {
    batch_inbox_address: Address,
    ecotone_time: Option<u64>,
    l1_provider: P,
    blob_provider: B,
}

impl<P, B> DataSourceFactory<P, B>
where
    P: L1Provider + Clone,
    B: BlobProvider + Clone,
{
    /// Returns a new factory over the provided providers.
    pub fn new(config: &RollupConfig, l1_provider: P, blob_provider: B) -> Self {
        Self {
            batch_inbox_address: config.batch_inbox_address,
            ecotone_time: config.ecotone_time,
            l1_provider,
            blob_provider,
        }
    }

    /// Returns a single-use data source over the batcher payloads of the
    /// referenced L1 block.
    pub fn open_data(&self, block_ref: L1BlockRef, batcher_address: Address) -> DataSource<P, B> {
        if self.ecotone_time.is_some_and(|t| block_ref.timestamp >= t) {
            DataSource::Blob(BlobDataSource::new(
                self.l1_provider.clone(),
                self.blob_provider.clone(),
                block_ref,
                self.batch_inbox_address,
                batcher_address,
            ))
        } else {
            DataSource::Calldata(CalldataSource::new(
                self.l1_provider.clone(),
                block_ref,
                self.batch_inbox_address,
                batcher_address,
            ))
        }
    }
}

/// A single-use forward sequence of batcher payloads from one L1 block.
#[derive(Debug)]
pub enum DataSource<P, B, S = TokioSleeper> {
    /// Payloads read from transaction calldata.
    Calldata(CalldataSource<P>),
    /// Payloads read from blob sidecars, with calldata for non-blob txs.
    Blob(BlobDataSource<P, B, S>),
}

impl<P: L1Provider, B: BlobProvider, S: Sleeper> DataSource<P, B, S> {
    /// Returns the next payload, or `None` once the block is exhausted.
    /// Repeated calls after exhaustion keep returning `None`.
    pub async fn next(&mut self) -> Result<Option<Bytes>, DerivationError> {
        match self {
            Self::Calldata(source) => source.next().await,
            Self::Blob(source) => source.next().await,
        }
    }
}

/// Fetches the block's transactions, classifying a missing block as a reset
/// condition and any other failure as temporary.
async fn fetch_transactions<P: L1Provider>(
    provider: &P,
    block_ref: &L1BlockRef,
) -> Result<Vec<TxEnvelope>, DerivationError> {
    provider.transactions_by_hash(block_ref.hash).await.map_err(|err| {
        if err.is_not_found() {
            DerivationError::Reset(err.into())
        } else {
            DerivationError::Temporary(err.into())
        }
    })
}

/// Extracts payloads from the calldata of valid batcher transactions.
#[derive(Debug)]
pub struct CalldataSource<P> {
    provider: P,
    block_ref: L1BlockRef,
    batch_inbox_address: Address,
    batcher_address: Address,
    entries: Option<VecDeque<Bytes>>,
}

impl<P: L1Provider> CalldataSource<P> {
    /// Returns a new calldata source for the referenced block.
    pub const fn new(
        provider: P,
        block_ref: L1BlockRef,
        batch_inbox_address: Address,
        batcher_address: Address,
    ) -> Self {
        Self { provider, block_ref, batch_inbox_address, batcher_address, entries: None }
    }

    /// Returns the next payload, or `None` once the block is exhausted.
    pub async fn next(&mut self) -> Result<Option<Bytes>, DerivationError> {
        if self.entries.is_none() {
            let txs = fetch_transactions(&self.provider, &self.block_ref).await?;
            let entries = txs
                .iter()
                .filter(|tx| {
                    is_valid_batch_tx(tx, self.batch_inbox_address, self.batcher_address)
                })
                .map(|tx| tx.input().clone())
                .collect();
            self.entries = Some(entries);
        }
        Ok(self.entries.as_mut().and_then(VecDeque::pop_front))
    }
}

/// One payload element of a block: exactly one transport populated.
#[derive(Debug)]
enum DataEntry {
    /// Calldata of a non-blob batcher transaction.
    Calldata(Bytes),
    /// A resolved blob body.
    Blob(Box<Blob>),
}

/// A slot in block order awaiting either calldata or a fetched blob.
#[derive(Debug, PartialEq, Eq)]
enum Placeholder {
    Calldata(Bytes),
    Blob,
}

/// Extracts payloads from valid batcher transactions, resolving referenced
/// blobs against the blob provider with bounded retry.
#[derive(Debug)]
pub struct BlobDataSource<P, B, S = TokioSleeper> {
    l1_provider: P,
    blob_provider: B,
    sleeper: S,
    block_ref: L1BlockRef,
    batch_inbox_address: Address,
    batcher_address: Address,
    entries: Option<VecDeque<DataEntry>>,
}

impl<P, B> BlobDataSource<P, B> {
    /// Returns a new blob data source for the referenced block.
    pub const fn new(
        l1_provider: P,
        blob_provider: B,
        block_ref: L1BlockRef,
        batch_inbox_address: Address,
        batcher_address: Address,
    ) -> Self {
        Self {
            l1_provider,
            blob_provider,
            sleeper: TokioSleeper,
            block_ref,
            batch_inbox_address,
            batcher_address,
            entries: None,
        }
    }
}

impl<P, B, S> BlobDataSource<P, B, S>
where
    P: L1Provider,
    B: BlobProvider,
    S: Sleeper,
{
    /// Returns a new blob data source sleeping through the provided
    /// [`Sleeper`].
    pub const fn with_sleeper(
        l1_provider: P,
        blob_provider: B,
        sleeper: S,
        block_ref: L1BlockRef,
        batch_inbox_address: Address,
        batcher_address: Address,
    ) -> Self {
        Self {
            l1_provider,
            blob_provider,
            sleeper,
            block_ref,
            batch_inbox_address,
            batcher_address,
            entries: None,
        }
    }

    /// Returns the next payload, or `None` once the block is exhausted.
    /// Blobs whose bodies fail to parse are logged and skipped.
    pub async fn next(&mut self) -> Result<Option<Bytes>, DerivationError> {
        if self.entries.is_none() {
            let entries = self.open().await?;
            self.entries = Some(entries);
        }
        while let Some(entry) = self.entries.as_mut().and_then(VecDeque::pop_front) {
            match entry {
                DataEntry::Calldata(data) => return Ok(Some(data)),
                DataEntry::Blob(blob) => match decode_blob(&blob) {
                    Some(data) => return Ok(Some(data.into())),
                    None => {
                        tracing::error!(target: "batcher::data_source", origin = %self.block_ref.hash, "ignoring blob due to parse failure");
                    }
                },
            }
        }
        Ok(None)
    }

    /// Fetches the block's transactions and resolves all referenced blobs.
    async fn open(&self) -> Result<VecDeque<DataEntry>, DerivationError> {
        let txs = fetch_transactions(&self.l1_provider, &self.block_ref).await?;
        let (placeholders, hashes) =
            data_and_hashes_from_txs(&txs, self.batch_inbox_address, self.batcher_address);

        let blobs = if hashes.is_empty() { Vec::new() } else { self.fetch_blobs(&hashes).await? };
        fill_entries(placeholders, blobs)
    }

    /// Fetches the referenced blobs, retrying "not found" responses with
    /// bounded backoff: a lagging beacon node may catch up, and retrying here
    /// avoids resetting the whole pipeline. Any other error is returned
    /// immediately as temporary.
    async fn fetch_blobs(
        &self,
        hashes: &[IndexedBlobHash],
    ) -> Result<Vec<Box<Blob>>, DerivationError> {
        let mut attempt = 0;
        loop {
            match self.blob_provider.blobs(&self.block_ref, hashes).await {
                Ok(blobs) => return Ok(blobs),
                Err(err) if err.is_not_found() => {
                    tracing::warn!(target: "batcher::data_source", origin = %self.block_ref.hash, attempt, "blobs not found, retrying");
                    self.sleeper.sleep(backoff_delay(attempt)).await;
                    attempt += 1;
                    if attempt >= MAX_BLOB_FETCH_ATTEMPTS {
                        // the block exists but its blobs are gone, most
                        // likely past the retention window.
                        return Err(DerivationError::Reset(err.into()));
                    }
                }
                Err(err) => return Err(DerivationError::Temporary(err.into())),
            }
        }
    }
}

/// Walks the block's transactions, collecting calldata placeholders and
/// indexed blob hashes for valid batcher transactions. Blob indices count
/// across *all* transactions of the block, skipped ones included, to stay
/// aligned with the block's sidecar index space.
fn data_and_hashes_from_txs(
    txs: &[TxEnvelope],
    batch_inbox: Address,
    batcher: Address,
) -> (Vec<Placeholder>, Vec<IndexedBlobHash>) {
    let mut data = Vec::new();
    let mut hashes = Vec::new();
    let mut blob_index = 0u64;
    for tx in txs {
        if !is_valid_batch_tx(tx, batch_inbox, batcher) {
            blob_index += tx.blob_versioned_hashes().map_or(0, <[_]>::len) as u64;
            continue;
        }
        let Some(blob_hashes) = tx.blob_versioned_hashes() else {
            data.push(Placeholder::Calldata(tx.input().clone()));
            continue;
        };
        if !tx.input().is_empty() {
            tracing::warn!(target: "batcher::data_source", hash = %tx.tx_hash(), "blob tx has calldata, which will be ignored");
        }
        for hash in blob_hashes {
            hashes.push(IndexedBlobHash { index: blob_index, hash: *hash });
            data.push(Placeholder::Blob);
            blob_index += 1;
        }
    }
    (data, hashes)
}

/// Fills each blob placeholder with the fetched blob bodies, strictly in
/// request order. Any count mismatch indicates a broken blob provider.
fn fill_entries(
    placeholders: Vec<Placeholder>,
    blobs: Vec<Box<Blob>>,
) -> Result<VecDeque<DataEntry>, DerivationError> {
    let mut blobs = blobs.into_iter();
    let mut entries = VecDeque::with_capacity(placeholders.len());
    for placeholder in placeholders {
        entries.push_back(match placeholder {
            Placeholder::Calldata(data) => DataEntry::Calldata(data),
            Placeholder::Blob => DataEntry::Blob(
                blobs.next().ok_or(DerivationError::Fatal("not enough blobs for placeholders"))?,
            ),
        });
    }
    if blobs.next().is_some() {
        return Err(DerivationError::Fatal("too many blobs for placeholders"));
    }
    Ok(entries)
}

/// Decodes a blob body into its payload bytes.
fn decode_blob(blob: &Blob) -> Option<Vec<u8>> {
    SimpleCoder::default().decode_all(std::slice::from_ref(blob))?.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{signed_blob_tx, signed_tx};
    use alloy_eips::eip4844::builder::SidecarBuilder;
    use alloy_primitives::B256;
    use alloy_signer_local::PrivateKeySigner;
    use rollup_batcher_primitives::BlockInfo;
    use rollup_batcher_providers::{BlobProviderError, ProviderError};
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    struct MockL1 {
        txs: Vec<TxEnvelope>,
    }

    #[async_trait::async_trait]
    impl L1Provider for MockL1 {
        async fn latest_head(&self) -> Result<L1BlockRef, ProviderError> {
            unimplemented!("unused in data source tests")
        }

        async fn transactions_by_hash(
            &self,
            _block_hash: B256,
        ) -> Result<Vec<TxEnvelope>, ProviderError> {
            Ok(self.txs.clone())
        }
    }

    enum BlobBehavior {
        NotFound,
        Broken,
        Return(Vec<Box<Blob>>),
    }

    struct MockBlobs {
        behavior: BlobBehavior,
        calls: AtomicU32,
    }

    impl MockBlobs {
        fn new(behavior: BlobBehavior) -> Self {
            Self { behavior, calls: AtomicU32::new(0) }
        }
    }

    #[async_trait::async_trait]
    impl BlobProvider for MockBlobs {
        async fn blobs(
            &self,
            _block_ref: &L1BlockRef,
            _hashes: &[IndexedBlobHash],
        ) -> Result<Vec<Box<Blob>>, BlobProviderError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            match &self.behavior {
                BlobBehavior::NotFound => Err(BlobProviderError::NotFound(0)),
                BlobBehavior::Broken => Err(BlobProviderError::VersionedHashMismatch {
                    index: 0,
                    expected: B256::ZERO,
                    got: B256::ZERO,
                }),
                BlobBehavior::Return(blobs) => Ok(blobs.clone()),
            }
        }
    }

    fn block_ref(timestamp: u64) -> L1BlockRef {
        L1BlockRef { hash: B256::random(), number: 100, parent_hash: B256::random(), timestamp }
    }

    fn test_config(inbox: Address) -> RollupConfig {
        RollupConfig {
            genesis_l1: BlockInfo::default(),
            block_time: 2,
            ecotone_time: Some(1_000),
            batch_inbox_address: inbox,
            deposit_contract_address: Address::random(),
            l1_chain_id: 1,
        }
    }

    #[tokio::test]
    async fn test_calldata_source_filters_by_signer() -> eyre::Result<()> {
        let inbox = Address::random();
        let batcher_key = PrivateKeySigner::random();
        let other_key = PrivateKeySigner::random();

        let txs = vec![
            signed_tx(&batcher_key, inbox, vec![0xaa, 0xbb].into()),
            signed_tx(&other_key, inbox, vec![0xcc].into()),
            signed_tx(&batcher_key, Address::random(), vec![0xdd].into()),
        ];
        let factory = std::sync::Arc::new(MockL1 { txs });
        let blobs = std::sync::Arc::new(MockBlobs::new(BlobBehavior::NotFound));
        let factory = DataSourceFactory::new(&test_config(inbox), factory, blobs);

        // pre-upgrade timestamp selects the calldata source.
        let mut source = factory.open_data(block_ref(500), batcher_key.address());
        assert!(matches!(source, DataSource::Calldata(_)));

        assert_eq!(source.next().await?, Some(vec![0xaa, 0xbb].into()));
        assert_eq!(source.next().await?, None);
        // exhausted sources keep signaling end-of-data.
        assert_eq!(source.next().await?, None);
        Ok(())
    }

    #[test]
    fn test_blob_indices_count_skipped_txs() {
        let inbox = Address::random();
        let batcher_key = PrivateKeySigner::random();
        let other_key = PrivateKeySigner::random();

        let skipped_hashes = vec![B256::random(), B256::random()];
        let wanted_hash = B256::random();
        let txs = vec![
            signed_blob_tx(&other_key, inbox, skipped_hashes, Bytes::new()),
            signed_tx(&batcher_key, inbox, vec![0x01].into()),
            signed_blob_tx(&batcher_key, inbox, vec![wanted_hash], Bytes::new()),
        ];

        let (placeholders, hashes) =
            data_and_hashes_from_txs(&txs, inbox, batcher_key.address());
        assert_eq!(
            placeholders,
            vec![Placeholder::Calldata(vec![0x01].into()), Placeholder::Blob]
        );
        // the two skipped blobs still advance the sidecar index space.
        assert_eq!(hashes, vec![IndexedBlobHash { index: 2, hash: wanted_hash }]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blob_not_found_retries_then_resets() -> eyre::Result<()> {
        let inbox = Address::random();
        let batcher_key = PrivateKeySigner::random();
        let txs =
            vec![signed_blob_tx(&batcher_key, inbox, vec![B256::random()], Bytes::new())];

        let blobs = MockBlobs::new(BlobBehavior::NotFound);
        let mut source = BlobDataSource::with_sleeper(
            MockL1 { txs },
            &blobs,
            TokioSleeper,
            block_ref(2_000),
            inbox,
            batcher_key.address(),
        );

        let start = tokio::time::Instant::now();
        let err = source.next().await.unwrap_err();
        let elapsed = start.elapsed();

        assert!(err.is_reset());
        assert_eq!(blobs.calls.load(Ordering::Relaxed), 3);
        assert!(elapsed >= Duration::from_secs(13), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(14), "elapsed {elapsed:?}");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_blob_other_error_is_temporary_without_retry() -> eyre::Result<()> {
        let inbox = Address::random();
        let batcher_key = PrivateKeySigner::random();
        let txs =
            vec![signed_blob_tx(&batcher_key, inbox, vec![B256::random()], Bytes::new())];

        let blobs = MockBlobs::new(BlobBehavior::Broken);
        let mut source = BlobDataSource::with_sleeper(
            MockL1 { txs },
            &blobs,
            TokioSleeper,
            block_ref(2_000),
            inbox,
            batcher_key.address(),
        );

        let start = tokio::time::Instant::now();
        let err = source.next().await.unwrap_err();

        assert!(err.is_temporary());
        assert_eq!(blobs.calls.load(Ordering::Relaxed), 1);
        assert!(start.elapsed() < Duration::from_secs(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_blob_payload_roundtrip() -> eyre::Result<()> {
        let inbox = Address::random();
        let batcher_key = PrivateKeySigner::random();

        let payload = vec![0x42u8; 4096];
        let sidecar: SidecarBuilder<SimpleCoder> = SidecarBuilder::from_slice(&payload);
        let blobs: Vec<Box<Blob>> = sidecar.take().into_iter().map(Box::new).collect();
        assert_eq!(blobs.len(), 1);

        let txs =
            vec![signed_blob_tx(&batcher_key, inbox, vec![B256::random()], Bytes::new())];
        let provider = MockBlobs::new(BlobBehavior::Return(blobs));
        let mut source = BlobDataSource::with_sleeper(
            MockL1 { txs },
            &provider,
            TokioSleeper,
            block_ref(2_000),
            inbox,
            batcher_key.address(),
        );

        let data = source.next().await?.unwrap();
        assert_eq!(data.as_ref(), payload.as_slice());
        assert_eq!(source.next().await?, None);
        Ok(())
    }

    #[test]
    fn test_fill_entries_count_mismatch_is_fatal() {
        let placeholders = vec![Placeholder::Blob, Placeholder::Blob];
        let err = fill_entries(placeholders, vec![Box::new(Blob::ZERO)]).unwrap_err();
        assert!(matches!(err, DerivationError::Fatal(_)));

        let err =
            fill_entries(Vec::new(), vec![Box::new(Blob::ZERO)]).unwrap_err();
        assert!(matches!(err, DerivationError::Fatal(_)));
    }
}
