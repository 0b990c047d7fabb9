//! An online [`BlobProvider`] backed by a beacon node's REST API.

use crate::{BlobProvider, BlobProviderError};
use std::collections::HashMap;

use alloy_eips::eip4844::{kzg_to_versioned_hash, Blob};
use alloy_primitives::FixedBytes;
use alloy_rpc_types_beacon::sidecar::{BeaconBlobBundle, BlobData};
use reqwest::Client;
use rollup_batcher_primitives::{IndexedBlobHash, L1BlockRef};
use tokio::sync::OnceCell;

/// The config spec api method.
const SPEC_METHOD: &str = "eth/v1/config/spec";

/// The beacon genesis api method.
const GENESIS_METHOD: &str = "eth/v1/beacon/genesis";

/// The blob sidecars api method prefix.
const SIDECARS_METHOD_PREFIX: &str = "eth/v1/beacon/blob_sidecars";

/// An API response.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct APIResponse<T> {
    /// The data.
    data: T,
}

/// A reduced genesis data.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct ReducedGenesisData {
    /// The genesis time.
    #[serde(rename = "genesis_time")]
    #[serde(with = "alloy_serde::quantity")]
    genesis_time: u64,
}

/// A reduced config data.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct ReducedConfigData {
    /// The seconds per slot.
    #[serde(rename = "SECONDS_PER_SLOT")]
    #[serde(with = "alloy_serde::quantity")]
    seconds_per_slot: u64,
}

/// The slot timing parameters of the beacon chain, fetched once on first use.
#[derive(Debug, Clone, Copy)]
struct BeaconChainInfo {
    /// The genesis timestamp.
    genesis_timestamp: u64,
    /// The seconds per slot.
    slot_interval: u64,
}

impl BeaconChainInfo {
    /// Returns the beacon slot holding the sidecars of an L1 block with the
    /// provided timestamp.
    const fn slot(&self, block_timestamp: u64) -> Result<u64, BlobProviderError> {
        if block_timestamp < self.genesis_timestamp {
            return Err(BlobProviderError::InvalidBlockTimestamp(
                self.genesis_timestamp,
                block_timestamp,
            ));
        }
        Ok((block_timestamp - self.genesis_timestamp) / self.slot_interval)
    }
}

/// An online implementation of a beacon client.
#[derive(Debug)]
pub struct OnlineBeaconClient {
    /// The base URL of the beacon API.
    base: String,
    /// The inner reqwest client.
    inner: Client,
    /// The chain timing parameters, resolved lazily.
    chain_info: OnceCell<BeaconChainInfo>,
}

impl OnlineBeaconClient {
    /// Creates a new [`OnlineBeaconClient`] from the provided base url.
    pub fn new_http(mut base: String) -> Self {
        // If base ends with a slash, remove it
        if base.ends_with('/') {
            base.remove(base.len() - 1);
        }
        Self { base, inner: Client::new(), chain_info: OnceCell::new() }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
    ) -> Result<T, reqwest::Error> {
        let response = self.inner.get(format!("{}/{}", self.base, method)).send().await?;
        response.error_for_status()?.json::<T>().await
    }

    async fn chain_info(&self) -> Result<BeaconChainInfo, BlobProviderError> {
        let info = self
            .chain_info
            .get_or_try_init(|| async {
                let spec =
                    self.get_json::<APIResponse<ReducedConfigData>>(SPEC_METHOD).await?;
                let genesis =
                    self.get_json::<APIResponse<ReducedGenesisData>>(GENESIS_METHOD).await?;
                Ok::<_, reqwest::Error>(BeaconChainInfo {
                    genesis_timestamp: genesis.data.genesis_time,
                    slot_interval: spec.data.seconds_per_slot,
                })
            })
            .await?;
        Ok(*info)
    }

    /// Returns the blob sidecars for the provided slot.
    async fn sidecars(&self, slot: u64) -> Result<Vec<BlobData>, BlobProviderError> {
        let url = format!("{}/{}/{}", self.base, SIDECARS_METHOD_PREFIX, slot);
        let response = self.inner.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BlobProviderError::NotFound(slot));
        }
        let bundle = response.error_for_status()?.json::<BeaconBlobBundle>().await?;
        Ok(bundle.data)
    }
}

/// The subset of a sidecar needed to match it against a versioned hash.
#[derive(Debug)]
struct IndexedSidecar {
    /// The index of the sidecar within its block.
    index: u64,
    /// The KZG commitment of the blob.
    commitment: FixedBytes<48>,
    /// The blob body.
    blob: Box<Blob>,
}

/// Matches the fetched sidecars against the requested indexed hashes,
/// returning the blobs in request order. Every requested index must resolve
/// to a sidecar whose commitment hashes to the requested versioned hash.
fn select_blobs(
    sidecars: Vec<IndexedSidecar>,
    hashes: &[IndexedBlobHash],
) -> Result<Vec<Box<Blob>>, BlobProviderError> {
    let mut by_index: HashMap<u64, IndexedSidecar> =
        sidecars.into_iter().map(|sidecar| (sidecar.index, sidecar)).collect();

    let mut blobs = Vec::with_capacity(hashes.len());
    for hash in hashes {
        let sidecar = by_index
            .remove(&hash.index)
            .ok_or(BlobProviderError::SidecarMissing(hash.index))?;
        let got = kzg_to_versioned_hash(sidecar.commitment.as_slice());
        if got != hash.hash {
            return Err(BlobProviderError::VersionedHashMismatch {
                index: hash.index,
                expected: hash.hash,
                got,
            });
        }
        blobs.push(sidecar.blob);
    }
    Ok(blobs)
}

#[async_trait::async_trait]
impl BlobProvider for OnlineBeaconClient {
    async fn blobs(
        &self,
        block_ref: &L1BlockRef,
        hashes: &[IndexedBlobHash],
    ) -> Result<Vec<Box<Blob>>, BlobProviderError> {
        if hashes.is_empty() {
            return Ok(Vec::new());
        }

        let slot = self.chain_info().await?.slot(block_ref.timestamp)?;
        tracing::trace!(target: "batcher::providers", slot, count = hashes.len(), "fetching blob sidecars");

        let sidecars = self
            .sidecars(slot)
            .await?
            .into_iter()
            .map(|data| IndexedSidecar {
                index: data.index,
                commitment: data.kzg_commitment,
                blob: data.blob,
            })
            .collect();
        select_blobs(sidecars, hashes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    fn sidecar(index: u64, fill: u8) -> IndexedSidecar {
        IndexedSidecar {
            index,
            commitment: FixedBytes::repeat_byte(fill),
            blob: Box::new(Blob::repeat_byte(fill)),
        }
    }

    fn hash_for(sidecar: &IndexedSidecar) -> IndexedBlobHash {
        IndexedBlobHash {
            index: sidecar.index,
            hash: kzg_to_versioned_hash(sidecar.commitment.as_slice()),
        }
    }

    #[test]
    fn test_select_blobs_preserves_request_order() {
        let sidecars = vec![sidecar(0, 1), sidecar(1, 2), sidecar(2, 3)];
        // request out of sidecar order, skipping index 1.
        let hashes = vec![hash_for(&sidecars[2]), hash_for(&sidecars[0])];

        let blobs = select_blobs(sidecars, &hashes).unwrap();
        assert_eq!(blobs.len(), 2);
        assert_eq!(*blobs[0], Blob::repeat_byte(3));
        assert_eq!(*blobs[1], Blob::repeat_byte(1));
    }

    #[test]
    fn test_select_blobs_missing_index() {
        let sidecars = vec![sidecar(0, 1)];
        let hashes = vec![IndexedBlobHash { index: 4, hash: B256::random() }];
        let err = select_blobs(sidecars, &hashes).unwrap_err();
        assert!(matches!(err, BlobProviderError::SidecarMissing(4)));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_select_blobs_hash_mismatch() {
        let sidecars = vec![sidecar(0, 1)];
        let hashes = vec![IndexedBlobHash { index: 0, hash: B256::random() }];
        let err = select_blobs(sidecars, &hashes).unwrap_err();
        assert!(matches!(err, BlobProviderError::VersionedHashMismatch { index: 0, .. }));
        assert!(!err.is_not_found());
    }

    // <https://docs.arbitrum.io/run-arbitrum-node/l1-ethereum-beacon-chain-rpc-providers>
    const BEACON_CLIENT_URL: &str = "https://eth-beacon-chain.drpc.org/rest/";

    #[tokio::test]
    #[ignore]
    async fn test_should_resolve_chain_info() -> eyre::Result<()> {
        let client = OnlineBeaconClient::new_http(BEACON_CLIENT_URL.to_string());
        let info = client.chain_info().await?;

        assert_eq!(info.genesis_timestamp, 1606824023);
        assert_eq!(info.slot_interval, 12);

        Ok(())
    }
}
