use crate::{
    BatchSubmitterMetrics, DriverConfig, DriverError, SendError, SendQueue, SendResult,
    TxCandidate, TxPoolState, TxPoolStatus, TxReceipt, TxRef,
};
use std::{sync::Arc, time::Duration};

use alloy_eips::eip4844::builder::{SidecarBuilder, SimpleCoder};
use alloy_primitives::Bytes;
use rollup_batcher_channel::{
    ChannelError, ChannelManager, CompressorFactory, TxData, ZstdCompressorFactory,
};
use rollup_batcher_codec::{DepositTransaction, L1BlockInfo};
use rollup_batcher_primitives::{BlockInfo, L1BlockRef, L2Block, RollupConfig, SyncStatus};
use rollup_batcher_providers::{L2Provider, RollupProvider};
use tokio::sync::{mpsc, watch};

const RECEIPT_CHANNEL_SIZE: usize = 64;

/// The submission control loop.
///
/// Owns the channel manager exclusively: new blocks, ready frames and
/// receipts all flow through this task. The receipt drain only touches the
/// shared [`TxPoolStatus`] and forwards everything else back here over a
/// channel.
#[derive(Debug)]
pub struct BatchSubmitter<L2, R, Q, F = ZstdCompressorFactory> {
    config: DriverConfig,
    rollup_config: RollupConfig,
    l2_provider: L2,
    rollup_provider: R,
    queue: Q,
    channels: ChannelManager<F>,
    status: Arc<TxPoolStatus>,
    receipts_tx: mpsc::Sender<TxReceipt>,
    confirmations: mpsc::Receiver<(TxRef, SendResult)>,
    metrics: BatchSubmitterMetrics,
}

impl<L2, R, Q, F> BatchSubmitter<L2, R, Q, F>
where
    L2: L2Provider,
    R: RollupProvider,
    Q: SendQueue,
    F: CompressorFactory,
{
    /// Returns a new submitter and spawns its receipt-drain task.
    pub fn new(
        config: DriverConfig,
        rollup_config: RollupConfig,
        l2_provider: L2,
        rollup_provider: R,
        queue: Q,
        channels: ChannelManager<F>,
    ) -> Self {
        let status = Arc::new(TxPoolStatus::default());
        let (receipts_tx, receipts_rx) = mpsc::channel(RECEIPT_CHANNEL_SIZE);
        let (confirm_tx, confirmations) = mpsc::channel(RECEIPT_CHANNEL_SIZE);
        spawn_receipt_drain(receipts_rx, status.clone(), confirm_tx);
        Self {
            config,
            rollup_config,
            l2_provider,
            rollup_provider,
            queue,
            channels,
            status,
            receipts_tx,
            confirmations,
            metrics: BatchSubmitterMetrics::default(),
        }
    }

    /// Runs the loop until a shutdown or kill signal.
    ///
    /// Shutdown drains every channel that ever had data submitted before
    /// returning; kill abandons in-flight work immediately.
    pub async fn run(
        mut self,
        mut shutdown: watch::Receiver<bool>,
        mut kill: watch::Receiver<bool>,
    ) -> Result<(), DriverError> {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                _ = kill.changed() => {
                    tracing::warn!(target: "batcher::driver", "kill signal, abandoning in-flight work");
                    return Ok(());
                }
                _ = shutdown.changed() => {
                    return self.drain_and_exit(&mut kill).await;
                }
                recv = self.confirmations.recv() => {
                    if let Some((tx, result)) = recv {
                        self.handle_receipt(tx, result);
                    }
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.tick(&mut shutdown).await {
                        if err.is_fatal() {
                            return Err(err);
                        }
                        tracing::warn!(target: "batcher::driver", %err, "tick failed, retrying next interval");
                    }
                }
            }
        }
    }

    async fn tick(&mut self, shutdown: &mut watch::Receiver<bool>) -> Result<(), DriverError> {
        self.drain_confirmations();

        match self.status.load() {
            // wait for the cancellation receipt before doing anything else.
            TxPoolState::CancelPending => return Ok(()),
            TxPoolState::Blocked => {
                if let Some(blocked_by_blob) = self.status.begin_cancel() {
                    self.send_cancel(blocked_by_blob).await?;
                }
                return Ok(());
            }
            TxPoolState::Good => {}
        }

        let sync = self.sync_status().await?;
        self.load_blocks(&sync, shutdown).await?;
        self.publish_pending(&sync.head_l1).await?;
        Ok(())
    }

    /// Ingests the L2 block range `(stored tip, unsafe head]`, snapping the
    /// tip forward to the safe head when it lags behind.
    async fn load_blocks(
        &mut self,
        sync: &SyncStatus,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), DriverError> {
        let safe = sync.safe_l2;
        let tip = self.channels.tip();
        if tip.is_none_or(|tip| tip.number < safe.number) {
            if tip.is_some() {
                // everything at or below the safe head is already derived
                // from L1; deliberately skip ahead.
                tracing::info!(target: "batcher::driver", safe = safe.number, "stored tip behind safe head, catching up");
            }
            self.channels.clear(safe.id());
        }

        let start = self.channels.tip().map_or(safe.number, |tip| tip.number) + 1;
        for number in start..=sync.unsafe_l2.number {
            let block = self.block_by_number(number).await?;
            let l1_origin = self.l1_origin_of(&block)?;
            match self.channels.add_l2_block(&block, l1_origin) {
                Ok(()) => self.metrics.blocks_loaded.increment(1),
                Err(ChannelError::Reorg { expected, got }) => {
                    tracing::warn!(target: "batcher::driver", %expected, %got, number, "L2 reorg detected");
                    self.metrics.reorgs_detected.increment(1);
                    self.recover_from_reorg(&sync.head_l1, shutdown).await?;
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Publishes everything already packed, then resets the channel state to
    /// a freshly queried safe origin, retrying the query until it succeeds
    /// or shutdown is requested.
    async fn recover_from_reorg(
        &mut self,
        l1_head: &L1BlockRef,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), DriverError> {
        match self.channels.close() {
            Ok(()) | Err(ChannelError::PendingAfterClose) => {}
            Err(err) => return Err(err.into()),
        }
        self.publish_pending(l1_head).await?;
        self.queue.wait().await;
        self.drain_confirmations();

        loop {
            match self.sync_status().await {
                Ok(sync) => {
                    self.channels.clear(sync.safe_l2.id());
                    tracing::info!(
                        target: "batcher::driver",
                        origin = %sync.safe_l2.id(),
                        "channel state reset to safe origin"
                    );
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!(target: "batcher::driver", %err, "safe origin query failed, retrying");
                }
            }
            tokio::select! {
                _ = shutdown.changed() => return Ok(()),
                _ = tokio::time::sleep(self.config.clear_retry_interval) => {}
            }
        }
    }

    /// Hands every ready txData unit to the send queue, pausing as soon as
    /// the pool state degrades.
    async fn publish_pending(&mut self, l1_head: &L1BlockRef) -> Result<(), DriverError> {
        let head = BlockInfo::new(l1_head.number, l1_head.hash);
        let use_blobs = self.rollup_config.is_ecotone(l1_head.timestamp);
        while let Some(tx) = self.channels.tx_data(head) {
            let candidate = self.candidate(&tx, use_blobs)?;
            let tx_ref = TxRef { id: Some(tx.id()), is_cancel: false, is_blob: use_blobs };
            self.queue.send(tx_ref, candidate, self.receipts_tx.clone()).await?;
            self.metrics.txs_published.increment(1);
            if self.status.load() != TxPoolState::Good {
                break;
            }
        }
        Ok(())
    }

    fn candidate(&self, tx: &TxData, use_blobs: bool) -> Result<TxCandidate, DriverError> {
        let payload = tx.payload_bytes();
        let to = self.rollup_config.batch_inbox_address;
        if use_blobs {
            let sidecar = SidecarBuilder::<SimpleCoder>::from_slice(&payload)
                .build()
                .map_err(|err| DriverError::Sidecar(err.to_string()))?;
            Ok(TxCandidate { to, data: Bytes::new(), sidecar: Some(sidecar) })
        } else {
            Ok(TxCandidate { to, data: payload, sidecar: None })
        }
    }

    /// Sends a zero-effect transaction of the opposite payload type to clear
    /// the sender's pool slot.
    async fn send_cancel(&mut self, blocked_by_blob: bool) -> Result<(), DriverError> {
        let to = self.rollup_config.batch_inbox_address;
        let candidate = if blocked_by_blob {
            TxCandidate { to, data: Bytes::new(), sidecar: None }
        } else {
            let sidecar = SidecarBuilder::<SimpleCoder>::from_slice(&[0])
                .build()
                .map_err(|err| DriverError::Sidecar(err.to_string()))?;
            TxCandidate { to, data: Bytes::new(), sidecar: Some(sidecar) }
        };
        let tx_ref = TxRef { id: None, is_cancel: true, is_blob: !blocked_by_blob };
        tracing::info!(target: "batcher::driver", is_blob = tx_ref.is_blob, "sending pool-clearing transaction");
        self.queue.send(tx_ref, candidate, self.receipts_tx.clone()).await?;
        self.metrics.cancellations_sent.increment(1);
        Ok(())
    }

    /// Drains remaining channel data on shutdown. Channels that never had a
    /// submission are discarded by the close; everything else is published
    /// and awaited, unless the kill signal fires first.
    async fn drain_and_exit(
        &mut self,
        kill: &mut watch::Receiver<bool>,
    ) -> Result<(), DriverError> {
        tracing::info!(target: "batcher::driver", "shutting down, draining submitted channels");
        loop {
            self.drain_confirmations();
            match self.channels.close() {
                Ok(()) => break,
                Err(ChannelError::PendingAfterClose) => {}
                Err(err) => return Err(err.into()),
            }

            if self.status.load() == TxPoolState::Blocked {
                if let Some(blocked_by_blob) = self.status.begin_cancel() {
                    self.send_cancel(blocked_by_blob).await?;
                }
            }

            let sync = match self.sync_status().await {
                Ok(sync) => sync,
                Err(err) => {
                    tracing::warn!(target: "batcher::driver", %err, "status query failed during drain");
                    tokio::select! {
                        _ = kill.changed() => return Ok(()),
                        _ = tokio::time::sleep(self.config.clear_retry_interval) => continue,
                    }
                }
            };
            self.publish_pending(&sync.head_l1).await?;
            tokio::select! {
                _ = kill.changed() => {
                    tracing::warn!(target: "batcher::driver", "kill signal during drain, abandoning");
                    return Ok(());
                }
                _ = self.queue.wait() => {}
            }
            // receipts may still be in flight from the drain task.
            if let Ok(Some((tx, result))) =
                tokio::time::timeout(Duration::from_millis(100), self.confirmations.recv()).await
            {
                self.handle_receipt(tx, result);
            }
        }
        tokio::select! {
            _ = kill.changed() => {}
            _ = self.queue.wait() => {}
        }
        Ok(())
    }

    fn handle_receipt(&mut self, tx: TxRef, result: SendResult) {
        let Some(id) = tx.id else { return };
        match result {
            SendResult::Confirmed(block) => self.channels.tx_confirmed(id, block),
            SendResult::Failed(err) => {
                tracing::warn!(target: "batcher::driver", ?id, %err, "transaction failed");
                self.channels.tx_failed(id);
            }
        }
    }

    fn drain_confirmations(&mut self) {
        while let Ok((tx, result)) = self.confirmations.try_recv() {
            self.handle_receipt(tx, result);
        }
    }

    async fn sync_status(&self) -> Result<SyncStatus, DriverError> {
        tokio::time::timeout(self.config.network_timeout, self.rollup_provider.sync_status())
            .await
            .map_err(|_| DriverError::Timeout("sync status query"))?
            .map_err(DriverError::from)
    }

    async fn block_by_number(&self, number: u64) -> Result<L2Block, DriverError> {
        tokio::time::timeout(self.config.network_timeout, self.l2_provider.block_by_number(number))
            .await
            .map_err(|_| DriverError::Timeout("block fetch"))?
            .map_err(DriverError::from)
    }

    /// Derives the L1 origin of a block from its leading attributes deposit.
    fn l1_origin_of(&self, block: &L2Block) -> Result<BlockInfo, DriverError> {
        let first =
            block.transactions.first().ok_or(DriverError::MissingAttributes(block.number))?;
        let deposit = DepositTransaction::decode_2718(first)
            .map_err(|_| DriverError::InvalidAttributes(block.number))?;
        let info = L1BlockInfo::from_bytes(&self.rollup_config, block.timestamp, &deposit.input)?;
        Ok(BlockInfo::new(info.number, info.block_hash))
    }
}

/// Forwards receipts to the control loop, updating the shared pool state on
/// the way. This task is the only writer of the `Good -> Blocked` and
/// `CancelPending -> Good` transitions.
fn spawn_receipt_drain(
    mut receipts: mpsc::Receiver<TxReceipt>,
    status: Arc<TxPoolStatus>,
    confirmations: mpsc::Sender<(TxRef, SendResult)>,
) {
    tokio::spawn(async move {
        while let Some(TxReceipt { tx, result }) = receipts.recv().await {
            if tx.is_cancel {
                tracing::debug!(
                    target: "batcher::driver",
                    success = matches!(result, SendResult::Confirmed(_)),
                    "pool-clearing transaction resolved"
                );
                status.cancel_resolved();
                continue;
            }
            if matches!(result, SendResult::Failed(SendError::AddressReserved)) {
                tracing::warn!(target: "batcher::driver", is_blob = tx.is_blob, "sender slot reserved, pausing submissions");
                status.mark_blocked(tx.is_blob);
            }
            if confirmations.send((tx, result)).await.is_err() {
                break;
            }
        }
    });
}
