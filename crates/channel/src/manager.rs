use crate::{
    channel::Channel, ChannelConfig, ChannelError, ChannelManagerMetrics, CompressorFactory,
    ZstdCompressorFactory,
};
use std::collections::VecDeque;

use alloy_primitives::Bytes;
use rollup_batcher_codec::{Frame, FrameId, DERIVATION_VERSION_0};
use rollup_batcher_primitives::{BlockInfo, L2Block};

/// Identifies a submission by its first frame.
pub type TxId = FrameId;

/// The frames of one batcher transaction. A failed submission is retried with
/// the exact same payload so the identifier stays stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxData {
    frames: Vec<Frame>,
}

impl TxData {
    pub(crate) fn new(frames: Vec<Frame>) -> Self {
        debug_assert!(!frames.is_empty());
        Self { frames }
    }

    /// The identifier of the submission.
    pub fn id(&self) -> TxId {
        self.frames[0].frame_id()
    }

    /// The frames bundled into the submission.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The batcher transaction payload: the version byte followed by the
    /// encoded frames.
    pub fn payload_bytes(&self) -> Bytes {
        let mut out =
            Vec::with_capacity(1 + self.frames.iter().map(Frame::encoded_len).sum::<usize>());
        out.push(DERIVATION_VERSION_0);
        for frame in &self.frames {
            frame.encode(&mut out);
        }
        out.into()
    }
}

/// Packs pending L2 blocks into channels and tracks every frame handed out
/// for submission until it is confirmed on L1.
///
/// Channels are kept oldest first; data is always submitted in order, and a
/// failed submission is resent before any new frame goes out.
#[derive(Debug)]
pub struct ChannelManager<F = ZstdCompressorFactory> {
    config: ChannelConfig,
    factory: F,
    /// The last block successfully added. Blocks must extend this tip.
    tip: Option<BlockInfo>,
    channels: VecDeque<Channel>,
    metrics: ChannelManagerMetrics,
}

impl<F: CompressorFactory> ChannelManager<F> {
    /// Returns a new manager with no tip. The first added block is accepted
    /// unconditionally and establishes the tip.
    pub fn new(config: ChannelConfig, factory: F) -> Self {
        Self {
            config,
            factory,
            tip: None,
            channels: VecDeque::new(),
            metrics: ChannelManagerMetrics::default(),
        }
    }

    /// The last block successfully added.
    pub const fn tip(&self) -> Option<BlockInfo> {
        self.tip
    }

    /// Appends a block to the current channel, opening a new one when the
    /// current channel is closed, full, or spans too many L1 blocks.
    ///
    /// Rejects blocks that do not extend the tip, leaving all state
    /// untouched. The caller treats that rejection as an L2 reorg signal.
    pub fn add_l2_block(
        &mut self,
        block: &L2Block,
        l1_origin: BlockInfo,
    ) -> Result<(), ChannelError> {
        if let Some(tip) = self.tip {
            if block.parent_hash != tip.hash {
                return Err(ChannelError::Reorg { expected: tip.hash, got: block.parent_hash });
            }
        }

        let payload = block.payload_bytes();
        self.ensure_open_channel(payload.len(), l1_origin.number)?;
        let max_frame_size = self.config.max_frame_size;
        if let Some(channel) = self.channels.back_mut() {
            if let Err(err) = channel.add_block(&payload, l1_origin.number, max_frame_size) {
                // a broken compression stream cannot be recovered; drop the
                // channel so the caller can clear and reload.
                self.channels.pop_back();
                return Err(err);
            }
        }

        self.tip = Some(block.id());
        self.metrics.blocks_added.increment(1);
        self.metrics.pending_frames.set(self.total_pending_frames() as f64);
        Ok(())
    }

    /// Returns the next transaction to submit, or `None` when nothing is
    /// ready. Failed submissions are resent first, oldest channel first.
    pub fn tx_data(&mut self, l1_head: BlockInfo) -> Option<TxData> {
        self.sweep_timed_out(l1_head.number);

        if let Some(tx) = self.channels.iter_mut().find_map(Channel::next_resend) {
            tracing::debug!(target: "batcher::channel", id = ?tx.id(), "resending failed transaction");
            return Some(tx);
        }

        let target = self.config.target_frames_per_tx;
        let head = l1_head.number;
        let tx = self.channels.iter_mut().find_map(|channel| channel.next_new_tx(target, head));
        if tx.is_some() {
            self.metrics.pending_frames.set(self.total_pending_frames() as f64);
        }
        tx
    }

    /// Records a landed submission. A channel whose frames are all confirmed
    /// is dropped.
    pub fn tx_confirmed(&mut self, id: TxId, l1_block: BlockInfo) {
        let Some(pos) = self.channels.iter_mut().position(|channel| channel.confirm(id)) else {
            tracing::warn!(target: "batcher::channel", ?id, "receipt for unknown transaction");
            return;
        };
        tracing::trace!(target: "batcher::channel", ?id, block = %l1_block, "transaction confirmed");
        if self.channels[pos].is_fully_confirmed() {
            self.channels.remove(pos);
            self.metrics.channels_confirmed.increment(1);
        }
    }

    /// Records a failed submission, queueing its payload for a
    /// byte-identical resend.
    pub fn tx_failed(&mut self, id: TxId) {
        if !self.channels.iter_mut().any(|channel| channel.fail(id)) {
            tracing::warn!(target: "batcher::channel", ?id, "failure for unknown transaction");
        }
    }

    /// Closes the manager for new blocks: channels that were never submitted
    /// are discarded, the rest are closed so their remaining data can drain.
    ///
    /// Returns [`ChannelError::PendingAfterClose`] while unconfirmed data
    /// remains; the caller must keep submitting and confirming until a close
    /// succeeds.
    pub fn close(&mut self) -> Result<(), ChannelError> {
        self.channels.retain(Channel::ever_submitted);
        let max_frame_size = self.config.max_frame_size;
        for channel in &mut self.channels {
            channel.close(max_frame_size)?;
        }
        if self.channels.iter().any(Channel::has_pending) {
            return Err(ChannelError::PendingAfterClose);
        }
        Ok(())
    }

    /// Drops all channels and restarts the tip at `origin`. Used after the
    /// caller has re-synchronized following a reorg.
    pub fn clear(&mut self, origin: BlockInfo) {
        self.channels.clear();
        self.tip = Some(origin);
        self.metrics.pending_frames.set(0.0);
    }

    fn ensure_open_channel(
        &mut self,
        input_len: usize,
        l1_origin_number: u64,
    ) -> Result<(), ChannelError> {
        let ChannelConfig { max_channel_size, max_frame_size, max_l1_origin_span, .. } =
            self.config;
        if let Some(channel) = self.channels.back_mut() {
            if !channel.is_closed()
                && channel.has_capacity(input_len, max_channel_size)
                && !channel.spans_too_far(l1_origin_number, max_l1_origin_span)
            {
                return Ok(());
            }
            channel.close(max_frame_size)?;
        }
        let compressor = self.factory.compressor()?;
        let channel = Channel::new(compressor);
        tracing::debug!(target: "batcher::channel", id = ?channel.id(), "opened channel");
        self.channels.push_back(channel);
        self.metrics.channels_opened.increment(1);
        Ok(())
    }

    fn sweep_timed_out(&mut self, l1_head_number: u64) {
        let max_duration = self.config.max_channel_duration;
        let metrics = self.metrics.clone();
        self.channels.retain(|channel| {
            if channel.timed_out(l1_head_number, max_duration) {
                tracing::warn!(
                    target: "batcher::channel",
                    id = ?channel.id(),
                    "channel unconfirmed for too long, abandoning"
                );
                metrics.channels_timed_out.increment(1);
                return false;
            }
            true
        });
    }

    fn total_pending_frames(&self) -> usize {
        self.channels.iter().map(Channel::pending_frame_count).sum()
    }
}
