use crate::{manager::TxData, ChannelError, Compressor, TxId};
use std::collections::{HashMap, VecDeque};

use rollup_batcher_codec::{ChannelId, Frame};

/// The compressed byte stream of a channel: streaming while the channel is
/// open, a frozen buffer once it is closed.
#[derive(Debug)]
enum Buffer {
    Streaming(Box<dyn Compressor>),
    Finished(Vec<u8>),
}

/// One channel: an append-only compressed buffer of block payloads, the
/// boundary index of the frames already cut from it, and the ack state of
/// everything handed out for submission.
#[derive(Debug)]
pub(crate) struct Channel {
    id: ChannelId,
    buffer: Buffer,
    /// Compressed bytes already cut into frames.
    emitted: usize,
    next_frame_number: u16,
    closed: bool,
    blocks: usize,
    /// L1 origin number of the first block packed into the channel.
    first_l1_origin: Option<u64>,
    /// L1 head number at the first submission, the basis of the timeout.
    first_l1_head: Option<u64>,
    ever_submitted: bool,
    /// Frames cut but never handed out.
    pending_frames: VecDeque<Frame>,
    /// Failed submissions awaiting a byte-identical resend.
    resend: VecDeque<TxData>,
    /// In-flight submissions awaiting a receipt.
    submitted: HashMap<TxId, TxData>,
}

impl Channel {
    pub(crate) fn new(compressor: Box<dyn Compressor>) -> Self {
        Self {
            id: rand::random(),
            buffer: Buffer::Streaming(compressor),
            emitted: 0,
            next_frame_number: 0,
            closed: false,
            blocks: 0,
            first_l1_origin: None,
            first_l1_head: None,
            ever_submitted: false,
            pending_frames: VecDeque::new(),
            resend: VecDeque::new(),
            submitted: HashMap::new(),
        }
    }

    pub(crate) const fn id(&self) -> ChannelId {
        self.id
    }

    pub(crate) const fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) const fn ever_submitted(&self) -> bool {
        self.ever_submitted
    }

    fn compressed(&self) -> &[u8] {
        match &self.buffer {
            Buffer::Streaming(compressor) => compressor.compressed(),
            Buffer::Finished(bytes) => bytes,
        }
    }

    /// Whether an input of `len` raw bytes can be appended without the
    /// compressed output possibly exceeding `max_channel_size`. The bound is
    /// the compressor's worst-case growth, not the raw length: flushing
    /// incompressible data adds stream framing on top of it.
    pub(crate) fn has_capacity(&self, len: usize, max_channel_size: usize) -> bool {
        match &self.buffer {
            Buffer::Streaming(compressor) => {
                compressor.compressed().len() + compressor.max_growth(len) < max_channel_size
            }
            Buffer::Finished(_) => false,
        }
    }

    /// Whether packing a block with the provided L1 origin would span more
    /// L1 blocks than allowed.
    pub(crate) fn spans_too_far(&self, l1_origin_number: u64, max_span: u64) -> bool {
        self.first_l1_origin.is_some_and(|first| l1_origin_number > first + max_span)
    }

    /// Whether the channel exceeded its L1-block span without full
    /// confirmation.
    pub(crate) fn timed_out(&self, l1_head_number: u64, max_duration: u64) -> bool {
        self.first_l1_head.is_some_and(|first| l1_head_number > first + max_duration)
    }

    /// Appends one block payload, cutting full-size frames as the buffer
    /// fills.
    pub(crate) fn add_block(
        &mut self,
        payload: &[u8],
        l1_origin_number: u64,
        max_frame_size: usize,
    ) -> Result<(), ChannelError> {
        let Buffer::Streaming(compressor) = &mut self.buffer else {
            unreachable!("closed channels never accept blocks")
        };
        compressor.write(payload)?;
        compressor.flush()?;
        self.blocks += 1;
        self.first_l1_origin.get_or_insert(l1_origin_number);
        self.emit_ready_frames(max_frame_size);
        Ok(())
    }

    /// Closes the channel: finalizes the compression stream and drains the
    /// remaining buffer into frames, the final one carrying the last-frame
    /// marker.
    pub(crate) fn close(&mut self, max_frame_size: usize) -> Result<(), ChannelError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let bytes = match std::mem::replace(&mut self.buffer, Buffer::Finished(Vec::new())) {
            Buffer::Streaming(compressor) => compressor.finish()?,
            Buffer::Finished(bytes) => bytes,
        };
        self.buffer = Buffer::Finished(bytes);
        tracing::debug!(
            target: "batcher::channel",
            id = ?self.id,
            blocks = self.blocks,
            compressed = self.compressed().len(),
            "closed channel"
        );
        loop {
            let remaining = self.compressed().len() - self.emitted;
            let is_last = remaining <= max_frame_size;
            self.push_frame(remaining.min(max_frame_size), is_last);
            if is_last {
                break;
            }
        }
        Ok(())
    }

    fn emit_ready_frames(&mut self, max_frame_size: usize) {
        while self.compressed().len() - self.emitted >= max_frame_size {
            self.push_frame(max_frame_size, false);
        }
    }

    fn push_frame(&mut self, len: usize, is_last: bool) {
        let data = self.compressed()[self.emitted..self.emitted + len].to_vec();
        self.emitted += len;
        let frame =
            Frame { id: self.id, number: self.next_frame_number, data: data.into(), is_last };
        self.next_frame_number += 1;
        self.pending_frames.push_back(frame);
    }

    /// Returns the next failed submission to retry, byte-identical to its
    /// first attempt, moving it back in flight.
    pub(crate) fn next_resend(&mut self) -> Option<TxData> {
        let tx = self.resend.pop_front()?;
        self.submitted.insert(tx.id(), tx.clone());
        Some(tx)
    }

    /// Bundles up to `target_frames` pending frames into a new submission,
    /// registering `l1_head_number` as the timeout basis on first use.
    pub(crate) fn next_new_tx(&mut self, target_frames: usize, l1_head_number: u64) -> Option<TxData> {
        if self.pending_frames.is_empty() {
            return None;
        }
        let count = target_frames.min(self.pending_frames.len()).max(1);
        let frames = self.pending_frames.drain(..count).collect();
        let tx = TxData::new(frames);
        self.first_l1_head.get_or_insert(l1_head_number);
        self.ever_submitted = true;
        self.submitted.insert(tx.id(), tx.clone());
        Some(tx)
    }

    /// Acknowledges an in-flight submission. Returns whether the id belonged
    /// to this channel.
    pub(crate) fn confirm(&mut self, id: TxId) -> bool {
        self.submitted.remove(&id).is_some()
    }

    /// Returns a failed submission to the resend queue. Returns whether the
    /// id belonged to this channel.
    pub(crate) fn fail(&mut self, id: TxId) -> bool {
        match self.submitted.remove(&id) {
            Some(tx) => {
                self.resend.push_back(tx);
                true
            }
            None => false,
        }
    }

    /// Whether every emitted frame of a closed channel is confirmed.
    pub(crate) fn is_fully_confirmed(&self) -> bool {
        self.closed
            && self.pending_frames.is_empty()
            && self.resend.is_empty()
            && self.submitted.is_empty()
    }

    /// Whether the channel still holds unsubmitted or unconfirmed data.
    pub(crate) fn has_pending(&self) -> bool {
        !self.pending_frames.is_empty() || !self.resend.is_empty() || !self.submitted.is_empty()
    }

    /// Number of frames cut but not yet handed out.
    pub(crate) fn pending_frame_count(&self) -> usize {
        self.pending_frames.len()
    }
}
