//! The channel frame format. A channel is split into frames so it can be
//! spread across several batcher transactions; a batcher transaction payload
//! is a version byte followed by one or more concatenated frames.

use crate::CodecError;
use alloy_primitives::Bytes;

/// The version byte prefixing every batcher transaction payload.
pub const DERIVATION_VERSION_0: u8 = 0;

/// The maximum number of data bytes a single frame may carry.
pub const MAX_FRAME_LEN: usize = 1_000_000;

/// A conservative upper bound on the non-data bytes a frame contributes to a
/// payload, used when sizing channels against a target payload size.
pub const FRAME_OVERHEAD: usize = 200;

/// The 16-byte random identifier shared by all frames of one channel.
pub type ChannelId = [u8; 16];

/// Identifies a frame by its channel and its position within the channel.
pub type FrameId = (ChannelId, u16);

/// One frame of a channel.
///
/// Wire layout: `channel_id(16) ‖ frame_number(u16 BE) ‖ data_len(u32 BE) ‖
/// data ‖ is_last(1)`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The channel this frame belongs to.
    pub id: ChannelId,
    /// The position of this frame in the channel, starting at 0.
    pub number: u16,
    /// The channel data carried by this frame.
    pub data: Bytes,
    /// Whether this is the final frame of the channel.
    pub is_last: bool,
}

impl Frame {
    /// The number of non-data bytes in the wire encoding of a frame.
    const HEADER_LEN: usize = 16 + 2 + 4;

    /// Returns the frame id.
    pub const fn frame_id(&self) -> FrameId {
        (self.id, self.number)
    }

    /// Returns the size of the wire encoding in bytes.
    pub fn encoded_len(&self) -> usize {
        Self::HEADER_LEN + self.data.len() + 1
    }

    /// Appends the wire encoding of the frame to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.id);
        buf.extend_from_slice(&self.number.to_be_bytes());
        buf.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        buf.extend_from_slice(&self.data);
        buf.push(self.is_last as u8);
    }

    /// Decodes a single frame from the front of `buf`, returning it together
    /// with the number of bytes consumed.
    pub fn decode(buf: &[u8]) -> Result<(usize, Self), CodecError> {
        if buf.len() < Self::HEADER_LEN {
            return Err(CodecError::UnexpectedEndOfData);
        }
        let id: ChannelId = buf[..16].try_into().expect("16 bytes");
        let number = u16::from_be_bytes(buf[16..18].try_into().expect("2 bytes"));
        let data_len = u32::from_be_bytes(buf[18..22].try_into().expect("4 bytes")) as usize;
        if data_len > MAX_FRAME_LEN {
            return Err(CodecError::FrameTooLarge(data_len));
        }
        let total = Self::HEADER_LEN + data_len + 1;
        if buf.len() < total {
            return Err(CodecError::UnexpectedEndOfData);
        }
        let data = buf[Self::HEADER_LEN..Self::HEADER_LEN + data_len].to_vec();
        let is_last = match buf[total - 1] {
            0 => false,
            1 => true,
            marker => return Err(CodecError::InvalidMarker(marker)),
        };
        Ok((total, Self { id, number, data: data.into(), is_last }))
    }
}

/// Parses a batcher transaction payload into its frames.
///
/// The payload must start with [`DERIVATION_VERSION_0`], carry at least one
/// frame and contain nothing after the last frame.
pub fn parse_frames(payload: &[u8]) -> Result<Vec<Frame>, CodecError> {
    let Some((&version, mut rest)) = payload.split_first() else {
        return Err(CodecError::UnexpectedEndOfData);
    };
    if version != DERIVATION_VERSION_0 {
        return Err(CodecError::UnsupportedVersion(version));
    }
    if rest.is_empty() {
        return Err(CodecError::UnexpectedEndOfData);
    }
    let mut frames = Vec::new();
    while !rest.is_empty() {
        let (consumed, frame) = Frame::decode(rest)?;
        rest = &rest[consumed..];
        frames.push(frame);
    }
    Ok(frames)
}
