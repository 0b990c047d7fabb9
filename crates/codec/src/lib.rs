//! The binary wire formats shared between the batch submission and data
//! derivation sides of the rollup: the L1 attributes deposit (two format
//! generations), user deposit logs, the deposit exclusion bitmap and the
//! channel frame format.

pub use error::{CodecError, DepositError};
mod error;

mod abi;

pub use bitmap::Bitmap;
mod bitmap;

pub use deposit::{
    user_deposits, DepositTransaction, L1InfoDepositSource, UserDepositSource,
    DEPOSIT_EVENT_ABI_HASH, DEPOSIT_EVENT_VERSION_0, DEPOSIT_TX_TYPE,
};
mod deposit;

pub use frame::{
    parse_frames, ChannelId, Frame, FrameId, DERIVATION_VERSION_0, FRAME_OVERHEAD, MAX_FRAME_LEN,
};
mod frame;

pub use info::{
    l1_info_deposit, L1BlockDetails, L1BlockInfo, BEDROCK_EXCLUSIONS_SELECTOR, BEDROCK_SELECTOR,
    ECOTONE_EXCLUSIONS_SELECTOR, ECOTONE_SELECTOR, L1_BLOCK_ADDRESS, L1_INFO_BEDROCK_LEN,
    L1_INFO_DEPOSITER_ADDRESS, L1_INFO_ECOTONE_LEN, REGOLITH_SYSTEM_TX_GAS,
};
mod info;
