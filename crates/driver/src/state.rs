use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

const GOOD: u8 = 0;
const BLOCKED: u8 = 1;
const CANCEL_PENDING: u8 = 2;

/// The txpool contention state of the batcher's sender address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPoolState {
    /// Submissions flow normally.
    Good,
    /// A send failed because the sender's pool slot is reserved by a
    /// transaction of a different payload type.
    Blocked,
    /// A pool-clearing cancellation is in flight.
    CancelPending,
}

/// The contention state shared between the control loop and the receipt
/// drain.
///
/// Each transition is owned by exactly one side: the receipt drain performs
/// `Good -> Blocked` and `CancelPending -> Good`, the control loop performs
/// `Blocked -> CancelPending`. All transitions are compare-and-swap so a
/// stale writer never clobbers the other side's move.
#[derive(Debug, Default)]
pub struct TxPoolStatus {
    state: AtomicU8,
    blocked_by_blob: AtomicBool,
}

impl TxPoolStatus {
    /// The current state.
    pub fn load(&self) -> TxPoolState {
        match self.state.load(Ordering::Acquire) {
            GOOD => TxPoolState::Good,
            BLOCKED => TxPoolState::Blocked,
            _ => TxPoolState::CancelPending,
        }
    }

    /// Receipt-drain side: records that a send hit a reserved pool slot,
    /// remembering the payload type of the blocked transaction.
    pub fn mark_blocked(&self, blocked_tx_is_blob: bool) {
        self.blocked_by_blob.store(blocked_tx_is_blob, Ordering::Release);
        let _ = self.state.compare_exchange(GOOD, BLOCKED, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Control-loop side: claims the cancellation. Returns the payload type
    /// of the blocked transaction when the claim succeeds, so the caller can
    /// send the opposite type.
    pub fn begin_cancel(&self) -> Option<bool> {
        self.state
            .compare_exchange(BLOCKED, CANCEL_PENDING, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| self.blocked_by_blob.load(Ordering::Acquire))
    }

    /// Receipt-drain side: the cancellation resolved. Either outcome clears
    /// the state, since the contention may have cleared independently of
    /// this transaction's own result.
    pub fn cancel_resolved(&self) {
        let _ =
            self.state.compare_exchange(CANCEL_PENDING, GOOD, Ordering::AcqRel, Ordering::Acquire);
    }
}
