use embassy_time::{Duration, Instant};

use crate::common::{addr_is_unicast, MessageContext};
use crate::config::LAST_MSG_WINDOW_MS;

/// The last transaction a model accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LastMsgInfo {
    pub tid: u8,
    pub src: u16,
    pub dst: u16,
    pub timestamp: Option<Instant>,
}

impl LastMsgInfo {
    /// A retransmission of the stored transaction: same (tid, src, dst) to a
    /// unicast destination within the window.
    pub fn is_duplicate(&self, tid: u8, src: u16, dst: u16, now: Instant) -> bool {
        if !addr_is_unicast(dst) {
            return false;
        }

        if self.tid != tid || self.src != src || self.dst != dst {
            return false;
        }

        match self.timestamp.and_then(|ts| now.checked_duration_since(ts)) {
            Some(age) => age <= Duration::from_millis(LAST_MSG_WINDOW_MS),
            None => false,
        }
    }

    pub fn is_duplicate_ctx(&self, tid: u8, ctx: &MessageContext, now: Instant) -> bool {
        self.is_duplicate(tid, ctx.addr, ctx.recv_dst, now)
    }

    pub fn update(&mut self, tid: u8, src: u16, dst: u16, now: Instant) {
        // Group and virtual destinations are never tracked
        if !addr_is_unicast(dst) {
            return;
        }

        self.tid = tid;
        self.src = src;
        self.dst = dst;
        self.timestamp = Some(now);
    }

    pub fn update_ctx(&mut self, tid: u8, ctx: &MessageContext, now: Instant) {
        self.update(tid, ctx.addr, ctx.recv_dst, now)
    }
}
