pub mod category;

use embassy_time::Instant;
use log::{debug, error};

use crate::buf::StatusMsg;
use crate::common::{MessageContext, ModelRef};
use crate::error::SendError;
use crate::event::{ServerEvent, StateChange};
use crate::last_msg::LastMsgInfo;
use crate::transition::{Tick, Transition, TransitionFields};

/// The mesh stack and the application, as seen by the model servers.
pub trait MeshSink {
    /// Unicast reply to the sender of `ctx`.
    fn send(
        &mut self,
        model: ModelRef,
        ctx: &MessageContext,
        msg: &[u8],
    ) -> core::result::Result<(), SendError>;

    /// Publication. `ttl` overrides the configured publish TTL.
    fn publish(
        &mut self,
        model: ModelRef,
        msg: &[u8],
        ttl: Option<u8>,
    ) -> core::result::Result<(), SendError>;

    fn notify(&mut self, model: ModelRef, ctx: &MessageContext, event: ServerEvent);
}

pub fn check_send_status(model: ModelRef, result: core::result::Result<(), SendError>) {
    match result {
        Ok(()) => {}
        Err(SendError::NoPublication) => {
            debug!("{:?} on element 0x{:04x} has no publication", model.id, model.element)
        }
        Err(err) => error!(
            "{:?} on element 0x{:04x} failed to send: {}",
            model.id, model.element, err
        ),
    }
}

pub fn send_status<S: MeshSink>(sink: &mut S, model: ModelRef, ctx: &MessageContext, msg: &StatusMsg) {
    check_send_status(model, sink.send(model, ctx, msg.as_slice()));
}

pub fn publish_status<S: MeshSink>(sink: &mut S, model: ModelRef, msg: &StatusMsg) {
    check_send_status(model, sink.publish(model, msg.as_slice(), None));
}

/// Replies when the message was acknowledged, then publishes the same status.
pub fn respond<S: MeshSink>(
    sink: &mut S,
    model: ModelRef,
    ctx: &MessageContext,
    ack: bool,
    msg: &StatusMsg,
) {
    if ack {
        send_status(sink, model, ctx, msg);
    }
    publish_status(sink, model, msg);
}

pub fn notify_change<S: MeshSink>(
    sink: &mut S,
    model: ModelRef,
    ctx: &MessageContext,
    change: StateChange,
) {
    sink.notify(model, ctx, ServerEvent::StateChange(change));
}

pub fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// A decoded transactional Set (Set, Delta, Move, Recall).
#[derive(Clone, Copy, Debug)]
pub struct SetRequest<'a> {
    pub ctx: &'a MessageContext,
    pub tid: u8,
    pub tt: TransitionFields,
    // Whether the sender expects a status reply
    pub ack: bool,
}

impl<'a> SetRequest<'a> {
    pub fn new(ctx: &'a MessageContext, tid: u8, tt: TransitionFields, ack_opcode: u32) -> Self {
        Self {
            ctx,
            tid,
            tt,
            ack: ctx.recv_op == ack_opcode,
        }
    }
}

/// A model state that moves toward a target over a [`Transition`].
///
/// Servers with several independently transitioning states (Lightness Actual
/// and Linear) tell them apart with `Channel`.
pub trait TransitionModel {
    type Channel: Copy;

    fn model(&self, ch: Self::Channel) -> ModelRef;
    fn transition(&self, ch: Self::Channel) -> &Transition;
    fn transition_mut(&mut self, ch: Self::Channel) -> &mut Transition;
    fn last_msg(&mut self) -> &mut LastMsgInfo;

    fn target_reached(&self, ch: Self::Channel) -> bool;
    /// Computes the per-step deltas from the current transition counter.
    fn prepare(&mut self, ch: Self::Channel);
    fn step(&mut self, ch: Self::Channel);
    /// Snaps to the target and applies shadow values.
    fn complete(&mut self, ch: Self::Channel);

    /// Called at the first fire of a stepping transition. Returns whether the
    /// visible state changed.
    fn begin(&mut self, _ch: Self::Channel) -> bool {
        false
    }

    fn reports_step(&self, _ch: Self::Channel, _done: bool) -> bool {
        true
    }

    fn state_change(&self, ch: Self::Channel, ctx: &MessageContext) -> StateChange;
    fn status(&mut self, ch: Self::Channel, ctx: Option<&MessageContext>, now: Instant) -> StatusMsg;
}

pub fn respond_status<M: TransitionModel, S: MeshSink>(
    srv: &mut M,
    ch: M::Channel,
    req: &SetRequest,
    now: Instant,
    sink: &mut S,
) {
    let msg = srv.status(ch, Some(req.ctx), now);
    respond(sink, srv.model(ch), req.ctx, req.ack, &msg);
}

/// The transaction part of every Set: duplicate check, cancel the running
/// transition, remember the transaction.
///
/// Returns false if the message was a retransmission, which is only answered.
pub fn accept_transaction<M: TransitionModel, S: MeshSink>(
    srv: &mut M,
    ch: M::Channel,
    req: &SetRequest,
    now: Instant,
    sink: &mut S,
) -> bool {
    if srv.last_msg().is_duplicate_ctx(req.tid, req.ctx, now) {
        respond_status(srv, ch, req, now, sink);
        return false;
    }

    srv.transition_mut(ch).stop();
    srv.last_msg().update_ctx(req.tid, req.ctx, now);
    true
}

/// Starts moving toward the target already stored in the model.
pub fn begin_transition<M: TransitionModel, S: MeshSink>(
    srv: &mut M,
    ch: M::Channel,
    req: &SetRequest,
    now: Instant,
    sink: &mut S,
) {
    srv.transition_mut(ch)
        .set_values(req.tt.trans_time, req.tt.delay);
    srv.prepare(ch);
    srv.transition_mut(ch).set_ctx(req.ctx);

    if srv.transition(ch).counter == 0 {
        srv.complete(ch);
    }

    srv.transition_mut(ch).just_started = true;
    respond_status(srv, ch, req, now, sink);
    srv.transition_mut(ch).start(now);
}

/// Full Set flow for a model whose target is written by `set_target`.
pub fn transactional_set<M, S, F>(
    srv: &mut M,
    ch: M::Channel,
    req: &SetRequest,
    now: Instant,
    sink: &mut S,
    set_target: F,
) where
    M: TransitionModel,
    S: MeshSink,
    F: FnOnce(&mut M),
{
    if !accept_transaction(srv, ch, req, now, sink) {
        return;
    }

    set_target(srv);

    if srv.target_reached(ch) {
        let change = srv.state_change(ch, req.ctx);
        notify_change(sink, srv.model(ch), req.ctx, change);
        respond_status(srv, ch, req, now, sink);
        return;
    }

    begin_transition(srv, ch, req, now, sink);
}

/// Applies one timer fire to the model.
pub fn tick<M: TransitionModel, S: MeshSink>(
    srv: &mut M,
    ch: M::Channel,
    tick: Tick,
    now: Instant,
    sink: &mut S,
) {
    let model = srv.model(ch);
    let Some(ctx) = srv.transition(ch).ctx().copied() else {
        error!("{:?} transition fired without a message context", model.id);
        return;
    };

    match tick {
        Tick::Instant => {
            let change = srv.state_change(ch, &ctx);
            notify_change(sink, model, &ctx, change);
        }
        Tick::Begin => {
            if srv.begin(ch) {
                let change = srv.state_change(ch, &ctx);
                notify_change(sink, model, &ctx, change);
            }
        }
        Tick::Step { done } => {
            srv.step(ch);
            if done {
                srv.complete(ch);
            }
            if srv.reports_step(ch, done) {
                let change = srv.state_change(ch, &ctx);
                notify_change(sink, model, &ctx, change);
            }

            let msg = srv.status(ch, Some(&ctx), now);
            publish_status(sink, model, &msg);
        }
    }
}

/// Fires the channel's timer if due. Returns the next deadline.
pub fn poll_transition<M: TransitionModel, S: MeshSink>(
    srv: &mut M,
    ch: M::Channel,
    now: Instant,
    sink: &mut S,
) -> Option<Instant> {
    if let Some(fired) = srv.transition_mut(ch).poll(now) {
        tick(srv, ch, fired, now, sink);
    }
    srv.transition(ch).next_deadline()
}


#[cfg(test)]
mod tests {
    use super::test_sink::RecordingSink;
    use super::*;
    use crate::common::ModelId;

    #[test]
    fn test_respond_unacked_only_publishes() {
        let mut sink = RecordingSink::default();
        let model = ModelRef::new(0, ModelId::GenOnOffSrv);
        let ctx = MessageContext::new(0x0002, 0x0001, 0x8203);
        let msg = StatusMsg::new(0x8204);

        respond(&mut sink, model, &ctx, false, &msg);

        assert!(sink.sent.is_empty());
        assert_eq!(sink.last_published(), Some(&[0x82, 0x04][..]));
    }

    #[test]
    fn test_publish_failure_is_only_logged() {
        let mut sink = RecordingSink {
            publish_error: Some(SendError::Transport(-5)),
            ..Default::default()
        };
        let model = ModelRef::new(0, ModelId::GenOnOffSrv);
        let ctx = MessageContext::new(0x0002, 0x0001, 0x8202);

        respond(&mut sink, model, &ctx, true, &StatusMsg::new(0x8204));

        assert_eq!(sink.sent.len(), 1);
        assert_eq!(sink.published.len(), 1);
    }

    #[test]
    fn test_earliest() {
        let a = Instant::from_millis(10);
        let b = Instant::from_millis(20);

        assert_eq!(earliest(Some(a), Some(b)), Some(a));
        assert_eq!(earliest(None, Some(b)), Some(b));
        assert_eq!(earliest(Some(a), None), Some(a));
        assert_eq!(earliest(None, None), None);
    }

    #[test]
    fn test_set_request_ack_from_opcode() {
        let acked = MessageContext::new(0x0002, 0x0001, 0x8202);
        let unacked = MessageContext::new(0x0002, 0x0001, 0x8203);

        assert!(SetRequest::new(&acked, 0, TransitionFields::default(), 0x8202).ack);
        assert!(!SetRequest::new(&unacked, 0, TransitionFields::default(), 0x8202).ack);
    }
}
