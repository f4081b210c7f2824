use core::cell::RefCell;

use embassy_sync::blocking_mutex::CriticalSectionMutex;
use embassy_time::Instant;
use log::{error, warn};

use crate::binding::{self, BindingValue, BoundModel};
use crate::common::{MessageContext, ModelRef};
use crate::embassy::time_driver::uptime;
use crate::embassy::yield_now::yield_now;
use crate::error::{Result, ServerError};
use crate::server::MeshSink;

/// All model instances of one category (Generic, Lighting, Time and Scene).
pub trait Servers {
    const NAME: &'static str;

    fn handle<S: MeshSink>(
        &mut self,
        model: ModelRef,
        ctx: &MessageContext,
        payload: &[u8],
        now: Instant,
        sink: &mut S,
    ) -> Result<()>;

    /// Fires every due transition timer. Returns the earliest pending deadline.
    fn poll<S: MeshSink>(&mut self, now: Instant, sink: &mut S) -> Option<Instant>;

    /// The model a binding value may be written to.
    fn bound_model(&mut self, _model: ModelRef) -> Option<BoundModel<'_>> {
        None
    }
}

/// A category of servers behind its lock. Handlers and timer fires of the
/// category run with the lock held.
pub struct ServerCategory<T> {
    servers: CriticalSectionMutex<RefCell<T>>,
}

impl<T: Servers> ServerCategory<T> {
    pub const fn new(servers: T) -> Self {
        Self {
            servers: CriticalSectionMutex::new(RefCell::new(servers)),
        }
    }

    /// Runs `f` with the category locked. Locking again from inside `f` is an
    /// error, not a deadlock.
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        self.servers.lock(|servers| {
            let mut servers = servers
                .try_borrow_mut()
                .map_err(|_| ServerError::Reentrant(T::NAME))?;
            Ok(f(&mut servers))
        })
    }

    /// Entry point for an access message addressed to one of our models.
    pub fn handle_message<S: MeshSink>(
        &self,
        model: ModelRef,
        ctx: &MessageContext,
        payload: &[u8],
        sink: &mut S,
    ) -> Result<()> {
        let now = uptime();
        let result = self.lock(|servers| servers.handle(model, ctx, payload, now, sink))?;

        match &result {
            Ok(()) => {}
            Err(err @ ServerError::UnknownOpcode { .. }) => warn!("{} server: {}", T::NAME, err),
            Err(err) => error!(
                "{} server dropped opcode 0x{:04x} from 0x{:04x}: {}",
                T::NAME,
                ctx.recv_op,
                ctx.addr,
                err
            ),
        }
        result
    }

    /// Applies a bound state value to `model`, see [`binding::update_binding_state`].
    pub fn update_binding_state<S: MeshSink>(
        &self,
        model: ModelRef,
        value: BindingValue,
        sink: &mut S,
    ) -> Result<()> {
        let now = uptime();
        self.lock(|servers| {
            let bound = servers.bound_model(model).ok_or(ServerError::NoSuchModel {
                model: model.id,
                element: model.element,
            })?;
            binding::update_binding_state(bound, value, now, sink)
        })?
    }

    /// One pass of the category work queue.
    pub fn process<S: MeshSink>(&self, sink: &mut S) -> Result<Option<Instant>> {
        let now = uptime();
        self.lock(|servers| servers.poll(now, sink))
    }

    pub async fn run<S: MeshSink>(&self, sink: &mut S) {
        loop {
            if let Err(err) = self.process(sink) {
                error!("{} work queue: {}", T::NAME, err);
            }
            yield_now().await;
        }
    }

    /// Like [`run`](Self::run), but returns once `deadline` has passed.
    pub async fn run_until<S: MeshSink>(&self, sink: &mut S, deadline: Instant) {
        while uptime() < deadline {
            if let Err(err) = self.process(sink) {
                error!("{} work queue: {}", T::NAME, err);
            }
            yield_now().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;
    use crate::config::RspCtrl;
    use crate::embassy::time_driver::mock_uptime;
    use crate::models::generic::{GenericServers, OnOffServer};
    use crate::opcode::*;
    use crate::server::test_sink::RecordingSink;
    use crate::ModelId;

    const ELEMENT: u16 = 0x0001;
    const ONOFF: ModelRef = ModelRef::new(ELEMENT, ModelId::GenOnOffSrv);

    fn category() -> ServerCategory<GenericServers> {
        let category = ServerCategory::new(GenericServers::new());
        category
            .lock(|servers| servers.add_onoff(OnOffServer::new(ELEMENT, RspCtrl::auto())))
            .unwrap()
            .unwrap();
        category
    }

    #[test]
    #[mry::lock(uptime)]
    fn test_handle_message_replies() {
        mock_uptime().returns(Instant::from_millis(1000));
        let category = category();
        let mut sink = RecordingSink::default();

        category
            .handle_message(
                ONOFF,
                &MessageContext::new(0x0002, ELEMENT, GEN_ONOFF_SET),
                &[0x01, 0x00],
                &mut sink,
            )
            .unwrap();

        assert_eq!(sink.sent[0].2, vec![0x82, 0x04, 0x01]);
    }

    #[test]
    #[mry::lock(uptime)]
    fn test_handle_message_reports_refusal() {
        mock_uptime().returns(Instant::from_millis(0));
        let category = category();
        let mut sink = RecordingSink::default();

        let result = category.handle_message(
            ONOFF,
            &MessageContext::new(0x0002, ELEMENT, GEN_LEVEL_GET),
            &[],
            &mut sink,
        );

        assert!(matches!(result, Err(ServerError::UnknownOpcode { .. })));
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn test_nested_lock_is_refused() {
        let category = category();

        let inner = category.lock(|_| category.lock(|_| ())).unwrap();

        assert_eq!(inner, Err(ServerError::Reentrant("Generic")));
    }

    #[test]
    #[mry::lock(uptime)]
    fn test_update_binding_state() {
        mock_uptime().returns(Instant::from_millis(0));
        let category = category();
        let mut sink = RecordingSink::default();

        category
            .update_binding_state(ONOFF, BindingValue::GenericOnOff { onoff: 1 }, &mut sink)
            .unwrap();
        let missing = category.update_binding_state(
            ModelRef::new(0x0005, ModelId::GenOnOffSrv),
            BindingValue::GenericOnOff { onoff: 1 },
            &mut sink,
        );

        assert_eq!(category.lock(|servers| servers.onoff(ELEMENT).map(|srv| srv.onoff)), Ok(Some(1)));
        assert!(matches!(missing, Err(ServerError::NoSuchModel { .. })));
        assert_eq!(sink.published.len(), 1);
    }

    static CLOCK_MS: AtomicU64 = AtomicU64::new(0);

    #[test]
    #[mry::lock(uptime)]
    fn test_run_until_finishes_transition() {
        // Arrange
        mock_uptime().returns_with(|| Instant::from_millis(CLOCK_MS.fetch_add(50, Ordering::SeqCst)));
        let category = category();
        let mut sink = RecordingSink::default();
        category
            .handle_message(
                ONOFF,
                &MessageContext::new(0x0002, ELEMENT, GEN_ONOFF_SET_UNACK),
                &[0x01, 0x00, 0x05, 0x00],
                &mut sink,
            )
            .unwrap();
        let deadline = Instant::from_millis(CLOCK_MS.load(Ordering::SeqCst) + 3000);

        // Act
        futures::executor::block_on(category.run_until(&mut sink, deadline));

        // Assert
        let (onoff, running) = category
            .lock(|servers| {
                let srv = servers.onoff(ELEMENT).map(|srv| (srv.onoff, srv.transition.is_running()));
                srv.unwrap_or((0, true))
            })
            .unwrap();
        assert_eq!(onoff, 1);
        assert!(!running);
        assert_eq!(sink.last_published(), Some(&[0x82, 0x04, 0x01][..]));
    }
}
