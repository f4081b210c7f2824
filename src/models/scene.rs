use embassy_time::Instant;
use heapless::Vec;
use log::{debug, warn};

use crate::buf::{NetBuf, StatusMsg};
use crate::common::{MessageContext, ModelId, ModelRef};
use crate::config::{RspCtrl, MAX_SCENES, SCENE_VALUE_MAX};
use crate::error::{Result, ServerError};
use crate::event::{RecvGet, RecvSet, StateChange};
use crate::last_msg::LastMsgInfo;
use crate::models::{forward_get, forward_set, unknown_opcode};
use crate::opcode::*;
use crate::server::{
    accept_transaction, begin_transition, notify_change, respond, respond_status, send_status,
    MeshSink, SetRequest, TransitionModel,
};
use crate::transition::{Transition, TransitionFields};

pub const INVALID_SCENE_NUMBER: u16 = 0x0000;

// Scene status codes
pub const SCENE_SUCCESS: u8 = 0x00;
pub const SCENE_REG_FULL: u8 = 0x01;
pub const SCENE_NOT_FOUND: u8 = 0x02;

/// One Scene Register slot. A slot whose number is 0x0000 is free.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneRegister {
    pub scene_number: u16,
    pub scene_type: u8,
    // Stored states, owned by the application
    pub scene_value: Vec<u8, SCENE_VALUE_MAX>,
}

impl SceneRegister {
    pub fn is_free(&self) -> bool {
        self.scene_number == INVALID_SCENE_NUMBER
    }
}

/// Scene Server together with its Setup Server, sharing one register.
#[derive(Clone, Debug)]
pub struct SceneServer {
    pub element: u16,
    pub rsp_ctrl: RspCtrl,
    pub scenes: Vec<SceneRegister, MAX_SCENES>,
    pub current_scene: u16,
    pub target_scene: u16,
    pub status_code: u8,
    pub in_progress: bool,
    pub last: LastMsgInfo,
    pub transition: Transition,
    // Scene asked for by the recall being processed
    recall_scene: u16,
}

impl SceneServer {
    pub fn new(element: u16, scene_count: usize, rsp_ctrl: RspCtrl) -> Result<Self> {
        if scene_count == 0 || scene_count > MAX_SCENES {
            return Err(ServerError::InvalidConfig("scene count out of range"));
        }

        let mut scenes = Vec::new();
        for _ in 0..scene_count {
            scenes
                .push(SceneRegister::default())
                .map_err(|_| ServerError::InvalidConfig("scene count out of range"))?;
        }

        Ok(Self {
            element,
            rsp_ctrl,
            scenes,
            current_scene: INVALID_SCENE_NUMBER,
            target_scene: INVALID_SCENE_NUMBER,
            status_code: SCENE_SUCCESS,
            in_progress: false,
            last: LastMsgInfo::default(),
            transition: Transition::default(),
            recall_scene: INVALID_SCENE_NUMBER,
        })
    }

    pub fn scene(&self, scene_number: u16) -> Option<&SceneRegister> {
        self.scenes.iter().find(|scene| scene.scene_number == scene_number)
    }

    pub fn scene_mut(&mut self, scene_number: u16) -> Option<&mut SceneRegister> {
        self.scenes
            .iter_mut()
            .find(|scene| scene.scene_number == scene_number)
    }

    /// A state stored with scenes changed outside a recall, so no scene is
    /// active anymore.
    pub fn stored_state_changed(&mut self) {
        if !self.in_progress {
            self.current_scene = INVALID_SCENE_NUMBER;
        }
    }

    pub fn register_status(&self, status_code: u8) -> StatusMsg {
        let mut msg = StatusMsg::new(SCENE_REGISTER_STATUS);
        msg.add_u8(status_code);
        msg.add_le16(self.current_scene);

        for scene in self.scenes.iter().filter(|scene| !scene.is_free()) {
            if msg.remaining() < 2 {
                warn!("Scene Register Status too large, truncated");
                break;
            }
            msg.add_le16(scene.scene_number);
        }
        msg
    }

    pub fn handle<S: MeshSink>(
        &mut self,
        model: ModelRef,
        ctx: &MessageContext,
        buf: &mut NetBuf,
        now: Instant,
        sink: &mut S,
    ) -> Result<()> {
        let setup = model.id == ModelId::SceneSetupSrv;
        match ctx.recv_op {
            SCENE_GET | SCENE_REGISTER_GET if !setup => {
                if forward_get(self.rsp_ctrl, model, ctx, RecvGet::State, sink) {
                    return Ok(());
                }
                let msg = match ctx.recv_op {
                    SCENE_GET => self.status((), Some(ctx), now),
                    _ => self.register_status(SCENE_SUCCESS),
                };
                send_status(sink, model, ctx, &msg);
                Ok(())
            }
            SCENE_RECALL | SCENE_RECALL_UNACK if !setup => self.recall(model, ctx, buf, now, sink),
            SCENE_STORE | SCENE_STORE_UNACK if setup => {
                let scene_number = pull_scene_number(buf)?;

                if forward_set(self.rsp_ctrl, model, ctx, RecvSet::SceneStore { scene_number }, sink) {
                    return Ok(());
                }

                self.store(scene_number);
                if self.status_code == SCENE_SUCCESS {
                    notify_change(sink, model, ctx, StateChange::SceneStore { scene_number });
                }

                let msg = self.register_status(self.status_code);
                respond(sink, model, ctx, ctx.recv_op == SCENE_STORE, &msg);
                Ok(())
            }
            SCENE_DELETE | SCENE_DELETE_UNACK if setup => {
                let scene_number = pull_scene_number(buf)?;

                if forward_set(self.rsp_ctrl, model, ctx, RecvSet::SceneDelete { scene_number }, sink) {
                    return Ok(());
                }

                self.delete(scene_number);
                notify_change(sink, model, ctx, StateChange::SceneDelete { scene_number });

                let msg = self.register_status(self.status_code);
                respond(sink, model, ctx, ctx.recv_op == SCENE_DELETE, &msg);
                Ok(())
            }
            _ => Err(unknown_opcode(model, ctx)),
        }
    }

    fn recall<S: MeshSink>(
        &mut self,
        model: ModelRef,
        ctx: &MessageContext,
        buf: &mut NetBuf,
        now: Instant,
        sink: &mut S,
    ) -> Result<()> {
        let scene_number = pull_scene_number(buf)?;
        let tid = buf.pull_u8()?;
        let tt = TransitionFields::parse(buf)?;

        let set = RecvSet::SceneRecall {
            scene_number,
            tid,
            tt,
        };
        if forward_set(self.rsp_ctrl, model, ctx, set, sink) {
            return Ok(());
        }

        let req = SetRequest::new(ctx, tid, tt, SCENE_RECALL);

        if self.scene(scene_number).is_none() {
            warn!("Scene 0x{:04x} is not stored", scene_number);
            self.status_code = SCENE_NOT_FOUND;
            respond_status(self, (), &req, now, sink);
            return Ok(());
        }
        self.status_code = SCENE_SUCCESS;

        if !accept_transaction(self, (), &req, now, sink) {
            return Ok(());
        }

        self.in_progress = false;
        self.target_scene = INVALID_SCENE_NUMBER;

        if self.current_scene == scene_number {
            respond_status(self, (), &req, now, sink);
            notify_change(sink, model, ctx, StateChange::SceneRecall { scene_number });
            return Ok(());
        }

        self.recall_scene = scene_number;
        begin_transition(self, (), &req, now, sink);
        Ok(())
    }

    fn store(&mut self, scene_number: u16) {
        let slot = self
            .scenes
            .iter()
            .position(|scene| scene.scene_number == scene_number)
            .or_else(|| self.scenes.iter().position(SceneRegister::is_free));

        match slot {
            Some(index) => {
                debug!("Scene 0x{:04x} stored in slot {}", scene_number, index);
                self.scenes[index].scene_number = scene_number;
                self.status_code = SCENE_SUCCESS;
                self.current_scene = scene_number;
            }
            None => {
                warn!("Scene Register is full");
                self.status_code = SCENE_REG_FULL;
                self.current_scene = self
                    .scenes
                    .iter()
                    .find(|scene| !scene.is_free())
                    .map_or(INVALID_SCENE_NUMBER, |scene| scene.scene_number);
            }
        }

        if self.in_progress {
            self.target_scene = scene_number;
        }
    }

    fn delete(&mut self, scene_number: u16) {
        match self.scene_mut(scene_number) {
            Some(scene) => {
                scene.scene_number = INVALID_SCENE_NUMBER;
                scene.scene_value.clear();
            }
            None => warn!("Scene 0x{:04x} is not stored", scene_number),
        }
        self.status_code = SCENE_SUCCESS;

        self.current_scene = if self.current_scene == scene_number {
            INVALID_SCENE_NUMBER
        } else {
            self.scenes
                .iter()
                .rev()
                .find(|scene| !scene.is_free())
                .map_or(INVALID_SCENE_NUMBER, |scene| scene.scene_number)
        };

        // Only the scene transition ends, model transitions started by the
        // recall keep running
        if self.in_progress && self.target_scene == scene_number {
            self.target_scene = INVALID_SCENE_NUMBER;
            self.in_progress = false;
            self.transition.stop();
        }
    }
}

fn pull_scene_number(buf: &mut NetBuf) -> Result<u16> {
    let scene_number = buf.pull_le16()?;
    if scene_number == INVALID_SCENE_NUMBER {
        return Err(ServerError::invalid("scene number", scene_number));
    }
    Ok(scene_number)
}

impl TransitionModel for SceneServer {
    type Channel = ();

    fn model(&self, _ch: ()) -> ModelRef {
        ModelRef::new(self.element, ModelId::SceneSrv)
    }

    fn transition(&self, _ch: ()) -> &Transition {
        &self.transition
    }

    fn transition_mut(&mut self, _ch: ()) -> &mut Transition {
        &mut self.transition
    }

    fn last_msg(&mut self) -> &mut LastMsgInfo {
        &mut self.last
    }

    fn target_reached(&self, _ch: ()) -> bool {
        self.current_scene == self.recall_scene
    }

    fn prepare(&mut self, _ch: ()) {
        if self.transition.counter != 0 {
            self.in_progress = true;
            self.current_scene = INVALID_SCENE_NUMBER;
            self.target_scene = self.recall_scene;
        }
    }

    fn step(&mut self, _ch: ()) {}

    fn complete(&mut self, _ch: ()) {
        self.current_scene = match self.in_progress {
            true => self.target_scene,
            false => self.recall_scene,
        };
        self.target_scene = INVALID_SCENE_NUMBER;
        self.in_progress = false;
    }

    fn reports_step(&self, _ch: (), done: bool) -> bool {
        done
    }

    fn state_change(&self, _ch: (), _ctx: &MessageContext) -> StateChange {
        StateChange::SceneRecall {
            scene_number: self.current_scene,
        }
    }

    fn status(&mut self, _ch: (), ctx: Option<&MessageContext>, now: Instant) -> StatusMsg {
        let mut msg = StatusMsg::new(SCENE_STATUS);
        match ctx {
            Some(ctx) if ctx.recv_op == SCENE_GET => msg.add_u8(SCENE_SUCCESS),
            _ => msg.add_u8(self.status_code),
        }
        msg.add_le16(self.current_scene);
        if self.transition.counter != 0 {
            let remain = self.transition.calc_remain_time(now);
            msg.add_le16(self.target_scene);
            msg.add_u8(remain);
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::poll_transition;
    use crate::server::test_sink::RecordingSink;

    const SRC: u16 = 0x0002;
    const ELEMENT: u16 = 0x0001;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn ctx(opcode: u32) -> MessageContext {
        MessageContext::new(SRC, ELEMENT, opcode)
    }

    fn scene_model() -> ModelRef {
        ModelRef::new(ELEMENT, ModelId::SceneSrv)
    }

    fn setup_model() -> ModelRef {
        ModelRef::new(ELEMENT, ModelId::SceneSetupSrv)
    }

    fn server(scene_count: usize) -> SceneServer {
        SceneServer::new(ELEMENT, scene_count, RspCtrl::auto()).unwrap()
    }

    fn store(srv: &mut SceneServer, sink: &mut RecordingSink, scene_number: u16) {
        srv.handle(
            setup_model(),
            &ctx(SCENE_STORE_UNACK),
            &mut NetBuf::new(&scene_number.to_le_bytes()),
            at(0),
            sink,
        )
        .unwrap();
    }

    fn recall(srv: &mut SceneServer, sink: &mut RecordingSink, payload: &[u8], now: u64) {
        srv.handle(scene_model(), &ctx(SCENE_RECALL), &mut NetBuf::new(payload), at(now), sink)
            .unwrap();
    }

    fn run(srv: &mut SceneServer, sink: &mut RecordingSink, from: u64, to: u64) {
        let mut now = from;
        while now <= to {
            poll_transition(srv, (), at(now), sink);
            now += 10;
        }
    }

    #[test]
    fn test_scene_count_is_checked() {
        assert!(SceneServer::new(ELEMENT, 0, RspCtrl::auto()).is_err());
        assert!(SceneServer::new(ELEMENT, MAX_SCENES + 1, RspCtrl::auto()).is_err());
        assert_eq!(server(MAX_SCENES).scenes.len(), MAX_SCENES);
    }

    #[test]
    fn test_store_fills_first_free_slot() {
        let mut srv = server(2);
        let mut sink = RecordingSink::default();

        store(&mut srv, &mut sink, 0x0011);
        store(&mut srv, &mut sink, 0x0022);
        store(&mut srv, &mut sink, 0x0011);

        assert_eq!(srv.scenes[0].scene_number, 0x0011);
        assert_eq!(srv.scenes[1].scene_number, 0x0022);
        assert_eq!(srv.current_scene, 0x0011);
        assert_eq!(srv.status_code, SCENE_SUCCESS);
        assert_eq!(
            sink.last_published(),
            Some(&[0x82, 0x45, 0x00, 0x11, 0x00, 0x11, 0x00, 0x22, 0x00][..])
        );
    }

    #[test]
    fn test_store_into_full_register() {
        // Arrange
        let mut srv = server(2);
        let mut sink = RecordingSink::default();
        store(&mut srv, &mut sink, 0x0011);
        store(&mut srv, &mut sink, 0x0022);
        sink.clear();

        // Act
        srv.handle(
            setup_model(),
            &ctx(SCENE_STORE),
            &mut NetBuf::new(&[0x33, 0x00]),
            at(0),
            &mut sink,
        )
        .unwrap();

        // Assert
        assert_eq!(srv.status_code, SCENE_REG_FULL);
        assert_eq!(srv.current_scene, 0x0011);
        assert!(sink.changes().is_empty());
        assert_eq!(
            sink.sent[0].2,
            vec![0x82, 0x45, 0x01, 0x11, 0x00, 0x11, 0x00, 0x22, 0x00]
        );
    }

    #[test]
    fn test_scene_number_zero_is_dropped() {
        let mut srv = server(2);
        let mut sink = RecordingSink::default();

        let result = srv.handle(
            setup_model(),
            &ctx(SCENE_STORE),
            &mut NetBuf::new(&[0x00, 0x00]),
            at(0),
            &mut sink,
        );

        assert_eq!(result, Err(ServerError::invalid("scene number", 0u16)));
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn test_recall_unknown_scene() {
        let mut srv = server(2);
        let mut sink = RecordingSink::default();

        recall(&mut srv, &mut sink, &[0x44, 0x00, 0x01], 0);

        assert_eq!(srv.status_code, SCENE_NOT_FOUND);
        assert_eq!(sink.sent[0].2, vec![0x5E, 0x02, 0x00, 0x00]);
        assert_eq!(sink.published.len(), 1);
        assert!(!srv.transition.is_running());
    }

    #[test]
    fn test_recall_with_transition() {
        // Arrange
        let mut srv = server(2);
        let mut sink = RecordingSink::default();
        store(&mut srv, &mut sink, 0x0011);
        store(&mut srv, &mut sink, 0x0022);
        sink.clear();

        // Act
        recall(&mut srv, &mut sink, &[0x11, 0x00, 0x01, 0x05, 0x00], 0);

        // Assert
        assert!(srv.in_progress);
        assert_eq!(srv.current_scene, INVALID_SCENE_NUMBER);
        assert_eq!(srv.target_scene, 0x0011);
        assert_eq!(sink.sent[0].2, vec![0x5E, 0x00, 0x00, 0x00, 0x11, 0x00, 0x05]);

        run(&mut srv, &mut sink, 0, 500);
        assert!(!srv.in_progress);
        assert_eq!(srv.current_scene, 0x0011);
        assert_eq!(srv.target_scene, INVALID_SCENE_NUMBER);
        assert_eq!(
            sink.changes(),
            vec![StateChange::SceneRecall { scene_number: 0x0011 }]
        );
        assert_eq!(sink.last_published(), Some(&[0x5E, 0x00, 0x11, 0x00][..]));
    }

    #[test]
    fn test_instant_recall() {
        let mut srv = server(2);
        let mut sink = RecordingSink::default();
        store(&mut srv, &mut sink, 0x0011);
        store(&mut srv, &mut sink, 0x0022);
        sink.clear();

        recall(&mut srv, &mut sink, &[0x11, 0x00, 0x01], 0);

        assert_eq!(srv.current_scene, 0x0011);
        assert!(!srv.in_progress);
        assert_eq!(sink.sent[0].2, vec![0x5E, 0x00, 0x11, 0x00]);

        run(&mut srv, &mut sink, 0, 0);
        assert_eq!(
            sink.changes(),
            vec![StateChange::SceneRecall { scene_number: 0x0011 }]
        );
    }

    #[test]
    fn test_recall_current_scene_completes_at_once() {
        let mut srv = server(2);
        let mut sink = RecordingSink::default();
        store(&mut srv, &mut sink, 0x0011);
        sink.clear();

        recall(&mut srv, &mut sink, &[0x11, 0x00, 0x01, 0x05, 0x00], 0);

        assert!(!srv.transition.is_running());
        assert_eq!(sink.sent[0].2, vec![0x5E, 0x00, 0x11, 0x00]);
        assert_eq!(
            sink.changes(),
            vec![StateChange::SceneRecall { scene_number: 0x0011 }]
        );
    }

    #[test]
    fn test_duplicate_recall_only_answers() {
        let mut srv = server(2);
        let mut sink = RecordingSink::default();
        store(&mut srv, &mut sink, 0x0011);
        store(&mut srv, &mut sink, 0x0022);
        recall(&mut srv, &mut sink, &[0x11, 0x00, 0x07], 0);
        run(&mut srv, &mut sink, 0, 0);
        sink.clear();

        recall(&mut srv, &mut sink, &[0x22, 0x00, 0x07], 100);

        assert_eq!(srv.current_scene, 0x0011);
        assert_eq!(sink.sent.len(), 1);
        assert_eq!(sink.published.len(), 1);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_delete_target_of_recall_in_progress() {
        // Arrange
        let mut srv = server(3);
        let mut sink = RecordingSink::default();
        store(&mut srv, &mut sink, 0x0011);
        store(&mut srv, &mut sink, 0x0022);
        store(&mut srv, &mut sink, 0x0033);
        recall(&mut srv, &mut sink, &[0x22, 0x00, 0x01, 0x0A, 0x00], 0);
        run(&mut srv, &mut sink, 0, 300);
        sink.clear();

        // Act
        srv.handle(
            setup_model(),
            &ctx(SCENE_DELETE),
            &mut NetBuf::new(&[0x22, 0x00]),
            at(300),
            &mut sink,
        )
        .unwrap();

        // Assert
        assert!(!srv.in_progress);
        assert_eq!(srv.target_scene, INVALID_SCENE_NUMBER);
        assert!(!srv.transition.is_running());
        assert!(srv.scene(0x0022).is_none());
        // Falls back to the last occupied slot
        assert_eq!(srv.current_scene, 0x0033);
        assert_eq!(
            sink.changes(),
            vec![StateChange::SceneDelete { scene_number: 0x0022 }]
        );
        assert_eq!(
            sink.sent[0].2,
            vec![0x82, 0x45, 0x00, 0x33, 0x00, 0x11, 0x00, 0x33, 0x00]
        );
    }

    #[test]
    fn test_delete_current_scene() {
        let mut srv = server(2);
        let mut sink = RecordingSink::default();
        store(&mut srv, &mut sink, 0x0011);
        store(&mut srv, &mut sink, 0x0022);

        srv.handle(
            setup_model(),
            &ctx(SCENE_DELETE_UNACK),
            &mut NetBuf::new(&[0x22, 0x00]),
            at(0),
            &mut sink,
        )
        .unwrap();
        assert_eq!(srv.current_scene, INVALID_SCENE_NUMBER);

        // Deleting an absent scene still succeeds
        srv.handle(
            setup_model(),
            &ctx(SCENE_DELETE_UNACK),
            &mut NetBuf::new(&[0x44, 0x00]),
            at(0),
            &mut sink,
        )
        .unwrap();
        assert_eq!(srv.status_code, SCENE_SUCCESS);
        assert_eq!(srv.current_scene, 0x0011);
    }

    #[test]
    fn test_store_during_recall_retargets() {
        let mut srv = server(3);
        let mut sink = RecordingSink::default();
        store(&mut srv, &mut sink, 0x0011);
        store(&mut srv, &mut sink, 0x0022);
        recall(&mut srv, &mut sink, &[0x11, 0x00, 0x01, 0x05, 0x00], 0);

        store(&mut srv, &mut sink, 0x0033);
        assert_eq!(srv.target_scene, 0x0033);

        run(&mut srv, &mut sink, 0, 500);
        assert_eq!(srv.current_scene, 0x0033);
    }

    #[test]
    fn test_scene_get_reports_success() {
        let mut srv = server(2);
        let mut sink = RecordingSink::default();
        recall(&mut srv, &mut sink, &[0x44, 0x00, 0x01], 0);
        sink.clear();

        srv.handle(scene_model(), &ctx(SCENE_GET), &mut NetBuf::new(&[]), at(0), &mut sink)
            .unwrap();
        srv.handle(scene_model(), &ctx(SCENE_REGISTER_GET), &mut NetBuf::new(&[]), at(0), &mut sink)
            .unwrap();

        assert_eq!(sink.sent[0].2, vec![0x5E, 0x00, 0x00, 0x00]);
        assert_eq!(sink.sent[1].2, vec![0x82, 0x45, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_stored_state_change_clears_current_scene() {
        let mut srv = server(2);
        let mut sink = RecordingSink::default();
        store(&mut srv, &mut sink, 0x0011);

        srv.stored_state_changed();

        assert_eq!(srv.current_scene, INVALID_SCENE_NUMBER);
    }

    #[test]
    fn test_recall_on_setup_model_is_refused() {
        let mut srv = server(2);
        let mut sink = RecordingSink::default();

        let result = srv.handle(
            setup_model(),
            &ctx(SCENE_RECALL),
            &mut NetBuf::new(&[0x11, 0x00, 0x01]),
            at(0),
            &mut sink,
        );

        assert!(matches!(result, Err(ServerError::UnknownOpcode { .. })));
    }
}
