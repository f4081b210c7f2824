//! BLE Mesh model servers: Generic, Lighting, Time, Scene and Scheduler.
//!
//! The mesh stack hands decoded access messages to a [`ServerCategory`], which
//! runs the addressed model's handler under the category lock. Replies,
//! publications and application events leave through a [`MeshSink`].
//! Transitions are polled from the category's work queue.

#![cfg_attr(not(any(test, feature = "host-clock")), no_std)]

#[macro_use]
mod macros;

pub mod binding;
pub mod buf;
pub mod common;
pub mod config;
pub mod embassy;
pub mod error;
pub mod event;
pub mod last_msg;
pub mod models;
pub mod opcode;
pub mod server;
pub mod transition;

pub use binding::{update_binding_state, BindingValue, BoundModel};
pub use common::{MessageContext, ModelId, ModelRef};
pub use config::{RspCtrl, RspMode};
pub use error::{Result, SendError, ServerError};
pub use event::{RecvGet, RecvSet, RecvStatus, ServerEvent, StateChange};
pub use models::generic::GenericServers;
pub use models::lighting::LightingServers;
pub use models::time::TimeSceneServers;
pub use server::category::{ServerCategory, Servers};
pub use server::MeshSink;
pub use transition::TransitionFields;
