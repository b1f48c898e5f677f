//! Trackside: a REST control layer for TMCC and Legacy model railroads.
//!
//! The crate turns high-level action intents (speed, bell, horn, couplers,
//! accessory pulses) into the low-level command descriptors the layout's
//! two command dialects understand, and guards every action behind a token
//! access controller with a registration handshake.
//!
//! # Architecture
//!
//! ```text
//! HTTP request ──▶ auth middleware ──▶ handler ──▶ Dispatcher
//!                                                    │ validate id
//!                                                    │ query LayoutState (dialect)
//!                                                    │ translate intent
//!                                                    ▼
//!                                               CommandSink (fire-and-forget)
//! ```
//!
//! - [`translator`]: pure intent-to-descriptor translation, per dialect
//! - [`dispatch`]: validation, fresh state lookup, submission
//! - [`auth`]: static and signed-token admission, registration handshake
//! - [`services`]: the `/v1` axum surface
//! - [`layout`]: the collaborator traits the layout process implements

pub mod auth;
pub mod commands;
pub mod config;
pub mod dialect;
pub mod dispatch;
pub mod error;
pub mod intents;
pub mod layout;
pub mod scope;
pub mod services;
pub mod translator;

pub use auth::{Authenticator, ClientRegistry, Principal};
pub use commands::{CommandCode, CommandDescriptor};
pub use config::Config;
pub use dialect::{Dialect, SpeedPreset, SpeedValue};
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use intents::{AccessoryAction, MovableAction, RouteAction, SwitchAction};
pub use layout::{CommandSink, ComponentState, LayoutState, MockLayout};
pub use scope::CommandScope;
pub use services::web::{build_router, run_server, AppState};
pub use translator::TranslatorOptions;
