#![forbid(unsafe_code)]

//! Core primitives for deskui.
//!
//! This crate is the leaf of the workspace. It defines the boundary between
//! the reactive UI state engines and whatever host actually presents the
//! interface:
//!
//! - [`Environment`]: the host adapter (focus, attributes, durable storage,
//!   timers, key listeners, scroll lock).
//! - [`KeyEvent`] and friends: the key-press vocabulary the engines react to.
//! - [`ElementId`]: opaque element identity.
//! - [`KeyValueStore`]: durable key-value storage backends.

pub mod element;
pub mod environment;
pub mod event;
pub mod storage;

pub use element::ElementId;
pub use environment::{Environment, KeyDisposition, KeyListener, ListenerId, TimerCallback, TimerId};
pub use event::{KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use storage::{KeyValueStore, MemoryStore, StorageError};
