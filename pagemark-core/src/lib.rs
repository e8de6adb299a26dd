//! Pagemark Core - Platform-agnostic highlight anchoring library
//!
//! This crate anchors highlighted runs of text in an incrementally rendered
//! document to position-independent descriptors, stores them per document
//! and restores the highlights whenever matching content mounts again. It is
//! shared by the terminal viewer and the WASM bridge.

pub mod app;
pub mod codec;
pub mod config;
pub mod decoration;
pub mod dom;
pub mod error;
pub mod groups;
pub mod model;
pub mod overlap;
pub mod range;
pub mod reconcile;
pub mod session;
pub mod store;

pub use app::{App, HitPoint, InteractionEvent, Outcome};
pub use config::{AnnotatorConfig, Palettes};
pub use decoration::DecorationApplier;
pub use dom::{Dom, NodeId, NodeKind};
pub use error::{DomError, MarkupError, SessionError, StoreError};
pub use groups::GroupManager;
pub use model::{Anchor, Group, GroupId, GroupIdClock, PathStep, StructuralPath};
pub use overlap::Superseded;
pub use range::{Boundary, SelectionRange, TextSegment};
pub use reconcile::{MountEvent, MountFeed, ReconcileReport, Reconciler};
pub use session::{CursorHint, Mode, Session, Tool};
pub use store::{AnnotationStore, MemoryStore};
