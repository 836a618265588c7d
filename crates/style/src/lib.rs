//! # Style Engine
//!
//! Pooled styles, rule trees, scoped class names, descriptors and the
//! incremental `<style>` synchronization. Single-threaded: every handle is
//! `Rc`-based and `!Send`.

pub mod config;
pub mod definition;
pub mod descriptor;
pub mod manager;
pub mod provider;
pub mod render;
pub mod session;
pub mod style;

pub use config::{Config, Extension, Globals};
pub use definition::{Definition, Exposure, Parser, RuleContext, RuleHandle, parser};
pub use descriptor::{CompositeId, Descriptor, DocumentDescriptor, StyleDescriptor};
pub use manager::Manager;
pub use provider::Provider;
pub use render::{Renderer, element_id};
pub use session::Session;
pub use style::{Configuration, Instance, Owner, Style, StyleScope};
