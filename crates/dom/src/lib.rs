//! DOM crate: the document side of style synchronization
//!
//! A pooled in-memory head document plus the [`Document`] trait the style
//! engine writes `<style>` elements through.

pub mod document;
pub mod node;
pub mod tree;

pub use document::{Document, SharedDocument};
pub use node::*;
pub use tree::{ANCHOR_ID, Dom};
