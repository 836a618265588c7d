//! # CSS Primitives
//!
//! Declaration values, selector scoping and vendor prefixing. The engine
//! never parses a CSS grammar: it handles property/value pairs and
//! pre-tokenized selector strings.

pub mod prefix;
pub mod selector;
pub mod value;

pub use prefix::{Engine, Prefixer};
pub use selector::{class_tokens, hash_selector};
pub use value::{Sheet, StyleValue, kebab_case};
