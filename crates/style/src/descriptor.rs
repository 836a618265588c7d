//! Plain render descriptors.
//!
//! A descriptor is a snapshot of a provider tree: no shared handles, nothing
//! live. The renderer turns it into CSS text and it serializes to JSON for
//! inspection.

use std::fmt;

use css::Sheet;
use serde::{Serialize, Serializer};

/// `style[_instance[_configuration]]`: the scope suffix of every class token
/// a provider renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompositeId {
    pub style: usize,
    pub instance: Option<usize>,
    pub configuration: Option<usize>,
}

impl CompositeId {
    pub fn style(style: usize) -> Self {
        Self {
            style,
            instance: None,
            configuration: None,
        }
    }

    pub fn instance(style: usize, instance: usize) -> Self {
        Self {
            style,
            instance: Some(instance),
            configuration: None,
        }
    }

    pub fn configuration(style: usize, instance: usize, configuration: usize) -> Self {
        Self {
            style,
            instance: Some(instance),
            configuration: Some(configuration),
        }
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.style)?;
        if let Some(instance) = self.instance {
            write!(f, "_{instance}")?;
            if let Some(configuration) = self.configuration {
                write!(f, "_{configuration}")?;
            }
        }
        Ok(())
    }
}

impl Serialize for CompositeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Descriptors
// ─────────────────────────────────────────────────────────────────────────────

/// One provider node. Empty fields are left out of the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptor {
    pub id: CompositeId,
    /// The hashed selector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stylesheet: Option<Sheet>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub siblings: Vec<Descriptor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Descriptor>,
}

/// Everything one style contributes: the shared block first, then one
/// block per instance-scoped instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleDescriptor {
    pub id: usize,
    pub instances: Vec<Descriptor>,
}

/// A whole-session snapshot, styles in ascending index order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentDescriptor {
    pub styles: Vec<StyleDescriptor>,
}
