//! Vendor prefixing bound to a user agent.
//!
//! Each session owns a [`Prefixer`] created from the user agent it renders
//! for. Known engines only get the prefixes they need; an unknown or absent
//! user agent gets every prefix, which is what server-side output wants.

use crate::value::{Sheet, StyleValue};

/// Rendering engine family detected from a user-agent string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    WebKit,
    Gecko,
    Trident,
    Unknown,
}

impl Engine {
    pub fn detect(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent else {
            return Engine::Unknown;
        };
        if ua.contains("Trident/") || ua.contains("Edge/") || ua.contains("MSIE ") {
            Engine::Trident
        } else if ua.contains("AppleWebKit/") || ua.contains("Chrome/") {
            Engine::WebKit
        } else if ua.contains("Gecko/") || ua.contains("Firefox/") {
            Engine::Gecko
        } else {
            Engine::Unknown
        }
    }

    fn vendors(self) -> Vendors {
        match self {
            Engine::WebKit => Vendors::WEBKIT,
            Engine::Gecko => Vendors::MOZ,
            Engine::Trident => Vendors::MS,
            Engine::Unknown => Vendors::ALL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Vendors {
    webkit: bool,
    moz: bool,
    ms: bool,
}

impl Vendors {
    const WEBKIT: Self = Self { webkit: true, moz: false, ms: false };
    const MOZ: Self = Self { webkit: false, moz: true, ms: false };
    const MS: Self = Self { webkit: false, moz: false, ms: true };
    const ALL: Self = Self { webkit: true, moz: true, ms: true };
    const NONE: Self = Self { webkit: false, moz: false, ms: false };

    fn intersect(self, other: Self) -> Self {
        Self {
            webkit: self.webkit && other.webkit,
            moz: self.moz && other.moz,
            ms: self.ms && other.ms,
        }
    }
}

/// Properties that still need vendor-prefixed twins, with the vendors that use them.
const PREFIXED_PROPERTIES: &[(&str, Vendors)] = &[
    ("userSelect", Vendors::ALL),
    ("appearance", Vendors { webkit: true, moz: true, ms: false }),
    ("hyphens", Vendors::ALL),
    ("textSizeAdjust", Vendors::ALL),
    ("transform", Vendors { webkit: true, moz: false, ms: true }),
    ("transformOrigin", Vendors { webkit: true, moz: false, ms: true }),
    ("transition", Vendors::WEBKIT),
    ("animation", Vendors::WEBKIT),
    ("backfaceVisibility", Vendors::WEBKIT),
    ("backdropFilter", Vendors::WEBKIT),
    ("filter", Vendors::WEBKIT),
    ("maskImage", Vendors::WEBKIT),
    ("flex", Vendors { webkit: true, moz: false, ms: true }),
    ("flexDirection", Vendors { webkit: true, moz: false, ms: true }),
    ("flexWrap", Vendors { webkit: true, moz: false, ms: true }),
    ("alignItems", Vendors::WEBKIT),
    ("justifyContent", Vendors::WEBKIT),
    ("order", Vendors::WEBKIT),
    ("columnCount", Vendors { webkit: true, moz: true, ms: false }),
    ("columnGap", Vendors { webkit: true, moz: true, ms: false }),
    ("tabSize", Vendors::MOZ),
];

/// Keyword values that expand into a fallback chain, one entry per vendor.
const PREFIXED_VALUES: &[(&str, &str, &[(&str, Vendors)])] = &[
    (
        "display",
        "flex",
        &[
            ("-webkit-box", Vendors::WEBKIT),
            ("-moz-box", Vendors::MOZ),
            ("-ms-flexbox", Vendors::MS),
            ("-webkit-flex", Vendors::WEBKIT),
        ],
    ),
    (
        "display",
        "inline-flex",
        &[
            ("-webkit-inline-box", Vendors::WEBKIT),
            ("-moz-inline-box", Vendors::MOZ),
            ("-ms-inline-flexbox", Vendors::MS),
            ("-webkit-inline-flex", Vendors::WEBKIT),
        ],
    ),
    ("position", "sticky", &[("-webkit-sticky", Vendors::WEBKIT)]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefixer {
    engine: Engine,
}

impl Prefixer {
    pub fn new(user_agent: Option<&str>) -> Self {
        Self {
            engine: Engine::detect(user_agent),
        }
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// Return a copy of `sheet` with vendor twins inserted before each
    /// prefixed property and keyword values expanded into fallback chains.
    pub fn prefix(&self, sheet: &Sheet) -> Sheet {
        let vendors = self.engine.vendors();
        let mut out = Sheet::new();
        for (name, value) in sheet.iter() {
            if let Some((_, needs)) = PREFIXED_PROPERTIES.iter().find(|(p, _)| *p == name) {
                let needs = needs.intersect(vendors);
                for (enabled, vendor) in [(needs.webkit, "Webkit"), (needs.moz, "Moz"), (needs.ms, "Ms")] {
                    if enabled {
                        out.set(&vendor_property(vendor, name), value.clone());
                    }
                }
            }
            out.set(name, self.prefix_value(name, value, vendors));
        }
        out
    }

    fn prefix_value(&self, name: &str, value: &StyleValue, vendors: Vendors) -> StyleValue {
        let StyleValue::Single(keyword) = value else {
            return value.clone();
        };
        let Some((_, _, chain)) = PREFIXED_VALUES
            .iter()
            .find(|(p, v, _)| *p == name && *v == keyword.as_str())
        else {
            return value.clone();
        };
        let mut values: Vec<String> = chain
            .iter()
            .filter(|(_, needs)| needs.intersect(vendors) != Vendors::NONE)
            .map(|(v, _)| v.to_string())
            .collect();
        if values.is_empty() {
            return value.clone();
        }
        values.push(keyword.clone());
        StyleValue::Fallbacks(values)
    }
}

fn vendor_property(vendor: &str, property: &str) -> String {
    let mut chars = property.chars();
    match chars.next() {
        Some(first) => format!("{vendor}{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => vendor.to_string(),
    }
}
