//! Descriptor to CSS text.

use css::{Prefixer, Sheet, kebab_case};

use crate::config::Config;
use crate::descriptor::{Descriptor, DocumentDescriptor, StyleDescriptor};

/// Id of the `<style>` element holding style `index`.
pub fn element_id(index: usize) -> String {
    format!("sidx_{index}")
}

/// Renders descriptors with one session's prefixer and output switches.
pub struct Renderer<'a> {
    config: Config,
    prefixer: &'a Prefixer,
}

impl<'a> Renderer<'a> {
    pub fn new(config: Config, prefixer: &'a Prefixer) -> Self {
        Self { config, prefixer }
    }

    fn join(&self, lines: Vec<String>) -> String {
        let separator = if self.config.minify { "" } else { "\r\n" };
        lines
            .into_iter()
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn indent(&self, depth: usize) -> String {
        if self.config.minify {
            String::new()
        } else {
            "  ".repeat(depth)
        }
    }

    /// One line per declaration value, vendor-prefixed and kebab-cased.
    pub fn declarations(&self, sheet: &Sheet, depth: usize) -> Vec<String> {
        let indent = self.indent(depth);
        let mut lines = Vec::new();
        for (name, value) in self.prefixer.prefix(sheet).iter() {
            let property = kebab_case(name);
            for v in value.values() {
                lines.push(if self.config.minify {
                    format!("{property}:{v};")
                } else {
                    format!("{indent}{property}: {v};")
                });
            }
        }
        lines
    }

    /// Render one provider descriptor at `depth`.
    ///
    /// A selector wraps children and declarations in a block. Without one the
    /// children are spliced in place, followed by the bare declarations.
    /// Spliced content keeps the depth of the enclosing block, so a group
    /// nested under `.card` indents like `.card`'s own children instead of
    /// restarting at column 0. Siblings follow at the same depth.
    pub fn render_descriptor(&self, descriptor: &Descriptor, depth: usize) -> String {
        let mut lines = Vec::new();
        let inner = match &descriptor.selector {
            Some(selector) => {
                let open = if self.config.minify { "{" } else { " {" };
                lines.push(format!("{}{selector}{open}", self.indent(depth)));
                depth + 1
            }
            None => depth,
        };

        for child in &descriptor.children {
            lines.push(self.render_descriptor(child, inner));
        }
        if let Some(sheet) = &descriptor.stylesheet {
            lines.extend(self.declarations(sheet, inner));
        }
        if descriptor.selector.is_some() {
            lines.push(format!("{}}}", self.indent(depth)));
        }

        for sibling in &descriptor.siblings {
            lines.push(self.render_descriptor(sibling, depth));
        }
        self.join(lines)
    }

    pub fn render_style(&self, style: &StyleDescriptor) -> String {
        self.join(
            style
                .instances
                .iter()
                .map(|d| self.render_descriptor(d, 0))
                .collect(),
        )
    }

    /// One `<style>` wrapper per style, in descriptor order.
    pub fn render_document(&self, document: &DocumentDescriptor) -> String {
        let mut lines = Vec::new();
        for style in &document.styles {
            lines.push(format!(
                "<style id=\"{}\" type=\"text/css\">",
                element_id(style.id)
            ));
            lines.push(self.render_style(style));
            lines.push("</style>".to_string());
        }
        self.join(lines)
    }
}
