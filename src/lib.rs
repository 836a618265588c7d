//! # scoped_styles
//!
//! Scoped, deduplicated CSS from nested style definitions, kept in sync with
//! a live document's `<style>` elements.
//!
//! ```text
//! definition ──▶ Manager::create_style ──▶ Style (pooled by identity)
//!                                           │
//!                Session::get_instance ◀────┘
//!                       │
//!                       ├─▶ get_descriptor ─▶ Renderer ─▶ CSS text
//!                       └─▶ render_into_dom ─▶ <style id="sidx_N">
//! ```
//!
//! The crates underneath are usable on their own; this facade re-exports
//! them, adds a per-thread default [`Manager`] and the [`StyleBinding`]
//! lifecycle that component adapters drive.

use std::rc::Rc;

pub mod binding;

pub use binding::{Mounted, StyleBinding, StyleRoot};
pub use common::{Props, Result, StyleError};
pub use css::{Engine, Prefixer, Sheet, StyleValue};
pub use dom::{Document, Dom, SharedDocument};
pub use style::{
    CompositeId, Config, Configuration, Definition, Descriptor, DocumentDescriptor, Extension,
    Globals, Instance, Manager, Owner, Provider, RuleContext, RuleHandle, Session, Style,
    StyleDescriptor, StyleScope, parser,
};

thread_local! {
    static MANAGER: Rc<Manager> = Rc::new(Manager::new());
}

/// This thread's default manager.
pub fn manager() -> Rc<Manager> {
    MANAGER.with(Rc::clone)
}

/// Register `definition` with the default manager.
pub fn create_style(definition: impl Into<Definition>) -> Style {
    MANAGER.with(|manager| manager.create_style(definition))
}

/// Empty the default manager's style pool.
pub fn reset() {
    MANAGER.with(|manager| manager.reset());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    const CHROME: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

    fn button() -> Definition {
        let hover = Definition::new(|ctx| {
            Sheet::new().with("color", ctx.str("hover").unwrap_or("blue").to_string())
        });
        Definition::new(move |ctx| {
            ctx.css(".btn", Sheet::new().with("padding", 4));
            ctx.css(".btn:hover", hover.clone()).expose("hover", None);
            Sheet::new()
        })
    }

    fn head_ids(dom: &Rc<RefCell<Dom>>) -> Vec<String> {
        dom.borrow().head_ids()
    }

    // -- default manager -----------------------------------------------------

    #[test]
    fn default_manager_pools_by_identity() {
        reset();
        let definition = button();
        let first = create_style(definition.clone());
        let second = create_style(definition);
        assert!(first.ptr_eq(&second));
        assert_eq!(manager().style_count(), 1);

        reset();
        assert_eq!(manager().style_count(), 0);
    }

    // -- server rendering ----------------------------------------------------

    #[test]
    fn renders_a_whole_session() {
        let manager = Manager::new();
        let binding = StyleBinding::bind_in(&manager, button());
        let session = manager.get_session(Some(CHROME));
        for _ in 0..3 {
            binding.mount(&session);
        }
        assert_eq!(
            session.render_to_string(),
            [
                "<style id=\"sidx_0\" type=\"text/css\">",
                ".btn_0 {",
                "  padding: 4;",
                "}",
                ".btn_0:hover {",
                "  color: blue;",
                "}",
                "</style>",
            ]
            .join("\r\n")
        );
    }

    #[test]
    fn minified_session() {
        let manager = Manager::new();
        manager.set_config(Config {
            minify: true,
            keep_original_class_names: false,
        });
        let binding = StyleBinding::bind_in(&manager, button());
        let session = manager.get_session(Some(CHROME));
        binding.mount(&session);
        assert_eq!(
            session.render_to_string(),
            "<style id=\"sidx_0\" type=\"text/css\">.btn_0{padding:4;}.btn_0:hover{color:blue;}</style>"
        );
    }

    #[test]
    fn descriptor_serializes_to_json() {
        let manager = Manager::new();
        let style = manager.create_style(Sheet::new().with("color", "red"));
        let session = manager.get_session(None);
        session.get_instance(&style, None);
        assert_eq!(
            serde_json::to_value(session.get_descriptor()).unwrap(),
            json!({
                "styles": [{
                    "id": 0,
                    "instances": [{"id": "0", "stylesheet": {"color": "red"}}]
                }]
            })
        );
    }

    #[test]
    fn configured_hover_stays_scoped() {
        let manager = Manager::new();
        let binding = StyleBinding::bind_in(&manager, button());
        let session = manager.get_session(Some(CHROME));
        let plain = binding.mount(&session);
        let danger = binding.mount(&session);
        danger
            .instance()
            .configure("hover", &[json!({"hover": "red"})])
            .unwrap();

        assert_eq!(plain.instance().css(["btn"]), "btn_0");
        let css = session.render_to_string();
        assert!(css.contains(".btn_0:hover {\r\n  color: blue;\r\n}"));
        assert!(css.contains(".btn_0_1_0:hover {\r\n  color: red;\r\n}"));
    }

    #[test]
    fn unknown_exposure_is_an_error() {
        let manager = Manager::new();
        let style = manager.create_style(button());
        let session = manager.get_session(None);
        let instance = session.get_instance(&style, None);
        assert!(matches!(
            instance.configure("missing", &[]),
            Err(StyleError::UnknownExposure(name)) if name == "missing"
        ));
    }

    // -- document synchronization --------------------------------------------

    #[test]
    fn components_keep_head_in_index_order() {
        let manager = Manager::new();
        let dom = Rc::new(RefCell::new(Dom::with_anchor()));
        let session = manager.get_session_with_document(Some(CHROME), dom.clone());

        let global = manager.create_style(Sheet::new().with("margin", 0));
        let root = StyleRoot::new(session.clone(), Some(&global));
        let buttons = StyleBinding::bind_in(&manager, button());
        let cards = StyleBinding::bind_in(&manager, Sheet::new().with("padding", 16));

        let card = cards.mount(&session);
        let first = buttons.mount(&session);
        card.did_mount();
        first.did_mount();
        if let Some(global) = root.global() {
            global.apply_configuration();
        }
        assert_eq!(head_ids(&dom), vec!["sidx_0", "sidx_1", "sidx_2", "sidx"]);

        let second = buttons.mount(&session);
        second.did_mount();
        first.unmount();
        session.settle();
        assert_eq!(head_ids(&dom), vec!["sidx_0", "sidx_1", "sidx_2", "sidx"]);

        second.unmount();
        session.settle();
        assert_eq!(head_ids(&dom), vec!["sidx_0", "sidx_2", "sidx"]);

        root.unmount();
        card.unmount();
        session.settle();
        assert_eq!(head_ids(&dom), vec!["sidx"]);
    }

    #[test]
    fn theme_override_reaches_the_document() {
        let manager = Manager::new();
        manager.set_dependencies(
            &serde_json::from_value(json!({"theme": {"accent": "navy"}})).unwrap(),
        );
        let title = Definition::new(|ctx| {
            let accent = ctx
                .theme()
                .and_then(|t| t.get("accent"))
                .and_then(|a| a.as_str())
                .unwrap_or("black")
                .to_string();
            Sheet::new().with("color", accent)
        });
        let definition = Definition::new(move |ctx| {
            ctx.css(".title", title.clone());
            Sheet::new()
        });

        let dom = Rc::new(RefCell::new(Dom::with_anchor()));
        let session = manager.get_session_with_document(Some(CHROME), dom.clone());
        let mounted = StyleBinding::bind_in(&manager, definition).mount(&session);
        mounted.render();
        mounted.instance().theme(json!({"accent": "teal"})).unwrap();
        mounted.did_mount();

        let dom = dom.borrow();
        let text = dom
            .get_element_by_id("sidx_0")
            .map(|el| dom.text_content(el))
            .unwrap_or_default();
        assert!(text.contains("color: navy;"));
        assert!(text.contains("color: teal;"));
    }
}
