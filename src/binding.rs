//! Component lifecycle integration.
//!
//! A UI adapter binds a definition once, mounts it per component and calls
//! the hooks below from its own render cycle. Document writes only happen
//! when the session is attached to an available document.

use common::Props;
use style::{Definition, Instance, Manager, Session, Style};

/// A definition bound to a manager, ready to be mounted per consumer.
#[derive(Clone, Debug)]
pub struct StyleBinding {
    style: Style,
}

impl StyleBinding {
    /// Bind through this thread's default manager.
    pub fn bind(definition: impl Into<Definition>) -> Self {
        Self::bind_in(&crate::manager(), definition)
    }

    pub fn bind_in(manager: &Manager, definition: impl Into<Definition>) -> Self {
        Self {
            style: manager.create_style(definition),
        }
    }

    /// Default props for every instance mounted from now on.
    pub fn with(mut self, props: Props) -> Self {
        self.style = self.style.with(props);
        self
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Create the consumer's instance (before its first render).
    pub fn mount(&self, session: &Session) -> Mounted {
        Mounted {
            instance: session.get_instance(&self.style, None),
        }
    }

    /// [`StyleBinding::mount`] with per-consumer props.
    pub fn mount_with(&self, session: &Session, props: Props) -> Mounted {
        Mounted {
            instance: session.get_instance(&self.style, Some(props)),
        }
    }
}

/// One mounted consumer.
#[derive(Debug)]
pub struct Mounted {
    instance: Instance,
}

impl Mounted {
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    fn is_live(&self) -> bool {
        self.instance.session().is_some_and(|s| s.is_live())
    }

    /// Before each render: drop last pass's configurations.
    pub fn render(&self) {
        if self.is_live() {
            self.instance.clear_configuration();
        }
    }

    /// After the first commit.
    pub fn did_mount(&self) {
        if self.is_live() {
            self.instance.apply_configuration();
        }
    }

    /// After later commits; only re-renders when something was configured.
    pub fn did_update(&self) {
        if self.is_live() && !self.instance.configurations().is_empty() {
            self.instance.apply_configuration();
        }
    }

    /// Teardown. The instance stays until the session settles, so the
    /// commit in progress can still use its classes.
    pub fn unmount(self) {
        self.instance.schedule_dispose();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StyleRoot
// ─────────────────────────────────────────────────────────────────────────────

/// The top of a component tree: one session, optionally one global style.
#[derive(Debug)]
pub struct StyleRoot {
    session: Session,
    global: Option<Instance>,
}

impl StyleRoot {
    pub fn new(session: Session, global_style: Option<&Style>) -> Self {
        let global = global_style.map(|style| session.get_instance(style, None));
        Self { session, global }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn global(&self) -> Option<&Instance> {
        self.global.as_ref()
    }

    pub fn unmount(self) {
        if let Some(global) = self.global {
            global.dispose();
        }
    }
}
