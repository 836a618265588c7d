//! Render a small sample component tree and print the resulting CSS.

use std::cell::RefCell;
use std::rc::Rc;

use clap::Parser;
use scoped_styles::{
    Config, Definition, Dom, Sheet, StyleBinding, StyleRoot, StyleScope, create_style, manager,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scoped-styles")]
#[command(about = "Render a sample style tree to scoped CSS")]
#[command(version)]
struct Args {
    /// Strip separator whitespace from the output
    #[arg(long)]
    minify: bool,

    /// Emit `_name` markers next to scoped class names
    #[arg(long)]
    keep_original_class_names: bool,

    /// User agent to prefix for (every prefix when omitted)
    #[arg(long, short = 'u')]
    user_agent: Option<String>,

    /// Print the render descriptor as JSON instead of CSS
    #[arg(long)]
    descriptor: bool,

    /// Synchronize into an in-memory document and print its head
    #[arg(long)]
    dom: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn card() -> Definition {
    let title = Definition::new(|ctx| {
        let color = ctx
            .theme()
            .and_then(|t| t.get("accent"))
            .and_then(|c| c.as_str())
            .unwrap_or("black")
            .to_string();
        Sheet::new().with("color", color).with("fontSize", 18)
    });
    Definition::new(move |ctx| {
        let radius = ctx.get("radius").cloned().unwrap_or(json!("4px"));
        ctx.css(
            ".card",
            Sheet::new()
                .with("display", "flex")
                .with("borderRadius", scoped_styles::StyleValue::from_json(&radius))
                .with("background", ["white", "linear-gradient(white, #eee)"]),
        );
        ctx.css(".card .title", title.clone()).expose("title", None);
        ctx.css(".card {.is-dense} .body", Sheet::new().with("padding", 4));
        Sheet::new()
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let manager = manager();
    manager.set_config(Config {
        minify: args.minify,
        keep_original_class_names: args.keep_original_class_names,
    });
    if let serde_json::Value::Object(dependencies) = json!({"theme": {"accent": "rebeccapurple"}}) {
        manager.set_dependencies(&dependencies);
    }

    let global = create_style(Sheet::new().with("boxSizing", "border-box").with("userSelect", "none"));
    let binding = StyleBinding::bind(card());

    let document = Rc::new(RefCell::new(Dom::with_anchor()));
    let session = if args.dom {
        manager.get_session_with_document(args.user_agent.as_deref(), document.clone())
    } else {
        manager.get_session(args.user_agent.as_deref())
    };
    let root = StyleRoot::new(session.clone(), Some(&global));

    let plain = binding.mount(&session);
    let highlighted = binding.mount(&session);
    let rounded = binding.mount_with(&session, serde_json::from_value(json!({"radius": "12px"}))?);

    for mounted in [&plain, &highlighted, &rounded] {
        mounted.render();
    }
    highlighted
        .instance()
        .configure("title", &[json!({"theme": {"accent": "crimson"}})])?;
    rounded.instance().theme(json!({"accent": "teal"}))?;

    tracing::info!(
        plain = %plain.instance().css(["card", "title"]),
        highlighted = %highlighted.instance().css(["card", "title", "is-dense"]),
        rounded = %rounded.instance().css(["card"]),
        "class names"
    );

    if let Some(global) = root.global() {
        global.apply_configuration();
    }
    for mounted in [&plain, &highlighted, &rounded] {
        mounted.did_mount();
    }

    if args.descriptor {
        println!("{}", serde_json::to_string_pretty(&session.get_descriptor())?);
    } else if args.dom {
        let dom = document.borrow();
        if let Some(head) = dom.head() {
            println!("{}", dom.to_html(head));
        }
    } else {
        println!("{}", session.render_to_string());
    }

    plain.unmount();
    highlighted.unmount();
    rounded.unmount();
    let disposed = session.settle();
    root.unmount();
    tracing::debug!(disposed, "settled");
    Ok(())
}
