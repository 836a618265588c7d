//! Selector scoping.
//!
//! Selectors are never parsed into a grammar here. The engine only needs to
//! find class tokens (`.name`) and rewrite them to their scoped form, while
//! leaving brace-protected groups alone: `.card {.theme-dark} .title` scopes
//! `card` and `title`, passes `.theme-dark` through and drops the braces.

use std::fmt::Display;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// A brace-wrapped protected group, matched lazily so adjacent groups stay apart.
static PROTECTED_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{.*?\}").expect("protected group pattern is valid"));

/// A class token: a dot followed by anything up to the next selector delimiter.
static CLASS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[^:# .,}{]+").expect("class token pattern is valid"));

/// Class-name tokens declared by `selector`, without the leading dot.
///
/// Tokens are unique and kept in order of first appearance. Dots inside
/// protected groups are not tokens.
pub fn class_tokens(selector: &str) -> Vec<String> {
    let masked = PROTECTED_GROUP.replace_all(selector, "{}");
    let mut tokens: Vec<String> = Vec::new();
    for m in CLASS_TOKEN.find_iter(&masked) {
        let name = &m.as_str()[1..];
        if !tokens.iter().any(|t| t == name) {
            tokens.push(name.to_string());
        }
    }
    tokens
}

/// Rewrite every class token of `selector` to `<token>_<id>`.
///
/// Protected groups are first swapped for numbered markers, class tokens are
/// rewritten, the markers are restored and finally every brace is stripped,
/// so the content of a group comes out exactly as written.
pub fn hash_selector(selector: &str, id: &impl Display) -> String {
    let suffix = format!("_{id}");
    let scope = |caps: &Captures<'_>| format!("{}{}", &caps[0], suffix);

    let groups: Vec<&str> = PROTECTED_GROUP
        .find_iter(selector)
        .map(|m| m.as_str())
        .collect();
    if groups.is_empty() {
        return CLASS_TOKEN.replace_all(selector, scope).into_owned();
    }

    let mut masked = selector.to_string();
    for (i, group) in groups.iter().enumerate() {
        masked = masked.replacen(group, &marker(i), 1);
    }

    let mut hashed = CLASS_TOKEN.replace_all(&masked, scope).into_owned();
    for (i, group) in groups.iter().enumerate() {
        hashed = hashed.replacen(&marker(i), group, 1);
    }
    hashed.retain(|c| c != '{' && c != '}');
    hashed
}

fn marker(index: usize) -> String {
    format!("{{{index}}}")
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- class_tokens --------------------------------------------------------

    #[test]
    fn tokens_in_compound_and_descendant_selectors() {
        assert_eq!(class_tokens(".a.b .c"), vec!["a", "b", "c"]);
        assert_eq!(class_tokens("div.foo#bar:hover"), vec!["foo"]);
        assert_eq!(class_tokens(".x, .y > .x"), vec!["x", "y"]);
    }

    #[test]
    fn no_tokens() {
        assert!(class_tokens("div > p").is_empty());
        assert!(class_tokens("").is_empty());
    }

    #[test]
    fn protected_group_hides_tokens() {
        assert_eq!(class_tokens(".card {.theme-dark} .title"), vec!["card", "title"]);
        assert_eq!(class_tokens(".btn{:not(.disabled)}"), vec!["btn"]);
    }

    // -- hash_selector -------------------------------------------------------

    #[test]
    fn hashes_every_class_token() {
        assert_eq!(hash_selector(".a .b:hover", &"0"), ".a_0 .b_0:hover");
        assert_eq!(hash_selector("ul > li.item", &3), "ul > li.item_3");
        assert_eq!(hash_selector("div", &1), "div");
    }

    #[test]
    fn protected_group_round_trips() {
        assert_eq!(
            hash_selector(".card {.theme-dark} .title", &"2_1"),
            ".card_2_1 .theme-dark .title_2_1"
        );
        assert_eq!(
            hash_selector(".btn{:not(.disabled)}:hover", &0),
            ".btn_0:not(.disabled):hover"
        );
    }

    #[test]
    fn several_protected_groups_keep_their_positions() {
        assert_eq!(
            hash_selector("{.dark} .a {.rtl} .b", &7),
            ".dark .a_7 .rtl .b_7"
        );
    }

    #[test]
    fn repeated_group_text_is_restored_in_order() {
        assert_eq!(hash_selector("{.x} .a {.x}", &1), ".x .a_1 .x");
    }
}
