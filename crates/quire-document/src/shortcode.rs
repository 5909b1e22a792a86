// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shortcode resolution — rewrites `#{type:id}` mentions into the display name
// of the referenced entity before the markup is parsed.

use std::sync::LazyLock;

use quire_core::traits::EntityLookup;
use quire_core::types::EntityKind;
use regex::{Captures, Regex};
use tracing::debug;

/// `#{<word>:<digits>}`, ASCII only.
static SHORTCODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#\{([A-Za-z0-9_]+):([0-9]+)\}").unwrap_or_else(|err| {
        unreachable!("shortcode pattern is a valid regex: {err}")
    })
});

/// Replaces mention shortcodes with entity names.
///
/// Runs on raw markup, before parsing. Names are inserted verbatim, with no
/// `$` group expansion, and are not scanned again for shortcodes. Unknown
/// entity kinds leave the token as written; known kinds whose target is
/// missing get a placeholder such as `Unknown Character`.
pub struct ShortcodeResolver<'a> {
    lookup: &'a dyn EntityLookup,
}

impl<'a> ShortcodeResolver<'a> {
    pub fn new(lookup: &'a dyn EntityLookup) -> Self {
        Self { lookup }
    }

    /// Resolve every shortcode in `content`. `None` resolves to an empty string.
    pub fn resolve(&self, content: Option<&str>) -> String {
        let Some(content) = content.filter(|c| !c.is_empty()) else {
            return String::new();
        };

        SHORTCODE
            .replace_all(content, |caps: &Captures<'_>| self.replacement(caps))
            .into_owned()
    }

    fn replacement(&self, caps: &Captures<'_>) -> String {
        let token = &caps[0];
        let Some(kind) = EntityKind::from_keyword(&caps[1]) else {
            return token.to_string();
        };

        // Ids too large for u64 cannot exist in the store.
        let name = caps[2]
            .parse::<u64>()
            .ok()
            .and_then(|id| self.lookup.display_name(kind, id));

        match name {
            Some(name) => name,
            None => {
                debug!(token, "shortcode target not found");
                kind.placeholder().to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture;

    impl EntityLookup for Fixture {
        fn display_name(&self, kind: EntityKind, id: u64) -> Option<String> {
            match (kind, id) {
                (EntityKind::Character, 1) => Some("Ada".into()),
                (EntityKind::Location, 2) => Some("The $1 <b>Inn</b>".into()),
                (EntityKind::Lore, 3) => Some("#{character:1}".into()),
                _ => None,
            }
        }
    }

    fn resolve(content: &str) -> String {
        ShortcodeResolver::new(&Fixture).resolve(Some(content))
    }

    #[test]
    fn known_entity_is_replaced_by_name() {
        assert_eq!(resolve("Hello #{character:1}!"), "Hello Ada!");
        assert_eq!(resolve("#{Character:1}"), "Ada");
    }

    #[test]
    fn missing_entity_gets_placeholder() {
        assert_eq!(resolve("See #{character:5}"), "See Unknown Character");
        assert_eq!(resolve("#{item:9} and #{lore:8}"), "Unknown Item and Unknown Lore");
    }

    #[test]
    fn unknown_kind_is_left_verbatim() {
        assert_eq!(resolve("a #{widget:1} b"), "a #{widget:1} b");
    }

    #[test]
    fn names_are_inserted_literally() {
        assert_eq!(resolve("#{location:2}"), "The $1 <b>Inn</b>");
        // Not resolved a second time.
        assert_eq!(resolve("#{lore:3}"), "#{character:1}");
    }

    #[test]
    fn page_break_marker_and_malformed_tokens_pass_through() {
        assert_eq!(resolve("a#{pagebreak}b"), "a#{pagebreak}b");
        assert_eq!(resolve("#{character:-1} #{character:}"), "#{character:-1} #{character:}");
    }

    #[test]
    fn oversized_id_is_a_miss() {
        assert_eq!(
            resolve("#{character:99999999999999999999999}"),
            "Unknown Character"
        );
    }

    #[test]
    fn empty_and_absent_input() {
        let resolver = ShortcodeResolver::new(&Fixture);
        assert_eq!(resolver.resolve(None), "");
        assert_eq!(resolver.resolve(Some("")), "");
    }
}
