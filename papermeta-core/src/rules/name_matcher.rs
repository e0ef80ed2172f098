use regex::Regex;
use std::sync::LazyLock;

// One name component: letters of either case, modifier symbols, periods and
// dash punctuation, e.g. "J." or "García-López". Apostrophes are not included.
const NAME_COMPONENT: &str = r"[\p{Uppercase}\p{Lowercase}\p{Sk}.\p{Pd}]";

// Separator left over when a list of names is split across spans
const LIST_PREFIX: &str = r"(?:,|\x{00B7})\p{Zs}+";

// At least two space-separated components, after an optional list prefix.
// Anchored at the start only: trailing text is allowed.
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?:{LIST_PREFIX})?{NAME_COMPONENT}+(?:\p{{Zs}}{NAME_COMPONENT}+)+"
    ))
    .unwrap()
});

static PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{LIST_PREFIX}")).unwrap());

/// Decides whether a span's text reads like a person's name.
#[derive(Debug, Clone, Default)]
pub struct NameMatcher {
    false_positives: Vec<String>,
}

impl NameMatcher {
    pub fn new(false_positives: &[String]) -> Self {
        Self {
            false_positives: false_positives.to_vec(),
        }
    }

    /// The stored author value: the whole trimmed text with any leading list
    /// separator removed. `None` when the text does not start with a name or
    /// is a known false positive.
    pub fn match_name(&self, text: &str) -> Option<String> {
        let trimmed = text.trim();
        if self.false_positives.iter().any(|entry| entry == trimmed) {
            return None;
        }
        if !NAME_PATTERN.is_match(trimmed) {
            return None;
        }

        Some(PREFIX_PATTERN.replace(trimmed, "").into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> NameMatcher {
        NameMatcher::new(&["Æ".to_string()])
    }

    #[test]
    fn test_accepts_multi_component_names() {
        let matcher = matcher();
        assert_eq!(matcher.match_name("J. Smith").as_deref(), Some("J. Smith"));
        assert_eq!(
            matcher.match_name("Maria García-López").as_deref(),
            Some("Maria García-López")
        );
        assert_eq!(
            matcher.match_name("  Wei\u{00A0}Zhang  ").as_deref(),
            Some("Wei\u{00A0}Zhang")
        );
        assert_eq!(matcher.match_name("Smith"), None);
        assert_eq!(matcher.match_name("1 Department of Physics"), None);
    }

    #[test]
    fn test_list_prefix_is_stripped() {
        let matcher = matcher();
        assert_eq!(matcher.match_name(", A. Author").as_deref(), Some("A. Author"));
        assert_eq!(
            matcher.match_name("\u{00B7} B. Other").as_deref(),
            Some("B. Other")
        );
    }

    #[test]
    fn test_trailing_text_is_kept() {
        let matcher = matcher();
        assert_eq!(
            matcher.match_name("J. Smith, A. Author").as_deref(),
            Some("J. Smith, A. Author")
        );
    }

    #[test]
    fn test_false_positive_discarded() {
        assert_eq!(matcher().match_name("Æ"), None);
        assert_eq!(matcher().match_name("   "), None);
    }
}
