use regex::Regex;

/// Marker character that makes an event name a wildcard pattern.
pub const WILDCARD: char = '*';

/// Compiled wildcard event-name pattern.
///
/// The pattern text is escaped as a regex literal, each escaped `*` is
/// rewritten to `.*`, and the expression is anchored at both ends. Matching
/// is case-sensitive, full-string and Unicode-aware.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    text: String,
    matcher: Regex,
}

impl WildcardPattern {
    /// Compile a pattern such as `"notification.*"`.
    pub fn compile(pattern: &str) -> Self {
        let escaped = regex::escape(pattern).replace("\\*", ".*");
        let anchored = format!("^{escaped}$");
        // The escaped expression is always a valid regex.
        let matcher = Regex::new(&anchored).expect("escaped wildcard pattern must compile");
        Self {
            text: pattern.to_string(),
            matcher,
        }
    }

    /// True if `name` should be treated as a pattern rather than an exact event name.
    pub fn is_pattern(name: &str) -> bool {
        name.contains(WILDCARD)
    }

    /// The original pattern text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Test a concrete event name against this pattern.
    pub fn matches(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }
}
