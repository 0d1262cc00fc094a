//! # vimregex
//!
//! ## Overview
//!
//! This crate compiles Vim-style search patterns into [regex::Regex] matchers.
//!
//! The pattern dialect is scanned left to right against a [MagicLevel] that decides which
//! characters carry special meaning bare and which require a backslash. The level in effect at
//! the start of the pattern comes from the `magic` flag in a [SearchSettings] snapshot, and the
//! `\v`, `\V`, `\m` and `\M` tokens switch it for everything that follows them. Case
//! sensitivity is resolved once per pattern from the `\c`/`\C` tokens, the `smartcase` rule,
//! and the `ignorecase` flag, in that order.
//!
//! Compilation is a pure function of the pattern text and the settings snapshot: a
//! [CompiledPattern] holds no reference to live settings, and changing them later never affects
//! patterns that were already compiled.
//!
//! ## Example
//!
//! ```
//! use vimregex::{CompiledPattern, SearchSettings};
//!
//! let settings = SearchSettings { ignore_case: true, smart_case: false, magic: true };
//!
//! // "." is a wildcard under Magic, and a literal dot once \M switches to NoMagic.
//! let wild = CompiledPattern::compile(".", &settings).unwrap();
//! let lit = CompiledPattern::compile(r"\M.", &settings).unwrap();
//!
//! assert!(wild.is_match("a"));
//! assert!(!lit.is_match("a"));
//! assert!(lit.is_match("."));
//! ```

// Require docs for public APIs, and disable the more annoying clippy lints.
#![deny(missing_docs)]
#![allow(clippy::bool_to_int_with_if)]
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::match_like_matches_macro)]
#![allow(clippy::needless_return)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

use std::str::Chars;

use regex::{Regex, RegexBuilder};
use tracing::trace;

/// Which pattern characters carry special meaning by default.
///
/// The active level can change in the middle of a pattern; a switch only affects the characters
/// that follow it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MagicLevel {
    /// `.` and `*` are special bare; the remaining operators need a backslash.
    Magic,

    /// Operators are special only in their backslash-escaped forms (`\.`, `\*`, ...).
    NoMagic,

    /// Every operator is special bare (`.`, `*`, `?`, `=`, `+`, `(`, `)`, `|`, `[`).
    VeryMagic,

    /// Operators need a backslash, and escaping a bare operator form makes it literal.
    VeryNoMagic,
}

impl MagicLevel {
    fn bare_dot_star(&self) -> bool {
        matches!(self, MagicLevel::Magic | MagicLevel::VeryMagic)
    }
}

/// The compile-time snapshot of the host's search settings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SearchSettings {
    /// Patterns match case-insensitively unless something overrides it (`'ignorecase'`).
    pub ignore_case: bool,

    /// A literal uppercase character makes the pattern case-sensitive (`'smartcase'`).
    pub smart_case: bool,

    /// Whether patterns start at [MagicLevel::Magic] or [MagicLevel::NoMagic] (`'magic'`).
    pub magic: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings { ignore_case: false, smart_case: false, magic: true }
    }
}

/// Errors produced when pattern text cannot be compiled.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum PatternError {
    /// A backslash with nothing following it.
    #[error("Pattern ends with a trailing backslash")]
    TrailingBackslash,

    /// A `[...]` collection with no closing bracket.
    #[error("Unclosed [] collection in pattern")]
    UnclosedCollection,

    /// Group parentheses that do not pair up.
    #[error("Unbalanced group parentheses in pattern")]
    UnbalancedGroup,

    /// The translated pattern was rejected by the regex engine.
    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// A search pattern compiled against a [SearchSettings] snapshot.
///
/// Values are immutable once built and may be shared across threads and read concurrently.
#[derive(Clone, Debug)]
pub struct CompiledPattern {
    text: String,
    levels: Vec<MagicLevel>,
    case_sensitive: bool,
    regex: Regex,
}

impl CompiledPattern {
    /// Compile pattern text against a settings snapshot.
    pub fn compile(pattern: &str, settings: &SearchSettings) -> Result<Self, PatternError> {
        let translator = Translator::new(pattern, settings).run()?;

        let case_sensitive = if translator.force_sensitive {
            true
        } else if translator.force_insensitive {
            false
        } else if settings.smart_case && translator.saw_upper {
            true
        } else {
            !settings.ignore_case
        };

        trace!(pattern, source = %translator.out, case_sensitive, "compiled search pattern");

        let regex = RegexBuilder::new(&translator.out)
            .case_insensitive(!case_sensitive)
            .build()?;

        Ok(CompiledPattern {
            text: pattern.to_string(),
            levels: translator.levels,
            case_sensitive,
            regex,
        })
    }

    /// Whether the pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// The leftmost matching substring of `text`, if there is one.
    pub fn first_match<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex.find(text).map(|m| m.as_str())
    }

    /// The original pattern text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The magic levels applied while translating, in order: the level in effect at the start
    /// of the pattern, followed by one entry per switch token.
    pub fn magic_levels(&self) -> &[MagicLevel] {
        &self.levels
    }

    /// The case sensitivity the pattern resolved to.
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// The underlying matcher.
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }
}

fn is_regex_meta(c: char) -> bool {
    matches!(
        c,
        '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
    )
}

struct Translator<'a> {
    input: Chars<'a>,
    level: MagicLevel,
    levels: Vec<MagicLevel>,
    out: String,
    depth: usize,
    saw_upper: bool,
    force_sensitive: bool,
    force_insensitive: bool,
}

impl<'a> Translator<'a> {
    fn new(pattern: &'a str, settings: &SearchSettings) -> Self {
        let level = if settings.magic { MagicLevel::Magic } else { MagicLevel::NoMagic };

        Translator {
            input: pattern.chars(),
            level,
            levels: vec![level],
            out: String::with_capacity(pattern.len()),
            depth: 0,
            saw_upper: false,
            force_sensitive: false,
            force_insensitive: false,
        }
    }

    fn run(mut self) -> Result<Self, PatternError> {
        while let Some(c) = self.input.next() {
            if c == '\\' {
                match self.input.next() {
                    Some(e) => self.escaped(e)?,
                    None => return Err(PatternError::TrailingBackslash),
                }
            } else {
                self.bare(c)?;
            }
        }

        if self.depth != 0 {
            return Err(PatternError::UnbalancedGroup);
        }

        Ok(self)
    }

    fn switch(&mut self, level: MagicLevel) {
        self.level = level;
        self.levels.push(level);
    }

    // Emit one character of literal pattern text.
    fn literal(&mut self, c: char) {
        if c.is_uppercase() {
            self.saw_upper = true;
        }

        if is_regex_meta(c) {
            self.out.push('\\');
        }

        self.out.push(c);
    }

    fn group_open(&mut self) {
        self.depth += 1;
        self.out.push('(');
    }

    fn group_close(&mut self) -> Result<(), PatternError> {
        if self.depth == 0 {
            return Err(PatternError::UnbalancedGroup);
        }

        self.depth -= 1;
        self.out.push(')');

        Ok(())
    }

    // Carry a [...] collection through to the regex engine, which shares the class syntax.
    fn collection(&mut self) -> Result<(), PatternError> {
        self.out.push('[');

        loop {
            match self.input.next() {
                Some('\\') => match self.input.next() {
                    Some(e) => {
                        self.out.push('\\');
                        self.out.push(e);
                    },
                    None => return Err(PatternError::UnclosedCollection),
                },
                Some(']') => {
                    self.out.push(']');
                    return Ok(());
                },
                Some(c) => self.out.push(c),
                None => return Err(PatternError::UnclosedCollection),
            }
        }
    }

    // A character that appeared bare in the pattern text.
    fn bare(&mut self, c: char) -> Result<(), PatternError> {
        let very = self.level == MagicLevel::VeryMagic;

        match c {
            '.' | '*' if self.level.bare_dot_star() => self.out.push(c),
            '?' | '=' if very => self.out.push('?'),
            '+' if very => self.out.push('+'),
            '|' if very => self.out.push('|'),
            '(' if very => self.group_open(),
            ')' if very => self.group_close()?,
            '[' if self.level.bare_dot_star() => self.collection()?,
            '^' => self.out.push('^'),
            '$' => self.out.push('$'),
            c => self.literal(c),
        }

        Ok(())
    }

    // A character that appeared backslash-escaped in the pattern text.
    fn escaped(&mut self, c: char) -> Result<(), PatternError> {
        let very = self.level == MagicLevel::VeryMagic;

        match c {
            'v' => self.switch(MagicLevel::VeryMagic),
            'V' => self.switch(MagicLevel::VeryNoMagic),
            'm' => self.switch(MagicLevel::Magic),
            'M' => self.switch(MagicLevel::NoMagic),
            'c' => self.force_insensitive = true,
            'C' => self.force_sensitive = true,
            '.' | '*' if !self.level.bare_dot_star() => self.out.push(c),
            '?' | '=' if !very => self.out.push('?'),
            '+' if !very => self.out.push('+'),
            '|' if !very => self.out.push('|'),
            '(' if !very => self.group_open(),
            ')' if !very => self.group_close()?,
            '[' if !self.level.bare_dot_star() => self.collection()?,
            '<' | '>' => self.out.push_str("\\b"),
            'd' => self.out.push_str("[0-9]"),
            'D' => self.out.push_str("[^0-9]"),
            's' => self.out.push_str("[ \\t]"),
            'S' => self.out.push_str("[^ \\t]"),
            'w' => self.out.push_str("[0-9A-Za-z_]"),
            'W' => self.out.push_str("[^0-9A-Za-z_]"),
            'a' => self.out.push_str("[A-Za-z]"),
            'A' => self.out.push_str("[^A-Za-z]"),
            'l' => self.out.push_str("[a-z]"),
            'u' => self.out.push_str("[A-Z]"),
            'h' => self.out.push_str("[A-Za-z_]"),
            'H' => self.out.push_str("[^A-Za-z_]"),
            c => self.literal(c),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IGNORE: SearchSettings =
        SearchSettings { ignore_case: true, smart_case: false, magic: true };
    const EXACT: SearchSettings =
        SearchSettings { ignore_case: false, smart_case: false, magic: true };
    const SMART: SearchSettings =
        SearchSettings { ignore_case: true, smart_case: true, magic: true };
    const NOMAGIC: SearchSettings =
        SearchSettings { ignore_case: true, smart_case: false, magic: false };

    fn verify_matches(pattern: &str, settings: &SearchSettings, inputs: &[&str]) {
        let re = CompiledPattern::compile(pattern, settings).unwrap();

        for input in inputs {
            assert!(re.is_match(input), "{pattern:?} should match {input:?}");
        }
    }

    fn verify_not_matches(pattern: &str, settings: &SearchSettings, inputs: &[&str]) {
        let re = CompiledPattern::compile(pattern, settings).unwrap();

        for input in inputs {
            assert!(!re.is_match(input), "{pattern:?} should not match {input:?}");
        }
    }

    fn verify_match_is(pattern: &str, settings: &SearchSettings, input: &str, expected: &str) {
        let re = CompiledPattern::compile(pattern, settings).unwrap();

        assert_eq!(re.first_match(input), Some(expected), "{pattern:?} in {input:?}");
    }

    #[test]
    fn test_letters_ignore_case() {
        verify_matches("a", &IGNORE, &["a", "A"]);
        verify_matches("b", &IGNORE, &["b", "B"]);
    }

    #[test]
    fn test_letters_exact_case() {
        verify_matches("a", &EXACT, &["a"]);
        verify_not_matches("a", &EXACT, &["A"]);
        verify_matches("b", &EXACT, &["b"]);
        verify_not_matches("b", &EXACT, &["B"]);
    }

    #[test]
    fn test_force_sensitive() {
        // \C takes precedence over 'ignorecase'.
        verify_matches(r"\Ca", &IGNORE, &["a"]);
        verify_not_matches(r"\Ca", &IGNORE, &["A"]);
        verify_matches(r"\Ca", &EXACT, &["a"]);
        verify_not_matches(r"\Ca", &EXACT, &["A"]);
    }

    #[test]
    fn test_force_insensitive() {
        // \c takes precedence over 'ignorecase'.
        verify_matches(r"\ca", &IGNORE, &["a", "A"]);
        verify_matches(r"\ca", &EXACT, &["a", "A"]);
    }

    #[test]
    fn test_smart_case() {
        // All lowercase matches both; any literal uppercase is exact.
        verify_matches("a", &SMART, &["a", "A"]);
        verify_matches("b", &SMART, &["b", "B"]);
        verify_matches("A", &SMART, &["A"]);
        verify_not_matches("A", &SMART, &["a"]);
        verify_matches("Foo", &SMART, &["Foo"]);
        verify_not_matches("Foo", &SMART, &["foo", "FOO"]);
    }

    #[test]
    fn test_case_tokens_beat_smart_case() {
        verify_matches(r"\cFoo", &SMART, &["foo", "FOO", "fOO"]);
        verify_matches(r"\CFOO", &SMART, &["FOO"]);
        verify_not_matches(r"\CFOO", &SMART, &["foo"]);
    }

    #[test]
    fn test_sensitive_token_wins() {
        // \C wins no matter where the tokens appear.
        verify_not_matches(r"\c\CFoo", &IGNORE, &["foo"]);
        verify_not_matches(r"\CFoo\c", &IGNORE, &["foo"]);
        verify_matches(r"\c\CFoo", &IGNORE, &["Foo"]);
    }

    #[test]
    fn test_smart_case_ignores_tokens() {
        // The uppercase letters in \V and \C are tokens, not literal text.
        verify_matches(r"\Vfoo", &SMART, &["FOO", "foo"]);

        let re = CompiledPattern::compile(r"\Vfoo", &SMART).unwrap();
        assert!(!re.is_case_sensitive());
    }

    #[test]
    fn test_magic_default() {
        verify_matches(".", &IGNORE, &["a", "b", "c"]);
    }

    #[test]
    fn test_nomagic_default() {
        verify_not_matches(".", &NOMAGIC, &["a", "b", "c"]);
        verify_matches(".", &NOMAGIC, &["."]);
        verify_matches(r"\.", &NOMAGIC, &["a", "b", "c"]);
    }

    #[test]
    fn test_magic_prefix() {
        verify_matches(r"\m.", &NOMAGIC, &["a", "b", "c"]);
    }

    #[test]
    fn test_nomagic_prefix() {
        verify_not_matches(r"\M.", &IGNORE, &["a", "b", "c"]);
        verify_matches(r"\M\.", &IGNORE, &["a", "b", "c"]);
    }

    #[test]
    fn test_switch_mid_pattern() {
        // A switch only affects what follows it.
        verify_matches(r"a\m.", &NOMAGIC, &["ab", "ac"]);
        verify_not_matches(r"a\M.", &IGNORE, &["ab", "ac"]);
        verify_matches(r"a\M.", &IGNORE, &["a."]);
    }

    #[test]
    fn test_very_magic() {
        verify_matches(r"\v.", &NOMAGIC, &["a", "b"]);
    }

    #[test]
    fn test_very_nomagic() {
        verify_not_matches(r"\V.", &IGNORE, &["a", "b"]);
        verify_matches(r"\V\.", &IGNORE, &["a", "b"]);
    }

    #[test]
    fn test_item_star() {
        verify_match_is(r"ab*", &IGNORE, "abb", "abb");
        verify_match_is(r"ab*", &IGNORE, "cab", "ab");
        verify_match_is(r"ab*", &IGNORE, "cabb", "abb");

        verify_match_is(r"\Mab*", &IGNORE, "ab*", "ab*");
        verify_match_is(r"\Mab\*", &IGNORE, "ab", "ab");
        verify_match_is(r"\Mab\*", &IGNORE, "caabb", "a");
        verify_match_is(r"\Mab\*", &IGNORE, "cabb", "abb");

        verify_match_is(r"\mab*", &IGNORE, "abb", "abb");
        verify_match_is(r"\mab*", &IGNORE, "cab", "ab");
    }

    #[test]
    fn test_item_question() {
        verify_match_is(r"ab?", &IGNORE, "ab?", "ab?");
        verify_match_is(r"ab\?", &IGNORE, "ab", "ab");
        verify_match_is(r"ab\?", &IGNORE, "abc", "ab");
        verify_match_is(r"ab\?", &IGNORE, "adc", "a");

        verify_match_is(r"\Mab?", &IGNORE, "ab?", "ab?");
        verify_match_is(r"\Mab\?", &IGNORE, "abc", "ab");

        verify_match_is(r"\vab?", &IGNORE, "ad", "a");
        verify_match_is(r"\vab?", &IGNORE, "ab", "ab");
        verify_match_is(r"\vab?", &IGNORE, "abc", "ab");
    }

    #[test]
    fn test_item_equal() {
        verify_match_is(r"ab\=", &IGNORE, "a", "a");
        verify_match_is(r"ab\=", &IGNORE, "ab", "ab");
        verify_match_is(r"ab\=", &IGNORE, "abc", "ab");

        verify_match_is(r"\Mab=", &IGNORE, "ab=", "ab=");
        verify_match_is(r"\Mab\=", &IGNORE, "ab", "ab");
        verify_match_is(r"\Mab\=", &IGNORE, "adc", "a");

        verify_match_is(r"\vab=", &IGNORE, "a", "a");
        verify_match_is(r"\vab=", &IGNORE, "abc", "ab");
    }

    #[test]
    fn test_quantifier_equivalence() {
        // Escaped under Magic and bare under VeryMagic mean the same thing.
        for pattern in [r"ab\?", r"ab\=", r"\vab?", r"\vab="] {
            verify_match_is(pattern, &IGNORE, "ab", "ab");
            verify_match_is(pattern, &IGNORE, "adc", "a");
        }
    }

    #[test]
    fn test_plus() {
        verify_match_is(r"ab\+", &IGNORE, "abbc", "abb");
        verify_not_matches(r"ab\+", &IGNORE, &["ac"]);
        verify_match_is(r"\vab+", &IGNORE, "abbc", "abb");
        verify_match_is(r"ab+", &IGNORE, "ab+", "ab+");
    }

    #[test]
    fn test_anchors() {
        verify_matches("^ab", &IGNORE, &["abc"]);
        verify_not_matches("^ab", &IGNORE, &["cab"]);
        verify_matches("ab$", &IGNORE, &["cab"]);
        verify_not_matches("ab$", &IGNORE, &["abc"]);

        // Anchors are special at every level.
        verify_matches(r"\M^ab", &IGNORE, &["abc"]);
        verify_not_matches(r"\M^ab", &IGNORE, &["cab"]);
        verify_matches(r"\V^a", &IGNORE, &["abc"]);

        // Escaped anchors are literal.
        verify_matches(r"a\$b", &IGNORE, &["a$b"]);
        verify_not_matches(r"a\$b", &IGNORE, &["ab"]);
    }

    #[test]
    fn test_word_boundary() {
        verify_matches(r"\<foo\>", &IGNORE, &["a foo b", "foo"]);
        verify_not_matches(r"\<foo\>", &IGNORE, &["foobar", "xfoo"]);
    }

    #[test]
    fn test_char_classes() {
        verify_match_is(r"\d\+", &EXACT, "abc123", "123");
        verify_matches(r"\D", &EXACT, &["x"]);
        verify_not_matches(r"\D", &EXACT, &["7"]);
        verify_matches(r"\s", &EXACT, &["a b", "a\tb"]);
        verify_not_matches(r"\s", &EXACT, &["ab"]);
        verify_match_is(r"\w\+", &EXACT, "!foo_1!", "foo_1");
        verify_matches(r"\a", &EXACT, &["x", "X"]);
        verify_not_matches(r"\a", &EXACT, &["1"]);
        verify_matches(r"\l", &EXACT, &["x"]);
        verify_not_matches(r"\l", &EXACT, &["X"]);
        verify_matches(r"\u", &EXACT, &["X"]);
        verify_not_matches(r"\u", &EXACT, &["x"]);
        verify_match_is(r"\h\w\*", &EXACT, "1foo1", "foo1");
    }

    #[test]
    fn test_groups_and_alternation() {
        verify_matches(r"\(ab\)\|cd", &IGNORE, &["ab", "cd"]);
        verify_not_matches(r"\(ab\)\|cd", &IGNORE, &["ax", "cx"]);
        verify_matches(r"\v(ab)|cd", &IGNORE, &["ab", "cd"]);
        verify_match_is(r"\v(ab)+", &IGNORE, "xababy", "abab");

        // Bare parens are literal outside of VeryMagic.
        verify_matches(r"(ab)", &IGNORE, &["(ab)"]);
        verify_not_matches(r"(ab)", &IGNORE, &["ab"]);
    }

    #[test]
    fn test_collections() {
        verify_matches("[abc]", &EXACT, &["b"]);
        verify_not_matches("[abc]", &EXACT, &["d"]);
        verify_matches("[^abc]", &EXACT, &["d"]);
        verify_matches(r"\v[a-c]+", &EXACT, &["cab"]);

        // Bare brackets are literal under NoMagic; the escaped form is a collection.
        verify_matches(r"\M[abc]", &EXACT, &["[abc]"]);
        verify_not_matches(r"\M[abc]", &EXACT, &["b"]);
        verify_matches(r"\M\[abc]", &EXACT, &["b"]);
    }

    #[test]
    fn test_invalid_patterns() {
        let err = CompiledPattern::compile("ab\\", &IGNORE).unwrap_err();
        assert!(matches!(err, PatternError::TrailingBackslash));

        let err = CompiledPattern::compile(r"\(ab", &IGNORE).unwrap_err();
        assert!(matches!(err, PatternError::UnbalancedGroup));

        let err = CompiledPattern::compile(r"ab\)", &IGNORE).unwrap_err();
        assert!(matches!(err, PatternError::UnbalancedGroup));

        let err = CompiledPattern::compile("[ab", &IGNORE).unwrap_err();
        assert!(matches!(err, PatternError::UnclosedCollection));
    }

    #[test]
    fn test_levels_recorded() {
        let re = CompiledPattern::compile(r"\vfoo\m.", &IGNORE).unwrap();

        assert_eq!(
            re.magic_levels(),
            &[MagicLevel::Magic, MagicLevel::VeryMagic, MagicLevel::Magic]
        );

        let re = CompiledPattern::compile("foo", &NOMAGIC).unwrap();

        assert_eq!(re.magic_levels(), &[MagicLevel::NoMagic]);
    }

    #[test]
    fn test_accessors() {
        let re = CompiledPattern::compile("Foo", &SMART).unwrap();

        assert_eq!(re.text(), "Foo");
        assert!(re.is_case_sensitive());
        assert!(re.as_regex().is_match("a Foo b"));
    }

    #[test]
    fn test_compile_is_snapshot() {
        let mut settings = IGNORE;
        let re = CompiledPattern::compile("a", &settings).unwrap();

        // Later changes to the settings value cannot reach the compiled pattern.
        settings.ignore_case = false;

        assert!(re.is_match("A"));
    }
}
