//! # Input keys
//!
//! ## Overview
//!
//! This module contains value types for one keypress ([KeyInput]) and an ordered sequence of
//! keypresses ([KeyInputSet]), along with parsing and printing of the `<...>` syntax used when
//! mappings are written as text (e.g. `<C-w>j` or `<Esc>`).
use std::fmt;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyModifiers};

use self::parse::{parse_key_str, parse_keyseq_str};

pub(crate) mod parse;

/// Errors that occur while interpreting key-sequence text.
#[derive(thiserror::Error, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum KeySequenceError {
    /// Failure to interpret key-sequence text.
    #[error("Invalid key sequence: {0:?}")]
    Invalid(String),

    /// Empty key-sequence text.
    #[error("Empty key sequence")]
    Empty,
}

/// A single keypress: a symbolic key identity plus a modifier bit-set.
///
/// Values are canonicalized during construction so that equality and hashing see exactly one
/// representation per distinguishable key:
///
/// - Shift plus a letter becomes the uppercase letter with Shift cleared, so `<S-a>` and `<S-A>`
///   are the same key as a typed `A`. Shift on a non-letter stays a distinct bit: `<S-#>` is not
///   the same key as `#`.
/// - Control plus a letter folds to lowercase, making `<C-a>` and `<C-A>` the same key.
/// - Alt (`<A-...>`, `<M-...>`) and Command (`<D-...>`) leave the character untouched, so
///   `<A-a>` and `<A-A>` stay distinct.
///
/// The Command modifier is carried as [KeyModifiers::SUPER].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct KeyInput {
    code: KeyCode,
    modifiers: KeyModifiers,
}

impl KeyInput {
    /// Create a key from its identity and modifiers, normalizing as described above.
    pub fn new(code: KeyCode, mut modifiers: KeyModifiers) -> Self {
        let code = match code {
            KeyCode::Char(c)
                if modifiers.contains(KeyModifiers::CONTROL) && c.is_ascii_alphabetic() =>
            {
                // Control is case-insensitive for letters.
                modifiers -= KeyModifiers::SHIFT;

                KeyCode::Char(c.to_ascii_lowercase())
            },
            KeyCode::Char(c) if modifiers.contains(KeyModifiers::SHIFT) && c.is_alphabetic() => {
                // Shift is redundant information for letters.
                modifiers -= KeyModifiers::SHIFT;

                KeyCode::Char(c.to_uppercase().next().unwrap_or(c))
            },
            code => code,
        };

        Self { code, modifiers }
    }

    /// The symbolic key identity.
    pub fn code(&self) -> KeyCode {
        self.code
    }

    /// The modifier bits held along with the key.
    pub fn modifiers(&self) -> KeyModifiers {
        self.modifiers
    }

    /// Return this key's literal character, if it has one.
    ///
    /// Keys whose only modifier is Shift still carry their character (e.g. a shifted symbol);
    /// keys held with Control, Alt or Command do not.
    pub fn get_char(&self) -> Option<char> {
        if let KeyCode::Char(c) = self.code {
            if (self.modifiers - KeyModifiers::SHIFT).is_empty() {
                return Some(c);
            }
        }

        None
    }
}

impl From<KeyCode> for KeyInput {
    fn from(code: KeyCode) -> Self {
        KeyInput::new(code, KeyModifiers::NONE)
    }
}

impl FromStr for KeyInput {
    type Err = KeySequenceError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Err(KeySequenceError::Empty);
        } else if let Ok((_, key)) = parse_key_str(input) {
            return Ok(key);
        } else {
            return Err(KeySequenceError::Invalid(input.to_string()));
        }
    }
}

impl fmt::Display for KeyInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let push_mods = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if self.modifiers.contains(KeyModifiers::CONTROL) {
                f.write_str("C-")?;
            }

            if self.modifiers.contains(KeyModifiers::SHIFT) {
                f.write_str("S-")?;
            }

            if self.modifiers.contains(KeyModifiers::ALT) {
                f.write_str("A-")?;
            }

            if self.modifiers.contains(KeyModifiers::SUPER) {
                f.write_str("D-")?;
            }

            Ok(())
        };

        let push_named = |f: &mut fmt::Formatter<'_>, name: &str| -> fmt::Result {
            f.write_str("<")?;
            push_mods(f)?;
            f.write_str(name)?;
            f.write_str(">")
        };

        match self.code {
            KeyCode::Left => push_named(f, "Left"),
            KeyCode::Right => push_named(f, "Right"),
            KeyCode::Up => push_named(f, "Up"),
            KeyCode::Down => push_named(f, "Down"),
            KeyCode::Backspace => push_named(f, "BS"),
            KeyCode::Enter => push_named(f, "Enter"),
            KeyCode::Home => push_named(f, "Home"),
            KeyCode::End => push_named(f, "End"),
            KeyCode::PageUp => push_named(f, "PageUp"),
            KeyCode::PageDown => push_named(f, "PageDown"),
            KeyCode::Null => push_named(f, "Nul"),
            KeyCode::Esc => push_named(f, "Esc"),
            KeyCode::Delete => push_named(f, "Del"),
            KeyCode::Insert => push_named(f, "Insert"),
            KeyCode::Tab => push_named(f, "Tab"),
            KeyCode::BackTab => f.write_str("<S-Tab>"),
            KeyCode::F(n) => push_named(f, n.to_string().as_str()),
            KeyCode::Char(c) => {
                if self.modifiers.is_empty() {
                    if c == '<' {
                        f.write_str("<lt>")
                    } else if c == ' ' {
                        f.write_str("<Space>")
                    } else {
                        write!(f, "{c}")
                    }
                } else {
                    match c {
                        ' ' => push_named(f, "Space"),
                        '<' => push_named(f, "lt"),
                        c => push_named(f, c.to_string().as_str()),
                    }
                }
            },
            _ => Ok(()),
        }
    }
}

/// An ordered sequence of keypresses.
///
/// Equality and hashing are structural over the sequence, so a [KeyInputSet] can serve both as a
/// lookup key and as a replacement value. Sequences parsed from text are never empty; the empty
/// value only shows up as the result of sequence arithmetic.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct KeyInputSet(Vec<KeyInput>);

impl KeyInputSet {
    /// Create a sequence holding a single keypress.
    pub fn single(key: KeyInput) -> Self {
        KeyInputSet(vec![key])
    }

    /// The number of keypresses in this sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this sequence contains no keypresses.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The keypresses in this sequence, in order.
    pub fn keys(&self) -> &[KeyInput] {
        &self.0
    }

    /// The first keypress, if the sequence is non-empty.
    pub fn first(&self) -> Option<&KeyInput> {
        self.0.first()
    }

    /// Whether this sequence begins with every keypress of `prefix`, in order.
    pub fn starts_with(&self, prefix: &KeyInputSet) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Append a single keypress to the end of this sequence.
    pub fn push(&mut self, key: KeyInput) {
        self.0.push(key);
    }

    /// Concatenate two sequences.
    pub fn concat(mut self, other: KeyInputSet) -> KeyInputSet {
        self.0.extend(other.0);
        self
    }

    /// Split this sequence at `idx`, returning the leading and trailing parts.
    pub fn split_at(&self, idx: usize) -> (KeyInputSet, KeyInputSet) {
        let (a, b) = self.0.split_at(idx);

        (KeyInputSet(a.to_vec()), KeyInputSet(b.to_vec()))
    }
}

impl From<KeyInput> for KeyInputSet {
    fn from(key: KeyInput) -> Self {
        KeyInputSet::single(key)
    }
}

impl From<Vec<KeyInput>> for KeyInputSet {
    fn from(keys: Vec<KeyInput>) -> Self {
        KeyInputSet(keys)
    }
}

impl FromIterator<KeyInput> for KeyInputSet {
    fn from_iter<T: IntoIterator<Item = KeyInput>>(iter: T) -> Self {
        KeyInputSet(iter.into_iter().collect())
    }
}

impl IntoIterator for KeyInputSet {
    type Item = KeyInput;
    type IntoIter = std::vec::IntoIter<KeyInput>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a KeyInputSet {
    type Item = &'a KeyInput;
    type IntoIter = std::slice::Iter<'a, KeyInput>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromStr for KeyInputSet {
    type Err = KeySequenceError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Err(KeySequenceError::Empty);
        } else if let Ok((_, keys)) = parse_keyseq_str(input) {
            return Ok(KeyInputSet(keys));
        } else {
            return Err(KeySequenceError::Invalid(input.to_string()));
        }
    }
}

impl fmt::Display for KeyInputSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.0 {
            write!(f, "{key}")?;
        }

        Ok(())
    }
}
