//! # Key remapping
//!
//! ## Overview
//!
//! This module contains [KeyMap], which owns one table of [Mapping] values per [KeyRemapMode],
//! and resolves typed key sequences against them.
//!
//! Each mode's table is a radix trie keyed by a byte encoding of the mapping's left-hand side,
//! which answers the two questions resolution needs without scanning the whole table: what is
//! the longest registered sequence that is a prefix of the input, and could further input still
//! extend the input into a longer registered sequence.
use std::collections::{HashMap, HashSet};

use crossterm::event::KeyCode;
use radix_trie::{Trie, TrieCommon, TrieKey};
use tracing::debug;

use crate::key::{KeyInput, KeyInputSet};

/// The editing modes that each hold an independent table of key mappings.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KeyRemapMode {
    /// Mappings applied to Normal mode keypresses.
    Normal,

    /// Mappings applied to Insert mode keypresses.
    Insert,

    /// Mappings applied while entering a command.
    Command,

    /// Mappings applied to Visual mode keypresses.
    Visual,

    /// Mappings applied to Select mode keypresses.
    Select,

    /// Mappings applied to the keypresses following an operator (e.g. "d" or "y").
    OperatorPending,

    /// Mappings applied while entering language text.
    Language,
}

impl KeyRemapMode {
    /// Every mode that can hold mappings.
    pub const LIST: [KeyRemapMode; 7] = [
        KeyRemapMode::Normal,
        KeyRemapMode::Insert,
        KeyRemapMode::Command,
        KeyRemapMode::Visual,
        KeyRemapMode::Select,
        KeyRemapMode::OperatorPending,
        KeyRemapMode::Language,
    ];
}

/// A single registered remapping rule.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mapping {
    lhs: KeyInputSet,
    rhs: KeyInputSet,
    allow_remap: bool,
    mode: KeyRemapMode,
}

impl Mapping {
    /// The key sequence that triggers this rule.
    pub fn lhs(&self) -> &KeyInputSet {
        &self.lhs
    }

    /// The key sequence substituted for the left-hand side.
    pub fn rhs(&self) -> &KeyInputSet {
        &self.rhs
    }

    /// Whether the substituted keys are themselves scanned for further mappings.
    pub fn allow_remap(&self) -> bool {
        self.allow_remap
    }

    /// The mode this rule is registered in.
    pub fn mode(&self) -> KeyRemapMode {
        self.mode
    }
}

/// The outcome of resolving a key sequence against a mode's mapping table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum KeyMappingResult {
    /// No rule applies; the input passes through unchanged.
    NoMapping,

    /// The input fully resolved to a replacement sequence, including any trailing keys that
    /// were not consumed by the matched rule.
    Mapped(KeyInputSet),

    /// The input is a prefix of at least one longer rule, so no decision can be made until the
    /// caller supplies more keys.
    NeedsMoreInput,

    /// Expanding the input revisits a rule that is already being expanded, and would never
    /// terminate.
    Recursive,
}

impl TrieKey for KeyInputSet {
    fn encode_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len() * 6);

        for key in self.keys() {
            encode_key(key, &mut bytes);
        }

        return bytes;
    }
}

// Each key encodes to a self-delimiting unit, so that a byte prefix of the encoded sequence is
// exactly a key-sequence prefix. Units with the same leading tag always have the same length.
fn encode_key(key: &KeyInput, bytes: &mut Vec<u8>) {
    bytes.push(key.modifiers().bits());

    match key.code() {
        KeyCode::Char(c) => {
            bytes.push(0x01);
            bytes.extend_from_slice(&(c as u32).to_be_bytes());
        },
        KeyCode::F(n) => {
            bytes.push(0x02);
            bytes.push(n);
        },
        KeyCode::Backspace => bytes.push(0x10),
        KeyCode::Enter => bytes.push(0x11),
        KeyCode::Left => bytes.push(0x12),
        KeyCode::Right => bytes.push(0x13),
        KeyCode::Up => bytes.push(0x14),
        KeyCode::Down => bytes.push(0x15),
        KeyCode::Home => bytes.push(0x16),
        KeyCode::End => bytes.push(0x17),
        KeyCode::PageUp => bytes.push(0x18),
        KeyCode::PageDown => bytes.push(0x19),
        KeyCode::Tab => bytes.push(0x1A),
        KeyCode::BackTab => bytes.push(0x1B),
        KeyCode::Delete => bytes.push(0x1C),
        KeyCode::Insert => bytes.push(0x1D),
        KeyCode::Null => bytes.push(0x1E),
        KeyCode::Esc => bytes.push(0x1F),
        code => {
            // Keys the mapping syntax never produces still need a distinct encoding; their
            // Debug form is unique per key and contains no NUL to collide with the terminator.
            bytes.push(0xFE);
            bytes.extend_from_slice(format!("{code:?}").as_bytes());
            bytes.push(0x00);
        },
    }
}

/// Tracks and resolves the key remappings for each editing mode.
///
/// Mutation and resolution are synchronous; nothing here suspends or performs I/O. Writers must
/// be serialized if a [KeyMap] is shared across threads.
#[derive(Default)]
pub struct KeyMap {
    tables: HashMap<KeyRemapMode, Trie<KeyInputSet, Mapping>>,
}

impl KeyMap {
    /// Create an empty set of mapping tables.
    pub fn new() -> Self {
        KeyMap::default()
    }

    fn add_mapping(&mut self, lhs: &str, rhs: &str, mode: KeyRemapMode, allow_remap: bool) -> bool {
        let Ok(lhs) = lhs.parse::<KeyInputSet>() else {
            return false;
        };
        let Ok(rhs) = rhs.parse::<KeyInputSet>() else {
            return false;
        };

        debug!(?mode, %lhs, %rhs, allow_remap, "registering key mapping");

        let mapping = Mapping { lhs: lhs.clone(), rhs, allow_remap, mode };

        self.tables.entry(mode).or_insert_with(Trie::new).insert(lhs, mapping);

        return true;
    }

    /// Register a rule whose right-hand side is emitted literally (`:noremap`).
    ///
    /// Returns false without mutating the table when either side parses to an empty sequence.
    /// Re-registering an existing left-hand side replaces the previous rule.
    pub fn map_no_remap(&mut self, lhs: &str, rhs: &str, mode: KeyRemapMode) -> bool {
        self.add_mapping(lhs, rhs, mode, false)
    }

    /// Register a rule whose right-hand side is rescanned for further mappings (`:map`).
    ///
    /// Same constraints as [KeyMap::map_no_remap].
    pub fn map_remap(&mut self, lhs: &str, rhs: &str, mode: KeyRemapMode) -> bool {
        self.add_mapping(lhs, rhs, mode, true)
    }

    /// Remove the rule whose left-hand side equals the parsed text.
    ///
    /// Returns false when no such rule exists.
    pub fn unmap(&mut self, lhs: &str, mode: KeyRemapMode) -> bool {
        let Ok(lhs) = lhs.parse::<KeyInputSet>() else {
            return false;
        };
        let Some(table) = self.tables.get_mut(&mode) else {
            return false;
        };

        table.remove(&lhs).is_some()
    }

    /// Remove the rule whose right-hand side equals the parsed text.
    ///
    /// This looks up by value: a rule is only removed when its replacement matches, even if
    /// some rule's left-hand side happens to equal the text.
    pub fn unmap_by_mapping(&mut self, rhs: &str, mode: KeyRemapMode) -> bool {
        let Ok(rhs) = rhs.parse::<KeyInputSet>() else {
            return false;
        };
        let Some(table) = self.tables.get_mut(&mode) else {
            return false;
        };

        let lhs = table.values().find(|m| m.rhs == rhs).map(|m| m.lhs.clone());

        match lhs {
            Some(lhs) => table.remove(&lhs).is_some(),
            None => false,
        }
    }

    /// Drop every rule registered for one mode, leaving other modes untouched.
    pub fn clear(&mut self, mode: KeyRemapMode) {
        debug!(?mode, "clearing key mappings");

        self.tables.remove(&mode);
    }

    /// Drop every rule in every mode.
    pub fn clear_all(&mut self) {
        debug!("clearing all key mappings");

        self.tables.clear();
    }

    /// Iterate over the rules registered for a mode, for `:map`-style listings.
    pub fn mappings(&self, mode: KeyRemapMode) -> impl Iterator<Item = &Mapping> {
        self.tables.get(&mode).into_iter().flat_map(|t| t.values())
    }

    /// Resolve a key sequence, yielding its fully flattened expansion.
    ///
    /// Inputs that do not resolve to a replacement (no rule applies, more input is needed, or
    /// expansion recurses) yield the input unchanged. The returned iterator is finite, and can
    /// be restarted by cloning it.
    pub fn get_key_mapping(
        &self,
        input: &KeyInputSet,
        mode: KeyRemapMode,
    ) -> std::vec::IntoIter<KeyInput> {
        match self.get_key_mapping_result(input, mode) {
            KeyMappingResult::Mapped(keys) => keys.into_iter(),
            _ => input.clone().into_iter(),
        }
    }

    /// Resolve a key sequence to a structured [KeyMappingResult].
    pub fn get_key_mapping_result(
        &self,
        input: &KeyInputSet,
        mode: KeyRemapMode,
    ) -> KeyMappingResult {
        if input.is_empty() {
            return KeyMappingResult::NoMapping;
        }

        let Some(table) = self.tables.get(&mode) else {
            return KeyMappingResult::NoMapping;
        };

        // More input could still extend into a longer rule.
        if has_longer_match(table, input) {
            return KeyMappingResult::NeedsMoreInput;
        }

        let Some(node) = table.get_ancestor(input) else {
            return KeyMappingResult::NoMapping;
        };
        let (Some(lhs), Some(mapping)) = (node.key(), node.value()) else {
            return KeyMappingResult::NoMapping;
        };

        let mut stack = HashSet::new();

        match expand(table, mapping, &mut stack) {
            Some(mut keys) => {
                // The unconsumed tail is appended as-is; it is not rescanned here.
                keys.extend(input.keys()[lhs.len()..].iter().copied());

                KeyMappingResult::Mapped(KeyInputSet::from(keys))
            },
            None => KeyMappingResult::Recursive,
        }
    }
}

fn has_longer_match(table: &Trie<KeyInputSet, Mapping>, input: &KeyInputSet) -> bool {
    table
        .get_raw_descendant(input)
        .map(|sub| sub.keys().any(|k| k.len() > input.len()))
        .unwrap_or(false)
}

fn longest_match<'a>(
    table: &'a Trie<KeyInputSet, Mapping>,
    tail: &KeyInputSet,
) -> Option<&'a Mapping> {
    table.get_ancestor(tail).and_then(|node| node.value())
}

// Flatten one rule. `stack` holds the left-hand sides currently being expanded: reaching one of
// them again through a different rule is a cycle. The rule's own left-hand side is instead
// skipped while scanning its right-hand side, which is what keeps rules like "j" -> "gj" from
// re-triggering themselves.
fn expand(
    table: &Trie<KeyInputSet, Mapping>,
    mapping: &Mapping,
    stack: &mut HashSet<KeyInputSet>,
) -> Option<Vec<KeyInput>> {
    if stack.contains(mapping.lhs()) {
        return None;
    }

    if !mapping.allow_remap {
        return Some(mapping.rhs().keys().to_vec());
    }

    stack.insert(mapping.lhs().clone());

    let rhs = mapping.rhs().keys();
    let mut out = Vec::with_capacity(rhs.len());
    let mut i = 0;

    while i < rhs.len() {
        let tail = KeyInputSet::from(rhs[i..].to_vec());

        match longest_match(table, &tail) {
            Some(sub) if sub.lhs() != mapping.lhs() => {
                out.extend(expand(table, sub, stack)?);
                i += sub.lhs().len();
            },
            _ => {
                out.push(rhs[i]);
                i += 1;
            },
        }
    }

    stack.remove(mapping.lhs());

    return Some(out);
}
