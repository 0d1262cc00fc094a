//! # keymap
//!
//! ## Overview
//!
//! This crate provides the key-remapping half of a modal editor's input layer: value types
//! describing keypresses and sequences of keypresses, a parser for the `<...>` syntax used when
//! writing mappings as text, and a per-mode table ([KeyMap][remap::KeyMap]) that resolves typed
//! input into its remapped expansion the way `:map` and `:noremap` rules behave.
//!
//! Resolution is synchronous and allocation-bounded: there is no I/O, no blocking, and cycles in
//! recursive mappings are detected and reported rather than followed.
//!
//! ## Example
//!
//! ```
//! use keymap::remap::{KeyMap, KeyMappingResult, KeyRemapMode};
//!
//! let mut map = KeyMap::new();
//!
//! assert!(map.map_no_remap("aa", "foo", KeyRemapMode::Normal));
//! assert!(map.map_no_remap("aaa", "bar", KeyRemapMode::Normal));
//!
//! // "aa" could still become "aaa", so the caller needs to type more keys.
//! let input = "aa".parse().unwrap();
//! let res = map.get_key_mapping_result(&input, KeyRemapMode::Normal);
//! assert_eq!(res, KeyMappingResult::NeedsMoreInput);
//!
//! // "aab" can only be the shorter rule plus a trailing "b".
//! let input = "aab".parse().unwrap();
//! let res = map.get_key_mapping_result(&input, KeyRemapMode::Normal);
//! assert_eq!(res, KeyMappingResult::Mapped("foob".parse().unwrap()));
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

#[macro_use]
mod util;

pub mod key;
pub mod remap;
