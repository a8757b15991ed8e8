// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::Table;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Distinct non-empty values of `field_key`, collated, then narrowed to the
/// ones containing `filter` (case-insensitive). An empty table or an
/// unmatched filter yields an empty list.
///
/// Other selections never narrow the list.
pub fn options(table: &Table, field_key: &str, filter: &str) -> Vec<String> {
    let distinct: BTreeSet<&str> = table
        .values(field_key)
        .filter(|value| !value.is_empty())
        .collect();

    let mut values: Vec<String> = distinct.into_iter().map(str::to_owned).collect();
    values.sort_by(|left, right| locale_compare(left, right));

    values.retain(|value| matches_filter(value, filter));
    values
}

/// Case-insensitive substring test used by the option filter.
pub fn matches_filter(value: &str, filter: &str) -> bool {
    filter.is_empty() || value.to_lowercase().contains(&filter.to_lowercase())
}

/// Multi-level comparison: base letters, then accents, then case (lowercase
/// first). Raw code points break the last tie so the order is total.
pub fn locale_compare(left: &str, right: &str) -> Ordering {
    CollationKey::new(left)
        .cmp(&CollationKey::new(right))
        .then_with(|| left.cmp(right))
}

/// Root-locale order of punctuation and symbols. Anything not listed sorts
/// after these by code point.
const VARIABLE_ORDER: &[char] = &[
    '_', '-', '\u{2013}', '\u{2014}', ',', ';', ':', '!', '\u{a1}', '?', '\u{bf}', '.',
    '\u{2026}', '\u{b7}', '\'', '\u{2018}', '\u{2019}', '"', '\u{201c}', '\u{201d}',
    '\u{ab}', '\u{bb}', '(', ')', '[', ']', '{', '}', '\u{a7}', '\u{b6}', '@', '*', '/',
    '\\', '&', '#', '%', '\u{2030}', '\u{2020}', '\u{2021}', '\u{2022}', '`', '\u{b4}',
    '^', '\u{a8}', '\u{b0}', '\u{a9}', '\u{ae}', '+', '\u{b1}', '\u{f7}', '\u{d7}', '<',
    '=', '>', '\u{ac}', '|', '\u{a6}', '~', '\u{a4}', '\u{a2}', '$', '\u{a3}', '\u{a5}',
    '\u{20ac}',
];

fn variable_weight(ch: char) -> u32 {
    match VARIABLE_ORDER.iter().position(|listed| *listed == ch) {
        Some(index) => index as u32,
        None => VARIABLE_ORDER.len() as u32 + u32::from(ch),
    }
}

#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
struct CollationKey {
    primary: Vec<(CharClass, u32)>,
    secondary: Vec<u32>,
    tertiary: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Space,
    Punctuation,
    Digit,
    Letter,
    Other,
}

impl CharClass {
    fn of(ch: char) -> Self {
        if ch.is_whitespace() {
            Self::Space
        } else if ch.is_ascii_punctuation() || (!ch.is_alphanumeric() && !ch.is_control()) {
            Self::Punctuation
        } else if ch.is_numeric() {
            Self::Digit
        } else if ch.is_alphabetic() {
            Self::Letter
        } else {
            Self::Other
        }
    }
}

impl CollationKey {
    fn new(value: &str) -> Self {
        let mut key = Self::default();
        for ch in value.nfd() {
            if is_combining_mark(ch) {
                if let Some(last) = key.secondary.last_mut() {
                    *last = last.wrapping_add(u32::from(ch));
                }
                continue;
            }

            let class = CharClass::of(ch);
            if class == CharClass::Punctuation {
                key.primary.push((class, variable_weight(ch)));
            } else {
                for folded in ch.to_lowercase() {
                    key.primary.push((class, u32::from(folded)));
                }
            }
            key.secondary.push(0);
            key.tertiary.push(u8::from(ch.is_uppercase()));
        }
        key
    }
}
