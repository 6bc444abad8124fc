//! Age/skill category model.
//!
//! A category is the registration class a participant competes in
//! (e.g. "J15", "Gutter 12", "female age-15", "Menn Senior"). The engine
//! only needs two facts about it: an age used for tiering and ordering,
//! and an optional gender used to keep track heats separated.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Age assigned to senior and open categories.
pub const SENIOR_AGE: u8 = 99;

/// Age assigned to recruit categories without an explicit age.
pub const RECRUIT_AGE: u8 = 10;

/// Gender of a category, when the name reveals one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

/// A competition category.
///
/// Identity is the registered name; `age` and `gender` are derived from it
/// by [`Category::parse`] or set explicitly with [`Category::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    /// Category name as registered.
    pub name: String,
    /// Nominal age (lower = younger). Seniors use [`SENIOR_AGE`].
    pub age: u8,
    /// Gender, if known.
    pub gender: Option<Gender>,
}

impl Category {
    /// Creates a category with an explicit age and gender.
    pub fn new(name: impl Into<String>, age: u8, gender: Option<Gender>) -> Self {
        Self {
            name: name.into(),
            age,
            gender,
        }
    }

    /// Parses a category name.
    ///
    /// Recognizes Norwegian class codes (`J15`, `G-Rekrutt`, `Jenter 18/19`,
    /// `Kvinner Senior`) and English forms (`female age-15`, `boys 12`,
    /// `W35`, `U13`). Returns `None` when no age can be derived.
    pub fn parse(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lower = trimmed.to_lowercase();
        let age = parse_age(&lower)?;
        Some(Self {
            name: trimmed.to_string(),
            age,
            gender: parse_gender(&lower),
        })
    }

    /// Whether this is a senior/open category.
    pub fn is_senior(&self) -> bool {
        self.age == SENIOR_AGE
    }
}

fn parse_age(lower: &str) -> Option<u8> {
    let digits: String = lower
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if let Ok(age) = digits.parse::<u8>() {
        return Some(age);
    }
    if lower.contains("rekrutt") || lower.contains("recruit") {
        return Some(RECRUIT_AGE);
    }
    if lower.contains("senior") || lower.contains("open") {
        return Some(SENIOR_AGE);
    }
    None
}

fn parse_gender(lower: &str) -> Option<Gender> {
    const FEMALE_WORDS: [&str; 7] = ["female", "women", "woman", "girl", "jenter", "kvinner", "ladies"];
    const MALE_WORDS: [&str; 6] = ["male", "men", "boy", "gutter", "menn", "man"];

    // "female"/"women" contain "male"/"men", so female words are checked first.
    if FEMALE_WORDS.iter().any(|w| lower.contains(w)) {
        return Some(Gender::Female);
    }
    if MALE_WORDS.iter().any(|w| lower.contains(w)) {
        return Some(Gender::Male);
    }

    let mut chars = lower.chars();
    let prefix = chars.next()?;
    let next = chars.next();
    let is_code = matches!(next, Some(c) if c.is_ascii_digit() || c == '-' || c == ' ');
    if !is_code {
        return None;
    }
    match prefix {
        'j' | 'k' | 'f' | 'w' => Some(Gender::Female),
        'g' | 'm' | 'b' => Some(Gender::Male),
        _ => None,
    }
}

impl PartialOrd for Category {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Category {
    /// Youngest first, then by name.
    fn cmp(&self, other: &Self) -> Ordering {
        self.age
            .cmp(&other.age)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
