//! # Menu Catalog Module
//!
//! Static catalog of selectable plants ("subjects") and the greeting/reset
//! literals that bring a user back to the menu.
//!
//! ## Features
//!
//! - Alias selector tokens: several literals (e.g. ASCII and Bengali digits) may select one subject
//! - Case-normalized lookup with whitespace and punctuation clean-up
//! - Menu rendering de-duplicated by subject identity, in declaration order

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

lazy_static! {
    static ref WHITESPACE_REGEX: Regex =
        Regex::new(r"\s+").expect("Whitespace pattern should be valid");
}

/// Greeting and reset literals, English and Bengali
pub const DEFAULT_RESET_TOKENS: &[&str] = &[
    "hi", "hello", "menu", "start", "/start", "/menu", "হাই", "হ্যালো", "মেনু", "শুরু",
];

/// A selectable disease-prediction category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Input literals selecting this subject; the first one is canonical
    pub selector_tokens: Vec<String>,
    /// Name shown to users
    pub display_name: String,
    /// Key sent to the inference gateway as `plant_type`
    pub key: String,
}

impl Subject {
    pub fn new(tokens: &[&str], display_name: &str, key: &str) -> Self {
        Self {
            selector_tokens: tokens.iter().map(|t| t.to_string()).collect(),
            display_name: display_name.to_string(),
            key: key.to_string(),
        }
    }

    /// Token listed in the menu
    pub fn canonical_token(&self) -> &str {
        self.selector_tokens
            .first()
            .map(String::as_str)
            .unwrap_or(self.key.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Selector token '{token}' is claimed by both '{first}' and '{second}'")]
    DuplicateToken {
        token: String,
        first: String,
        second: String,
    },
    #[error("Subject key '{0}' is declared twice")]
    DuplicateKey(String),
    #[error("Subject '{0}' has no selector tokens")]
    NoTokens(String),
}

/// Catalog of subjects plus the reset literal set
#[derive(Debug, Clone)]
pub struct MenuCatalog {
    subjects: Vec<Subject>,
    /// Normalized token -> index into `subjects`
    index: HashMap<String, usize>,
    reset_tokens: HashSet<String>,
}

impl MenuCatalog {
    /// Build a catalog, validating token uniqueness across all subjects
    pub fn new(subjects: Vec<Subject>, reset_tokens: &[&str]) -> Result<Self, CatalogError> {
        let mut index = HashMap::new();
        let mut keys = HashSet::new();

        for (position, subject) in subjects.iter().enumerate() {
            if subject.selector_tokens.is_empty() {
                return Err(CatalogError::NoTokens(subject.key.clone()));
            }
            if !keys.insert(subject.key.clone()) {
                return Err(CatalogError::DuplicateKey(subject.key.clone()));
            }
            for token in &subject.selector_tokens {
                let normalized = normalize_input(token);
                match index.get(&normalized) {
                    // Same literal listed twice on one subject is harmless
                    Some(&existing) if existing == position => {}
                    Some(&existing) => {
                        let first: &Subject = &subjects[existing];
                        return Err(CatalogError::DuplicateToken {
                            token: normalized,
                            first: first.key.clone(),
                            second: subject.key.clone(),
                        });
                    }
                    None => {
                        index.insert(normalized, position);
                    }
                }
            }
        }

        let reset_tokens = reset_tokens.iter().map(|t| normalize_input(t)).collect();

        debug!(
            "Menu catalog built with {} subjects and {} selector tokens",
            subjects.len(),
            index.len()
        );

        Ok(Self {
            subjects,
            index,
            reset_tokens,
        })
    }

    /// Resolve a user token to a subject
    pub fn resolve(&self, token: &str) -> Option<&Subject> {
        self.index
            .get(&normalize_input(token))
            .map(|&position| &self.subjects[position])
    }

    pub fn subject_by_key(&self, key: &str) -> Option<&Subject> {
        self.subjects.iter().find(|subject| subject.key == key)
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Whether the text is one of the greeting/reset literals
    pub fn is_reset_token(&self, text: &str) -> bool {
        self.reset_tokens.contains(&normalize_input(text))
    }

    /// One line per subject, canonical token only, in declaration order
    pub fn render_menu(&self) -> String {
        self.render_menu_with(|subject| subject.display_name.clone())
    }

    /// Same listing with a caller-chosen name per subject (e.g. localized)
    pub fn render_menu_with<F>(&self, name_of: F) -> String
    where
        F: Fn(&Subject) -> String,
    {
        // Iterating subjects rather than tokens keeps aliases out of the listing
        self.subjects
            .iter()
            .map(|subject| format!("{}. {}", subject.canonical_token(), name_of(subject)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for MenuCatalog {
    /// The plants served by the disease models
    fn default() -> Self {
        let subjects = vec![
            Subject::new(&["1", "১"], "Corn", "corn"),
            Subject::new(&["2", "২"], "Cotton", "cotton"),
            Subject::new(&["3", "৩"], "Rice", "rice"),
            Subject::new(&["4", "৪"], "Tea", "tea"),
            Subject::new(&["5", "৫"], "Tomato", "tomato"),
            Subject::new(&["6", "৬"], "Mango", "mango"),
            Subject::new(&["7", "৭"], "Potato", "potato"),
        ];

        Self::new(subjects, DEFAULT_RESET_TOKENS)
            .unwrap_or_else(|e| unreachable!("built-in catalog is valid: {e}"))
    }
}

/// Normalize free-form user input for matching
///
/// Trims, lowercases, collapses internal whitespace, strips surrounding
/// sentence punctuation and a trailing `@botname` on commands.
pub fn normalize_input(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let collapsed = WHITESPACE_REGEX.replace_all(&lowered, " ");
    let stripped = collapsed
        .trim_matches(|c: char| matches!(c, '!' | '.' | '?' | '।'))
        .trim();

    if stripped.starts_with('/') {
        if let Some((command, _bot_name)) = stripped.split_once('@') {
            return command.to_string();
        }
    }

    stripped.to_string()
}
