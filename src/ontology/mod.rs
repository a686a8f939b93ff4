//! Sensor ontology for AgriQuery
//!
//! Maps free-text sensor names in Persian and English onto canonical
//! sensor identifiers, carries display names and units for response
//! assembly, and groups sensors under UI feature contexts. The builtin
//! catalog is validated at construction: a synonym appearing under two
//! different sensors is a configuration bug and fails startup.
//!
//! Runtime synonym learning is optional and disabled by default; learned
//! entries go through the same collision validation as builtin ones and
//! never overwrite a canonical identifier.

mod catalog;
pub mod normalize;


use std::collections::HashMap;

use parking_lot::RwLock;

use crate::core::config::OntologyConfig;
use crate::core::error::OntologyError;
use crate::core::types::Language;

use catalog::{CATALOG, CONTEXTS};
pub use normalize::{fold_digits, fold_text};

/// One canonical sensor with its resolved synonym sets
#[derive(Debug, Clone)]
pub struct OntologyEntry {
    /// Canonical sensor identifier
    pub id: String,

    /// Display name for English responses
    pub display_en: String,

    /// Display name for Persian responses
    pub display_fa: String,

    /// Unit string for responses and chart axes
    pub unit: String,

    /// Feature context this sensor belongs to, if any
    pub context: Option<String>,
}

/// A match produced by scanning free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntity {
    /// Canonical sensor identifier
    pub id: String,

    /// The synonym that matched, in folded form
    pub matched: String,
}

/// Read-mostly sensor ontology. Safe for unsynchronized concurrent reads;
/// the learned-synonym map is the only mutable part and sits behind a
/// write lock.
pub struct Ontology {
    entries: HashMap<String, OntologyEntry>,
    synonyms: HashMap<String, String>,
    learned: RwLock<HashMap<String, String>>,
    contexts: HashMap<String, Vec<String>>,
    max_synonym_words: usize,
    config: OntologyConfig,
}

impl Ontology {
    /// Build the ontology from the builtin catalog, failing fast on any
    /// synonym collision.
    pub fn from_builtin(config: OntologyConfig) -> Result<Self, OntologyError> {
        let mut entries = HashMap::new();
        let mut synonyms: HashMap<String, String> = HashMap::new();
        let mut max_synonym_words = 1;

        for row in CATALOG {
            entries.insert(
                row.id.to_string(),
                OntologyEntry {
                    id: row.id.to_string(),
                    display_en: row.display_en.to_string(),
                    display_fa: row.display_fa.to_string(),
                    unit: row.unit.to_string(),
                    context: row.context.map(str::to_string),
                },
            );

            for term in row.english.iter().chain(row.persian.iter()) {
                let folded = fold_text(term);
                if folded.is_empty() {
                    continue;
                }
                max_synonym_words = max_synonym_words.max(folded.split(' ').count());
                if let Some(existing) = synonyms.get(&folded) {
                    if existing != row.id {
                        return Err(OntologyError::SynonymCollision {
                            synonym: folded,
                            first: existing.clone(),
                            second: row.id.to_string(),
                        });
                    }
                    continue;
                }
                synonyms.insert(folded, row.id.to_string());
            }
        }

        let contexts = CONTEXTS
            .iter()
            .map(|(name, members)| {
                (
                    name.to_string(),
                    members.iter().map(|m| m.to_string()).collect(),
                )
            })
            .collect();

        Ok(Self {
            entries,
            synonyms,
            learned: RwLock::new(HashMap::new()),
            contexts,
            max_synonym_words,
            config,
        })
    }

    /// Case-insensitive, language-agnostic lookup of one token or phrase.
    pub fn resolve_entity(&self, token: &str) -> Option<String> {
        let folded = fold_text(token);
        if folded.is_empty() {
            return None;
        }
        if let Some(id) = self.synonyms.get(&folded) {
            return Some(id.clone());
        }
        self.learned.read().get(&folded).cloned()
    }

    /// Scan free text for sensor synonyms. Longer synonyms win over
    /// shorter ones; at equal length the leftmost occurrence wins.
    pub fn resolve_in_text(&self, text: &str) -> Option<ResolvedEntity> {
        let folded = fold_text(text);
        if folded.is_empty() {
            return None;
        }
        let words: Vec<&str> = folded.split(' ').collect();
        let learned = self.learned.read();

        for window in (1..=self.max_synonym_words.min(words.len())).rev() {
            for start in 0..=(words.len() - window) {
                let candidate = words[start..start + window].join(" ");
                let hit = self
                    .synonyms
                    .get(&candidate)
                    .or_else(|| learned.get(&candidate));
                if let Some(id) = hit {
                    return Some(ResolvedEntity {
                        id: id.clone(),
                        matched: candidate,
                    });
                }
            }
        }
        None
    }

    /// Sensors allowed under a feature context, in priority order.
    /// Returns `None` for `dashboard` and unknown contexts, both of
    /// which are unrestricted.
    pub fn feature_context_entities(&self, context: &str) -> Option<&[String]> {
        if context == "dashboard" {
            return None;
        }
        match self.contexts.get(context) {
            Some(members) => Some(members.as_slice()),
            None => {
                if !context.is_empty() {
                    tracing::debug!(context, "unknown feature context, treating as unrestricted");
                }
                None
            }
        }
    }

    /// Default entity for a feature context (its first member).
    pub fn context_default(&self, context: &str) -> Option<&str> {
        self.feature_context_entities(context)
            .and_then(|members| members.first())
            .map(String::as_str)
    }

    /// Whether the identifier is a canonical sensor id.
    pub fn is_known_sensor(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Unit string for a canonical sensor.
    pub fn unit(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(|e| e.unit.as_str())
    }

    /// Localized display name for a canonical sensor.
    pub fn display_name(&self, id: &str, lang: Language) -> Option<&str> {
        self.entries.get(id).map(|e| match lang {
            Language::En => e.display_en.as_str(),
            Language::Fa => e.display_fa.as_str(),
        })
    }

    /// Entry metadata for a canonical sensor.
    pub fn entry(&self, id: &str) -> Option<&OntologyEntry> {
        self.entries.get(id)
    }

    /// All canonical sensor identifiers.
    pub fn sensor_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Accept a learned synonym after validation. The canonical id must
    /// already exist, the folded synonym must be non-empty and within the
    /// configured length, and it must not collide with any existing
    /// synonym.
    pub fn learn_synonym(&self, synonym: &str, canonical: &str) -> Result<(), OntologyError> {
        if !self.config.enable_synonym_learning {
            return Err(OntologyError::LearningDisabled);
        }
        if !self.entries.contains_key(canonical) {
            return Err(OntologyError::UnknownSensor {
                token: canonical.to_string(),
            });
        }

        let folded = fold_text(synonym);
        if folded.is_empty() {
            return Err(OntologyError::LearningRejected {
                reason: "synonym is empty after normalization".to_string(),
            });
        }
        if folded.chars().count() > self.config.max_synonym_length {
            return Err(OntologyError::LearningRejected {
                reason: format!(
                    "synonym exceeds {} characters",
                    self.config.max_synonym_length
                ),
            });
        }
        if let Some(existing) = self.synonyms.get(&folded) {
            if existing == canonical {
                return Ok(());
            }
            return Err(OntologyError::LearningRejected {
                reason: format!("synonym already maps to {existing}"),
            });
        }

        // max_synonym_words is sized at construction; a learned synonym
        // longer than any catalog term would be unreachable from
        // resolve_in_text.
        if folded.split(' ').count() > self.max_synonym_words {
            return Err(OntologyError::LearningRejected {
                reason: "synonym has more words than any catalog term".to_string(),
            });
        }

        let mut learned = self.learned.write();
        if let Some(existing) = learned.get(&folded) {
            if existing == canonical {
                return Ok(());
            }
            return Err(OntologyError::LearningRejected {
                reason: format!("synonym already learned for {existing}"),
            });
        }
        learned.insert(folded.clone(), canonical.to_string());
        drop(learned);

        tracing::info!(synonym = %folded, canonical, "learned sensor synonym");
        Ok(())
    }

    /// Number of learned synonyms currently accepted.
    pub fn learned_count(&self) -> usize {
        self.learned.read().len()
    }
}

impl std::fmt::Debug for Ontology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ontology")
            .field("sensors", &self.entries.len())
            .field("synonyms", &self.synonyms.len())
            .field("learned", &self.learned.read().len())
            .finish()
    }
}
