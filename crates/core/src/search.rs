//! Search identity and the persisted search record
//!
//! A search's identity is its target entity type plus its canonicalized
//! parameter map. Identity is independent of the order parameters were
//! supplied, of the order of values inside a multi-valued parameter, and of
//! whether a multi-valued parameter arrived as an array or a list. It is
//! NOT independent of scalar runtime types: `Int(9)` and `Float(9.0)` are
//! different searches.
//!
//! The hash is an XOR-fold, not a sequence-sensitive fold, so it is
//! order-independent by construction and always consistent with equality.
//! Fixture file names are derived from the hash alone, which makes them
//! intentionally lossy: two different searches can collide on a name, and
//! the store detects that instead of ignoring it.

use crate::error::{FixtureError, Result};
use crate::link::Link;
use crate::params::ParamTerm;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use xxhash_rust::xxh3::xxh3_64;

/// Canonicalized, order-independent identity of a search
///
/// Immutable after construction. Serialized into the search fixture next to
/// the results so a stored search can be checked against the one being
/// executed (hash collisions must be detected, not silently absorbed).
///
/// # Examples
///
/// ```
/// use reprise_core::SearchKey;
///
/// let a = SearchKey::build([("name", "Bob"), ("state", "done")], "Sample");
/// let b = SearchKey::build([("state", "done"), ("name", "Bob")], "Sample");
///
/// assert_eq!(a, b);
/// assert_eq!(a.key_hash(), b.key_hash());
/// assert_eq!(a.file_name(), format!("search_{:x}.xml", a.key_hash()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchKey {
    /// The type being searched for
    entity_type: String,
    /// Parameter name to canonicalized term
    terms: HashMap<String, ParamTerm>,
}

impl SearchKey {
    /// Build a key from a raw parameter map and the target entity type.
    ///
    /// Values convert through [`ParamTerm`]: collections and arrays become
    /// multi-valued terms, scalars stay scalar.
    pub fn build<I, K, V>(params: I, entity_type: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamTerm>,
    {
        SearchKey {
            entity_type: entity_type.into(),
            terms: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The type being searched for
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// The canonicalized parameter terms
    pub fn terms(&self) -> &HashMap<String, ParamTerm> {
        &self.terms
    }

    /// Order-independent 64-bit hash of this key.
    ///
    /// `xxh3(entity type)`, XORed with `xxh3(name)` and every value's token
    /// for each parameter. XOR is commutative and associative, so iteration
    /// order cannot leak into the result, and equal keys always agree. The
    /// underlying hash is seed-free xxh3: a playback process reproduces the
    /// recording process's file names exactly.
    pub fn key_hash(&self) -> u64 {
        let mut hash = xxh3_64(self.entity_type.as_bytes());
        for (name, term) in &self.terms {
            hash ^= xxh3_64(name.as_bytes());
            hash ^= term.hash_token();
        }
        hash
    }

    /// File name of this search's fixture: `search_{hex(hash)}.xml`
    pub fn file_name(&self) -> String {
        format!("search_{:x}.xml", self.key_hash())
    }
}

impl PartialEq for SearchKey {
    fn eq(&self, other: &Self) -> bool {
        if self.entity_type != other.entity_type || self.terms.len() != other.terms.len() {
            return false;
        }
        // Name sets must match exactly; a parameter present with a null or
        // empty value is still present, and never equal to an absent one.
        self.terms.iter().all(|(name, term)| {
            other
                .terms
                .get(name)
                .is_some_and(|other_term| term == other_term)
        })
    }
}

impl std::hash::Hash for SearchKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.key_hash());
    }
}

impl std::fmt::Display for SearchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SearchKey[entity={}", self.entity_type)?;
        // Sort for a stable, diffable rendering in collision logs.
        let mut names: Vec<&String> = self.terms.keys().collect();
        names.sort();
        for name in names {
            write!(f, ", {}={}", name, self.terms[name])?;
        }
        write!(f, "]")
    }
}

/// A persisted search: the key plus the links it returned
///
/// Created in record mode each time a find-like call completes, and loaded
/// read-only in playback mode. `results` distinguishes "never completed /
/// unknown" (`None`) from "completed with zero links" (`Some(vec![])`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Search {
    key: SearchKey,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    results: Option<Vec<Link>>,
}

impl Search {
    /// Create a search record with no results yet
    pub fn new(key: SearchKey) -> Self {
        Search { key, results: None }
    }

    /// Create a search record with its results
    pub fn with_results(key: SearchKey, results: Vec<Link>) -> Self {
        Search {
            key,
            results: Some(results),
        }
    }

    /// The search's key
    pub fn key(&self) -> &SearchKey {
        &self.key
    }

    /// The recorded result links, if any were recorded
    pub fn results(&self) -> Option<&[Link]> {
        self.results.as_deref()
    }

    /// Replace the result links
    pub fn set_results(&mut self, results: Vec<Link>) {
        self.results = Some(results);
    }

    /// File name of this search's fixture
    pub fn file_name(&self) -> String {
        self.key.file_name()
    }

    /// Merge another search's results into this one.
    ///
    /// Union by link identity (the locator URI), deduplicating. Links are
    /// only ever added: recorded knowledge grows, it never shrinks. Returns
    /// `true` when this search changed and its fixture therefore needs
    /// rewriting; merging in nothing new (including an empty or resultless
    /// `other`) is a no-op returning `false`.
    ///
    /// # Errors
    ///
    /// Two searches can only share results when they are for the same
    /// entity type; merging across types is an invariant violation.
    pub fn merge(&mut self, other: &Search) -> Result<bool> {
        if self.key.entity_type() != other.key.entity_type() {
            return Err(FixtureError::EntityTypeMismatch {
                ours: self.key.entity_type().to_string(),
                theirs: other.key.entity_type().to_string(),
            });
        }

        let Some(incoming) = other.results() else {
            return Ok(false);
        };
        if incoming.is_empty() {
            return Ok(false);
        }

        let mine = self.results.get_or_insert_with(Vec::new);
        let mut changed = false;
        for link in incoming {
            if !mine.iter().any(|known| known.same_entity(link)) {
                mine.push(link.clone());
                changed = true;
            }
        }
        Ok(changed)
    }
}

impl std::fmt::Display for Search {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Search[{}", self.key)?;
        if let Some(results) = &self.results {
            write!(f, ", #results={}", results.len())?;
        }
        write!(f, "]")
    }
}
