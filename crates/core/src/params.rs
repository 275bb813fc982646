//! Search parameter values
//!
//! This module defines the canonical value model for search parameters:
//! - ParamValue: a single typed scalar
//! - ParamTerm: the shape of one named parameter (scalar or multi-valued)
//!
//! ## Type Rules
//!
//! - No implicit coercions: `Int(9) != Float(9.0)` - different types are
//!   NEVER equal, and they never hash alike. The runtime type of a scalar is
//!   part of a search's identity.
//! - Float equality follows IEEE-754: `NaN != NaN`, `-0.0 == 0.0`.
//! - A multi-valued parameter is an unordered bag: `[a, b]` and `[b, a]` are
//!   the same term.
//! - `Single(x)` and `Many([x])` are different shapes and never equal.
//!
//! Every value contributes a 64-bit token to the search key hash. Tokens are
//! combined by XOR only, so any iteration order produces the same hash. The
//! token is computed with xxh3 over a canonical byte form, which keeps it
//! stable across processes - a recording run and a playback run must agree
//! on every fixture file name.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

/// A single typed scalar in a search parameter map
///
/// Different variants are never equal, even when they render the same:
/// `Int(9)`, `Float(9.0)` and `Str("9")` are three distinct search terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParamValue {
    /// An explicitly supplied null (still a present parameter)
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    Str(String),
}

// Custom PartialEq implementation for IEEE-754 float semantics
impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamValue::Null, ParamValue::Null) => true,
            (ParamValue::Bool(a), ParamValue::Bool(b)) => a == b,
            (ParamValue::Int(a), ParamValue::Int(b)) => a == b,
            // IEEE-754: NaN != NaN, -0.0 == 0.0
            (ParamValue::Float(a), ParamValue::Float(b)) => a == b,
            (ParamValue::Str(a), ParamValue::Str(b)) => a == b,
            // Different types are NEVER equal
            _ => false,
        }
    }
}

impl ParamValue {
    /// Stable name of this value's runtime type, hashed into the search key
    pub fn type_tag(&self) -> &'static str {
        match self {
            ParamValue::Null => "Null",
            ParamValue::Bool(_) => "Bool",
            ParamValue::Int(_) => "Int",
            ParamValue::Float(_) => "Float",
            ParamValue::Str(_) => "Str",
        }
    }

    /// The value's contribution to a search key hash.
    ///
    /// `xxh3(type tag) ^ xxh3(canonical bytes)`, so that equal values agree
    /// and values differing only in runtime type do not. Numeric bytes are
    /// little-endian; floats hash their IEEE-754 bit pattern.
    pub fn hash_token(&self) -> u64 {
        let value_hash = match self {
            ParamValue::Null => xxh3_64(&[]),
            ParamValue::Bool(b) => xxh3_64(&[u8::from(*b)]),
            ParamValue::Int(i) => xxh3_64(&i.to_le_bytes()),
            ParamValue::Float(f) => xxh3_64(&f.to_bits().to_le_bytes()),
            ParamValue::Str(s) => xxh3_64(s.as_bytes()),
        };
        xxh3_64(self.type_tag().as_bytes()) ^ value_hash
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Null => write!(f, "null"),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// The shape of one named search parameter
///
/// Collections and arrays supplied by the caller both normalize to `Many`;
/// scalars stay `Single` and are never wrapped. The shape itself is part of
/// a search's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParamTerm {
    /// A single scalar value
    Single(ParamValue),
    /// An unordered bag of values
    Many(Vec<ParamValue>),
}

impl ParamTerm {
    /// Build a multi-valued term from anything iterable
    pub fn many<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        ParamTerm::Many(values.into_iter().map(Into::into).collect())
    }

    /// Whether this term is multi-valued
    pub fn is_many(&self) -> bool {
        matches!(self, ParamTerm::Many(_))
    }

    /// The term's contribution to a search key hash.
    ///
    /// XOR over the value tokens, so the order of values in a `Many` term
    /// never affects the hash.
    pub fn hash_token(&self) -> u64 {
        match self {
            ParamTerm::Single(v) => v.hash_token(),
            ParamTerm::Many(vs) => vs.iter().fold(0u64, |h, v| h ^ v.hash_token()),
        }
    }
}

impl PartialEq for ParamTerm {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamTerm::Single(a), ParamTerm::Single(b)) => a == b,
            (ParamTerm::Many(a), ParamTerm::Many(b)) => {
                // Order must not matter: equal cardinality plus containment
                // both ways.
                a.len() == b.len()
                    && a.iter().all(|v| b.contains(v))
                    && b.iter().all(|v| a.contains(v))
            }
            // A scalar and a one-element collection are different shapes.
            _ => false,
        }
    }
}

impl std::fmt::Display for ParamTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamTerm::Single(v) => write!(f, "{v}"),
            ParamTerm::Many(vs) => {
                let joined: Vec<String> = vs.iter().map(ToString::to_string).collect();
                write!(f, "{}", joined.join(","))
            }
        }
    }
}

impl From<ParamValue> for ParamTerm {
    fn from(v: ParamValue) -> Self {
        ParamTerm::Single(v)
    }
}

impl From<bool> for ParamTerm {
    fn from(v: bool) -> Self {
        ParamTerm::Single(v.into())
    }
}

impl From<i64> for ParamTerm {
    fn from(v: i64) -> Self {
        ParamTerm::Single(v.into())
    }
}

impl From<i32> for ParamTerm {
    fn from(v: i32) -> Self {
        ParamTerm::Single(v.into())
    }
}

impl From<f64> for ParamTerm {
    fn from(v: f64) -> Self {
        ParamTerm::Single(v.into())
    }
}

impl From<&str> for ParamTerm {
    fn from(v: &str) -> Self {
        ParamTerm::Single(v.into())
    }
}

impl From<String> for ParamTerm {
    fn from(v: String) -> Self {
        ParamTerm::Single(v.into())
    }
}

impl From<Vec<ParamValue>> for ParamTerm {
    fn from(vs: Vec<ParamValue>) -> Self {
        ParamTerm::Many(vs)
    }
}

impl From<&[ParamValue]> for ParamTerm {
    fn from(vs: &[ParamValue]) -> Self {
        ParamTerm::Many(vs.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================
    // ParamValue Tests
    // ========================================

    #[test]
    fn test_value_type_distinction() {
        assert_ne!(ParamValue::Int(9), ParamValue::Float(9.0));
        assert_ne!(ParamValue::Int(9), ParamValue::Str("9".to_string()));
        assert_ne!(ParamValue::Bool(true), ParamValue::Int(1));
        assert_ne!(ParamValue::Null, ParamValue::Str(String::new()));
    }

    #[test]
    fn test_value_float_ieee754() {
        assert_ne!(ParamValue::Float(f64::NAN), ParamValue::Float(f64::NAN));
        assert_eq!(ParamValue::Float(-0.0), ParamValue::Float(0.0));
    }

    #[test]
    fn test_value_hash_token_type_aware() {
        assert_ne!(
            ParamValue::Int(9).hash_token(),
            ParamValue::Float(9.0).hash_token()
        );
        assert_ne!(
            ParamValue::Int(9).hash_token(),
            ParamValue::Str("9".to_string()).hash_token()
        );
    }

    #[test]
    fn test_value_hash_token_deterministic() {
        // The token must be a pure function of the value: both sides of a
        // record/playback pair recompute it independently.
        assert_eq!(
            ParamValue::Str("qwerty".to_string()).hash_token(),
            ParamValue::Str("qwerty".to_string()).hash_token()
        );
        assert_eq!(ParamValue::Int(67).hash_token(), ParamValue::Int(67).hash_token());
    }

    #[test]
    fn test_value_from_conversions() {
        assert_eq!(ParamValue::from(9i64), ParamValue::Int(9));
        assert_eq!(ParamValue::from(9i32), ParamValue::Int(9));
        assert_eq!(ParamValue::from("abc"), ParamValue::Str("abc".to_string()));
        assert_eq!(ParamValue::from(true), ParamValue::Bool(true));
        assert_eq!(ParamValue::from(1.5), ParamValue::Float(1.5));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(ParamValue::Int(9).to_string(), "9");
        assert_eq!(ParamValue::Str("abc".to_string()).to_string(), "abc");
        assert_eq!(ParamValue::Null.to_string(), "null");
    }

    // ========================================
    // ParamTerm Tests
    // ========================================

    #[test]
    fn test_term_many_order_insensitive() {
        let a = ParamTerm::many(["x", "y", "z"]);
        let b = ParamTerm::many(["z", "x", "y"]);
        assert_eq!(a, b);
        assert_eq!(a.hash_token(), b.hash_token());
    }

    #[test]
    fn test_term_many_cardinality_matters() {
        let a = ParamTerm::many(["x", "y"]);
        let b = ParamTerm::many(["x", "y", "y"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_term_many_containment_both_ways() {
        // Same length, overlapping but not identical bags.
        let a = ParamTerm::many(["x", "x", "y"]);
        let b = ParamTerm::many(["x", "y", "z"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_term_shape_matters() {
        let single = ParamTerm::from("x");
        let many = ParamTerm::many(["x"]);
        assert_ne!(single, many);
    }

    #[test]
    fn test_term_empty_many_equal() {
        let a = ParamTerm::Many(vec![]);
        let b = ParamTerm::Many(vec![]);
        assert_eq!(a, b);
        assert_eq!(a.hash_token(), b.hash_token());
    }

    #[test]
    fn test_term_display() {
        assert_eq!(ParamTerm::many(["a", "b"]).to_string(), "a,b");
        assert_eq!(ParamTerm::from(9i64).to_string(), "9");
    }

    #[test]
    fn test_term_serde_round_trip() {
        let term = ParamTerm::many([ParamValue::Int(1), ParamValue::Str("two".to_string())]);
        let json = serde_json::to_string(&term).unwrap();
        let back: ParamTerm = serde_json::from_str(&json).unwrap();
        assert_eq!(term, back);
    }
}
