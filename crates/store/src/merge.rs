//! Reconciling a fresh search with a previously recorded one
//!
//! Searches executed at different times against a live backend may return
//! partial, incrementally growing result sets. The fixture accumulates the
//! union across recording sessions rather than flickering between whichever
//! run was recorded last.

use reprise_core::Search;
use tracing::error;

/// Outcome of reconciling a fresh search against the stored state
#[derive(Debug)]
pub struct Reconciled {
    /// The search record that should be on disk after this call
    pub search: Search,
    /// Whether the fixture file must be (re)written
    pub must_persist: bool,
}

/// Reconcile a freshly executed search with whatever was stored at its
/// fixture location.
///
/// - No stored search: persist the new one unconditionally.
/// - Stored search with a different key: a hash collision between two
///   distinct search signatures. Logged at error level with both keys'
///   readable forms, then the newer search replaces the unrelated one.
/// - Equal keys: union the result links (never removing any); persist only
///   when the union differs from what was stored.
pub fn reconcile(new: Search, stored: Option<Search>) -> Reconciled {
    let Some(mut stored) = stored else {
        return Reconciled {
            search: new,
            must_persist: true,
        };
    };

    if stored.key() != new.key() {
        error!(
            target: "reprise::store",
            "Have two incompatible searches that reduce to the same hash:"
        );
        error!(target: "reprise::store", key = %new.key(), "This search");
        error!(target: "reprise::store", key = %stored.key(), "Previously recorded search");
        return Reconciled {
            search: new,
            must_persist: true,
        };
    }

    match stored.merge(&new) {
        Ok(changed) => Reconciled {
            search: stored,
            must_persist: changed,
        },
        // Equal keys imply equal entity types, so the stored record itself
        // is inconsistent. Favor the fresh search.
        Err(e) => {
            error!(target: "reprise::store", error = %e, "Stored search is inconsistent, replacing it");
            Reconciled {
                search: new,
                must_persist: true,
            }
        }
    }
}
