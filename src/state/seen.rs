use crate::asset::resolve_identity;
use std::collections::HashSet;

/// Run-wide record of every reference and identity already harvested
///
/// Seeded from the history file at startup and only ever grown afterwards.
/// The orchestrator owns it and lends it to each category crawl, so
/// discoveries de-duplicate across categories as well as across runs.
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    references: HashSet<String>,
    identities: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a previously persisted reference and its identity, if it has one
    pub fn insert_persisted(&mut self, reference: &str) {
        if let Some(identity) = resolve_identity(reference) {
            self.identities.insert(identity);
        }
        self.references.insert(reference.to_string());
    }

    pub fn contains_reference(&self, reference: &str) -> bool {
        self.references.contains(reference)
    }

    pub fn contains_identity(&self, identity: &str) -> bool {
        self.identities.contains(identity)
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    pub fn identity_count(&self) -> usize {
        self.identities.len()
    }

    pub fn identities(&self) -> &HashSet<String> {
        &self.identities
    }

    fn insert(&mut self, reference: &str, identity: Option<&str>) {
        self.references.insert(reference.to_string());
        if let Some(identity) = identity {
            self.identities.insert(identity.to_string());
        }
    }
}

/// References and identities accepted during the current category only
#[derive(Debug, Clone, Default)]
pub struct SessionSet {
    references: HashSet<String>,
    identities: HashSet<String>,
}

impl SessionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// Outcome of checking one candidate against the seen sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// New reference with no known identity: record it
    Accept,
    /// Empty reference string
    Empty,
    /// Exact reference recorded in history or an earlier category
    SeenReference,
    /// Exact reference already accepted in this category
    SessionReference,
    /// Same asset (other encoding) recorded in history or an earlier category
    SeenIdentity,
    /// Same asset (other encoding) already accepted in this category
    SessionIdentity,
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Empty => "empty",
            Self::SeenReference => "seen_reference",
            Self::SessionReference => "session_reference",
            Self::SeenIdentity => "seen_identity",
            Self::SessionIdentity => "session_identity",
        }
    }
}

/// Decides whether a candidate may be recorded
///
/// Checks run in a fixed order and the first match wins. A candidate without
/// an identity is only protected by exact-reference matching.
pub fn evaluate_candidate(
    seen: &SeenSet,
    session: &SessionSet,
    reference: &str,
    identity: Option<&str>,
) -> Verdict {
    if reference.is_empty() {
        return Verdict::Empty;
    }
    if seen.contains_reference(reference) {
        return Verdict::SeenReference;
    }
    if session.references.contains(reference) {
        return Verdict::SessionReference;
    }
    if let Some(identity) = identity {
        if seen.contains_identity(identity) {
            return Verdict::SeenIdentity;
        }
        if session.identities.contains(identity) {
            return Verdict::SessionIdentity;
        }
    }
    Verdict::Accept
}

/// Marks an accepted candidate in both the run-wide and category sets
pub fn record_candidate(
    seen: &mut SeenSet,
    session: &mut SessionSet,
    reference: &str,
    identity: Option<&str>,
) {
    seen.insert(reference, identity);
    session.references.insert(reference.to_string());
    if let Some(identity) = identity {
        session.identities.insert(identity.to_string());
    }
}
