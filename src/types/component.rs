//! Argument component and relation types.
//!
//! The type and relation enumerations are closed: free-form strings from
//! the reasoning engine are validated against them at the port boundary
//! (see [`crate::pipeline::parse`]) so nothing downstream ever does string
//! matching.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of argumentative component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Claim,
    Evidence,
    Conclusion,
    Counterclaim,
    Background,
    Method,
    Result,
    Limitation,
}

impl ComponentType {
    /// All variants, in wire order.
    pub const ALL: [ComponentType; 8] = [
        Self::Claim,
        Self::Evidence,
        Self::Conclusion,
        Self::Counterclaim,
        Self::Background,
        Self::Method,
        Self::Result,
        Self::Limitation,
    ];

    /// Wire spelling (capitalized, e.g. `"Claim"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claim => "Claim",
            Self::Evidence => "Evidence",
            Self::Conclusion => "Conclusion",
            Self::Counterclaim => "Counterclaim",
            Self::Background => "Background",
            Self::Method => "Method",
            Self::Result => "Result",
            Self::Limitation => "Limitation",
        }
    }

    /// Single-letter prefix used in component ids (e.g. `P3-C1`).
    ///
    /// Claim, Conclusion and Counterclaim share 'C'; the identity
    /// assigner resolves any resulting id collision.
    pub fn id_prefix(&self) -> char {
        match self {
            Self::Claim | Self::Conclusion | Self::Counterclaim => 'C',
            Self::Evidence => 'E',
            Self::Background => 'B',
            Self::Method => 'M',
            Self::Result => 'R',
            Self::Limitation => 'L',
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Kind of logical relation between two components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    SupportedBy,
    ContradictedBy,
    LeadsTo,
    Elaborates,
    Addresses,
    ComparesTo,
    BuildsOn,
    Motivates,
    Demonstrates,
}

impl RelationType {
    /// All variants, in wire order.
    pub const ALL: [RelationType; 9] = [
        Self::SupportedBy,
        Self::ContradictedBy,
        Self::LeadsTo,
        Self::Elaborates,
        Self::Addresses,
        Self::ComparesTo,
        Self::BuildsOn,
        Self::Motivates,
        Self::Demonstrates,
    ];

    /// Wire spelling (snake_case, e.g. `"supported_by"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SupportedBy => "supported_by",
            Self::ContradictedBy => "contradicted_by",
            Self::LeadsTo => "leads_to",
            Self::Elaborates => "elaborates",
            Self::Addresses => "addresses",
            Self::ComparesTo => "compares_to",
            Self::BuildsOn => "builds_on",
            Self::Motivates => "motivates",
            Self::Demonstrates => "demonstrates",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// A string that is not a member of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

/// An argumentative component extracted from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentComponent {
    /// Globally unique identifier (e.g. `P3-C1`)
    pub id: String,

    /// Component kind
    #[serde(rename = "type")]
    pub kind: ComponentType,

    /// Verbatim text span, non-empty
    pub text: String,

    /// 1-based page the span was found on
    pub page: u32,
}

impl ArgumentComponent {
    /// Create a new component.
    pub fn new(
        id: impl Into<String>,
        kind: ComponentType,
        text: impl Into<String>,
        page: u32,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            text: text.into(),
            page,
        }
    }
}

/// A typed logical relation between two components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentRelation {
    /// Id of the source component
    pub source: String,

    /// Id of the target component
    pub target: String,

    /// Relation kind
    pub relation: RelationType,

    /// Page at which the relation was asserted; may differ from either
    /// endpoint's page for cross-chunk relations
    pub page: u32,
}

impl ArgumentRelation {
    /// Create a new relation.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation: RelationType,
        page: u32,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation,
            page,
        }
    }

    /// The (source, target, relation) identity used for deduplication.
    pub fn key(&self) -> (&str, &str, RelationType) {
        (&self.source, &self.target, self.relation)
    }
}
