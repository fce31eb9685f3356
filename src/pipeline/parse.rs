//! Boundary validation of raw engine candidates.
//!
//! Free-form type and relation strings are checked against the closed
//! enumerations here, shape problems are dropped with a warning, and the
//! per-component out-degree cap is enforced. Nothing downstream of this
//! module sees an unvalidated string.
//!
//! Also provides JSON helpers for engine implementations that receive
//! free-text replies with a JSON array embedded somewhere inside.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::error::{ExtractionError, Result};
use crate::traits::engine::{RawComponent, RawRelation};
use crate::types::component::{ComponentType, RelationType};

/// A component candidate that passed shape validation.
///
/// Not yet in the graph: the identity assigner gives it an id and the
/// assembler deduplicates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateComponent {
    pub kind: ComponentType,
    pub text: String,
    pub page: u32,
}

/// A relation candidate that passed shape and reference validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRelation {
    pub source: String,
    pub target: String,
    pub relation: RelationType,
    pub confidence: Option<f32>,
}

/// Validate raw components against the chunk's page range.
///
/// Returns the surviving candidates in response order plus the number of
/// dropped ones. Drops are never fatal to the chunk.
pub fn validate_components(
    raw: Vec<RawComponent>,
    page_range: (u32, u32),
) -> (Vec<CandidateComponent>, usize) {
    let mut accepted = Vec::with_capacity(raw.len());
    let mut dropped = 0;

    for (i, candidate) in raw.into_iter().enumerate() {
        let Some(kind_str) = candidate.kind.as_deref() else {
            warn!(index = i, "component candidate missing type, dropped");
            dropped += 1;
            continue;
        };
        let Ok(kind) = kind_str.parse::<ComponentType>() else {
            warn!(index = i, kind = kind_str, "component type outside enumeration, dropped");
            dropped += 1;
            continue;
        };
        let text = match candidate.text {
            Some(t) if !t.trim().is_empty() => t,
            _ => {
                warn!(index = i, "component candidate with missing or empty text, dropped");
                dropped += 1;
                continue;
            }
        };
        let Some(page) = candidate.page else {
            warn!(index = i, "component candidate missing page, dropped");
            dropped += 1;
            continue;
        };
        if page < page_range.0 || page > page_range.1 {
            warn!(
                index = i,
                page,
                range = ?page_range,
                "component page outside chunk range, dropped"
            );
            dropped += 1;
            continue;
        }

        accepted.push(CandidateComponent { kind, text, page });
    }

    (accepted, dropped)
}

/// Validate raw relations against the visible component set and enforce
/// the per-source out-degree cap.
///
/// When a source component would exceed `max_out_degree`, the lowest-
/// confidence excess edges are dropped; on equal confidence, insertion
/// order wins (first kept). Unscored edges rank below scored ones.
pub fn validate_relations(
    raw: Vec<RawRelation>,
    visible: &HashSet<&str>,
    max_out_degree: usize,
) -> (Vec<CandidateRelation>, usize) {
    let mut accepted: Vec<CandidateRelation> = Vec::with_capacity(raw.len());
    let mut dropped = 0;

    for (i, candidate) in raw.into_iter().enumerate() {
        let (Some(source), Some(target), Some(relation_str)) =
            (candidate.source, candidate.target, candidate.relation)
        else {
            warn!(index = i, "relation candidate missing field, dropped");
            dropped += 1;
            continue;
        };
        let Ok(relation) = relation_str.parse::<RelationType>() else {
            warn!(index = i, relation = relation_str, "relation type outside enumeration, dropped");
            dropped += 1;
            continue;
        };
        if !visible.contains(source.as_str()) {
            warn!(index = i, source = %source, "relation source not visible, dropped");
            dropped += 1;
            continue;
        }
        if !visible.contains(target.as_str()) {
            warn!(index = i, target = %target, "relation target not visible, dropped");
            dropped += 1;
            continue;
        }

        accepted.push(CandidateRelation {
            source,
            target,
            relation,
            confidence: candidate.confidence,
        });
    }

    let capped = cap_out_degree(accepted, max_out_degree, &mut dropped);
    (capped, dropped)
}

/// Keep at most `max_out_degree` edges per source component.
fn cap_out_degree(
    relations: Vec<CandidateRelation>,
    max_out_degree: usize,
    dropped: &mut usize,
) -> Vec<CandidateRelation> {
    let mut by_source: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, rel) in relations.iter().enumerate() {
        by_source.entry(rel.source.as_str()).or_default().push(i);
    }

    let mut keep = vec![true; relations.len()];
    for indices in by_source.values() {
        if indices.len() <= max_out_degree {
            continue;
        }
        // Highest confidence first; stable sort so earlier insertion wins ties.
        let mut ranked = indices.clone();
        ranked.sort_by(|&a, &b| {
            let ca = relations[a].confidence.unwrap_or(0.0);
            let cb = relations[b].confidence.unwrap_or(0.0);
            cb.partial_cmp(&ca).unwrap_or(std::cmp::Ordering::Equal)
        });
        for &i in &ranked[max_out_degree..] {
            keep[i] = false;
            *dropped += 1;
            warn!(
                source = %relations[i].source,
                target = %relations[i].target,
                "out-degree cap exceeded, relation dropped"
            );
        }
    }

    relations
        .into_iter()
        .enumerate()
        .filter_map(|(i, rel)| keep[i].then_some(rel))
        .collect()
}

/// Locate the JSON array inside a free-text engine reply.
///
/// Tries the whole reply first, then the widest bracketed span.
pub fn extract_json_array(text: &str) -> Result<Vec<serde_json::Value>> {
    static JSON_ARRAY: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("static regex"));

    if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(text) {
        return Ok(values);
    }

    let array = JSON_ARRAY
        .find(text)
        .ok_or_else(|| ExtractionError::MalformedResponse("no JSON array in reply".to_string()))?;

    serde_json::from_str(array.as_str())
        .map_err(|e| ExtractionError::MalformedResponse(format!("bad JSON array: {e}")))
}

/// Parse a free-text reply into raw component candidates.
///
/// Elements that fail to deserialize are dropped individually so one bad
/// object does not poison the response.
pub fn parse_component_response(text: &str) -> Result<Vec<RawComponent>> {
    Ok(lenient_elements(extract_json_array(text)?))
}

/// Parse a free-text reply into raw relation candidates.
pub fn parse_relation_response(text: &str) -> Result<Vec<RawRelation>> {
    Ok(lenient_elements(extract_json_array(text)?))
}

fn lenient_elements<T: serde::de::DeserializeOwned>(values: Vec<serde_json::Value>) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|v| match serde_json::from_value(v) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!(error = %e, "undeserializable response element, dropped");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_drops() {
        let raw = vec![
            RawComponent::new("Claim", "valid claim", 1),
            RawComponent {
                kind: None,
                text: Some("no type".into()),
                page: Some(1),
            },
            RawComponent::new("Claim", "   ", 1),
            RawComponent {
                kind: Some("Claim".into()),
                text: Some("no page".into()),
                page: None,
            },
        ];

        let (accepted, dropped) = validate_components(raw, (1, 3));
        assert_eq!(accepted.len(), 1);
        assert_eq!(dropped, 3);
        assert_eq!(accepted[0].kind, ComponentType::Claim);
    }

    #[test]
    fn test_type_outside_enumeration_dropped() {
        let raw = vec![
            RawComponent::new("EVIDENCE", "shouted", 1),
            RawComponent::new("Evidence", "fine", 1),
        ];
        let (accepted, dropped) = validate_components(raw, (1, 1));
        assert_eq!(accepted.len(), 1);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_page_outside_range_dropped() {
        let raw = vec![
            RawComponent::new("Claim", "in range", 4),
            RawComponent::new("Claim", "before", 2),
            RawComponent::new("Claim", "after", 7),
        ];
        let (accepted, dropped) = validate_components(raw, (3, 5));
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].page, 4);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn test_relation_reference_validation() {
        let visible: HashSet<&str> = ["P1-C1", "P1-E1"].into();
        let raw = vec![
            RawRelation::new("P1-E1", "P1-C1", "supported_by"),
            RawRelation::new("P1-X9", "P1-C1", "supported_by"),
            RawRelation::new("P1-E1", "P1-X9", "leads_to"),
            RawRelation::new("P1-E1", "P1-C1", "supports"),
        ];

        let (accepted, dropped) = validate_relations(raw, &visible, 10);
        assert_eq!(accepted.len(), 1);
        assert_eq!(dropped, 3);
        assert_eq!(accepted[0].relation, RelationType::SupportedBy);
    }

    #[test]
    fn test_out_degree_cap_drops_lowest_confidence() {
        let visible: HashSet<&str> = ["A", "B", "C", "D"].into();
        let raw = vec![
            RawRelation::new("A", "B", "leads_to").with_confidence(0.4),
            RawRelation::new("A", "C", "leads_to").with_confidence(0.9),
            RawRelation::new("A", "D", "leads_to").with_confidence(0.7),
        ];

        let (accepted, dropped) = validate_relations(raw, &visible, 2);
        assert_eq!(dropped, 1);
        let targets: Vec<&str> = accepted.iter().map(|r| r.target.as_str()).collect();
        // Survivors keep response order; the 0.4 edge loses.
        assert_eq!(targets, ["C", "D"]);
    }

    #[test]
    fn test_out_degree_cap_ties_keep_first() {
        let visible: HashSet<&str> = ["A", "B", "C", "D"].into();
        let raw = vec![
            RawRelation::new("A", "B", "leads_to"),
            RawRelation::new("A", "C", "leads_to"),
            RawRelation::new("A", "D", "leads_to"),
        ];

        let (accepted, dropped) = validate_relations(raw, &visible, 2);
        assert_eq!(dropped, 1);
        let targets: Vec<&str> = accepted.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, ["B", "C"]);
    }

    #[test]
    fn test_extract_json_array_from_prose() {
        let reply = r#"Here is my analysis:
        [{"type": "Claim", "text": "We argue X", "page": 1}]
        Hope that helps!"#;

        let raw = parse_component_response(reply).unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].kind.as_deref(), Some("Claim"));
    }

    #[test]
    fn test_no_array_is_malformed() {
        let err = parse_component_response("I could not find any components.").unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedResponse(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_bad_element_dropped_not_fatal() {
        let reply = r#"[
            {"type": "Claim", "text": "good", "page": 1},
            {"type": "Claim", "text": "bad page", "page": "one"}
        ]"#;
        let raw = parse_component_response(reply).unwrap();
        assert_eq!(raw.len(), 1);
    }
}
