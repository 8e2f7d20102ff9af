//! Keyword classification of user requests.
//!
//! The result is a display label only. Which tool actually ran is reported
//! by the collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;

const PAYMENT_TERMS: &[&str] = &["pay", "refund", "transfer"];
const SEARCH_TERMS: &[&str] = &["document", "docs", "search", "policy", "policies"];

/// Coarse kind of operation a request is expected to trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Lookup,
    Payment,
    Search,
}

impl OperationKind {
    /// Name of the backend tool this kind of request usually invokes
    pub fn tool_label(&self) -> &'static str {
        match self {
            OperationKind::Lookup => "get_customer",
            OperationKind::Payment => "initiate_payment",
            OperationKind::Search => "search_documents",
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        match self {
            OperationKind::Payment => RiskLevel::High,
            OperationKind::Lookup | OperationKind::Search => RiskLevel::Low,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationKind::Lookup => "lookup",
            OperationKind::Payment => "payment",
            OperationKind::Search => "search",
        };
        f.write_str(s)
    }
}

/// Risk attached to a tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Risk for a reported tool name. Unknown tools are `Medium`.
pub fn risk_for_tool(tool_name: &str) -> RiskLevel {
    [
        OperationKind::Lookup,
        OperationKind::Payment,
        OperationKind::Search,
    ]
    .into_iter()
    .find(|kind| kind.tool_label() == tool_name)
    .map(|kind| kind.risk_level())
    .unwrap_or(RiskLevel::Medium)
}

/// Classify free text into an [`OperationKind`].
///
/// Case-insensitive. Payment terms win over search terms; anything else is a
/// lookup. A term matches anywhere in the text, so "repayment" and
/// "prepaid" count as payments.
///
/// ```
/// use flowgate_core::{classify, OperationKind};
///
/// assert_eq!(classify("Initiate a payment of $15000 to Bob"), OperationKind::Payment);
/// assert_eq!(classify("Search for documents about security"), OperationKind::Search);
/// assert_eq!(classify("Get customer information for Alice"), OperationKind::Lookup);
/// ```
pub fn classify(text: &str) -> OperationKind {
    let lowered = text.to_lowercase();
    let mentions = |terms: &[&str]| terms.iter().any(|term| lowered.contains(term));

    if mentions(PAYMENT_TERMS) {
        OperationKind::Payment
    } else if mentions(SEARCH_TERMS) {
        OperationKind::Search
    } else {
        OperationKind::Lookup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_reference_inputs() {
        let cases = [
            ("Initiate a payment of $15000 to Bob", OperationKind::Payment),
            ("Search for documents about security", OperationKind::Search),
            ("Get customer information for Alice", OperationKind::Lookup),
            ("Get customer information for Charlie", OperationKind::Lookup),
        ];

        for (input, expected) in cases {
            assert_eq!(classify(input), expected, "Failed for {:?}", input);
        }
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("REFUND my order"), OperationKind::Payment);
        assert_eq!(classify("Show me the Travel POLICY"), OperationKind::Search);
    }

    #[test]
    fn test_classify_matches_word_prefixes() {
        assert_eq!(classify("list recent payments"), OperationKind::Payment);
        assert_eq!(classify("was it refunded?"), OperationKind::Payment);
        assert_eq!(classify("find the docs"), OperationKind::Search);
        assert_eq!(classify("security policies"), OperationKind::Search);
    }

    #[test]
    fn test_classify_matches_inside_words() {
        assert_eq!(classify("Schedule a repayment for Bob"), OperationKind::Payment);
        assert_eq!(classify("Is the card prepaid?"), OperationKind::Payment);
        assert_eq!(classify("Open the research docs"), OperationKind::Search);
    }

    #[test]
    fn test_payment_wins_over_search() {
        assert_eq!(
            classify("search documents then pay the invoice"),
            OperationKind::Payment
        );
    }

    #[test]
    fn test_empty_input_is_lookup() {
        assert_eq!(classify(""), OperationKind::Lookup);
        assert_eq!(classify("   "), OperationKind::Lookup);
    }

    #[test]
    fn test_tool_labels_and_risk() {
        assert_eq!(OperationKind::Lookup.tool_label(), "get_customer");
        assert_eq!(OperationKind::Payment.tool_label(), "initiate_payment");
        assert_eq!(OperationKind::Search.tool_label(), "search_documents");

        assert_eq!(OperationKind::Payment.risk_level(), RiskLevel::High);
        assert_eq!(OperationKind::Search.risk_level(), RiskLevel::Low);
    }

    #[test]
    fn test_risk_for_tool() {
        assert_eq!(risk_for_tool("initiate_payment"), RiskLevel::High);
        assert_eq!(risk_for_tool("get_customer"), RiskLevel::Low);
        assert_eq!(risk_for_tool("delete_everything"), RiskLevel::Medium);
    }

    #[test]
    fn test_display() {
        assert_eq!(OperationKind::Search.to_string(), "search");
        assert_eq!(RiskLevel::Critical.to_string(), "critical");
    }
}
