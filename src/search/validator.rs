//! Static safety check for generated graph queries.
//!
//! The graph store accepts writes as well as reads, and the query text comes
//! from an LLM rather than an operator. Before a query may run it has to pass
//! an ordered list of rules; the first failing rule decides the verdict.
//!
//! The allow-list shape (leading `MATCH`, a `RETURN` clause) is the primary
//! control. The keyword denylist is a second layer and matches on substrings
//! of the upper-cased text, so it also fires on identifiers such as
//! `p.offset` or `created_at`. Those false positives are accepted.

use std::fmt;

/// Read-entry keyword every query must start with.
const READ_ENTRY: &str = "MATCH";

/// Projection keyword every query must contain.
const PROJECTION: &str = "RETURN";

/// Mutating and administrative keywords, checked in this order.
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "CREATE", "MERGE", "DELETE", "DETACH", "DROP", "REMOVE", "SET", "CALL", "LOAD", "UNWIND",
    "FOREACH", "APOC", "GDS",
];

/// Allow/deny decision for one query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationVerdict {
    pub allowed: bool,
    pub reason: String,
}

impl ValidationVerdict {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: "query is a read-only match with a return clause".to_string(),
        }
    }

    fn reject(rejection: Rejection) -> Self {
        Self {
            allowed: false,
            reason: rejection.to_string(),
        }
    }
}

/// Why a query was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    MissingReadEntry { found: String },
    MissingProjection,
    ForbiddenKeyword(&'static str),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "query is empty"),
            Rejection::MissingReadEntry { found } => {
                write!(f, "query must start with {READ_ENTRY}, found `{found}`")
            }
            Rejection::MissingProjection => {
                write!(f, "query must contain a {PROJECTION} clause")
            }
            Rejection::ForbiddenKeyword(keyword) => {
                write!(f, "query contains forbidden keyword `{keyword}`")
            }
        }
    }
}

type Rule = fn(&str) -> Result<(), Rejection>;

/// Rules in evaluation order. Each receives the trimmed, upper-cased query.
const RULES: &[Rule] = &[starts_with_read_entry, contains_projection, no_forbidden_keyword];

/// Decide whether `query` may be executed against the graph store.
pub fn validate(query: &str) -> ValidationVerdict {
    let normalized = query.trim().to_uppercase();
    match RULES.iter().try_for_each(|rule| rule(normalized.as_str())) {
        Ok(()) => ValidationVerdict::allow(),
        Err(rejection) => ValidationVerdict::reject(rejection),
    }
}

fn starts_with_read_entry(query: &str) -> Result<(), Rejection> {
    let leading = query
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or_default();
    if query.is_empty() {
        Err(Rejection::Empty)
    } else if leading == READ_ENTRY {
        Ok(())
    } else {
        let found = if leading.is_empty() {
            query.chars().next().map(String::from).unwrap_or_default()
        } else {
            leading.to_string()
        };
        Err(Rejection::MissingReadEntry { found })
    }
}

fn contains_projection(query: &str) -> Result<(), Rejection> {
    if query.contains(PROJECTION) {
        Ok(())
    } else {
        Err(Rejection::MissingProjection)
    }
}

fn no_forbidden_keyword(query: &str) -> Result<(), Rejection> {
    match FORBIDDEN_KEYWORDS.iter().copied().find(|kw| query.contains(kw)) {
        Some(kw) => Err(Rejection::ForbiddenKeyword(kw)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_match_return() {
        let verdict = validate("MATCH (p:Product) WHERE p.brand = 'Nike' RETURN p");
        assert!(verdict.allowed, "{}", verdict.reason);
    }

    #[test]
    fn test_accepts_lowercase_and_padding() {
        let verdict = validate("  \n match (p:Product) where p.price <= 100 return p limit 10 ");
        assert!(verdict.allowed);
    }

    #[test]
    fn test_rejects_detach_delete() {
        let verdict = validate("MATCH (p) DETACH DELETE p RETURN p");
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason, "query contains forbidden keyword `DELETE`");
    }

    #[test]
    fn test_rejects_leading_create() {
        let verdict = validate("CREATE (p:Product) RETURN p");
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason, "query must start with MATCH, found `CREATE`");
    }

    #[test]
    fn test_rejects_return_without_match() {
        let verdict = validate("RETURN 1");
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason, "query must start with MATCH, found `RETURN`");
    }

    #[test]
    fn test_documented_rejections_have_distinct_reasons() {
        let reasons: Vec<String> = [
            "MATCH (p) DETACH DELETE p RETURN p",
            "CREATE (p:Product) RETURN p",
            "RETURN 1",
        ]
        .iter()
        .map(|q| validate(q).reason)
        .collect();
        assert_ne!(reasons[0], reasons[1]);
        assert_ne!(reasons[1], reasons[2]);
        assert_ne!(reasons[0], reasons[2]);
    }

    #[test]
    fn test_rejects_empty_and_whitespace() {
        assert_eq!(validate("").reason, "query is empty");
        assert_eq!(validate("   \t").reason, "query is empty");
    }

    #[test]
    fn test_rejects_match_without_return() {
        let verdict = validate("MATCH (p:Product) WHERE p.color = 'Red'");
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason, "query must contain a RETURN clause");
    }

    #[test]
    fn test_rejects_prefix_that_only_looks_like_match() {
        let verdict = validate("MATCHES (p) RETURN p");
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason, "query must start with MATCH, found `MATCHES`");
    }

    #[test]
    fn test_rejects_optional_match_lead() {
        assert!(!validate("OPTIONAL MATCH (p) RETURN p").allowed);
    }

    #[test]
    fn test_rejects_procedure_call() {
        let verdict = validate("MATCH (p) CALL apoc.do.it() RETURN p");
        assert_eq!(verdict.reason, "query contains forbidden keyword `CALL`");
    }

    #[test]
    fn test_rejects_set_property() {
        let verdict = validate("match (p) set p.price = 0 return p");
        assert_eq!(verdict.reason, "query contains forbidden keyword `SET`");
    }

    #[test]
    fn test_denylist_matches_inside_identifiers() {
        // `created_at` embeds CREATE; conservative by intent.
        let verdict = validate("MATCH (p) WHERE p.created_at > 0 RETURN p");
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason, "query contains forbidden keyword `CREATE`");
    }

    #[test]
    fn test_first_failing_rule_wins() {
        // Violates all three rules; only the leading-token reason is reported.
        let verdict = validate("DELETE everything");
        assert_eq!(verdict.reason, "query must start with MATCH, found `DELETE`");
    }

    #[test]
    fn test_punctuation_lead_reports_character() {
        let verdict = validate("(p) RETURN p");
        assert_eq!(verdict.reason, "query must start with MATCH, found `(`");
    }

    #[test]
    fn test_verdict_is_stable() {
        let q = "MATCH (p) MERGE (q) RETURN p";
        assert_eq!(validate(q), validate(q));
    }
}
