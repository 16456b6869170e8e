//! Schema-agnostic search filter.
//!
//! The collection has no fixed schema, so searchable fields are inferred
//! from one live sample document: every top-level string or numeric field
//! becomes a case-insensitive regex clause, OR-ed together.
//!
//! ```
//! use domain_data::search::{SearchFilter, sanitize};
//! use mongodb::bson::doc;
//!
//! let sample = doc! { "title": "Example", "id": 1 };
//! let filter = SearchFilter::from_sample(sanitize("exa"), Some(&sample));
//! assert!(filter.matches(&doc! { "title": "EXAMPLE", "id": 2 }));
//! ```

use crate::error::{DataError, DataResult};
use crate::repository::DataRepository;
use mongodb::bson::{Bson, Document, doc};
use regex::RegexBuilder;
use tracing::debug;

/// Reject queries starting with `*`: a pattern that is unanchored on the
/// left cannot use any prefix index, so every search would scan the collection.
pub fn validate(raw: &str) -> DataResult<()> {
    if raw.starts_with('*') {
        return Err(DataError::leading_wildcard());
    }
    Ok(())
}

/// Escape regex metacharacters, then turn each `*` into `.*`.
pub fn sanitize(raw: &str) -> String {
    raw.split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*")
}

/// Top-level keys of `sample` holding a string or a number, in document order.
pub fn searchable_fields(sample: &Document) -> Vec<String> {
    sample
        .iter()
        .filter(|(_, value)| {
            matches!(
                value,
                Bson::String(_) | Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)
            )
        })
        .map(|(key, _)| key.clone())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    MatchAll,
    /// Any of `fields` matches `pattern`, case-insensitively
    AnyField { fields: Vec<String>, pattern: String },
}

impl SearchFilter {
    /// Filter for an already-sanitized pattern. Falls back to match-all when
    /// there is no sample or it has no scalar fields.
    pub fn from_sample(pattern: String, sample: Option<&Document>) -> Self {
        let fields = sample.map(searchable_fields).unwrap_or_default();
        if fields.is_empty() {
            return SearchFilter::MatchAll;
        }
        SearchFilter::AnyField { fields, pattern }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, SearchFilter::MatchAll)
    }

    /// MongoDB filter: `{}` or `{$or: [{field: {$regex, $options: "i"}}, ...]}`.
    pub fn to_document(&self) -> Document {
        match self {
            SearchFilter::MatchAll => Document::new(),
            SearchFilter::AnyField { fields, pattern } => {
                let clauses: Vec<Bson> = fields
                    .iter()
                    .map(|field| {
                        let mut clause = Document::new();
                        clause.insert(
                            field.as_str(),
                            doc! { "$regex": pattern.as_str(), "$options": "i" },
                        );
                        Bson::Document(clause)
                    })
                    .collect();
                doc! { "$or": clauses }
            }
        }
    }

    /// In-process evaluation. As with MongoDB `$regex`, only string values
    /// can match.
    pub fn matches(&self, document: &Document) -> bool {
        let SearchFilter::AnyField { fields, pattern } = self else {
            return true;
        };
        let Ok(regex) = RegexBuilder::new(pattern).case_insensitive(true).build() else {
            return false;
        };
        fields.iter().any(|field| match document.get(field) {
            Some(Bson::String(value)) => regex.is_match(value),
            _ => false,
        })
    }
}

/// Validate and sanitize `raw`, then infer fields from a fresh sample.
///
/// Blank queries are match-all and skip the sample read.
pub async fn build_filter<R>(repository: &R, raw: &str) -> DataResult<SearchFilter>
where
    R: DataRepository + ?Sized,
{
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(SearchFilter::MatchAll);
    }
    validate(raw)?;

    let pattern = sanitize(raw);
    let sample = repository.sample().await?;
    let filter = SearchFilter::from_sample(pattern, sample.as_ref());
    debug!(query = raw, match_all = filter.is_match_all(), "Built search filter");
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockDataRepository;

    #[test]
    fn test_validate_rejects_leading_wildcard() {
        let err = validate("*abc").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Wildcard (*) cannot be the first character in search query"
        );
        assert!(validate("ab*c").is_ok());
        assert!(validate("abc*").is_ok());
    }

    #[test]
    fn test_sanitize_escapes_and_expands_wildcards() {
        assert_eq!(sanitize("a.b"), "a\\.b");
        assert_eq!(sanitize("sensor*"), "sensor.*");
        assert_eq!(sanitize("a*b*c"), "a.*b.*c");
        assert_eq!(sanitize("(x)+[y]?"), "\\(x\\)\\+\\[y\\]\\?");
        assert_eq!(sanitize("$^|"), "\\$\\^\\|");
    }

    #[test]
    fn test_searchable_fields_keep_scalars_only() {
        let sample = doc! {
            "_id": mongodb::bson::oid::ObjectId::new(),
            "title": "Example",
            "id": 1,
            "big": 5_000_000_000_i64,
            "score": 0.5,
            "active": true,
            "tags": ["a", "b"],
            "meta": { "k": "v" },
        };
        assert_eq!(searchable_fields(&sample), vec!["title", "id", "big", "score"]);
    }

    #[test]
    fn test_title_matched_case_insensitively_without_requiring_id() {
        let sample = doc! { "title": "Example", "id": 1 };
        let filter = SearchFilter::from_sample(sanitize("exa"), Some(&sample));

        assert_eq!(
            filter.to_document(),
            doc! {
                "$or": [
                    { "title": { "$regex": "exa", "$options": "i" } },
                    { "id": { "$regex": "exa", "$options": "i" } },
                ]
            }
        );
        assert!(filter.matches(&doc! { "title": "Example" }));
        assert!(filter.matches(&doc! { "title": "AN EXAMPLE", "id": 7 }));
        assert!(!filter.matches(&doc! { "title": "other", "id": 1 }));
    }

    #[test]
    fn test_regex_never_matches_numbers() {
        let sample = doc! { "id": 1 };
        let filter = SearchFilter::from_sample(sanitize("1"), Some(&sample));
        assert!(!filter.matches(&doc! { "id": 1 }));
        assert!(filter.matches(&doc! { "id": "1" }));
    }

    #[test]
    fn test_no_scalar_fields_is_match_all() {
        let sample = doc! { "nested": { "a": 1 }, "flag": false };
        let filter = SearchFilter::from_sample(sanitize("x"), Some(&sample));
        assert!(filter.is_match_all());
        assert!(filter.to_document().is_empty());
        assert!(SearchFilter::from_sample(sanitize("x"), None).is_match_all());
    }

    #[test]
    fn test_wildcard_pattern_matches_across_characters() {
        let sample = doc! { "name": "" };
        let filter = SearchFilter::from_sample(sanitize("tem*ture"), Some(&sample));
        assert!(filter.matches(&doc! { "name": "Temperature sensor" }));
        assert!(!filter.matches(&doc! { "name": "temp" }));
    }

    #[tokio::test]
    async fn test_build_filter_blank_query_skips_sample() {
        let mut repo = MockDataRepository::new();
        repo.expect_sample().never();

        assert!(build_filter(&repo, "   ").await.unwrap().is_match_all());
        assert!(build_filter(&repo, "").await.unwrap().is_match_all());
    }

    #[tokio::test]
    async fn test_build_filter_rejects_before_sampling() {
        let mut repo = MockDataRepository::new();
        repo.expect_sample().never();

        let err = build_filter(&repo, "*exa").await.unwrap_err();
        assert!(matches!(err, DataError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_build_filter_empty_collection_is_match_all() {
        let mut repo = MockDataRepository::new();
        repo.expect_sample().times(1).returning(|| Ok(None));

        assert!(build_filter(&repo, "exa").await.unwrap().is_match_all());
    }

    #[tokio::test]
    async fn test_build_filter_reads_sample_every_call() {
        let mut repo = MockDataRepository::new();
        repo.expect_sample()
            .times(2)
            .returning(|| Ok(Some(doc! { "title": "Example", "id": 1 })));

        for _ in 0..2 {
            let filter = build_filter(&repo, "exa").await.unwrap();
            assert!(!filter.is_match_all());
        }
    }
}
