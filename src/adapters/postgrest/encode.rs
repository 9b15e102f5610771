//! Query-string rendering for the PostgREST dialect.
//!
//! Top-level filters become `column=op.value` pairs. Filters nested in an
//! `or` group are rendered as `column.op.value` and joined by commas, so
//! values inside groups and `in` lists are double-quoted when they contain
//! a character PostgREST treats as syntax.
//!
//! PostgREST reads `*` in a `like`/`ilike` value as `%` and offers no escape
//! for it. A literal `*` goes out as `_`, which matches a superset, and the
//! caller narrows the result with [`Filter::matches`].

use crate::domain::models::query::value_text;
use crate::domain::models::{Direction, Filter, Query};

const RESERVED: &[char] = &[',', '(', ')', '.', ':', '"', ' ', '\\'];

/// Every query-string pair for a select.
pub fn query_pairs(query: &Query) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), query.select_clause())];
    pairs.extend(filter_pairs(&query.filters));
    if let Some(order) = &query.order {
        let direction = match order.direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        pairs.push(("order".to_string(), format!("{}.{direction}", order.column)));
    }
    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }
    pairs
}

/// Query-string pairs for a list of filters that must all hold.
pub fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
    filters.iter().map(filter_pair).collect()
}

fn filter_pair(filter: &Filter) -> (String, String) {
    match filter {
        Filter::Or(inner) => ("or".to_string(), format!("({})", group(inner))),
        Filter::Eq { column, value } => (column.clone(), format!("eq.{}", value_text(value))),
        Filter::Neq { column, value } => (column.clone(), format!("neq.{}", value_text(value))),
        Filter::ILike { column, pattern } => {
            (column.clone(), format!("ilike.{}", wire_pattern(pattern)))
        }
        Filter::Like { column, pattern } => {
            (column.clone(), format!("like.{}", wire_pattern(pattern)))
        }
        Filter::In { column, values } => (column.clone(), format!("in.({})", list(values))),
        Filter::IsNull { column } => (column.clone(), "is.null".to_string()),
    }
}

fn group(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(|filter| match filter {
            Filter::Or(inner) => format!("or({})", group(inner)),
            Filter::Eq { column, value } => format!("{column}.eq.{}", quote(&value_text(value))),
            Filter::Neq { column, value } => {
                format!("{column}.neq.{}", quote(&value_text(value)))
            }
            Filter::ILike { column, pattern } => {
                format!("{column}.ilike.{}", quote(&wire_pattern(pattern)))
            }
            Filter::Like { column, pattern } => {
                format!("{column}.like.{}", quote(&wire_pattern(pattern)))
            }
            Filter::In { column, values } => format!("{column}.in.({})", list(values)),
            Filter::IsNull { column } => format!("{column}.is.null"),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn list(values: &[serde_json::Value]) -> String {
    values
        .iter()
        .map(|v| quote(&value_text(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Pattern as sent, with every literal `*` widened to `_`.
fn wire_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '*' => out.push('_'),
            '\\' => match chars.next() {
                Some('*') => out.push('_'),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            c => out.push(c),
        }
    }
    out
}

/// Whether the backend may return rows that `filters` reject, because a
/// pattern holds a `*` that had to be widened.
pub fn needs_local_match(filters: &[Filter]) -> bool {
    filters.iter().any(|filter| match filter {
        Filter::ILike { pattern, .. } | Filter::Like { pattern, .. } => pattern.contains('*'),
        Filter::Or(inner) => needs_local_match(inner),
        _ => false,
    })
}

/// Double-quote a value if it contains reserved characters.
pub fn quote(raw: &str) -> String {
    if raw.is_empty() || raw.contains(RESERVED) {
        let escaped = raw.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Order;

    #[test]
    fn test_select_defaults_to_star() {
        assert_eq!(
            query_pairs(&Query::new()),
            vec![("select".to_string(), "*".to_string())]
        );
    }

    #[test]
    fn test_full_query() {
        let query = Query::new()
            .columns("id, name_en")
            .filter(Filter::eq("category", "liqueur"))
            .filter(Filter::is_null("subcategory"))
            .order(Order::desc("id"))
            .limit(5);
        let pairs = query_pairs(&query);
        assert_eq!(
            pairs,
            vec![
                ("select".into(), "id,name_en".into()),
                ("category".into(), "eq.liqueur".into()),
                ("subcategory".into(), "is.null".into()),
                ("order".into(), "id.desc".into()),
                ("limit".into(), "5".into()),
            ]
        );
    }

    #[test]
    fn test_in_list_quotes_reserved_values() {
        let (col, value) = filter_pair(&Filter::is_in("id", ["gin", "dry vermouth", "a,b"]));
        assert_eq!(col, "id");
        assert_eq!(value, r#"in.(gin,"dry vermouth","a,b")"#);
    }

    #[test]
    fn test_or_group() {
        let filter = Filter::any([
            Filter::contains_ci("name_en", "sweet vermouth"),
            Filter::contains_ci("name_zh", "甜香艾酒"),
        ]);
        let (col, value) = filter_pair(&filter);
        assert_eq!(col, "or");
        assert_eq!(
            value,
            r#"(name_en.ilike."%sweet vermouth%",name_zh.ilike.%甜香艾酒%)"#
        );
    }

    #[test]
    fn test_nested_or_and_numbers() {
        let filter = Filter::any([
            Filter::eq("rank", 3),
            Filter::any([Filter::is_null("category"), Filter::neq("category", "x")]),
        ]);
        assert_eq!(
            filter_pair(&filter).1,
            "(rank.eq.3,or(category.is.null,category.neq.x))"
        );
    }

    #[test]
    fn test_star_in_search_term_is_not_sent_as_wildcard() {
        let filter = Filter::contains_ci("name_en", "a*b");
        assert_eq!(
            filter_pair(&filter),
            ("name_en".to_string(), "ilike.%a_b%".to_string())
        );
        assert!(needs_local_match(std::slice::from_ref(&filter)));

        let grouped = Filter::any([filter, Filter::eq("id", "x")]);
        assert_eq!(filter_pair(&grouped).1, "(name_en.ilike.%a_b%,id.eq.x)");
        assert!(needs_local_match(&[grouped]));
        assert!(!needs_local_match(&[Filter::contains_ci("name_en", "ab")]));
    }

    #[test]
    fn test_escaped_star_is_widened_too() {
        assert_eq!(wire_pattern(r"100\*"), "100_");
        assert_eq!(wire_pattern(r"50\%"), r"50\%");
        assert_eq!(wire_pattern("trailing\\"), "trailing\\");
    }

    #[test]
    fn test_quote_escapes_quotes() {
        assert_eq!(quote(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote(""), r#""""#);
        assert_eq!(quote("plain"), "plain");
    }
}
