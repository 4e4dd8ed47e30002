//! Rule-based classifier: maps a request to {simple, complex, hybrid} plus a
//! cacheability flag and an advisory latency estimate.

use crate::types::{Classification, FilterValue, QueryType, SearchRequest};

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub simple_threshold: f64,
    pub complex_threshold: f64,
    pub long_query_chars: usize,
    pub large_page_size: u32,
    pub base_latency_simple_ms: u64,
    pub base_latency_hybrid_ms: u64,
    pub base_latency_complex_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            simple_threshold: 3.0,
            complex_threshold: 8.0,
            long_query_chars: 80,
            large_page_size: 100,
            base_latency_simple_ms: 50,
            base_latency_hybrid_ms: 150,
            base_latency_complex_ms: 200,
        }
    }
}

fn is_phrase_or_fuzzy(q: &str) -> bool {
    q.contains('"') || q.contains('~') || q.contains('*')
}

fn score(request: &SearchRequest, config: &ClassifierConfig) -> f64 {
    let mut score = 0.0;

    if let Some(q) = &request.q {
        let words = q.split_whitespace().count().min(10);
        score += words as f64 * 0.5;
        if is_phrase_or_fuzzy(q) {
            score += 3.0;
        }
    }

    let filter_count = request.filters.len().min(10);
    score += filter_count as f64 * 0.8;
    for value in request.filters.values() {
        match value {
            FilterValue::Range { .. } => score += 1.0,
            FilterValue::Array(items) => score += 0.3 * items.len().min(5) as f64,
            FilterValue::Scalar(_) => {}
        }
    }

    for sort in &request.sort {
        score += 1.0;
        if !sort.field.ends_with("_id") && !sort.field.ends_with("_count") {
            score += 0.5; // text-field sorts weigh more
        }
    }

    if let Some(size) = request.page.size {
        if size > config.large_page_size {
            score += 2.0;
        }
    }

    if request.options.highlight {
        score += 2.0;
    }
    if request.options.suggest {
        score += 1.0;
    }

    (score * 10.0).round() / 10.0
}

fn requires_complex(request: &SearchRequest, config: &ClassifierConfig) -> Option<&'static str> {
    if request.options.highlight {
        return Some("highlight requested");
    }
    if request.options.suggest {
        return Some("suggest requested");
    }
    if let Some(q) = &request.q {
        if is_phrase_or_fuzzy(q) {
            return Some("phrase or fuzzy query markers present");
        }
        if q.len() > config.long_query_chars && q.split_whitespace().count() > 1 {
            return Some("long multi-word query");
        }
    }
    if request.filters.values().any(|v| matches!(v, FilterValue::Array(items) if items.len() > 3)) {
        return Some("nested/array filter with many values");
    }
    if let Some(size) = request.page.size {
        if size > config.large_page_size * 2 {
            return Some("very large page size");
        }
    }
    None
}

fn is_cacheable(request: &SearchRequest, config: &ClassifierConfig) -> bool {
    let has_time_range = request.filters.iter().any(|(name, value)| {
        name.to_lowercase().contains("date") && matches!(value, FilterValue::Range { .. })
    });
    if has_time_range {
        return false;
    }
    if let Some(q) = &request.q {
        if q.len() > config.long_query_chars {
            return false;
        }
    }
    if let Some(size) = request.page.size {
        if size > config.large_page_size {
            return false;
        }
    }
    true
}

pub fn classify(request: &SearchRequest, config: &ClassifierConfig) -> Classification {
    let complexity_score = score(request, config);
    let has_free_text = request.q.as_deref().is_some_and(|q| !q.trim().is_empty());
    let filter_count = request.filters.len();

    let (query_type, reason) = if complexity_score <= config.simple_threshold
        && !has_free_text
        && filter_count <= 2
        && !request.options.highlight
        && !request.options.suggest
    {
        (QueryType::Simple, "low score, no free text, few filters".to_string())
    } else if complexity_score >= config.complex_threshold {
        (QueryType::Complex, format!("score {complexity_score} at or above complex threshold"))
    } else if let Some(reason) = requires_complex(request, config) {
        (QueryType::Complex, reason.to_string())
    } else if has_free_text && filter_count > 0 {
        (QueryType::Hybrid, "free text combined with structured filters".to_string())
    } else if complexity_score < (config.simple_threshold + config.complex_threshold) / 2.0 {
        (QueryType::Simple, "residual score below midpoint".to_string())
    } else {
        (QueryType::Complex, "residual score above midpoint".to_string())
    };

    let base = match query_type {
        QueryType::Simple => config.base_latency_simple_ms,
        QueryType::Hybrid => config.base_latency_hybrid_ms,
        QueryType::Complex => config.base_latency_complex_ms,
    };
    let estimated_latency_ms = (base as f64 * (1.0 + complexity_score / 20.0)) as u64;

    Classification {
        query_type,
        complexity_score,
        cacheable: is_cacheable(request, config),
        estimated_latency_ms,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PageDescriptor, RequestOptions};
    use std::collections::BTreeMap;

    fn base_request() -> SearchRequest {
        SearchRequest {
            q: None,
            filters: BTreeMap::new(),
            sort: vec![],
            projection: None,
            page: PageDescriptor {
                size: Some(10),
                cursor: None,
            },
            options: RequestOptions::default(),
            tenant_id: "acme".to_string(),
        }
    }

    #[test]
    fn empty_request_is_simple_and_cacheable() {
        let c = classify(&base_request(), &ClassifierConfig::default());
        assert_eq!(c.query_type, QueryType::Simple);
        assert!(c.cacheable);
    }

    #[test]
    fn free_text_with_filters_is_hybrid() {
        let mut r = base_request();
        r.q = Some("wireless mouse".to_string());
        r.filters.insert("brand".to_string(), FilterValue::Scalar("logitech".into()));
        let c = classify(&r, &ClassifierConfig::default());
        assert_eq!(c.query_type, QueryType::Hybrid);
    }

    #[test]
    fn highlight_forces_complex() {
        let mut r = base_request();
        r.q = Some("mouse".to_string());
        r.options.highlight = true;
        let c = classify(&r, &ClassifierConfig::default());
        assert_eq!(c.query_type, QueryType::Complex);
    }

    #[test]
    fn date_range_filter_is_not_cacheable() {
        let mut r = base_request();
        r.filters.insert(
            "created_date".to_string(),
            FilterValue::Range {
                gte: Some("2026-01-01".into()),
                lte: None,
                gt: None,
                lt: None,
            },
        );
        let c = classify(&r, &ClassifierConfig::default());
        assert!(!c.cacheable);
    }

    #[test]
    fn classification_is_deterministic() {
        let r = base_request();
        let config = ClassifierConfig::default();
        assert_eq!(classify(&r, &config), classify(&r, &config));
    }
}
