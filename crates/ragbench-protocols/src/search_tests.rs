use super::*;
use serde_json::json;

#[test]
fn test_strategy_from_str() {
    assert_eq!("keyword".parse::<SearchStrategy>().unwrap(), SearchStrategy::Keyword);
    assert_eq!("Hybrid".parse::<SearchStrategy>().unwrap(), SearchStrategy::Hybrid);
    assert_eq!("custom".parse::<SearchStrategy>().unwrap(), SearchStrategy::Custom);
}

#[test]
fn test_strategy_unsupported() {
    let err = "fuzzy".parse::<SearchStrategy>().unwrap_err();
    assert!(matches!(err, RetrievalError::UnsupportedStrategy(s) if s == "fuzzy"));
}

#[test]
fn test_query_defaults() {
    let query = SearchQuery::keyword("machine learning");
    assert_eq!(query.top_k, 10);
    assert!((query.score_threshold - 0.7).abs() < f32::EPSILON);
    assert!(query.filters.is_empty());
    assert!(query.table_mapping.is_none());
}

#[test]
fn test_custom_query_carries_sql() {
    let query = SearchQuery::custom("SELECT * FROM chunks");
    assert_eq!(query.strategy, SearchStrategy::Custom);
    assert_eq!(query.custom_sql(), Some("SELECT * FROM chunks"));
}

#[test]
fn test_query_builders() {
    let query = SearchQuery::semantic("q")
        .with_top_k(3)
        .with_filter(USER_ID_KEY, 5)
        .with_score_threshold(0.1);
    assert_eq!(query.top_k, 3);
    assert_eq!(query.filters.get("user_id"), Some(&json!(5)));
    assert!((query.score_threshold - 0.1).abs() < f32::EPSILON);
}

#[test]
fn test_query_deserialize_defaults() {
    let query: SearchQuery = serde_json::from_str(r#"{"text":"x","strategy":"semantic"}"#).unwrap();
    assert_eq!(query.strategy, SearchStrategy::Semantic);
    assert_eq!(query.top_k, 10);
}

#[test]
fn test_search_result_serialization() {
    let result = SearchResult::new("1", 0.5, "hello", "chunks");
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["source"], "chunks");
    assert_eq!(json["id"], "1");
}
