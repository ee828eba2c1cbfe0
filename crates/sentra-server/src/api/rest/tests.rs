//! Tests for REST API payload types

#![cfg(test)]

use super::types::*;
use sentra_sdk::TransactionRequest;

#[test]
fn test_transaction_list_query_defaults() {
    let query: TransactionListQuery = serde_json::from_str("{}").unwrap();
    assert!(query.limit.is_none());
}

#[test]
fn test_simulation_payload_count_optional() {
    let payload: SimulationStartPayload = serde_json::from_str("{}").unwrap();
    assert!(payload.count.is_none());

    let payload: SimulationStartPayload = serde_json::from_str(r#"{"count": 12}"#).unwrap();
    assert_eq!(payload.count, Some(12));
}

#[test]
fn test_transaction_request_from_camel_case_body() {
    let json = r#"{
        "userId": "user-1",
        "amount": 120.5,
        "location": "NY",
        "deviceId": "device-1",
        "ipAddress": "10.0.0.5"
    }"#;

    let request: TransactionRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.user_id, "user-1");
    assert_eq!(request.currency, "USD");
    assert!(request.transaction_id.is_none());
    assert!(request.timestamp.is_none());
}

#[test]
fn test_transaction_list_response_serialization() {
    let response = TransactionListResponse {
        count: 0,
        transactions: vec![],
    };
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["count"], 0);
    assert!(json["transactions"].as_array().unwrap().is_empty());
}
