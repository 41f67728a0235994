use api_contract::ApiResponse;

#[test]
fn api_response_success() {
    let response = ApiResponse::success(vec!["metrics".to_string()]);
    assert!(response.success);
    assert!(response.data.is_some());
    assert!(response.error.is_none());
}

#[test]
fn api_response_error_carries_code() {
    let response = ApiResponse::<()>::error("CHANNEL.NOT_FOUND", "unknown channel: db1");
    assert!(!response.success);
    assert!(response.data.is_none());
    let value = serde_json::to_value(&response).expect("serialize");
    assert_eq!(value["error"]["code"], "CHANNEL.NOT_FOUND");
    assert_eq!(value["error"]["message"], "unknown channel: db1");
}
