use serde_json::json;
use stride_records::{NewProfile, RecordsClient, RecordsError};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> RecordsClient {
    RecordsClient::new(&server.uri(), "test_anon_key", reqwest::Client::new())
}

#[tokio::test]
async fn test_fetch_profile() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", "eq.user_1"))
        .and(query_param("select", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "user_1",
            "name": "Dana",
            "email": "dana@example.com",
            "interests": ["fitness", "reading"],
            "bio": "Getting back into running",
            "goals_completed": 4,
            "days_active": 21,
            "success_rate": "80%",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-02-01T00:00:00Z"
        }])))
        .mount(&mock_server)
        .await;

    let records = client_for(&mock_server);

    let profile = records.fetch_profile("user_1").await.unwrap();

    let profile = profile.expect("row should be present");
    assert_eq!(profile.name, "Dana");
    assert_eq!(profile.interests, vec!["fitness", "reading"]);
    assert_eq!(profile.goals_completed, 4);
}

#[tokio::test]
async fn test_fetch_profile_missing_row() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let records = client_for(&mock_server);

    let profile = records.fetch_profile("nobody").await.unwrap();
    assert!(profile.is_none());
}

#[tokio::test]
async fn test_insert_profile() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({
            "id": "user_1",
            "name": "Dana",
            "email": "dana@example.com",
            "success_rate": "0%"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "user_1",
            "name": "Dana",
            "email": "dana@example.com",
            "interests": [],
            "bio": "",
            "goals_completed": 0,
            "days_active": 0,
            "success_rate": "0%",
            "created_at": "2025-03-01T00:00:00Z",
            "updated_at": "2025-03-01T00:00:00Z"
        }])))
        .mount(&mock_server)
        .await;

    let records = client_for(&mock_server);

    let inserted = records
        .insert_profile(NewProfile::with_defaults("user_1", "Dana", "dana@example.com"))
        .await
        .unwrap();

    assert_eq!(inserted.id, "user_1");
    assert_eq!(inserted.success_rate, "0%");
    assert!(inserted.interests.is_empty());
}

#[tokio::test]
async fn test_insert_profile_conflict() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"profiles_pkey\"",
            "details": null,
            "hint": null
        })))
        .mount(&mock_server)
        .await;

    let records = client_for(&mock_server);

    let result = records
        .insert_profile(NewProfile::with_defaults("user_1", "Dana", "dana@example.com"))
        .await;

    match result {
        Err(RecordsError::ApiError { details, status }) => {
            assert_eq!(status.as_u16(), 409);
            assert_eq!(details.code.as_deref(), Some("23505"));
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_insert_dashboard_stats() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/dashboard_stats"))
        .and(body_partial_json(json!({
            "user_id": "user_1",
            "active_goals": 0,
            "completed_goals": 0,
            "partner_count": 0,
            "streak_days": 0
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "user_id": "user_1",
            "active_goals": 0,
            "completed_goals": 0,
            "partner_count": 0,
            "streak_days": 0
        }])))
        .mount(&mock_server)
        .await;

    let records = client_for(&mock_server);

    let result = records.insert_dashboard_stats("user_1").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_fetch_dashboard_stats() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/dashboard_stats"))
        .and(query_param("user_id", "eq.user_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "user_id": "user_1",
            "active_goals": 2,
            "completed_goals": 5,
            "partner_count": 1,
            "streak_days": 9
        }])))
        .mount(&mock_server)
        .await;

    let records = client_for(&mock_server);

    let stats = records.fetch_dashboard_stats("user_1").await.unwrap();
    let stats = stats.expect("row should be present");
    assert_eq!(stats.active_goals, 2);
    assert_eq!(stats.streak_days, 9);
}

#[tokio::test]
async fn test_fetch_goals_ordered_by_due_date() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/goals"))
        .and(query_param("user_id", "eq.user_1"))
        .and(query_param("order", "due_date.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "goal_1",
                "user_id": "user_1",
                "title": "Run a 10k",
                "description": "Train three times a week",
                "category": "fitness",
                "due_date": "2025-05-01",
                "progress": 40,
                "status": "in-progress"
            },
            {
                "id": "goal_2",
                "user_id": "user_1",
                "title": "Read twelve books",
                "category": "learning",
                "due_date": "2025-12-31",
                "progress": 100,
                "status": "completed"
            }
        ])))
        .mount(&mock_server)
        .await;

    let records = client_for(&mock_server);

    let goals = records.fetch_goals("user_1").await.unwrap();
    assert_eq!(goals.len(), 2);
    assert_eq!(goals[0].title, "Run a 10k");
    assert_eq!(goals[1].progress, 100);
}

#[tokio::test]
async fn test_query_error_body_is_parsed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(401).set_body_string("jwt expired"))
        .mount(&mock_server)
        .await;

    let records = client_for(&mock_server);

    let result = records.fetch_profile("user_1").await;
    match result {
        Err(RecordsError::UnparsedApiError { message, status }) => {
            assert_eq!(status.as_u16(), 401);
            assert!(message.contains("jwt expired"));
        }
        other => panic!("expected UnparsedApiError, got {:?}", other),
    }
}
