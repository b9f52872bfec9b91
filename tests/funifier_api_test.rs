use funifier_lottery::api::basic_auth_header;
use funifier_lottery::config::{ApiConfig, Header};
use funifier_lottery::data::DataValue;
use funifier_lottery::services::LotteryService;
use funifier_lottery::{FunifierApi, FunifierError};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACHIEVEMENT_AGGREGATE: &str = "/v3/database/achievement/aggregate";
const LOTTERY_AGGREGATE: &str = "/v3/database/lottery/aggregate";

fn stub_config(uri: &str) -> ApiConfig {
    ApiConfig::new("key", "secret", uri, "v3")
        .unwrap()
        .with_header(
            Header::new()
                .with_content_type("application/json")
                .with_range("items=0-1000000"),
        )
}

/// The blocking client owns its own runtime, so it is built, used and dropped
/// off the async executor
async fn with_api<T, F>(uri: String, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce(&FunifierApi) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let api = FunifierApi::new(stub_config(&uri)).unwrap();
        f(&api)
    })
    .await
    .unwrap()
}

fn winner_rows() -> serde_json::Value {
    json!([
        {
            "_id": "a1",
            "player": "p1",
            "total": 1,
            "lotteryUID": "L1",
            "ticketUID": "TK1",
            "firstname": "Ana",
            "street": "Rua A, 1",
            "zip": "1000-001",
            "tos_accepted": true
        },
        {
            "_id": "a2",
            "player": "p2",
            "total": 1,
            "lotteryUID": "L1",
            "ticketUID": "TK1",
            "firstname": "Bruno",
            "street": null,
            "zip": "2000-002",
            "tos_accepted": false
        }
    ])
}

#[tokio::test]
async fn test_winners_with_address_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ACHIEVEMENT_AGGREGATE))
        .and(query_param("strict", "true"))
        .and(header("Authorization", basic_auth_header("key", "secret").as_str()))
        .and(header("Range", "items=0-1000000"))
        .and(body_string_contains("\"item\": \"L1\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(winner_rows()))
        .expect(1)
        .mount(&server)
        .await;

    let table = with_api(server.uri(), |api| {
        api.get_lottery_winners_with_address("L1", "TK1")
    })
    .await
    .unwrap();

    assert_eq!(table.row_count(), 2);
    let lottery_uids = table.column_values("lotteryUID").unwrap();
    assert!(lottery_uids.iter().all(|v| v.as_str() == Some("L1")));
    assert_eq!(
        table.get_value_by_name(1, "street"),
        Some(&DataValue::Null)
    );
    assert_eq!(table.column_names()[0], "_id");
}

#[tokio::test]
async fn test_count_queries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ACHIEVEMENT_AGGREGATE))
        .and(body_string_contains("\"item\": \"TK1\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"count": 7}])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ACHIEVEMENT_AGGREGATE))
        .and(body_string_contains("\"item\": \"EMPTY\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (seven, zero) = with_api(server.uri(), |api| {
        (
            api.count_lottery_participants("TK1"),
            api.count_lottery_participants("EMPTY"),
        )
    })
    .await;

    assert_eq!(seven.unwrap(), 7);
    assert_eq!(zero.unwrap(), 0);
}

#[tokio::test]
async fn test_count_winners_sends_time_period() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ACHIEVEMENT_AGGREGATE))
        .and(body_string_contains("\"$date\":\"-3d\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"count": 2}])))
        .expect(1)
        .mount(&server)
        .await;

    let count = with_api(server.uri(), |api| api.count_lottery_winners("L1", Some(3)))
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_error_envelope_becomes_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"errorCode": 401, "errorMessage": "bad auth"})),
        )
        .mount(&server)
        .await;

    let result = with_api(server.uri(), |api| {
        api.get_lottery_winners_with_address("L1", "TK1")
    })
    .await;

    match result {
        Err(FunifierError::Api { code, message }) => {
            assert_eq!(code, 401);
            assert_eq!(message, "bad auth");
        }
        other => panic!("expected an API error, got {:?}", other.map(|t| t.row_count())),
    }
}

#[tokio::test]
async fn test_non_json_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let result = with_api(server.uri(), |api| api.count_lottery_participants("TK1")).await;
    assert!(matches!(result, Err(FunifierError::Decode(_))));
}

#[tokio::test]
async fn test_blank_input_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let result = with_api(server.uri(), |api| {
        api.get_lottery_winners_with_address("", "TK1")
    })
    .await;
    assert!(matches!(result, Err(FunifierError::Validation(_))));
}

#[tokio::test]
async fn test_lottery_routes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOTTERY_AGGREGATE))
        .and(body_string_contains("\"$limit\": 2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"_id": "L2"}, {"_id": "L1"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LOTTERY_AGGREGATE))
        .and(body_string_contains("2024-01-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": {"0": "L1", "1": "L2"},
            "title": {"0": "Spring", "1": "Summer"}
        })))
        .mount(&server)
        .await;

    let (uids, in_range) = with_api(server.uri(), |api| {
        (
            api.get_lottery_uids_by_last_n_entries(2),
            api.get_all_lottery_in_date_range("2024-01-01", "2024-06-30"),
        )
    })
    .await;

    let uids = uids.unwrap();
    assert_eq!(uids.row_count(), 2);
    assert_eq!(uids.get_value(0, 0).and_then(DataValue::as_str), Some("L2"));

    let in_range = in_range.unwrap();
    assert_eq!(in_range.column_names(), vec!["_id", "title"]);
    assert_eq!(
        in_range.get_value_by_name(1, "title").and_then(DataValue::as_str),
        Some("Summer")
    );
}

#[tokio::test]
async fn test_winners_report_runs_count_alongside() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ACHIEVEMENT_AGGREGATE))
        .and(body_string_contains("$lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(winner_rows()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ACHIEVEMENT_AGGREGATE))
        .and(body_string_contains("$count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"count": 42}])))
        .expect(1)
        .mount(&server)
        .await;

    let report = with_api(server.uri(), |api| {
        LotteryService::new(api).winners_report("L1", "TK1", true)
    })
    .await
    .unwrap();

    assert_eq!(report.winners.row_count(), 2);
    assert_eq!(report.participant_count, Some(42));
    assert!(report
        .status_message()
        .starts_with("2 winners out of 42 participants for lottery L1"));
}

#[tokio::test]
async fn test_unreachable_host_is_a_connectivity_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let result = with_api(format!("http://127.0.0.1:{}", port), |api| {
        api.count_lottery_participants("TK1")
    })
    .await;
    assert!(matches!(result, Err(FunifierError::Connectivity { .. })));
}

#[tokio::test]
async fn test_participants_and_player_tickets() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ACHIEVEMENT_AGGREGATE))
        .and(body_string_contains("\"player\": \"p1\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"count": 3}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ACHIEVEMENT_AGGREGATE))
        .and(body_string_contains("\"$date\":\"-0d-\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"player": "p1", "time": 1717200000000i64},
            {"player": "p2", "time": 1717200360000i64}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (tickets, participants) = with_api(server.uri(), |api| {
        (
            api.count_player_tickets("p1", "TK1"),
            api.get_lottery_participants("TK1", Some(0)),
        )
    })
    .await;

    assert_eq!(tickets.unwrap(), 3);
    let participants = participants.unwrap();
    assert_eq!(participants.row_count(), 2);
    assert_eq!(
        participants.get_value_by_name(1, "player").and_then(DataValue::as_str),
        Some("p2")
    );
}

#[tokio::test]
async fn test_invalid_utf8_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'[', 0xff, b']']))
        .mount(&server)
        .await;

    let result = with_api(server.uri(), |api| api.count_lottery_participants("TK1")).await;
    match result {
        Err(FunifierError::Decode(message)) => assert!(message.contains("not UTF-8")),
        other => panic!("expected a decode error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_upstream_is_a_connectivity_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"count": 1}]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let result = tokio::task::spawn_blocking(move || {
        let api = FunifierApi::with_timeout(stub_config(&uri), Duration::from_millis(50)).unwrap();
        api.count_lottery_participants("TK1")
    })
    .await
    .unwrap();

    match result {
        Err(FunifierError::Connectivity { source, .. }) => assert!(source.is_timeout()),
        other => panic!("expected a connectivity error, got {:?}", other),
    }
}
