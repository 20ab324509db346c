use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jgrants_search::{register_subsidy_tools, JGrantsClient, SearchQuery};
use jgrants_tool_runtime::ToolRegistry;

const PREFIX: &str = "/exp/v1/public";

fn client_for(server: &MockServer) -> JGrantsClient {
    JGrantsClient::new(format!("{}{PREFIX}", server.uri()), Duration::from_secs(5)).unwrap()
}

fn search_body() -> Value {
    json!({
        "metadata": {"type": "application/json", "resultset": {"count": 2}},
        "result": [
            {
                "id": "a0W5h00000UaVfHEAV",
                "name": "S-00007689",
                "title": "IT導入補助金2025（通常枠）",
                "target_area_search": "全国",
                "subsidy_max_limit": 4500000,
                "acceptance_start_datetime": "2025-03-31T15:00:00.000Z",
                "acceptance_end_datetime": "2025-05-12T08:00:00.000Z",
                "target_number_of_employees": "従業員数の制約なし"
            },
            {
                "id": "a0W5h00000UaVfIEAV",
                "name": "S-00007690",
                "title": "IT導入補助金2025（インボイス枠）",
                "target_area_search": "全国",
                "subsidy_max_limit": 3500000,
                "acceptance_start_datetime": "2025-03-31T15:00:00.000Z",
                "acceptance_end_datetime": "2025-06-16T08:00:00.000Z",
                "target_number_of_employees": null
            }
        ]
    })
}

fn detail_record() -> Value {
    json!({
        "id": "a0W5h00000UaVfHEAV",
        "name": "S-00007689",
        "title": "IT導入補助金2025（通常枠）",
        "target_area_search": "全国",
        "subsidy_max_limit": 4500000,
        "subsidy_rate": "1/2以内",
        "purpose": "生産性向上",
        "outline": "ITツール導入を支援します",
        "note": "",
        "grant_guideline_url": "https://example.invalid/guideline.pdf",
        "application_form_files": [
            {"name": "様式1.pdf", "data": "JVBERi0xLjQK"},
            {"name": "様式2.pdf", "data": "JVBERi0xLjQK"}
        ]
    })
}

#[tokio::test]
async fn search_shapes_upstream_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PREFIX}/subsidies")))
        .and(query_param("keyword", "IT導入"))
        .and(query_param("sort", "created_date"))
        .and(query_param("order", "DESC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server).search(&SearchQuery::new("IT導入")).await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.payload["count"], 2);
    let subsidies = result.payload["subsidies"].as_array().unwrap();
    assert_eq!(subsidies.len(), 2);
    assert_eq!(subsidies[0]["id"], "a0W5h00000UaVfHEAV");
    assert_eq!(subsidies[0]["target_area"], "全国");
    assert_eq!(subsidies[1]["acceptance_end"], "2025-06-16T08:00:00.000Z");
    assert!(subsidies[1]["target_employees"].is_null());
}

#[tokio::test]
async fn validation_failures_never_reach_the_network() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(0)
        .mount(&server)
        .await;
    let client = client_for(&server);

    let short = client.search(&SearchQuery::new("a")).await;
    assert_eq!(short.error.as_deref(), Some("keywordは2～255文字で指定してください"));

    let bad_sort = client
        .search(&SearchQuery::new("IT導入").sorted_by("title", "ASC"))
        .await;
    assert!(!bad_sort.success);

    let bad_order = client
        .search(&SearchQuery::new("IT導入").sorted_by("created_date", "asc"))
        .await;
    assert_eq!(bad_order.error.as_deref(), Some("orderはASCまたはDESCを指定してください"));

    let empty_id = client.detail("").await;
    assert_eq!(empty_id.error.as_deref(), Some("subsidy_idを指定してください"));
}

#[tokio::test]
async fn active_search_matches_equivalent_plain_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PREFIX}/subsidies")))
        .and(query_param("keyword", "省エネ"))
        .and(query_param("sort", "acceptance_end_datetime"))
        .and(query_param("order", "ASC"))
        .and(query_param("acceptance", "1"))
        .and(query_param("target_area_search", "大阪府"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(2)
        .mount(&server)
        .await;
    let client = client_for(&server);

    let active = client.search_active("省エネ", Some("大阪府")).await;
    let plain = client
        .search(
            &SearchQuery::new("省エネ")
                .sorted_by("acceptance_end_datetime", "ASC")
                .with_acceptance(1)
                .with_target_area(Some("大阪府".into())),
        )
        .await;

    assert!(active.success);
    assert_eq!(active, plain);
}

#[tokio::test]
async fn repeated_search_is_stable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PREFIX}/subsidies")))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(2)
        .mount(&server)
        .await;
    let client = client_for(&server);
    let query = SearchQuery::new("創業支援");

    let first = client.search(&query).await;
    let second = client.search(&query).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn detail_accepts_object_or_single_element_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PREFIX}/subsidies/id/obj1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": detail_record()})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{PREFIX}/subsidies/id/list1")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"result": [detail_record()]})),
        )
        .mount(&server)
        .await;
    let client = client_for(&server);

    let from_object = client.detail("obj1").await;
    let from_list = client.detail("list1").await;

    assert!(from_object.success, "{:?}", from_object.error);
    assert_eq!(from_object, from_list);
    let subsidy = &from_object.payload["subsidy"];
    assert_eq!(subsidy["subsidy_rate"], "1/2以内");
    assert_eq!(subsidy["application_form_files"], 2);
    assert_eq!(subsidy["grant_guideline_url"], "https://example.invalid/guideline.pdf");
}

#[tokio::test]
async fn detail_not_found_for_404_and_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PREFIX}/subsidies/id/missing")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{PREFIX}/subsidies/id/empty")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
        .mount(&server)
        .await;
    let client = client_for(&server);

    for id in ["missing", "empty"] {
        let result = client.detail(id).await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("指定されたIDの補助金が見つかりませんでした")
        );
    }
}

#[tokio::test]
async fn server_error_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client_for(&server).search(&SearchQuery::new("IT導入")).await;
    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("API通信エラー"));
}

#[tokio::test]
async fn malformed_body_is_unexpected_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = client_for(&server).search(&SearchQuery::new("IT導入")).await;
    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("予期しないエラー"));
}

#[tokio::test]
async fn registered_tool_applies_default_ordering() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PREFIX}/subsidies")))
        .and(query_param("sort", "created_date"))
        .and(query_param("order", "DESC"))
        .and(query_param("acceptance", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut registry = ToolRegistry::new();
    register_subsidy_tools(&mut registry, Arc::new(client_for(&server))).unwrap();

    let result = registry
        .execute("search_subsidies", json!({"keyword": "IT導入", "acceptance": 1}))
        .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.to_json()["count"], 2);
    assert_eq!(result.to_json()["success"], true);
}
