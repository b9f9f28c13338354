//! End-to-end HTTP API tests.
//!
//! Each test starts the real router on a random port, backed by a scripted
//! search backend and an in-memory transition store, and drives it with
//! reqwest.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sns::api::ApiServer;
use sns::config::IndexConfig;
use sns::domain::Transition;
use sns::index::IndexTarget;
use sns::query::SearchBody;
use sns::repository::{SearchContext, TransitionStore};
use sns::search::{DecodeContext, SearchBackend, SearchResponse};
use sns::Error;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<VecDeque<sns::Result<Value>>>,
    targets: Mutex<Vec<String>>,
}

#[async_trait]
impl SearchBackend for ScriptedBackend {
    async fn search(
        &self,
        target: &IndexTarget,
        _body: &SearchBody,
        _size: usize,
    ) -> sns::Result<SearchResponse> {
        self.targets.lock().unwrap().push(target.to_string());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(Error::Engine { status: 500 }));
        reply.map(|value| serde_json::from_value(value).unwrap())
    }
}

#[derive(Default)]
struct MemoryTransitions {
    rows: Vec<Transition>,
    calls: Mutex<Vec<(u64, NaiveDate, NaiveDate, u32)>>,
}

#[async_trait]
impl TransitionStore for MemoryTransitions {
    async fn transitions_by_user(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        limit: u32,
    ) -> sns::Result<Vec<Transition>> {
        self.calls.lock().unwrap().push((user_id, start, end, limit));
        Ok(self.rows.iter().take(limit as usize).cloned().collect())
    }
}

struct TestServer {
    base_url: String,
    backend: Arc<ScriptedBackend>,
    transitions: Arc<MemoryTransitions>,
    client: Client,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn searches(&self) -> Vec<String> {
        self.backend.targets.lock().unwrap().clone()
    }
}

async fn start_server(replies: Vec<sns::Result<Value>>, rows: Vec<Transition>) -> TestServer {
    let backend = Arc::new(ScriptedBackend {
        replies: Mutex::new(replies.into()),
        targets: Mutex::default(),
    });
    let transitions = Arc::new(MemoryTransitions {
        rows,
        calls: Mutex::default(),
    });
    let search =
        SearchContext::new(backend.clone(), IndexConfig::default(), DecodeContext::default());
    let router = ApiServer::new(search, transitions.clone()).router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        backend,
        transitions,
        client: Client::new(),
    }
}

fn envelope(total: u64, hits: Vec<Value>) -> Value {
    json!({"took": 2, "hits": {"total": {"value": total, "relation": "eq"}, "hits": hits}})
}

fn tweet_hit(id: &str) -> Value {
    json!({
        "_id": id,
        "_source": {
            "user_id": "42",
            "user_screen_name": "alice",
            "user_name": "Alice",
            "tweet": "hello",
            "quote_count": 0,
            "favorite_count": 3,
            "retweet_count": 1,
            "reply_count": 0,
            "created_at": "2023-01-10 03:00:00"
        }
    })
}

fn user_hit(id: &str) -> Value {
    json!({"_source": {
        "id": id,
        "screen_name": "ann",
        "name": "Ann",
        "description": "hi",
        "profile_image_url_https": "https://img/ann.png",
        "verified": true,
        "followers_count": 5,
        "statuses_count": 6,
        "favourites_count": 7,
        "friends_count": 8,
        "listed_count": 9,
        "sr_score": 0.4,
        "created_at": "2019-04-01 10:00:00"
    }})
}

fn snapshot(day: u32) -> Transition {
    Transition {
        user_id: 42,
        follower_count: 100 + day as u64,
        friend_count: 10,
        listed_count: 1,
        favorite_count: 50,
        status_count: 200,
        created_at: at(2023, 1, day),
    }
}

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

const WINDOW: [(&str, &str); 2] =
    [("start_date", "2023-01-01 00:00"), ("end_date", "2023-03-31 23:59")];

#[tokio::test]
async fn test_health() {
    let server = start_server(vec![], vec![]).await;

    for path in ["/health", "/health/"] {
        let resp = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"message": "success"}));
    }
}

#[tokio::test]
async fn test_tweets_by_user() {
    let server = start_server(vec![Ok(envelope(12, vec![tweet_hit("1")]))], vec![]).await;

    let resp = server
        .client
        .get(server.url("/tweets/user"))
        .query(&[("user_id", "42"), ("order_by", "retweet_count")])
        .query(&WINDOW)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["hits"], 12);
    assert_eq!(body["res"][0]["tweet_id"], "1");
    assert_eq!(body["res"][0]["created_at"], "2023-01-10 12:00:00");
    assert_eq!(server.searches(), vec!["tweet-*"]);
}

#[tokio::test]
async fn test_validation_errors_never_reach_the_engine() {
    let server = start_server(vec![], vec![]).await;

    let cases: Vec<(&str, Vec<(&str, &str)>)> = vec![
        ("/tweets/user", vec![("user_id", "42")]),
        (
            "/tweets/user",
            vec![
                ("user_id", "42"),
                ("start_date", "2023-02-01 00:00"),
                ("end_date", "2023-01-01 00:00"),
            ],
        ),
        (
            "/tweets/user",
            vec![("user_id", "42"), ("count", "0"), WINDOW[0], WINDOW[1]],
        ),
        (
            "/tweets/user",
            vec![("user_id", "42"), ("start_date", "2023/01/01"), ("end_date", "2023-01-01 00:00")],
        ),
        (
            "/tweets/media",
            vec![("user_id", "42"), ("media_type", "5"), WINDOW[0], WINDOW[1]],
        ),
        ("/tweets/users", vec![("user_ids", "1,x"), WINDOW[0], WINDOW[1]]),
        ("/hashtags/", vec![("retweet_min", "1"), WINDOW[0], WINDOW[1]]),
        (
            "/hashtags/",
            vec![
                ("keyword", "news"),
                ("retweet_min", "10"),
                ("retweet_max", "5"),
                WINDOW[0],
                WINDOW[1],
            ],
        ),
        ("/users/search", vec![("language", "ja"), WINDOW[0], WINDOW[1]]),
        (
            "/tweets/transition",
            vec![
                ("user_id", "42"),
                ("start_date", "2023-01-01"),
                ("end_date", "2023-01-31"),
                ("count", "0"),
            ],
        ),
    ];

    for (path, params) in cases {
        let resp = server
            .client
            .get(server.url(path))
            .query(&params)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{path} {params:?}");
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string(), "{path} {params:?}");
    }

    assert!(server.searches().is_empty());
    assert!(server.transitions.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_engine_failure_is_a_500_without_details() {
    let server = start_server(vec![Err(Error::Engine { status: 429 })], vec![]).await;

    let resp = server
        .client
        .get(server.url("/users/id"))
        .query(&[("user_id", "7")])
        .query(&WINDOW)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"error": "search failed"}));
}

#[tokio::test]
async fn test_users_by_ids_accepts_json_body() {
    let server =
        start_server(vec![Ok(envelope(2, vec![user_hit("7"), user_hit("8")]))], vec![]).await;

    let resp = server
        .client
        .post(server.url("/users/ids"))
        .json(&json!({
            "user_ids": [7, 8],
            "start_date": "2023-01-01 00:00",
            "end_date": "2023-02-28 23:59"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["hits"], 2);
    assert_eq!(body["res"][1]["user_id"], "8");
    assert_eq!(body["res"][0]["verified"], true);
    assert_eq!(server.searches(), vec!["user-2023.01,user-2023.02"]);
}

#[tokio::test]
async fn test_user_by_id_single_record() {
    let server = start_server(vec![Ok(envelope(3, vec![user_hit("7")]))], vec![]).await;

    let resp = server
        .client
        .get(server.url("/users/id"))
        .query(&[("user_id", "7")])
        .query(&WINDOW)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["hits"], 3);
    assert_eq!(body["res"]["user_screen_name"], "ann");
}

#[tokio::test]
async fn test_media_flow_reports_enrichment_failure() {
    let server = start_server(
        vec![
            Ok(envelope(
                1,
                vec![json!({
                    "_id": "10",
                    "_source": {
                        "id": "src-1",
                        "media_type": 3,
                        "favorite_count": 1,
                        "retweet_count": 0
                    }
                })],
            )),
            Err(Error::Engine { status: 503 }),
        ],
        vec![],
    )
    .await;

    let resp = server
        .client
        .get(server.url("/tweets/media"))
        .query(&[("user_id", "42"), ("media_type", "-1"), ("count", "5")])
        .query(&WINDOW)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["hits"], 1);
    assert_eq!(
        body["tweets"][0],
        json!({"tweet_id": "10", "media_type": 3, "favorite_count": 1, "retweet_count": 0})
    );
    assert_eq!(body["media"], json!([]));
    assert_eq!(body["enrichment_error"], "media lookup failed (engine)");
    assert_eq!(server.searches(), vec!["tweet-*", "media"]);
}

#[tokio::test]
async fn test_hashtag_search() {
    let server = start_server(
        vec![Ok(json!({
            "took": 3,
            "hits": {"total": {"value": 900, "relation": "eq"}, "hits": []},
            "aggregations": {
                "distinct_hashtag_count": {"value": 1},
                "group_by_hashtag": {"buckets": [{"key": "rustlang", "doc_count": 900}]}
            }
        }))],
        vec![],
    )
    .await;

    let resp = server
        .client
        .get(server.url("/hashtags/search"))
        .query(&[("hashtag", "rust")])
        .query(&WINDOW)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"hits": 1, "res": [{"hashtag": "rustlang", "status_count": 900}]}));
}

#[tokio::test]
async fn test_transitions() {
    let server = start_server(vec![], vec![snapshot(3), snapshot(2), snapshot(1)]).await;

    let resp = server
        .client
        .get(server.url("/tweets/transition"))
        .query(&[
            ("user_id", "42"),
            ("start_date", "2023-01-01"),
            ("end_date", "2023-01-31"),
            ("count", "2"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["hits"], 2);
    assert!(body.get("transitions").is_none());
    assert_eq!(body["res"].as_array().unwrap().len(), 2);
    assert_eq!(body["res"][0]["follower_count"], 103);
    assert_eq!(body["res"][0]["created_at"], "2023-01-03 00:00:00");

    let calls = server.transitions.calls.lock().unwrap();
    assert_eq!(
        calls[0],
        (
            42,
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
            2
        )
    );
}

#[tokio::test]
async fn test_metrics_route_without_recorder() {
    let server = start_server(vec![], vec![]).await;

    let resp = server
        .client
        .get(format!("{}/metrics", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
