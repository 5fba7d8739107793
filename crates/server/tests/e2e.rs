use std::net::SocketAddr;
use std::sync::Arc;

use support::BrokenStore;
use axum::Router;
use chrono::{TimeZone, Utc};
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use server::routes::{self, PromoState, TodoState};
use server::startup;
use service::clock::FixedClock;
use service::promo::{PromoCode, PromoService, SeededRandom};
use service::storage::{KvStore, MemoryKvStore};
use service::todo::TodoService;

struct TestApp {
    base_url: String,
}

async fn spawn(app: Router) -> anyhow::Result<TestApp> {
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url })
}

async fn start_todo() -> anyhow::Result<TestApp> {
    spawn(startup::todo_app(Arc::new(MemoryKvStore::new()))).await
}

/// Promo app with a pinned clock, deterministic randomness and one known code
/// (valid 2024-01-01..2024-07-01, discount 0.2).
async fn start_promo() -> anyhow::Result<(TestApp, PromoCode, Arc<FixedClock>)> {
    let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
    let promos = PromoService::with_clock(store, clock.clone());

    let code = PromoCode::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
        0.2,
    );
    promos.store_all(std::slice::from_ref(&code)).await?;

    let state = PromoState { promos, rng: Arc::new(SeededRandom::new(11)), seed_count: 50 };
    let app = spawn(routes::build_promo_router(state, CorsLayer::very_permissive())).await?;
    Ok((app, code, clock))
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn e2e_health() -> anyhow::Result<()> {
    let app = start_todo().await?;
    let res = client().get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_todo_lifecycle() -> anyhow::Result<()> {
    let app = start_todo().await?;
    let c = client();
    let todos = format!("{}/api/todos", app.base_url);

    // empty list
    let res = c.get(&todos).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!([]));

    // create
    let res = c.post(&todos).json(&json!({"content": "buy milk"})).send().await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let milk = res.json::<Value>().await?;
    assert_eq!(milk["content"], "buy milk");
    assert_eq!(milk["completed"], false);
    let milk_id = milk["id"].as_str().unwrap().to_string();

    let res = c.post(&todos).json(&json!({"content": "walk dog"})).send().await?;
    let dog_id = res.json::<Value>().await?["id"].as_str().unwrap().to_string();

    // update
    let res = c.put(format!("{todos}/{milk_id}")).json(&json!({"content": "buy oat milk"})).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<Value>().await?["content"], "buy oat milk");

    // toggle
    let res = c.post(format!("{todos}/{milk_id}")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<Value>().await?["completed"], true);

    // list keeps insertion order
    let list = c.get(&todos).send().await?.json::<Vec<Value>>().await?;
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"], milk_id.as_str());
    assert_eq!(list[1]["id"], dog_id.as_str());

    // delete completed returns survivors
    let res = c.delete(&todos).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let left = res.json::<Vec<Value>>().await?;
    assert_eq!(left.len(), 1);
    assert_eq!(left[0]["id"], dog_id.as_str());

    // delete by id
    let res = c.delete(format!("{todos}/{dog_id}")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NO_CONTENT);
    assert_eq!(c.get(&todos).send().await?.json::<Value>().await?, json!([]));
    Ok(())
}

#[tokio::test]
async fn e2e_todo_bad_input_and_unknown_ids() -> anyhow::Result<()> {
    let app = start_todo().await?;
    let c = client();
    let todos = format!("{}/api/todos", app.base_url);

    let res = c.post(&todos).json(&json!({"content": ""})).send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);

    let res = c.post(&todos).header("content-type", "application/json").body("{oops").send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);

    // nothing was stored by the rejected requests
    assert_eq!(c.get(&todos).send().await?.json::<Value>().await?, json!([]));

    let ghost = uuid::Uuid::new_v4();
    let res = c.put(format!("{todos}/{ghost}")).json(&json!({"content": "x"})).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    assert_eq!(res.text().await?, "Todo Not Found");

    let res = c.post(format!("{todos}/{ghost}")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);

    let res = c.delete(format!("{todos}/{ghost}")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn e2e_todo_store_failure_is_500() -> anyhow::Result<()> {
    let state = TodoState { todos: TodoService::new(Arc::new(BrokenStore)) };
    let app = spawn(routes::build_todo_router(state, CorsLayer::very_permissive())).await?;
    let c = client();
    let todos = format!("{}/api/todos", app.base_url);

    let res = c.get(&todos).send().await?;
    assert_eq!(res.status(), HttpStatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "Internal Server Error");

    let res = c.delete(format!("{todos}/abc")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn e2e_promo_validate_apply_once() -> anyhow::Result<()> {
    let (app, code, _) = start_promo().await?;
    let c = client();

    let res = c.post(format!("{}/validate/{}", app.base_url, code.code)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["isValid"], true);
    assert_eq!(body["code"], code.code.as_str());
    assert!((body["discount"].as_f64().unwrap() - 0.2).abs() < 1e-6);

    // upper-cased input hits the same code
    let shouted = code.code.to_uppercase();
    let res = c.post(format!("{}/apply/{}", app.base_url, shouted)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["isValid"], true);
    assert!(body.get("reason").is_none());

    let res = c.post(format!("{}/apply/{}", app.base_url, code.code)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["isValid"], false);
    assert_eq!(body["reason"], "Code has already been used");
    assert_eq!(body["discount"], 0.0);

    let res = c.post(format!("{}/validate/{}", app.base_url, code.code)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["reason"], "Code has already been used");
    Ok(())
}

#[tokio::test]
async fn e2e_promo_rejections() -> anyhow::Result<()> {
    let (app, code, clock) = start_promo().await?;
    let c = client();

    let res = c.post(format!("{}/validate/nope", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["reason"], "Invalid code presented");

    let res = c.post(format!("{}/validate/", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    assert_eq!(res.text().await?, "Bad Request");

    let res = c.post(format!("{}/apply/%20", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    assert_eq!(res.text().await?, "Bad Request");

    clock.set(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap());
    let res = c.post(format!("{}/apply/{}", app.base_url, code.code)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["reason"], "Code has expired");
    Ok(())
}

#[tokio::test]
async fn e2e_promo_seed() -> anyhow::Result<()> {
    let (app, _, clock) = start_promo().await?;
    let c = client();

    let res = c.post(format!("{}/seed-promocodes", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let codes = res.json::<Vec<PromoCode>>().await?;
    assert_eq!(codes.len(), 50);
    assert!(codes.iter().all(|p| !p.used && p.discount < 0.35));

    // seeded codes are persisted and become valid once their window opens
    clock.set(Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap());
    let res = c.post(format!("{}/validate/{}", app.base_url, codes[0].code)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}

mod support {
    use service::errors::ServiceError;
    use service::storage::KvStore;

    /// Store whose every call fails.
    pub struct BrokenStore;

    #[async_trait::async_trait]
    impl KvStore for BrokenStore {
        async fn exists(&self, _key: &str) -> Result<bool, ServiceError> {
            Err(ServiceError::Storage("store offline".into()))
        }
        async fn get(&self, _key: &str) -> Result<Vec<u8>, ServiceError> {
            Err(ServiceError::Storage("store offline".into()))
        }
        async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<(), ServiceError> {
            Err(ServiceError::Storage("store offline".into()))
        }
    }
}
