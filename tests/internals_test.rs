//! 内部策略与键构造测试
//!
//! 覆盖存储故障的 fail-open / fail-closed 策略、日志钩子，以及
//! 作用域到存储键的规范化规则。

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use jwt_invalidation::{
    CLIENT_PREFIX, ConfigureOptions, Error, Identifier, InvalidationLedger, InvalidationStore,
    MemoryInvalidationStore, SUBJECT_PREFIX, Scope, SignOptions, TokenService,
};
use serde_json::json;

const SECRET: &str = "SECRET";
const PAYLOAD: &str = "PAYLOAD";

/// 总是失败的存储，模拟 Redis 不可用
struct FailingStore;

#[async_trait]
impl InvalidationStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(anyhow!("connection refused"))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(anyhow!("connection refused"))
    }

    async fn del(&self, _key: &str) -> Result<()> {
        Err(anyhow!("connection refused"))
    }
}

#[tokio::test]
async fn store_errors_are_suppressed_by_default() {
    let svc = TokenService::new(SECRET, Arc::new(FailingStore));
    let token = svc.sign(&PAYLOAD, &SignOptions::new()).unwrap();

    // 默认 fail-open：存储故障时按"无失效记录"放行
    let decoded: String = svc.verify(&token).await.unwrap();
    assert_eq!(decoded, PAYLOAD);
}

#[tokio::test]
async fn store_errors_surface_when_suppression_is_off() {
    let svc = TokenService::new(SECRET, Arc::new(FailingStore))
        .with_options(ConfigureOptions::new().suppress_errors(false));
    let token = svc.sign(&PAYLOAD, &SignOptions::new()).unwrap();

    let err = svc.verify::<String>(&token).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
}

#[tokio::test]
async fn invalidate_always_surfaces_write_failures() {
    // 写路径不经过抑制策略：失效必须要么生效要么报错
    let svc = TokenService::new(SECRET, Arc::new(FailingStore));
    let err = svc.invalidate(Scope::subject(1i64)).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
}

#[tokio::test]
async fn error_hook_receives_the_failure() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let svc = TokenService::new(SECRET, Arc::new(FailingStore)).with_options(
        ConfigureOptions::new().error_logger(move |err| {
            sink.lock().unwrap().push(err.to_string());
        }),
    );
    let token = svc.sign(&PAYLOAD, &SignOptions::new()).unwrap();

    let decoded: String = svc.verify(&token).await.unwrap();
    assert_eq!(decoded, PAYLOAD);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn error_hook_is_silent_when_logging_is_disabled() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let svc = TokenService::new(SECRET, Arc::new(FailingStore)).with_options(
        ConfigureOptions::new()
            .allow_logging(false)
            .error_logger(move |err| {
                sink.lock().unwrap().push(err.to_string());
            }),
    );
    let token = svc.sign(&PAYLOAD, &SignOptions::new()).unwrap();

    let decoded: String = svc.verify(&token).await.unwrap();
    assert_eq!(decoded, PAYLOAD);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn configure_updates_internals_after_construction() {
    let mut svc = TokenService::new(SECRET, Arc::new(FailingStore));
    assert!(svc.internals().suppress_errors);
    assert!(svc.internals().allow_logging);

    svc.configure(ConfigureOptions::new().suppress_errors(false));
    assert!(!svc.internals().suppress_errors);
    // 未提供的字段保持原值
    assert!(svc.internals().allow_logging);

    let token = svc.sign(&PAYLOAD, &SignOptions::new()).unwrap();
    let err = svc.verify::<String>(&token).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
}

#[tokio::test]
async fn message_hook_fires_on_record_and_clear() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let svc = TokenService::new(SECRET, Arc::new(MemoryInvalidationStore::new())).with_options(
        ConfigureOptions::new().logger(move |message| {
            sink.lock().unwrap().push(message.to_string());
        }),
    );

    svc.invalidate(Scope::client("web")).await.unwrap();
    svc.revert(Scope::client("web")).await.unwrap();

    let messages = seen.lock().unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("recorded"));
    assert!(messages[1].contains("cleared"));
}

#[tokio::test]
async fn ledger_record_read_clear_cycle() {
    let ledger = InvalidationLedger::new(Arc::new(MemoryInvalidationStore::new()));
    let scope = Scope::subject("john");

    assert!(ledger.invalidation_time(&scope).await.unwrap().is_none());

    ledger.record_invalidation(&scope).await.unwrap();
    let recorded = ledger.invalidation_time(&scope).await.unwrap().unwrap();
    assert!(recorded > 0.0);

    ledger.clear_invalidation(&scope).await.unwrap();
    assert!(ledger.invalidation_time(&scope).await.unwrap().is_none());
    assert!(!ledger.revert(&scope).await.unwrap());
}

#[tokio::test]
async fn unparseable_stored_value_reads_as_no_record() {
    let store = Arc::new(MemoryInvalidationStore::new());
    store.set("user::john", "not-a-timestamp").await.unwrap();

    let ledger = InvalidationLedger::new(Arc::clone(&store) as Arc<dyn InvalidationStore>);
    assert!(
        ledger
            .invalidation_time(&Scope::subject("john"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn rejection_timestamp_converts_to_datetime() {
    let svc = TokenService::new(SECRET, Arc::new(MemoryInvalidationStore::new()));
    let token = svc
        .sign(&PAYLOAD, &SignOptions::new().user("john"))
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    svc.invalidate(Scope::subject("john")).await.unwrap();

    let err = svc.verify::<String>(&token).await.unwrap_err();
    let details = err.invalidation().expect("expected invalidation rejection");

    // chrono 换算与原始浮点时间戳保持整秒一致
    let datetime = details.invalidated_at_datetime();
    assert_eq!(datetime.timestamp(), details.invalidated_at.trunc() as i64);
}

#[test]
fn memory_store_round_trip_in_a_blocking_context() {
    let store = MemoryInvalidationStore::new();

    tokio_test::block_on(async {
        store.set("user::john", "1700000000.5").await.unwrap();
        assert_eq!(
            store.get("user::john").await.unwrap().as_deref(),
            Some("1700000000.5")
        );
        assert_eq!(store.len().await, 1);

        store.del("user::john").await.unwrap();
        assert!(store.get("user::john").await.unwrap().is_none());
        assert!(store.is_empty().await);
    });
}

#[test]
fn storage_keys_carry_the_reserved_prefixes() {
    assert_eq!(Scope::token("abc.def.ghi").storage_key(), "abc.def.ghi");
    assert_eq!(Scope::subject("john").storage_key(), "user::john");
    assert_eq!(Scope::client("web").storage_key(), "client::web");
    assert_eq!(
        Scope::subject_client("john", "web").storage_key(),
        "user::john::client::web"
    );
    assert_eq!(SUBJECT_PREFIX, "user::");
    assert_eq!(CLIENT_PREFIX, "client::");
}

#[test]
fn numeric_identifiers_use_canonical_decimal_form() {
    assert_eq!(Identifier::from(1i64).canonical_key(), "1");
    assert_eq!(Identifier::from(42u64).canonical_key(), "42");
    assert_eq!(Scope::subject(7i64).storage_key(), "user::7");
}

#[test]
fn string_identifiers_are_never_json_quoted() {
    assert_eq!(Identifier::from("john").canonical_key(), "john");
    // 结构化字符串与原生字符串解析到同一个键
    assert_eq!(
        Identifier::from(json!("john")).canonical_key(),
        Identifier::from("john").canonical_key()
    );
}

#[test]
fn structurally_equal_objects_resolve_to_the_same_key() {
    let a = Identifier::from(json!({ "id": 1, "name": "John" }));
    let b = Identifier::from(json!({ "name": "John", "id": 1 }));
    assert_eq!(a.canonical_key(), b.canonical_key());

    let c = Identifier::structured(&json!({ "id": 2 })).unwrap();
    assert_ne!(a.canonical_key(), c.canonical_key());
}
