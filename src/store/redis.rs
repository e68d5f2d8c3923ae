use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, RedisResult, Script, Value};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::domain::order::{Order, OrderId};

use super::codec::{decode, encode};
use super::keys::{order_key, parse_order_key, ORDER_INDEX_KEY};
use super::{OrderRepository, PageRequest, PageResult, StoreError};

// ============================================================================
// Redis Order Store
// ============================================================================
//
// insert / delete: one MULTI/EXEC group touching the record and the index set.
// update:          Lua compare-and-set on the record's revision.
// find_all:        SSCAN over the index set, then MGET for the page.
//
// Every round-trip is bounded by `op_timeout`; an elapsed timeout surfaces as
// StoreError::Transport. Nothing here retries.
//
// ============================================================================

// Reply: {0, 0} missing, {2, stored} revision mismatch, {3, 0} undecodable,
// {1, new_revision} written.
const CONDITIONAL_UPDATE_LUA: &str = r#"
local current = redis.call('GET', KEYS[1])
if not current then
    return {0, 0}
end
local ok, decoded = pcall(cjson.decode, current)
if not ok or type(decoded) ~= 'table' then
    return {3, 0}
end
local stored = tonumber(decoded['revision']) or 0
if stored ~= tonumber(ARGV[1]) then
    return {2, stored}
end
redis.call('SET', KEYS[1], ARGV[2], 'XX')
return {1, stored + 1}
"#;

pub struct RedisOrderStore {
    conn: MultiplexedConnection,
    op_timeout: Duration,
    update_script: Script,
}

impl RedisOrderStore {
    pub async fn connect(client: &Client, op_timeout: Duration) -> Result<Self, StoreError> {
        let conn = timeout(op_timeout, client.get_multiplexed_async_connection()).await??;

        tracing::info!(timeout_ms = op_timeout.as_millis() as u64, "Connected to Redis");

        Ok(Self {
            conn,
            op_timeout,
            update_script: Script::new(CONDITIONAL_UPDATE_LUA),
        })
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        Ok(timeout(self.op_timeout, operation).await??)
    }
}

#[async_trait]
impl OrderRepository for RedisOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let key = order_key(order.order_id);
        let mut record = order.clone();
        record.revision = 0;
        let bytes = encode(&record)?;

        // SADD runs even when SET NX refuses; the key is then already indexed.
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("SET").arg(&key).arg(bytes).arg("NX")
            .cmd("SADD").arg(ORDER_INDEX_KEY).arg(&key);

        let mut conn = self.conn.clone();
        let (created, _indexed): (Value, i64) =
            self.bounded(pipe.query_async(&mut conn)).await?;

        if created == Value::Nil {
            return Err(StoreError::AlreadyExists(order.order_id));
        }

        tracing::info!(order_id = order.order_id, key = %key, "Inserted order");
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Order, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = self
            .bounded(redis::cmd("GET").arg(order_key(id)).query_async(&mut conn))
            .await?;

        match value {
            Some(bytes) => decode(&bytes),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn update(&self, order: &Order) -> Result<u64, StoreError> {
        let key = order_key(order.order_id);
        let mut record = order.clone();
        record.revision = order.revision + 1;
        let bytes = encode(&record)?;

        let mut conn = self.conn.clone();
        let mut invocation = self.update_script.key(&key);
        invocation.arg(order.revision).arg(bytes);
        let (status, revision): (i64, u64) =
            self.bounded(invocation.invoke_async(&mut conn)).await?;

        match status {
            1 => {
                tracing::debug!(order_id = order.order_id, revision, "Updated order");
                Ok(revision)
            }
            0 => Err(StoreError::NotFound(order.order_id)),
            2 => Err(StoreError::Conflict {
                id: order.order_id,
                expected: order.revision,
                actual: revision,
            }),
            _ => Err(StoreError::Decode(format!(
                "stored record for order {} is not valid JSON",
                order.order_id
            ))),
        }
    }

    async fn delete_by_id(&self, id: OrderId) -> Result<(), StoreError> {
        let key = order_key(id);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("DEL").arg(&key)
            .cmd("SREM").arg(ORDER_INDEX_KEY).arg(&key);

        let mut conn = self.conn.clone();
        let (deleted, _unindexed): (i64, i64) =
            self.bounded(pipe.query_async(&mut conn)).await?;

        if deleted == 0 {
            return Err(StoreError::NotFound(id));
        }

        tracing::info!(order_id = id, key = %key, "Deleted order");
        Ok(())
    }

    async fn find_all(&self, page: PageRequest) -> Result<PageResult, StoreError> {
        let mut conn = self.conn.clone();
        let (next_offset, keys): (u64, Vec<String>) = self
            .bounded(
                redis::cmd("SSCAN")
                    .arg(ORDER_INDEX_KEY)
                    .arg(page.offset)
                    .arg("COUNT")
                    .arg(page.size.max(1))
                    .query_async(&mut conn),
            )
            .await?;

        let keys: Vec<String> = keys
            .into_iter()
            .filter(|key| {
                let known = parse_order_key(key).is_some();
                if !known {
                    tracing::warn!(key = %key, "Skipping foreign entry in order index");
                }
                known
            })
            .collect();

        if keys.is_empty() {
            return Ok(PageResult { orders: Vec::new(), next_offset });
        }

        let values: Vec<Option<Vec<u8>>> = self
            .bounded(redis::cmd("MGET").arg(&keys).query_async(&mut conn))
            .await?;

        // A key can vanish between SSCAN and MGET; skip it.
        let orders = values
            .into_iter()
            .flatten()
            .map(|bytes| decode(&bytes))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            cursor = page.offset,
            next_cursor = next_offset,
            scanned = keys.len(),
            returned = orders.len(),
            "Scanned order index"
        );

        Ok(PageResult { orders, next_offset })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = self.bounded(redis::cmd("PING").query_async(&mut conn)).await?;
        Ok(())
    }
}

// These need a reachable Redis and wipe the selected database:
//   REDIS_URL=redis://127.0.0.1:6379/15 cargo test -- --ignored
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;
    use tokio::sync::{Mutex, MutexGuard};

    const DEFAULT_TEST_URL: &str = "redis://127.0.0.1:6379/15";

    // Every test flushes the same database, so they take turns.
    static REDIS_LOCK: Mutex<()> = Mutex::const_new(());

    async fn fresh_store() -> (MutexGuard<'static, ()>, RedisOrderStore) {
        let guard = REDIS_LOCK.lock().await;
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_TEST_URL.to_string());
        let client = Client::open(url).unwrap();
        let store = RedisOrderStore::connect(&client, Duration::from_secs(2))
            .await
            .unwrap();

        let mut conn = store.conn.clone();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await.unwrap();

        (guard, store)
    }

    async fn put_raw(store: &RedisOrderStore, key: &str, bytes: &[u8]) {
        let mut conn = store.conn.clone();
        let _: () = redis::pipe()
            .cmd("SET").arg(key).arg(bytes).ignore()
            .cmd("SADD").arg(ORDER_INDEX_KEY).arg(key).ignore()
            .query_async(&mut conn)
            .await
            .unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_insert_then_find() {
        let (_guard, store) = fresh_store().await;
        contract::insert_then_find(&store).await;
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_insert_existing_is_rejected() {
        let (_guard, store) = fresh_store().await;
        contract::insert_existing_is_rejected(&store).await;
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_find_missing_is_not_found() {
        let (_guard, store) = fresh_store().await;
        contract::find_missing_is_not_found(&store).await;
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_update_bumps_revision() {
        let (_guard, store) = fresh_store().await;
        contract::update_bumps_revision(&store).await;
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_update_missing_is_not_found() {
        let (_guard, store) = fresh_store().await;
        contract::update_missing_is_not_found(&store).await;
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_stale_update_conflicts() {
        let (_guard, store) = fresh_store().await;
        contract::stale_update_conflicts(&store).await;
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_delete_removes_record_and_index() {
        let (_guard, store) = fresh_store().await;
        contract::delete_removes_record_and_index(&store).await;
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_scan_visits_every_order() {
        let (_guard, store) = fresh_store().await;
        contract::scan_visits_every_order(&store).await;
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_empty_scan_is_complete() {
        let (_guard, store) = fresh_store().await;
        contract::empty_scan_is_complete(&store).await;
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_ping() {
        let (_guard, store) = fresh_store().await;
        store.ping().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_undecodable_record_is_decode_error() {
        let (_guard, store) = fresh_store().await;
        put_raw(&store, &order_key(3), b"not json").await;

        assert!(matches!(store.find_by_id(3).await, Err(StoreError::Decode(_))));

        // The conditional update script must refuse to touch it as well.
        let err = store.update(&contract::order(3)).await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));

        let mut conn = store.conn.clone();
        let raw: Vec<u8> = redis::cmd("GET").arg(order_key(3)).query_async(&mut conn).await.unwrap();
        assert_eq!(raw, b"not json");
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_foreign_index_entries_are_skipped() {
        let (_guard, store) = fresh_store().await;
        store.insert(&contract::order(8)).await.unwrap();
        put_raw(&store, "session:abc", b"{}").await;

        let page = store.find_all(PageRequest::first(100)).await.unwrap();

        let ids: Vec<OrderId> = page.orders.iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![8]);
        assert!(page.is_last());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_insert_stores_revision_zero() {
        let (_guard, store) = fresh_store().await;
        let mut order = contract::order(21);
        order.revision = 9;

        store.insert(&order).await.unwrap();

        assert_eq!(store.find_by_id(21).await.unwrap().revision, 0);
    }
}
