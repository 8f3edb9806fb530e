use serde_json::{Map, Value};

use db::{Database, DbConfig, DbError, TaskQueue};

/// A fresh in-memory store, isolated from every other test.
pub async fn setup_db() -> Result<Database, DbError> {
    db::connect(&DbConfig::memory()).await
}

pub async fn setup_queue() -> Result<TaskQueue, DbError> {
    Ok(TaskQueue::new(setup_db().await?, "test"))
}

pub fn sleep_payload(seconds: u64) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("seconds".to_string(), Value::from(seconds));
    map
}
