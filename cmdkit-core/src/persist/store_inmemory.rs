//! 内存版持久化协作方（InMemoryStore）
//!
//! 基于 `DashMap` 的轻量存储，满足 `Persistence` 协议：
//! - 按 `(kind, key)` 保存实体负载，删除即移除；
//! - 统计批量写入次数，便于校验“每次 execute 至多一次批量写入”；
//! - 可注入一次性写入失败，用于验证错误传播。
//!
//! 典型用途：测试环境、示例与本地开发。

use crate::error::{CommandError, CommandResult};
use crate::persist::{Persistence, StagedEntity, WriteOp};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct InMemoryStore {
    rows: DashMap<(String, String), Value>,
    batches: AtomicUsize,
    fail_next: Mutex<Option<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: &str, key: &str) -> Option<Value> {
        self.rows
            .get(&(kind.to_string(), key.to_string()))
            .map(|row| row.value().clone())
    }

    /// 读取并反序列化为模型；不存在时返回 `Ok(None)`
    pub fn get_as<M>(&self, kind: &str, key: &str) -> CommandResult<Option<M>>
    where
        M: DeserializeOwned,
    {
        self.get(kind, key)
            .map(|value| serde_json::from_value(value).map_err(CommandError::from))
            .transpose()
    }

    pub fn contains(&self, kind: &str, key: &str) -> bool {
        self.rows.contains_key(&(kind.to_string(), key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 已成功写入的批次数
    pub fn batch_count(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    /// 让下一次批量写入失败（整批不落盘）
    pub fn fail_next_batch(&self, reason: impl Into<String>) {
        let mut slot = self.fail_next.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(reason.into());
    }
}

#[async_trait]
impl Persistence for InMemoryStore {
    async fn persist_batch(&self, entities: Vec<StagedEntity>) -> CommandResult<()> {
        let injected = self
            .fail_next
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(reason) = injected {
            return Err(CommandError::persistence(reason));
        }

        for entity in entities {
            let id = (entity.kind().to_string(), entity.key().to_string());
            match entity.op() {
                WriteOp::Upsert => {
                    self.rows.insert(id, entity.payload().clone());
                }
                WriteOp::Delete => {
                    self.rows.remove(&id);
                }
            }
        }

        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
