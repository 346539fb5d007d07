use crate::error::CommandResult;
use crate::persist::StagedEntity;
use async_trait::async_trait;
use std::sync::Arc;

/// 持久化协作方
///
/// - 一次调用即一次批量写入，成功返回 `()`；
/// - 任一写入失败都使整个 `execute()` 失败，核心层不做重试。
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn persist_batch(&self, entities: Vec<StagedEntity>) -> CommandResult<()>;
}

#[async_trait]
impl<T> Persistence for Arc<T>
where
    T: Persistence + ?Sized,
{
    async fn persist_batch(&self, entities: Vec<StagedEntity>) -> CommandResult<()> {
        (**self).persist_batch(entities).await
    }
}
