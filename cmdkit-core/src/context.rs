use crate::persist::Persistence;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 业务上下文信息
#[derive(Builder, Default, Debug, Clone, Serialize, Deserialize)]
pub struct BusinessContext {
    /// 关联ID
    correlation_id: Option<String>,
    /// 因果ID
    causation_id: Option<String>,
    /// 发起本次用例的主体类型（如用户、系统等）
    actor_type: Option<String>,
    /// 发起本次用例的主体ID
    actor_id: Option<String>,
}

impl BusinessContext {
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn actor_type(&self) -> Option<&str> {
        self.actor_type.as_deref()
    }

    pub fn actor_id(&self) -> Option<&str> {
        self.actor_id.as_deref()
    }
}

/// 命令执行上下文（Command Context）
///
/// 承载一次命令树执行所需的横切依赖：
/// - 持久化协作方（`store`）：`execute()` 在成功后将暂存实体批量写入；
/// - 业务语境（`business`）：关联追踪信息，随日志字段输出。
///
/// 典型用法：
/// ```rust
/// use cmdkit_core::context::{BusinessContext, CommandContext};
/// use cmdkit_core::persist::InMemoryStore;
/// use std::sync::Arc;
///
/// let ctx = CommandContext::builder()
///     .store(Arc::new(InMemoryStore::new()))
///     .business(
///         BusinessContext::builder()
///             .maybe_correlation_id(Some("cor-123".into()))
///             .maybe_actor_id(Some("u-1".into()))
///             .build(),
///     )
///     .build();
/// assert_eq!(ctx.correlation_id(), Some("cor-123"));
/// ```
#[derive(Builder, Clone)]
pub struct CommandContext {
    store: Arc<dyn Persistence>,
    #[builder(default)]
    business: BusinessContext,
}

impl CommandContext {
    pub fn new(store: Arc<dyn Persistence>) -> Self {
        Self {
            store,
            business: BusinessContext::default(),
        }
    }

    pub fn store(&self) -> &dyn Persistence {
        self.store.as_ref()
    }

    pub fn business(&self) -> &BusinessContext {
        &self.business
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.business.correlation_id()
    }
}
