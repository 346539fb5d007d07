//! 持久化（persist）
//!
//! 定义命令与存储之间唯一的协作协议：
//! - 待持久化实体的标准形态（`StagedEntity`/`WriteOp`）；
//! - 批量写入协议（`Persistence`），一次调用即一批；
//! - 内存实现（`InMemoryStore`），用于测试与示例。
//!
//! 具体存储后端由上层提供实现并注入 `CommandContext`。
//!
mod persistence;
mod staged_entity;
mod store_inmemory;

pub use persistence::Persistence;
pub use staged_entity::{StagedEntity, WriteOp};
pub use store_inmemory::InMemoryStore;
