//! 常用协作命令（cmdkit-commands）
//!
//! 基于 `cmdkit-core` 的叶子命令：
//! - `FetchCommand`：HTTP 请求
//! - `EnqueueCommand`：提交后台任务
//! - `SearchCommand`：分页查询
//! - `SaveCommand` / `DeleteCommand`：暂存写入与删除
//!
//! 需要等待外部协作方的命令都在准备阶段发起请求，
//! 因此放入并行组合时这些请求会同时在途。
//!
pub mod delete;
pub mod error;
pub mod fetch;
mod pending;
pub mod queue;
pub mod save;
pub mod search;

pub use delete::DeleteCommand;
pub use error::CollaboratorError;
pub use fetch::{FetchCommand, FetchConfig, FetchResponse, HttpMethod};
pub use queue::{EnqueueCommand, EnqueueConfig, InMemoryTaskQueue, Task, TaskQueue};
pub use save::{Record, SaveCommand};
pub use search::{Page, PageSource, SearchCommand, SearchConfig, VecPageSource};
