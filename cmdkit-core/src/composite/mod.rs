//! 组合命令（composite）
//!
//! 以同一个 `CommandList` 结构承载两种组合语义：
//! - `Mode::Parallel`：扇出执行、全部汇合，组合统一批量写入；
//! - `Mode::Sequential`：有序链路，成员各自持久化，首个失败即中止。
//!
//! 组合本身实现 `Command`，因此并行与顺序可以任意互相嵌套。
//!
mod chain;
mod list;
mod parallel;
mod sequential;

pub use chain::Then;
pub use list::{CommandList, Mode};
