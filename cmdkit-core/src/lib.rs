//! 命令执行引擎核心库（cmdkit-core）
//!
//! 以“命令”组织业务用例：每个命令分准备、业务、暂存三个阶段，
//! 并通过统一的错误表汇总单个命令与组合命令的失败。
//! - 命令协议与执行编排（`command`）
//! - 并行/顺序组合与组合运算符（`composite`）
//! - 执行上下文（`context`）与持久化协作协议（`persist`）
//! - 统一错误（`error`）与日志初始化（`logging`）
//!
//! 典型用法：
//! 1. 定义叶子命令：内嵌 `CommandState`，实现 `run_business`，按需覆盖 `prepare/handle_previous`；
//! 2. 以 `CommandList::parallel()/sequential()` 或 `a.then(b)` 组装命令树；
//! 3. 构造 `CommandContext`（注入 `Persistence` 实现），在根节点调用 `execute/invoke`；
//! 4. 失败时读取根节点的 `errors()` 获取全部业务错误。
//!
pub mod command;
pub mod composite;
pub mod context;
pub mod error;
pub mod logging;
pub mod persist;

pub use command::{Command, CommandExt, CommandState, Output, Phase};
pub use composite::{CommandList, Mode, Then};
pub use context::{BusinessContext, CommandContext};
pub use error::{CommandError, CommandResult, ErrorMap, merge_into};
