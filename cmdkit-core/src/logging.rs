//! 日志初始化
//!
//! 核心库只通过 `tracing` 发出结构化事件；是否以及如何输出由应用决定。
//! 这里提供一个基于 `tracing-subscriber` 的默认安装方式，供二进制与示例使用。
//!
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` 指令；设置了 `RUST_LOG` 时以环境变量为准
    pub filter: String,
    /// 是否输出 JSON 行
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// 安装全局订阅者；已安装过时返回 `false` 且不做任何事
pub fn init(config: &LoggingConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        let config = LoggingConfig {
            filter: "debug".into(),
            json: true,
        };
        let _ = init(&config);
        assert!(!init(&LoggingConfig::default()));
    }
}
