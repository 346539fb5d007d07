//! 命令执行统一错误定义
//!
//! - `ErrorMap`：命令按键（通常为字段名）记录的业务错误，是失败细节的唯一权威来源；
//! - `CommandError`：向调用方传播的错误类型，业务失败统一表现为 `Execution`，
//!   其余变体表示持久化、类型还原或生命周期等基础设施问题。
//!
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// 业务错误表：错误键 → 可读消息
///
/// 键唯一，插入顺序无意义；为空即表示命令当前被视为成功。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorMap(BTreeMap<String, String>);

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条错误，同键覆盖
    pub fn insert(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.0.insert(key.into(), message.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 将 `other` 合并进来，键冲突时以 `other` 为准
    pub fn merge(&mut self, other: &ErrorMap) {
        merge_into(self, other);
    }
}

/// 以“覆盖式并集”合并错误表：`source` 中的键写入 `target`，冲突时覆盖旧消息
pub fn merge_into(target: &mut ErrorMap, source: &ErrorMap) {
    for (key, message) in &source.0 {
        target.0.insert(key.clone(), message.clone());
    }
}

impl<K, V> FromIterator<(K, V)> for ErrorMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for ErrorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, message)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {message}")?;
        }
        f.write_str("}")
    }
}

/// 命令执行错误
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CommandError {
    /// 业务或准备阶段失败；详情以失败命令自身的 `errors()` 为准
    #[error("command execution failed: {0}")]
    Execution(ErrorMap),

    #[error("persistence error: {reason}")]
    Persistence { reason: String },

    #[error("collaborator error: {reason}")]
    Collaborator { reason: String },

    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid state: {reason}")]
    InvalidState { reason: String },
}

impl CommandError {
    pub fn persistence(reason: impl Into<String>) -> Self {
        Self::Persistence {
            reason: reason.into(),
        }
    }

    pub fn collaborator(reason: impl Into<String>) -> Self {
        Self::Collaborator {
            reason: reason.into(),
        }
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// 是否为业务失败（而非基础设施错误）
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// 业务失败时携带的错误表快照
    pub fn errors(&self) -> Option<&ErrorMap> {
        match self {
            Self::Execution(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence {
            reason: err.to_string(),
        }
    }
}

/// 统一 Result 类型别名
pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overwrites_on_collision() {
        let mut target: ErrorMap = [("name", "required"), ("age", "too young")]
            .into_iter()
            .collect();
        let source: ErrorMap = [("age", "must be a number"), ("email", "invalid")]
            .into_iter()
            .collect();

        merge_into(&mut target, &source);

        assert_eq!(target.len(), 3);
        assert_eq!(target.get("name"), Some("required"));
        assert_eq!(target.get("age"), Some("must be a number"));
        assert_eq!(target.get("email"), Some("invalid"));
    }

    #[test]
    fn display_lists_entries_in_key_order() {
        let errors: ErrorMap = [("b", "second"), ("a", "first")].into_iter().collect();
        assert_eq!(errors.to_string(), "{a: first, b: second}");
        assert_eq!(ErrorMap::new().to_string(), "{}");
    }

    #[test]
    fn execution_error_exposes_snapshot() {
        let mut errors = ErrorMap::new();
        errors.insert("title", "empty");
        let err = CommandError::Execution(errors.clone());

        assert!(err.is_execution());
        assert_eq!(err.errors(), Some(&errors));
        assert!(!CommandError::persistence("disk full").is_execution());
        assert_eq!(
            err.to_string(),
            "command execution failed: {title: empty}"
        );
    }

    #[test]
    fn serializes_as_plain_object() {
        let errors: ErrorMap = [("title", "empty")].into_iter().collect();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "title": "empty" }));
    }
}
