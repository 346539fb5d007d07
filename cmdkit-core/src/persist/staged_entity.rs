//! 待持久化实体（StagedEntity）
//!
//! 命令在业务阶段计算出、但尚未写入的数据的标准形态。
//! 负载统一序列化为 JSON，使持久化协作方无需了解具体模型类型。
//!
use crate::error::CommandResult;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// 写入方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOp {
    #[default]
    Upsert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct StagedEntity {
    /// 实体种类（类似表名/Kind）
    #[builder(into)]
    kind: String,
    /// 种类内唯一键
    #[builder(into)]
    key: String,
    #[builder(default)]
    op: WriteOp,
    /// 序列化后的模型；删除时为 `Null`
    #[builder(default)]
    payload: Value,
    #[builder(default = Utc::now())]
    staged_at: DateTime<Utc>,
}

impl StagedEntity {
    /// 以给定键暂存一个模型的写入
    pub fn upsert<M>(kind: impl Into<String>, key: impl Into<String>, model: &M) -> CommandResult<Self>
    where
        M: Serialize,
    {
        Ok(Self::builder()
            .kind(kind)
            .key(key)
            .payload(serde_json::to_value(model)?)
            .build())
    }

    /// 暂存一个新模型的写入，键由 UUID v4 生成
    pub fn insert<M>(kind: impl Into<String>, model: &M) -> CommandResult<Self>
    where
        M: Serialize,
    {
        Self::upsert(kind, uuid::Uuid::new_v4().to_string(), model)
    }

    /// 暂存一次删除
    pub fn delete(kind: impl Into<String>, key: impl Into<String>) -> Self {
        Self::builder().kind(kind).key(key).op(WriteOp::Delete).build()
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn op(&self) -> WriteOp {
        self.op
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn staged_at(&self) -> DateTime<Utc> {
        self.staged_at
    }

    /// 将负载还原为模型
    pub fn to_model<M>(&self) -> CommandResult<M>
    where
        M: DeserializeOwned,
    {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Tag {
        label: String,
    }

    #[test]
    fn upsert_carries_serialized_model() {
        let tag = Tag {
            label: "x".into(),
        };
        let entity = StagedEntity::upsert("tag", "t-1", &tag).unwrap();

        assert_eq!(entity.kind(), "tag");
        assert_eq!(entity.key(), "t-1");
        assert_eq!(entity.op(), WriteOp::Upsert);
        assert_eq!(entity.payload(), &serde_json::json!({ "label": "x" }));
        assert_eq!(entity.to_model::<Tag>().unwrap(), tag);
    }

    #[test]
    fn insert_generates_distinct_keys() {
        let tag = Tag {
            label: "x".into(),
        };
        let a = StagedEntity::insert("tag", &tag).unwrap();
        let b = StagedEntity::insert("tag", &tag).unwrap();
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn delete_has_no_payload() {
        let entity = StagedEntity::delete("tag", "t-1");
        assert_eq!(entity.op(), WriteOp::Delete);
        assert!(entity.payload().is_null());
    }
}
