use bon::Builder;
use serde::{Deserialize, Serialize};

/// 业务上下文信息：随命令进入应用层，用于链路追踪与审计日志
#[derive(Builder, Default, Debug, Clone, Serialize, Deserialize)]
pub struct BusinessContext {
    /// 关联ID
    correlation_id: Option<String>,
    /// 因果ID
    causation_id: Option<String>,
    /// 触发命令的主体类型（如用户、系统等）
    actor_type: Option<String>,
    /// 触发命令的主体ID
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let biz = BusinessContext::builder()
            .correlation_id("cor-1".into())
            .maybe_actor_id(Some("u-1".into()))
            .build();

        assert_eq!(biz.correlation_id(), Some("cor-1"));
        assert_eq!(biz.actor_id(), Some("u-1"));
        assert_eq!(biz.causation_id(), None);
        assert_eq!(biz.actor_type(), None);
    }
}
