use cqrs_domain::domain_event::BusinessContext;
use serde::{Deserialize, Serialize};

/// 应用层上下文（Application Context）
///
/// 承载一次命令调用的横切信息：
/// - 业务语境（`BusinessContext`）：关联追踪 `correlation_id`、因果链 `causation_id`、
///   执行者类型/ID；
/// - 幂等键（`idempotency_key`）：供上层或基础设施实现请求幂等。
///
/// 命令总线把以上字段（存在时）记录在 `command` 日志 span 上。
///
/// ```rust
/// use cqrs_application::context::AppContext;
/// use cqrs_domain::domain_event::BusinessContext;
///
/// let ctx = AppContext {
///     biz: BusinessContext::builder()
///         .correlation_id("cor-123".into())
///         .maybe_actor_type(Some("user".into()))
///         .maybe_actor_id(Some("u-1".into()))
///         .build(),
///     idempotency_key: Some("idem-xyz".into()),
/// };
/// assert_eq!(ctx.biz.correlation_id(), Some("cor-123"));
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppContext {
    pub biz: BusinessContext,
    pub idempotency_key: Option<String>,
}
