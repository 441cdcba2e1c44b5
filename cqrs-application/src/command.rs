/// 应用层命令（Command）
///
/// 表达“意图”的写操作请求，由唯一的处理器执行，不返回业务数据。
/// 建议使用动宾结构命名，如 `ChangeEmail`、`CloseOrder`。
///
/// `NAME` 是命令的稳定名称，用于错误信息、日志与追踪，不依赖 `type_name::<T>()`。
/// `#[command]` 宏默认取类型名并去掉 `Command` 后缀。
pub trait Command: Send + Sync + 'static {
    const NAME: &'static str;
}
