//! 通知扇出
//!
//! 审核事件写入持久化通知记录，接收方轮询读取。
//! 没有推送投递层，换来的是不需要 pub/sub 基础设施。

mod fanout;
mod template;

pub use fanout::NotificationFanout;
pub use template::TemplateEngine;
