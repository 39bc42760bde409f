// ==========================================
// 继续教育合规提醒系统 - 提醒计划值对象
// ==========================================
// 规划器输出的瞬态值, 本核心不落库
// 红线: 稳定键必须确定性生成, 重复规划得到同一键
// ==========================================

use crate::domain::types::NotificationKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ReminderRequest - 提醒调度请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRequest {
    pub stable_key: String,         // 稳定键 (跨实体类型唯一)
    pub kind: NotificationKind,     // 提醒类型
    pub title: String,              // 标题
    pub body: String,               // 正文
    pub trigger_at: NaiveDateTime,  // 触发时刻
    pub series_index: u32,          // 同一锚点下的序号 (0=主提醒)
}

impl ReminderRequest {
    /// 类型限定的实体唯一ID
    ///
    /// 不同实体类型各自的主键空间可能重叠 (都是UUID字符串),
    /// 前缀限定后拼入稳定键才具备全局唯一性
    pub fn entity_uid(kind: NotificationKind, entity_id: &str) -> String {
        format!("{}:{}", kind.source_prefix(), entity_id)
    }

    /// 生成稳定键
    ///
    /// 格式: "{实体UID}-{提醒类型}.{序号}"
    /// 同输入恒得同键, 以此保证 replan 幂等
    pub fn stable_key(kind: NotificationKind, entity_id: &str, series_index: u32) -> String {
        format!(
            "{}-{}.{}",
            Self::entity_uid(kind, entity_id),
            kind.to_db_str(),
            series_index
        )
    }
}
