// ==========================================
// 继续教育合规提醒系统 - 提醒来源实体
// ==========================================
// 处分整改 + 线下活动
// 两者仅作为提醒规划的截止时间来源, 不参与CE统计
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// DisciplinarySanction - 执业处分
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisciplinarySanction {
    pub sanction_id: String,                      // 处分ID
    pub credential_id: String,                    // 所属证书
    pub title: String,                            // 处分事由
    pub resolution_deadline: Option<NaiveDate>,   // 整改截止日
    pub resolved: bool,                           // 是否已整改完结
    pub created_at: NaiveDateTime,                // 创建时间
}

impl DisciplinarySanction {
    /// 判断处分是否需要规划截止提醒
    ///
    /// 已整改或无截止日的处分不产生提醒
    pub fn needs_reminder(&self) -> bool {
        !self.resolved && self.resolution_deadline.is_some()
    }
}

// ==========================================
// LiveEvent - 线下活动
// ==========================================
// 有确切开始时刻的活动 (讲座/考试/现场课),
// 同时产生按天与按分钟两路提前提醒
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveEvent {
    pub event_id: String,           // 活动ID
    pub title: String,              // 活动名称
    pub starts_at: NaiveDateTime,   // 开始时刻
    pub location: Option<String>,   // 地点
    pub created_at: NaiveDateTime,  // 创建时间
}
