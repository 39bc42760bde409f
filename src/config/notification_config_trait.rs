// ==========================================
// 继续教育合规提醒系统 - 提醒配置读取 Trait
// ==========================================
// 职责: 定义提醒规划所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::{NotificationKind, TimeOfDay};
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// NotificationConfigReader Trait
// ==========================================
// 用途: 提醒规划编排所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait NotificationConfigReader: Send + Sync {
    // ===== 按天提前量 =====

    /// 获取主提醒提前天数
    ///
    /// # 默认值
    /// - 30
    async fn get_lead_days_primary(&self) -> Result<i64, Box<dyn Error>>;

    /// 获取次提醒提前天数
    ///
    /// # 默认值
    /// - 7
    async fn get_lead_days_secondary(&self) -> Result<i64, Box<dyn Error>>;

    // ===== 线下活动按分钟提前量 =====

    /// 获取线下活动主提醒提前分钟数
    ///
    /// # 默认值
    /// - 120
    ///
    /// # 说明
    /// ≤0 时该条按分钟提醒被丢弃（不规划）
    async fn get_lead_minutes_primary_live(&self) -> Result<i64, Box<dyn Error>>;

    /// 获取线下活动次提醒提前分钟数
    ///
    /// # 默认值
    /// - 15
    async fn get_lead_minutes_secondary_live(&self) -> Result<i64, Box<dyn Error>>;

    // ===== 时段与开关 =====

    /// 获取提醒时段偏好
    ///
    /// # 默认值
    /// - MORNING (上午 09:00)
    async fn get_time_of_day_preference(&self) -> Result<TimeOfDay, Box<dyn Error>>;

    /// 查询指定提醒类型是否启用
    ///
    /// # 默认值
    /// - true (未配置的类型一律视为启用)
    async fn get_kind_enabled(&self, kind: NotificationKind) -> Result<bool, Box<dyn Error>>;
}
