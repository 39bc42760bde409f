// ==========================================
// 继续教育合规提醒系统 - 领域类型定义
// ==========================================
// 红线: 单位/提醒类型/时段全部使用封闭枚举,
//       禁止裸字符串贯穿比较逻辑
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 计量单位 (Measurement Unit)
// ==========================================
// CE 计量口径: 学时(Hours) 或 学分(Units)
// 换算经由证书的 hours_per_unit 比率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasurementUnit {
    Hours, // 学时
    Units, // 学分
}

impl fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementUnit::Hours => write!(f, "HOURS"),
            MeasurementUnit::Units => write!(f, "UNITS"),
        }
    }
}

impl MeasurementUnit {
    /// 从字符串解析计量单位
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "UNITS" => MeasurementUnit::Units,
            _ => MeasurementUnit::Hours, // 默认学时
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MeasurementUnit::Hours => "HOURS",
            MeasurementUnit::Units => "UNITS",
        }
    }
}

// ==========================================
// 提醒类型 (Notification Kind)
// ==========================================
// 稳定键的组成部分之一, to_db_str 值进入稳定键,
// 修改会导致既有提醒无法被幂等覆盖
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    ActivityExpiry,        // 活动证明到期
    RenewalDeadline,       // 换证周期截止
    SanctionDeadline,      // 处分整改截止
    ReinstatementDeadline, // 复证截止
    LiveEventDay,          // 线下活动(按天提前)
    LiveEventTime,         // 线下活动(按分钟提前)
    Award,                 // 成就通知
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl NotificationKind {
    /// 从字符串解析提醒类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVITY_EXPIRY" => Some(NotificationKind::ActivityExpiry),
            "RENEWAL_DEADLINE" => Some(NotificationKind::RenewalDeadline),
            "SANCTION_DEADLINE" => Some(NotificationKind::SanctionDeadline),
            "REINSTATEMENT_DEADLINE" => Some(NotificationKind::ReinstatementDeadline),
            "LIVE_EVENT_DAY" => Some(NotificationKind::LiveEventDay),
            "LIVE_EVENT_TIME" => Some(NotificationKind::LiveEventTime),
            "AWARD" => Some(NotificationKind::Award),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            NotificationKind::ActivityExpiry => "ACTIVITY_EXPIRY",
            NotificationKind::RenewalDeadline => "RENEWAL_DEADLINE",
            NotificationKind::SanctionDeadline => "SANCTION_DEADLINE",
            NotificationKind::ReinstatementDeadline => "REINSTATEMENT_DEADLINE",
            NotificationKind::LiveEventDay => "LIVE_EVENT_DAY",
            NotificationKind::LiveEventTime => "LIVE_EVENT_TIME",
            NotificationKind::Award => "AWARD",
        }
    }

    /// 实体唯一ID的类型限定前缀
    ///
    /// 稳定键 = "{前缀}:{实体ID}-{提醒类型}.{序号}"
    /// 前缀保证不同实体类型的ID空间互不冲突
    pub fn source_prefix(&self) -> &'static str {
        match self {
            NotificationKind::ActivityExpiry => "activity",
            NotificationKind::RenewalDeadline => "renewal",
            NotificationKind::SanctionDeadline => "sanction",
            NotificationKind::ReinstatementDeadline => "reinstatement",
            NotificationKind::LiveEventDay | NotificationKind::LiveEventTime => "live",
            NotificationKind::Award => "award",
        }
    }

    /// replan 范围内的全部提醒类型 (成就通知单独管理,不在其中)
    pub fn replannable() -> [NotificationKind; 6] {
        [
            NotificationKind::ActivityExpiry,
            NotificationKind::RenewalDeadline,
            NotificationKind::SanctionDeadline,
            NotificationKind::ReinstatementDeadline,
            NotificationKind::LiveEventDay,
            NotificationKind::LiveEventTime,
        ]
    }
}

// ==========================================
// 提醒时段偏好 (Time Of Day)
// ==========================================
// 按天提醒落在锚定日的固定时刻,自午夜偏移
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeOfDay {
    Morning,   // 上午 09:00
    Afternoon, // 下午 14:00
    Evening,   // 晚间 19:00
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeOfDay::Morning => write!(f, "MORNING"),
            TimeOfDay::Afternoon => write!(f, "AFTERNOON"),
            TimeOfDay::Evening => write!(f, "EVENING"),
        }
    }
}

impl TimeOfDay {
    /// 从字符串解析时段偏好
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "AFTERNOON" => TimeOfDay::Afternoon,
            "EVENING" => TimeOfDay::Evening,
            _ => TimeOfDay::Morning, // 默认上午
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "MORNING",
            TimeOfDay::Afternoon => "AFTERNOON",
            TimeOfDay::Evening => "EVENING",
        }
    }

    /// 自午夜起的偏移小时数
    pub fn hour_offset(&self) -> u32 {
        match self {
            TimeOfDay::Morning => 9,
            TimeOfDay::Afternoon => 14,
            TimeOfDay::Evening => 19,
        }
    }
}

// ==========================================
// 通知授权状态 (Authorization Status)
// ==========================================
// 网关边界的平台授权结果, NotDetermined 时允许重试一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationStatus {
    NotDetermined, // 尚未向用户请求授权
    Denied,        // 用户拒绝
    Authorized,    // 已授权
}

impl fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorizationStatus::NotDetermined => write!(f, "NOT_DETERMINED"),
            AuthorizationStatus::Denied => write!(f, "DENIED"),
            AuthorizationStatus::Authorized => write!(f, "AUTHORIZED"),
        }
    }
}
