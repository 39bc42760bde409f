// ==========================================
// 继续教育合规提醒系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、值对象
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod activity;
pub mod credential;
pub mod event;
pub mod notification;
pub mod renewal;
pub mod types;

// 重导出核心类型
pub use activity::Activity;
pub use credential::{Credential, SpecialCategory, DEFAULT_HOURS_PER_UNIT};
pub use event::{DisciplinarySanction, LiveEvent};
pub use notification::ReminderRequest;
pub use renewal::{ReinstatementInfo, ReinstatementSpecialCat, RenewalPeriod};
pub use types::{AuthorizationStatus, MeasurementUnit, NotificationKind, TimeOfDay};
