// ==========================================
// 继续教育合规提醒系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 合规计算与提醒规划核心
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AuthorizationStatus, MeasurementUnit, NotificationKind, TimeOfDay};

// 领域实体
pub use domain::{
    Activity, Credential, DisciplinarySanction, LiveEvent, ReinstatementInfo,
    ReinstatementSpecialCat, ReminderRequest, RenewalPeriod, SpecialCategory,
};

// 引擎
pub use engine::{
    ComplianceEngine, ComplianceRepositories, NotificationPlanner, PeriodResolver,
    ReinstatementEngine, ReminderGateway, ReplanOrchestrator, UnitConverter,
};

// 配置
pub use config::{ConfigManager, NotificationConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "继续教育合规提醒系统";

// ==========================================
// 预编译检查
// ==========================================

// 确保编译时所有模块可见
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
