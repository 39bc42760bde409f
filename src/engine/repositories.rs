// ==========================================
// 继续教育合规提醒系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合提醒编排所需的所有 Repository
// 目标: 减少 ReplanOrchestrator 的构造函数参数数量
// ==========================================

use std::sync::{Arc, Mutex};

use crate::repository::{
    ActivityRepository, CredentialRepository, LiveEventRepository, NotifiedAwardRepository,
    ReinstatementRepository, RenewalPeriodRepository, SanctionRepository,
    SpecialCategoryRepository,
};
use rusqlite::Connection;

/// 合规提醒仓储集合
///
/// 聚合提醒编排所需的所有 Repository，简化依赖注入。
///
/// # 包含的仓储
/// - `credential_repo`: 证书
/// - `category_repo`: 专项类别
/// - `renewal_repo`: 换证周期
/// - `reinstatement_repo`: 复证信息
/// - `activity_repo`: 学习活动
/// - `sanction_repo`: 执业处分
/// - `live_event_repo`: 线下活动
/// - `notified_award_repo`: 成就通知记录
#[derive(Clone)]
pub struct ComplianceRepositories {
    /// 证书仓储
    pub credential_repo: Arc<CredentialRepository>,
    /// 专项类别仓储
    pub category_repo: Arc<SpecialCategoryRepository>,
    /// 换证周期仓储
    pub renewal_repo: Arc<RenewalPeriodRepository>,
    /// 复证信息仓储
    pub reinstatement_repo: Arc<ReinstatementRepository>,
    /// 学习活动仓储
    pub activity_repo: Arc<ActivityRepository>,
    /// 执业处分仓储
    pub sanction_repo: Arc<SanctionRepository>,
    /// 线下活动仓储
    pub live_event_repo: Arc<LiveEventRepository>,
    /// 成就通知记录仓储
    pub notified_award_repo: Arc<NotifiedAwardRepository>,
}

impl ComplianceRepositories {
    /// 创建新的仓储集合
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        credential_repo: Arc<CredentialRepository>,
        category_repo: Arc<SpecialCategoryRepository>,
        renewal_repo: Arc<RenewalPeriodRepository>,
        reinstatement_repo: Arc<ReinstatementRepository>,
        activity_repo: Arc<ActivityRepository>,
        sanction_repo: Arc<SanctionRepository>,
        live_event_repo: Arc<LiveEventRepository>,
        notified_award_repo: Arc<NotifiedAwardRepository>,
    ) -> Self {
        Self {
            credential_repo,
            category_repo,
            renewal_repo,
            reinstatement_repo,
            activity_repo,
            sanction_repo,
            live_event_repo,
            notified_award_repo,
        }
    }

    /// 基于同一个数据库连接构建全部仓储
    ///
    /// 单机 SQLite 场景的常用入口 (生产与集成测试共用)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            credential_repo: Arc::new(CredentialRepository::from_connection(conn.clone())),
            category_repo: Arc::new(SpecialCategoryRepository::from_connection(conn.clone())),
            renewal_repo: Arc::new(RenewalPeriodRepository::from_connection(conn.clone())),
            reinstatement_repo: Arc::new(ReinstatementRepository::from_connection(conn.clone())),
            activity_repo: Arc::new(ActivityRepository::from_connection(conn.clone())),
            sanction_repo: Arc::new(SanctionRepository::from_connection(conn.clone())),
            live_event_repo: Arc::new(LiveEventRepository::from_connection(conn.clone())),
            notified_award_repo: Arc::new(NotifiedAwardRepository::from_connection(conn)),
        }
    }
}
