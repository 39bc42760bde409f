// ==========================================
// 继续教育合规提醒系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod activity_repo;
pub mod credential_repo;
pub mod error;
pub mod event_repo;
pub mod notified_award_repo;
pub mod renewal_repo;

// 重导出核心仓储
pub use activity_repo::{ActivityFilter, ActivityRepository};
pub use credential_repo::{CredentialRepository, SpecialCategoryRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use event_repo::{LiveEventRepository, SanctionRepository};
pub use notified_award_repo::NotifiedAwardRepository;
pub use renewal_repo::{ReinstatementRepository, RenewalPeriodRepository};
