// ==========================================
// 继续教育合规提醒系统 - 成就通知记录仓储
// ==========================================
// "已通知成就"持久集合: replan 的全量取消不触碰它,
// 仅在成就提醒被显式撤销时逐条移除
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 成就通知记录仓储
/// 职责: 管理 notified_award 表 (award_key 持久集合)
pub struct NotifiedAwardRepository {
    conn: Arc<Mutex<Connection>>,
}

impl NotifiedAwardRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 记录成就已通知 (重复记录幂等)
    pub fn mark_notified(&self, award_key: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO notified_award (award_key) VALUES (?1)",
            params![award_key],
        )?;
        Ok(())
    }

    /// 查询成就是否已通知过
    pub fn is_notified(&self, award_key: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notified_award WHERE award_key = ?1",
            params![award_key],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// 撤销单条成就通知记录
    ///
    /// 仅在显式取消成就提醒时调用, 全量 replan 决不触碰本表
    pub fn revoke(&self, award_key: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM notified_award WHERE award_key = ?1",
            params![award_key],
        )?;
        Ok(())
    }

    /// 查询全部已通知成就键 (排序后)
    pub fn list_all(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT award_key FROM notified_award ORDER BY award_key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<SqliteResult<Vec<String>>>()?;
        Ok(keys)
    }
}
