// ==========================================
// 继续教育合规提醒系统 - 提醒来源数据仓储
// ==========================================
// 执业处分 + 线下活动
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::event::{DisciplinarySanction, LiveEvent};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| {
        NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    })
}

// ==========================================
// SanctionRepository - 执业处分仓储
// ==========================================

/// 执业处分仓储
/// 职责: 管理 disciplinary_sanction 表的CRUD操作
pub struct SanctionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SanctionRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &rusqlite::Row) -> SqliteResult<DisciplinarySanction> {
        Ok(DisciplinarySanction {
            sanction_id: row.get(0)?,
            credential_id: row.get(1)?,
            title: row.get(2)?,
            resolution_deadline: row.get::<_, Option<String>>(3)?.map(|s| parse_date(&s)),
            resolved: row.get(4)?,
            created_at: parse_datetime(&row.get::<_, String>(5)?),
        })
    }

    /// 插入或更新处分
    pub fn upsert(&self, sanction: &DisciplinarySanction) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO disciplinary_sanction (
                sanction_id, credential_id, title, resolution_deadline, resolved, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                sanction.sanction_id,
                sanction.credential_id,
                sanction.title,
                sanction
                    .resolution_deadline
                    .map(|d| d.format(DATE_FMT).to_string()),
                sanction.resolved,
                sanction.created_at.format(DATETIME_FMT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 按ID查询处分
    pub fn find_by_id(&self, sanction_id: &str) -> RepositoryResult<Option<DisciplinarySanction>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT sanction_id, credential_id, title, resolution_deadline, resolved, created_at
            FROM disciplinary_sanction
            WHERE sanction_id = ?1
            "#,
        )?;
        let sanction = stmt
            .query_row(params![sanction_id], Self::map_row)
            .optional()?;
        Ok(sanction)
    }

    /// 查询未整改完结的处分 (提醒规划的输入)
    pub fn list_unresolved(&self) -> RepositoryResult<Vec<DisciplinarySanction>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT sanction_id, credential_id, title, resolution_deadline, resolved, created_at
            FROM disciplinary_sanction
            WHERE resolved = 0
            ORDER BY resolution_deadline
            "#,
        )?;
        let sanctions = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<DisciplinarySanction>>>()?;
        Ok(sanctions)
    }
}

// ==========================================
// LiveEventRepository - 线下活动仓储
// ==========================================

/// 线下活动仓储
/// 职责: 管理 live_event 表的CRUD操作
pub struct LiveEventRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LiveEventRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &rusqlite::Row) -> SqliteResult<LiveEvent> {
        Ok(LiveEvent {
            event_id: row.get(0)?,
            title: row.get(1)?,
            starts_at: parse_datetime(&row.get::<_, String>(2)?),
            location: row.get(3)?,
            created_at: parse_datetime(&row.get::<_, String>(4)?),
        })
    }

    /// 插入或更新线下活动
    pub fn upsert(&self, event: &LiveEvent) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO live_event (
                event_id, title, starts_at, location, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                event.event_id,
                event.title,
                event.starts_at.format(DATETIME_FMT).to_string(),
                event.location,
                event.created_at.format(DATETIME_FMT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 查询全部线下活动 (按开始时刻排序)
    ///
    /// 已开始的活动交由规划器按"触发时刻非未来"规则丢弃,
    /// 仓储不做时间过滤
    pub fn list_all(&self) -> RepositoryResult<Vec<LiveEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT event_id, title, starts_at, location, created_at
            FROM live_event
            ORDER BY starts_at
            "#,
        )?;
        let events = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<LiveEvent>>>()?;
        Ok(events)
    }
}
