// ==========================================
// 继续教育合规提醒系统 - 换证周期数据仓储
// ==========================================
// 换证周期 + 复证信息 + 复证专项子要求
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::renewal::{ReinstatementInfo, ReinstatementSpecialCat, RenewalPeriod};
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

fn fmt_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

// ==========================================
// RenewalPeriodRepository - 换证周期仓储
// ==========================================

/// 换证周期仓储
/// 职责: 管理 renewal_period 表的CRUD操作
pub struct RenewalPeriodRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RenewalPeriodRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &rusqlite::Row) -> SqliteResult<RenewalPeriod> {
        Ok(RenewalPeriod {
            period_id: row.get(0)?,
            credential_id: row.get(1)?,
            start_date: parse_date(&row.get::<_, String>(2)?),
            end_date: parse_date(&row.get::<_, String>(3)?),
            application_window_start: row
                .get::<_, Option<String>>(4)?
                .map(|s| parse_date(&s)),
            late_fee_date: row.get::<_, Option<String>>(5)?.map(|s| parse_date(&s)),
            late_fee_amount: row.get(6)?,
            completed: row.get(7)?,
            created_at: parse_datetime(&row.get::<_, String>(8)?),
            updated_at: parse_datetime(&row.get::<_, String>(9)?),
        })
    }

    const SELECT_COLS: &'static str = r#"
            SELECT period_id, credential_id, start_date, end_date,
                   application_window_start, late_fee_date, late_fee_amount,
                   completed, created_at, updated_at
            FROM renewal_period
    "#;

    /// 插入或更新换证周期
    pub fn upsert(&self, period: &RenewalPeriod) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO renewal_period (
                period_id, credential_id, start_date, end_date,
                application_window_start, late_fee_date, late_fee_amount,
                completed, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                period.period_id,
                period.credential_id,
                fmt_date(period.start_date),
                fmt_date(period.end_date),
                period.application_window_start.map(fmt_date),
                period.late_fee_date.map(fmt_date),
                period.late_fee_amount,
                period.completed,
                period.created_at.format(DATETIME_FMT).to_string(),
                period.updated_at.format(DATETIME_FMT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 按ID查询周期
    pub fn find_by_id(&self, period_id: &str) -> RepositoryResult<Option<RenewalPeriod>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE period_id = ?1", Self::SELECT_COLS);
        let mut stmt = conn.prepare(&sql)?;
        let period = stmt.query_row(params![period_id], Self::map_row).optional()?;
        Ok(period)
    }

    /// 按证书查询周期列表
    pub fn find_by_credential(&self, credential_id: &str) -> RepositoryResult<Vec<RenewalPeriod>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE credential_id = ?1 ORDER BY start_date",
            Self::SELECT_COLS
        );
        let mut stmt = conn.prepare(&sql)?;
        let periods = stmt
            .query_map(params![credential_id], Self::map_row)?
            .collect::<SqliteResult<Vec<RenewalPeriod>>>()?;
        Ok(periods)
    }

    /// 查询全部周期
    pub fn list_all(&self) -> RepositoryResult<Vec<RenewalPeriod>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY start_date", Self::SELECT_COLS);
        let mut stmt = conn.prepare(&sql)?;
        let periods = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<RenewalPeriod>>>()?;
        Ok(periods)
    }

    /// 查询未办结的周期 (提醒规划的输入)
    pub fn list_open(&self) -> RepositoryResult<Vec<RenewalPeriod>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE completed = 0 ORDER BY end_date",
            Self::SELECT_COLS
        );
        let mut stmt = conn.prepare(&sql)?;
        let periods = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<RenewalPeriod>>>()?;
        Ok(periods)
    }
}

// ==========================================
// ReinstatementRepository - 复证信息仓储
// ==========================================

/// 复证信息仓储
/// 职责: 管理 reinstatement_info / reinstatement_special_cat 表
pub struct ReinstatementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReinstatementRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_info(row: &rusqlite::Row) -> SqliteResult<ReinstatementInfo> {
        Ok(ReinstatementInfo {
            reinstatement_id: row.get(0)?,
            period_id: row.get(1)?,
            total_extra_ces: row.get(2)?,
            deadline: parse_date(&row.get::<_, String>(3)?),
            created_at: parse_datetime(&row.get::<_, String>(4)?),
        })
    }

    /// 插入或更新复证信息
    pub fn upsert(&self, info: &ReinstatementInfo) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO reinstatement_info (
                reinstatement_id, period_id, total_extra_ces, deadline, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                info.reinstatement_id,
                info.period_id,
                info.total_extra_ces,
                fmt_date(info.deadline),
                info.created_at.format(DATETIME_FMT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 按周期查询复证信息 (一对一)
    pub fn find_by_period(&self, period_id: &str) -> RepositoryResult<Option<ReinstatementInfo>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT reinstatement_id, period_id, total_extra_ces, deadline, created_at
            FROM reinstatement_info
            WHERE period_id = ?1
            "#,
        )?;
        let info = stmt.query_row(params![period_id], Self::map_info).optional()?;
        Ok(info)
    }

    /// 查询全部复证信息
    pub fn list_all(&self) -> RepositoryResult<Vec<ReinstatementInfo>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT reinstatement_id, period_id, total_extra_ces, deadline, created_at
            FROM reinstatement_info
            ORDER BY deadline
            "#,
        )?;
        let infos = stmt
            .query_map([], Self::map_info)?
            .collect::<SqliteResult<Vec<ReinstatementInfo>>>()?;
        Ok(infos)
    }

    /// 插入或更新专项子要求
    pub fn upsert_special_cat(&self, sub: &ReinstatementSpecialCat) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO reinstatement_special_cat (
                reinstatement_id, category_id, category_name, ces_required
            ) VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                sub.reinstatement_id,
                sub.category_id,
                sub.category_name,
                sub.ces_required,
            ],
        )?;
        Ok(())
    }

    /// 按复证信息查询专项子要求列表
    pub fn find_special_cats(
        &self,
        reinstatement_id: &str,
    ) -> RepositoryResult<Vec<ReinstatementSpecialCat>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT reinstatement_id, category_id, category_name, ces_required
            FROM reinstatement_special_cat
            WHERE reinstatement_id = ?1
            ORDER BY category_id
            "#,
        )?;
        let subs = stmt
            .query_map(params![reinstatement_id], |row| {
                Ok(ReinstatementSpecialCat {
                    reinstatement_id: row.get(0)?,
                    category_id: row.get(1)?,
                    category_name: row.get(2)?,
                    ces_required: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<ReinstatementSpecialCat>>>()?;
        Ok(subs)
    }
}
