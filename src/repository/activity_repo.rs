// ==========================================
// 继续教育合规提醒系统 - 学习活动数据仓储
// ==========================================
// 查询条件以谓词对象表达 (完成标志/日期区间/关联ID等值),
// 仓储负责翻译为 SQL, 不含业务逻辑
// ==========================================

use crate::domain::activity::Activity;
use crate::domain::types::MeasurementUnit;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as SqliteResult};
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
// ActivityFilter - 查询谓词对象
// ==========================================

/// 活动查询谓词
///
/// 全部条件为 AND 组合; None 表示该维度不过滤
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub completed: Option<bool>,              // 完成标志
    pub credential_id: Option<String>,        // 关联证书
    pub renewal_period_id: Option<String>,    // 挂接周期
    pub category_id: Option<String>,          // 挂接类别
    pub for_reinstatement: Option<bool>,      // 复证标志
    pub completion_from: Option<NaiveDate>,   // 完成日期下界 (含)
    pub completion_to: Option<NaiveDate>,     // 完成日期上界 (含)
    pub has_expiration: Option<bool>,         // 是否带证明到期日
}

impl ActivityFilter {
    /// 翻译为 WHERE 子句与绑定参数
    fn to_where_clause(&self) -> (String, Vec<Value>) {
        let mut conditions: Vec<String> = Vec::new();
        let mut bindings: Vec<Value> = Vec::new();

        if let Some(completed) = self.completed {
            conditions.push("a.completed = ?".to_string());
            bindings.push(Value::Integer(completed as i64));
        }
        if let Some(credential_id) = &self.credential_id {
            conditions.push(
                "a.activity_id IN (SELECT activity_id FROM activity_credential WHERE credential_id = ?)"
                    .to_string(),
            );
            bindings.push(Value::Text(credential_id.clone()));
        }
        if let Some(period_id) = &self.renewal_period_id {
            conditions.push("a.renewal_period_id = ?".to_string());
            bindings.push(Value::Text(period_id.clone()));
        }
        if let Some(category_id) = &self.category_id {
            conditions.push("a.category_id = ?".to_string());
            bindings.push(Value::Text(category_id.clone()));
        }
        if let Some(flag) = self.for_reinstatement {
            conditions.push("a.for_reinstatement = ?".to_string());
            bindings.push(Value::Integer(flag as i64));
        }
        if let Some(from) = self.completion_from {
            conditions.push("a.completion_date >= ?".to_string());
            bindings.push(Value::Text(from.format(DATE_FMT).to_string()));
        }
        if let Some(to) = self.completion_to {
            conditions.push("a.completion_date <= ?".to_string());
            bindings.push(Value::Text(to.format(DATE_FMT).to_string()));
        }
        if let Some(has_expiration) = self.has_expiration {
            if has_expiration {
                conditions.push("a.expiration_date IS NOT NULL".to_string());
            } else {
                conditions.push("a.expiration_date IS NULL".to_string());
            }
        }

        if conditions.is_empty() {
            (String::new(), bindings)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), bindings)
        }
    }
}

// ==========================================
// ActivityRepository - 学习活动仓储
// ==========================================

/// 学习活动仓储
/// 职责: 管理 activity / activity_credential 表的CRUD操作
pub struct ActivityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActivityRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &rusqlite::Row) -> SqliteResult<Activity> {
        Ok(Activity {
            activity_id: row.get(0)?,
            title: row.get(1)?,
            awarded_amount: row.get(2)?,
            unit: MeasurementUnit::from_str(&row.get::<_, String>(3)?),
            completed: row.get(4)?,
            completion_date: row.get::<_, Option<String>>(5)?.map(|s| parse_date(&s)),
            expiration_date: row.get::<_, Option<String>>(6)?.map(|s| parse_date(&s)),
            for_reinstatement: row.get(7)?,
            credential_ids: Vec::new(), // 由 load_credentials 补齐
            renewal_period_id: row.get(8)?,
            category_id: row.get(9)?,
            created_at: parse_datetime(&row.get::<_, String>(10)?),
            updated_at: parse_datetime(&row.get::<_, String>(11)?),
        })
    }

    const SELECT_COLS: &'static str = r#"
            SELECT a.activity_id, a.title, a.awarded_amount, a.unit, a.completed,
                   a.completion_date, a.expiration_date, a.for_reinstatement,
                   a.renewal_period_id, a.category_id, a.created_at, a.updated_at
            FROM activity a
    "#;

    /// 补齐活动的关联证书列表
    fn load_credentials(
        conn: &Connection,
        activities: &mut [Activity],
    ) -> SqliteResult<()> {
        let mut stmt = conn.prepare(
            "SELECT credential_id FROM activity_credential WHERE activity_id = ?1 ORDER BY credential_id",
        )?;
        for activity in activities.iter_mut() {
            activity.credential_ids = stmt
                .query_map(params![activity.activity_id], |row| row.get(0))?
                .collect::<SqliteResult<Vec<String>>>()?;
        }
        Ok(())
    }

    /// 插入或更新活动 (连带重建证书关联)
    pub fn upsert(&self, activity: &Activity) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        // REPLACE 会先删除旧行, 外键开启时须先清掉证书关联
        conn.execute(
            "DELETE FROM activity_credential WHERE activity_id = ?1",
            params![activity.activity_id],
        )?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO activity (
                activity_id, title, awarded_amount, unit, completed,
                completion_date, expiration_date, for_reinstatement,
                renewal_period_id, category_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                activity.activity_id,
                activity.title,
                activity.awarded_amount,
                activity.unit.to_db_str(),
                activity.completed,
                activity.completion_date.map(|d| d.format(DATE_FMT).to_string()),
                activity.expiration_date.map(|d| d.format(DATE_FMT).to_string()),
                activity.for_reinstatement,
                activity.renewal_period_id,
                activity.category_id,
                activity.created_at.format(DATETIME_FMT).to_string(),
                activity.updated_at.format(DATETIME_FMT).to_string(),
            ],
        )?;

        for credential_id in &activity.credential_ids {
            conn.execute(
                "INSERT OR IGNORE INTO activity_credential (activity_id, credential_id) VALUES (?1, ?2)",
                params![activity.activity_id, credential_id],
            )?;
        }

        Ok(())
    }

    /// 按ID查询活动
    pub fn find_by_id(&self, activity_id: &str) -> RepositoryResult<Option<Activity>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE a.activity_id = ?1", Self::SELECT_COLS);
        let mut stmt = conn.prepare(&sql)?;
        let activity = stmt
            .query_row(params![activity_id], Self::map_row)
            .optional()?;

        match activity {
            Some(mut a) => {
                let mut one = std::slice::from_mut(&mut a);
                Self::load_credentials(&conn, &mut one)?;
                Ok(Some(a))
            }
            None => Ok(None),
        }
    }

    /// 按谓词查询活动列表
    pub fn fetch(&self, filter: &ActivityFilter) -> RepositoryResult<Vec<Activity>> {
        let conn = self.get_conn()?;
        let (where_clause, bindings) = filter.to_where_clause();
        let sql = format!(
            "{} {} ORDER BY a.activity_id",
            Self::SELECT_COLS,
            where_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut activities = stmt
            .query_map(params_from_iter(bindings), Self::map_row)?
            .collect::<SqliteResult<Vec<Activity>>>()?;
        Self::load_credentials(&conn, &mut activities)?;
        Ok(activities)
    }

    /// 回写活动的周期挂接 (PeriodResolver 重挂接结果)
    pub fn update_period_link(
        &self,
        activity_id: &str,
        renewal_period_id: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE activity SET renewal_period_id = ?1, updated_at = datetime('now') WHERE activity_id = ?2",
            params![renewal_period_id, activity_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Activity".to_string(),
                id: activity_id.to_string(),
            });
        }
        Ok(())
    }
}
