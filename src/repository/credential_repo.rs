// ==========================================
// 继续教育合规提醒系统 - 证书数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::credential::{Credential, SpecialCategory};
use crate::domain::types::MeasurementUnit;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 时刻列的存储格式
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| {
        chrono::NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    })
}

// ==========================================
// CredentialRepository - 证书仓储
// ==========================================

/// 证书仓储
/// 职责: 管理 credential 表的CRUD操作
pub struct CredentialRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CredentialRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &rusqlite::Row) -> SqliteResult<Credential> {
        Ok(Credential {
            credential_id: row.get(0)?,
            name: row.get(1)?,
            measurement_default: MeasurementUnit::from_str(&row.get::<_, String>(2)?),
            hours_per_unit: row.get(3)?,
            required_ces: row.get(4)?,
            created_at: parse_datetime(&row.get::<_, String>(5)?),
            updated_at: parse_datetime(&row.get::<_, String>(6)?),
        })
    }

    /// 插入或更新证书
    pub fn upsert(&self, credential: &Credential) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO credential (
                credential_id, name, measurement_default, hours_per_unit,
                required_ces, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                credential.credential_id,
                credential.name,
                credential.measurement_default.to_db_str(),
                credential.hours_per_unit,
                credential.required_ces,
                credential.created_at.format(DATETIME_FMT).to_string(),
                credential.updated_at.format(DATETIME_FMT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 按ID查询证书
    pub fn find_by_id(&self, credential_id: &str) -> RepositoryResult<Option<Credential>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT credential_id, name, measurement_default, hours_per_unit,
                   required_ces, created_at, updated_at
            FROM credential
            WHERE credential_id = ?1
            "#,
        )?;

        let credential = stmt
            .query_row(params![credential_id], Self::map_row)
            .optional()?;
        Ok(credential)
    }

    /// 查询全部证书
    pub fn list_all(&self) -> RepositoryResult<Vec<Credential>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT credential_id, name, measurement_default, hours_per_unit,
                   required_ces, created_at, updated_at
            FROM credential
            ORDER BY name
            "#,
        )?;

        let credentials = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<Credential>>>()?;
        Ok(credentials)
    }
}

// ==========================================
// SpecialCategoryRepository - 专项类别仓储
// ==========================================

/// 专项类别仓储
/// 职责: 管理 special_category 表的CRUD操作
pub struct SpecialCategoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SpecialCategoryRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &rusqlite::Row) -> SqliteResult<SpecialCategory> {
        Ok(SpecialCategory {
            category_id: row.get(0)?,
            credential_id: row.get(1)?,
            name: row.get(2)?,
            required_hours: row.get(3)?,
            measurement_default: MeasurementUnit::from_str(&row.get::<_, String>(4)?),
        })
    }

    /// 插入或更新专项类别
    pub fn upsert(&self, category: &SpecialCategory) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO special_category (
                category_id, credential_id, name, required_hours, measurement_default
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                category.category_id,
                category.credential_id,
                category.name,
                category.required_hours,
                category.measurement_default.to_db_str(),
            ],
        )?;
        Ok(())
    }

    /// 按证书查询专项类别列表
    pub fn find_by_credential(&self, credential_id: &str) -> RepositoryResult<Vec<SpecialCategory>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT category_id, credential_id, name, required_hours, measurement_default
            FROM special_category
            WHERE credential_id = ?1
            ORDER BY name
            "#,
        )?;

        let categories = stmt
            .query_map(params![credential_id], Self::map_row)?
            .collect::<SqliteResult<Vec<SpecialCategory>>>()?;
        Ok(categories)
    }
}
