// ==========================================
// 继续教育合规提醒系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 口径: 缺失/非法配置一律静默回落默认值
// ==========================================

use crate::config::notification_config_trait::NotificationConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::types::{NotificationKind, TimeOfDay};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置值（UPSERT）
    ///
    /// # 用途
    /// - 用户在设置页调整提前量/时段/开关后回写
    /// - 回写后需重新执行一轮 replan 使配置生效
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;

        Ok(())
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 设置导出 / 问题排查时记录完整配置
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 此方法会覆盖现有的global配置
    pub fn restore_config_from_snapshot(
        &self,
        snapshot_json: &str,
    ) -> Result<usize, Box<dyn Error>> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute("BEGIN TRANSACTION", [])?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            let affected = conn.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
            count += affected;
        }

        conn.execute("COMMIT", [])?;

        Ok(count)
    }
}

// ==========================================
// NotificationConfigReader Trait 实现
// ==========================================
#[async_trait]
impl NotificationConfigReader for ConfigManager {
    // ===== 按天提前量 =====

    async fn get_lead_days_primary(&self) -> Result<i64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::LEAD_DAYS_PRIMARY, "30")?;
        Ok(value.parse::<i64>().unwrap_or(30))
    }

    async fn get_lead_days_secondary(&self) -> Result<i64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::LEAD_DAYS_SECONDARY, "7")?;
        Ok(value.parse::<i64>().unwrap_or(7))
    }

    // ===== 线下活动按分钟提前量 =====

    async fn get_lead_minutes_primary_live(&self) -> Result<i64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::LEAD_MINUTES_PRIMARY_LIVE, "120")?;
        Ok(value.parse::<i64>().unwrap_or(120))
    }

    async fn get_lead_minutes_secondary_live(&self) -> Result<i64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::LEAD_MINUTES_SECONDARY_LIVE, "15")?;
        Ok(value.parse::<i64>().unwrap_or(15))
    }

    // ===== 时段与开关 =====

    async fn get_time_of_day_preference(&self) -> Result<TimeOfDay, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::TIME_OF_DAY_PREFERENCE, "MORNING")?;
        Ok(TimeOfDay::from_str(&value))
    }

    async fn get_kind_enabled(&self, kind: NotificationKind) -> Result<bool, Box<dyn Error>> {
        let key = format!("{}/{}", config_keys::NOTIFY_TOGGLE_PREFIX, kind.to_db_str());
        let value = self.get_config_or_default(&key, "true")?;

        match value.to_lowercase().as_str() {
            "false" | "0" | "off" => Ok(false),
            _ => Ok(true), // 未知值回落到启用
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 按天提前量
    pub const LEAD_DAYS_PRIMARY: &str = "lead_days_primary";
    pub const LEAD_DAYS_SECONDARY: &str = "lead_days_secondary";

    // 线下活动按分钟提前量
    pub const LEAD_MINUTES_PRIMARY_LIVE: &str = "lead_minutes_primary_live";
    pub const LEAD_MINUTES_SECONDARY_LIVE: &str = "lead_minutes_secondary_live";

    // 时段偏好
    pub const TIME_OF_DAY_PREFERENCE: &str = "time_of_day_preference";

    // 提醒类型开关 (完整键: notify_toggle/{提醒类型})
    pub const NOTIFY_TOGGLE_PREFIX: &str = "notify_toggle";
}
