// ==========================================
// 继续教育合规提醒系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供幂等建表引导 (CREATE TABLE IF NOT EXISTS)
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开内存数据库并建表 (测试用)
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 幂等建表引导
///
/// 日期列统一存 %Y-%m-%d 文本, 时刻列存 %Y-%m-%d %H:%M:%S 文本
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS credential (
            credential_id       TEXT PRIMARY KEY,
            name                TEXT NOT NULL,
            measurement_default TEXT NOT NULL DEFAULT 'HOURS',
            hours_per_unit      REAL NOT NULL DEFAULT 10.0,
            required_ces        REAL NOT NULL DEFAULT 0.0,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS special_category (
            category_id         TEXT PRIMARY KEY,
            credential_id       TEXT NOT NULL REFERENCES credential(credential_id),
            name                TEXT NOT NULL,
            required_hours      REAL NOT NULL DEFAULT 0.0,
            measurement_default TEXT NOT NULL DEFAULT 'HOURS'
        );

        CREATE TABLE IF NOT EXISTS renewal_period (
            period_id                TEXT PRIMARY KEY,
            credential_id            TEXT NOT NULL REFERENCES credential(credential_id),
            start_date               TEXT NOT NULL,
            end_date                 TEXT NOT NULL,
            application_window_start TEXT,
            late_fee_date            TEXT,
            late_fee_amount          REAL,
            completed                INTEGER NOT NULL DEFAULT 0,
            created_at               TEXT NOT NULL,
            updated_at               TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reinstatement_info (
            reinstatement_id TEXT PRIMARY KEY,
            period_id        TEXT NOT NULL UNIQUE REFERENCES renewal_period(period_id),
            total_extra_ces  REAL NOT NULL DEFAULT 0.0,
            deadline         TEXT NOT NULL,
            created_at       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reinstatement_special_cat (
            reinstatement_id TEXT NOT NULL REFERENCES reinstatement_info(reinstatement_id),
            category_id      TEXT NOT NULL REFERENCES special_category(category_id),
            category_name    TEXT NOT NULL,
            ces_required     REAL NOT NULL DEFAULT 0.0,
            PRIMARY KEY (reinstatement_id, category_id)
        );

        CREATE TABLE IF NOT EXISTS activity (
            activity_id       TEXT PRIMARY KEY,
            title             TEXT NOT NULL,
            awarded_amount    REAL NOT NULL DEFAULT 0.0,
            unit              TEXT NOT NULL DEFAULT 'HOURS',
            completed         INTEGER NOT NULL DEFAULT 0,
            completion_date   TEXT,
            expiration_date   TEXT,
            for_reinstatement INTEGER NOT NULL DEFAULT 0,
            renewal_period_id TEXT REFERENCES renewal_period(period_id),
            category_id       TEXT REFERENCES special_category(category_id),
            created_at        TEXT NOT NULL,
            updated_at        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS activity_credential (
            activity_id   TEXT NOT NULL REFERENCES activity(activity_id),
            credential_id TEXT NOT NULL REFERENCES credential(credential_id),
            PRIMARY KEY (activity_id, credential_id)
        );

        CREATE TABLE IF NOT EXISTS disciplinary_sanction (
            sanction_id         TEXT PRIMARY KEY,
            credential_id       TEXT NOT NULL REFERENCES credential(credential_id),
            title               TEXT NOT NULL,
            resolution_deadline TEXT,
            resolved            INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS live_event (
            event_id   TEXT PRIMARY KEY,
            title      TEXT NOT NULL,
            starts_at  TEXT NOT NULL,
            location   TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS notified_award (
            award_key   TEXT PRIMARY KEY,
            notified_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key      TEXT NOT NULL,
            value    TEXT NOT NULL,
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    use rusqlite::OptionalExtension;

    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
