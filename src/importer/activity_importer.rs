// ==========================================
// 继续教育合规提醒系统 - 学习活动批量导入
// ==========================================
// 支持: CSV (.csv)
// 口径: 逐行校验, 非法行记录原因后跳过, 不中断整批
// ==========================================

use crate::domain::activity::Activity;
use crate::domain::types::MeasurementUnit;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::ActivityRepository;
use chrono::{NaiveDate, Utc};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const DATE_FMT: &str = "%Y-%m-%d";

// ==========================================
// ActivityImportReport - 导入结果汇总
// ==========================================

/// 单行跳过记录
#[derive(Debug, Clone)]
pub struct SkippedRow {
    pub row: usize,      // 数据行号 (表头后从1起)
    pub reason: String,  // 跳过原因
}

/// 批量导入结果汇总
#[derive(Debug, Clone, Default)]
pub struct ActivityImportReport {
    pub total_rows: usize,        // 读取到的数据行数
    pub imported: usize,          // 成功入库行数
    pub skipped: Vec<SkippedRow>, // 跳过的行及原因
}

// ==========================================
// ActivityImporter - 学习活动导入器
// ==========================================

/// 学习活动导入器
/// 职责: 解析CSV → 逐行校验 → 经仓储入库
pub struct ActivityImporter {
    activity_repo: Arc<ActivityRepository>,
}

impl ActivityImporter {
    /// 创建新的导入器实例
    pub fn new(activity_repo: Arc<ActivityRepository>) -> Self {
        Self { activity_repo }
    }

    /// 从CSV文件批量导入学习活动
    ///
    /// # 识别的列
    /// - title (必填): 活动名称
    /// - awarded_amount (必填, ≥0): 授予CE量
    /// - unit: HOURS / UNITS, 默认 HOURS
    /// - completed: true/false, 默认 true
    /// - completion_date / expiration_date: YYYY-MM-DD
    /// - for_reinstatement: true/false, 默认 false
    /// - credential_ids: 分号分隔的证书ID列表
    /// - category_id: 专项类别ID
    /// - activity_id: 留空时自动生成
    ///
    /// # 返回
    /// 导入结果汇总 (非法行跳过并记录原因, 不中断整批)
    pub fn import_csv(&self, file_path: &Path) -> ImportResult<ActivityImportReport> {
        let rows = self.parse_to_raw_records(file_path)?;

        let mut report = ActivityImportReport {
            total_rows: rows.len(),
            ..Default::default()
        };

        for (idx, row) in rows.iter().enumerate() {
            let row_no = idx + 1;
            match self.build_activity(row_no, row) {
                Ok(activity) => {
                    self.activity_repo.upsert(&activity)?;
                    report.imported += 1;
                }
                Err(e) => {
                    warn!(row = row_no, reason = %e, "跳过非法行");
                    report.skipped.push(SkippedRow {
                        row: row_no,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            file = %file_path.display(),
            total = report.total_rows,
            imported = report.imported,
            skipped = report.skipped.len(),
            "学习活动导入完成"
        );

        Ok(report)
    }

    /// 解析CSV为原始记录 (表头 → 值)
    fn parse_to_raw_records(
        &self,
        file_path: &Path,
    ) -> ImportResult<Vec<HashMap<String, String>>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        if let Some(ext) = file_path.extension() {
            if ext != "csv" {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row_map = HashMap::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }

            records.push(row_map);
        }

        Ok(records)
    }

    /// 单行 → 领域活动, 校验失败报具体字段
    fn build_activity(
        &self,
        row_no: usize,
        row: &HashMap<String, String>,
    ) -> ImportResult<Activity> {
        let get = |key: &str| row.get(key).map(|s| s.as_str()).unwrap_or("");

        let title = get("title");
        if title.is_empty() {
            return Err(ImportError::FieldValueError {
                row: row_no,
                field: "title".to_string(),
                message: "活动名称为空".to_string(),
            });
        }

        let awarded_amount = get("awarded_amount").parse::<f64>().map_err(|_| {
            ImportError::FieldValueError {
                row: row_no,
                field: "awarded_amount".to_string(),
                message: format!("无法解析为数值: {}", get("awarded_amount")),
            }
        })?;
        if awarded_amount < 0.0 {
            return Err(ImportError::FieldValueError {
                row: row_no,
                field: "awarded_amount".to_string(),
                message: format!("授予量不可为负: {}", awarded_amount),
            });
        }

        let completion_date = self.parse_optional_date(row_no, "completion_date", get("completion_date"))?;
        let expiration_date = self.parse_optional_date(row_no, "expiration_date", get("expiration_date"))?;

        let activity_id = match get("activity_id") {
            "" => Uuid::new_v4().to_string(),
            id => id.to_string(),
        };

        let credential_ids: Vec<String> = get("credential_ids")
            .split(';')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let now = Utc::now().naive_utc();

        Ok(Activity {
            activity_id,
            title: title.to_string(),
            awarded_amount,
            unit: MeasurementUnit::from_str(get("unit")),
            completed: parse_flag(get("completed"), true),
            completion_date,
            expiration_date,
            for_reinstatement: parse_flag(get("for_reinstatement"), false),
            credential_ids,
            renewal_period_id: None, // 挂接交由 PeriodResolver
            category_id: match get("category_id") {
                "" => None,
                id => Some(id.to_string()),
            },
            created_at: now,
            updated_at: now,
        })
    }

    fn parse_optional_date(
        &self,
        row_no: usize,
        field: &str,
        value: &str,
    ) -> ImportResult<Option<NaiveDate>> {
        if value.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(value, DATE_FMT)
            .map(Some)
            .map_err(|_| ImportError::DateFormatError {
                row: row_no,
                field: field.to_string(),
                value: value.to_string(),
            })
    }
}

/// 布尔列解析: 空值回落默认, 未知值视为 false
fn parse_flag(value: &str, default: bool) -> bool {
    match value.to_lowercase().as_str() {
        "" => default,
        "true" | "1" | "yes" | "y" => true,
        _ => false,
    }
}
