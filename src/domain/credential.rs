// ==========================================
// 继续教育合规提醒系统 - 证书领域模型
// ==========================================
// 证书(执业资格/认证) + 专项类别
// 红线: 领域结构不含数据访问逻辑
// ==========================================

use crate::domain::types::MeasurementUnit;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 全局默认学分换算比率 (1 学分 = 10 学时)
///
/// 证书的 hours_per_unit ≤ 0 时静默替换为该值,
/// 不作为错误向上传播
pub const DEFAULT_HOURS_PER_UNIT: f64 = 10.0;

// ==========================================
// Credential - 证书
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub credential_id: String,                // 证书ID
    pub name: String,                         // 证书名称
    pub measurement_default: MeasurementUnit, // 默认计量单位
    pub hours_per_unit: f64,                  // 学分换算比率 (>0, 默认10)
    pub required_ces: f64,                    // 每周期应修CE总量 (≥0)
    pub created_at: NaiveDateTime,            // 创建时间
    pub updated_at: NaiveDateTime,            // 更新时间
}

impl Credential {
    /// 计算用的有效换算比率
    ///
    /// 入库数据可能存在 ≤0 的脏比率,在进入计算的边界处
    /// 统一替换为全局默认值,调用点不再各自判断
    pub fn effective_hours_per_unit(&self) -> f64 {
        if self.hours_per_unit > 0.0 {
            self.hours_per_unit
        } else {
            DEFAULT_HOURS_PER_UNIT
        }
    }

    /// 判断本证书是否存在应修要求
    pub fn has_requirement(&self) -> bool {
        self.required_ces > 0.0
    }
}

// ==========================================
// SpecialCategory - 专项类别
// ==========================================
// 证书下的CE子要求 (如职业道德), 单独跟踪,
// 同时计入总量
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialCategory {
    pub category_id: String,                  // 类别ID
    pub credential_id: String,                // 所属证书
    pub name: String,                         // 类别名称
    pub required_hours: f64,                  // 应修量 (≥0)
    pub measurement_default: MeasurementUnit, // 计量单位
}

impl SpecialCategory {
    /// 判断本类别是否存在应修要求
    ///
    /// 应修量为0的类别不参与剩余量计算
    pub fn has_requirement(&self) -> bool {
        self.required_hours > 0.0
    }
}
