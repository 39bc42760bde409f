// ==========================================
// 继续教育合规提醒系统 - 学习活动领域模型
// ==========================================
// 活动由用户创建, 完成状态/日期变化后由
// PeriodResolver 重新挂接到换证周期
// ==========================================

use crate::domain::types::MeasurementUnit;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Activity - 学习活动
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub activity_id: String,                  // 活动ID
    pub title: String,                        // 活动名称
    pub awarded_amount: f64,                  // 授予CE量 (≥0)
    pub unit: MeasurementUnit,                // 授予单位
    pub completed: bool,                      // 是否已完成
    pub completion_date: Option<NaiveDate>,   // 完成日期
    pub expiration_date: Option<NaiveDate>,   // 证明到期日 (到期提醒锚点)
    pub for_reinstatement: bool,              // 是否计入复证额外CE
    pub credential_ids: Vec<String>,          // 关联证书 (零或多个)
    pub renewal_period_id: Option<String>,    // 挂接的换证周期
    pub category_id: Option<String>,          // 挂接的专项类别
    pub created_at: NaiveDateTime,            // 创建时间
    pub updated_at: NaiveDateTime,            // 更新时间
}

impl Activity {
    /// 判断活动是否可参与周期挂接
    ///
    /// 仅已完成且有完成日期的活动可被挂接
    pub fn eligible_for_assignment(&self) -> bool {
        self.completed && self.completion_date.is_some()
    }

    /// 判断活动是否计入指定周期的合规统计
    ///
    /// 口径: 挂接到该周期 + 已完成 + 授予量 > 0
    pub fn counts_toward(&self, period_id: &str) -> bool {
        self.completed
            && self.awarded_amount > 0.0
            && self.renewal_period_id.as_deref() == Some(period_id)
    }

    /// 判断活动是否挂接了指定专项类别
    pub fn tagged_with(&self, category_id: &str) -> bool {
        self.category_id.as_deref() == Some(category_id)
    }
}
