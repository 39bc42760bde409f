// ==========================================
// 继续教育合规提醒系统 - 换证周期领域模型
// ==========================================
// 换证周期 + 复证信息 + 复证专项子要求
// 不变式: end_date ≥ start_date;
//         同一证书同一时刻至多一个"当前"周期(上游数据约束)
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// RenewalPeriod - 换证周期
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenewalPeriod {
    pub period_id: String,                          // 周期ID
    pub credential_id: String,                      // 所属证书
    pub start_date: NaiveDate,                      // 周期起始日
    pub end_date: NaiveDate,                        // 周期截止日 (≥ start_date)
    pub application_window_start: Option<NaiveDate>,// 换证申请窗口起始日
    pub late_fee_date: Option<NaiveDate>,           // 滞纳金起算日
    pub late_fee_amount: Option<f64>,               // 滞纳金金额
    pub completed: bool,                            // 周期是否已办结
    pub created_at: NaiveDateTime,                  // 创建时间
    pub updated_at: NaiveDateTime,                  // 更新时间
}

impl RenewalPeriod {
    /// 判断日期是否落在周期窗口内 (两端闭区间)
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// 判断周期在参考日是否为"当前"周期
    pub fn is_current(&self, as_of: NaiveDate) -> bool {
        self.contains(as_of)
    }
}

// ==========================================
// ReinstatementInfo - 复证信息
// ==========================================
// 与失效周期一对一, 记录恢复注册所需的额外CE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReinstatementInfo {
    pub reinstatement_id: String,  // 复证ID
    pub period_id: String,         // 关联周期 (一对一)
    pub total_extra_ces: f64,      // 额外应修CE总量 (≥0)
    pub deadline: NaiveDate,       // 复证截止日
    pub created_at: NaiveDateTime, // 创建时间
}

// ==========================================
// ReinstatementSpecialCat - 复证专项子要求
// ==========================================
// 复证信息下按专项类别拆分的应修量
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReinstatementSpecialCat {
    pub reinstatement_id: String, // 所属复证信息
    pub category_id: String,      // 关联专项类别
    pub category_name: String,    // 类别名称快照 (展示用)
    pub ces_required: f64,        // 应修量 (证书默认单位)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn period(start: (i32, u32, u32), end: (i32, u32, u32)) -> RenewalPeriod {
        RenewalPeriod {
            period_id: "RP_001".to_string(),
            credential_id: "CRED_001".to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            application_window_start: None,
            late_fee_date: None,
            late_fee_amount: None,
            completed: false,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_contains_closed_on_both_ends() {
        // 两端闭区间: 起始日与截止日本身都算在周期内
        let p = period((2026, 1, 1), (2026, 12, 31));
        assert!(p.contains(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
        assert!(p.contains(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()));
        assert!(p.contains(NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()));
        assert!(!p.contains(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()));
        assert!(!p.contains(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()));
    }

    #[test]
    fn test_single_day_period() {
        // start == end 的单日周期同样合法
        let p = period((2026, 3, 1), (2026, 3, 1));
        assert!(p.contains(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()));
        assert!(!p.contains(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()));
    }
}
