// ==========================================
// 继续教育合规提醒系统 - 合规计算引擎
// ==========================================
// 职责: 计算换证周期的剩余CE — 总量 + 专项类别
// 输入: credential + renewal_period + activity 快照
// 输出: 剩余量 (允许为负, 负值表示超额完成)
// ==========================================

use crate::domain::activity::Activity;
use crate::domain::credential::{Credential, SpecialCategory};
use crate::domain::renewal::RenewalPeriod;
use crate::domain::types::MeasurementUnit;
use crate::engine::period_resolver::PeriodResolver;
use crate::engine::unit_conversion::UnitConverter;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

// ==========================================
// OverallCompliance - 总量合规结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct OverallCompliance {
    pub remaining: f64,        // 剩余应修量 (证书默认单位, 可为负)
    pub is_current: bool,      // 该周期在参考日是否为当前周期
    pub unit: MeasurementUnit, // 剩余量的计量单位
}

impl OverallCompliance {
    /// "无应修要求"的终态值
    fn nothing_required(unit: MeasurementUnit) -> Self {
        Self {
            remaining: 0.0,
            is_current: false,
            unit,
        }
    }
}

// ==========================================
// ComplianceEngine - 合规计算引擎
// ==========================================
pub struct ComplianceEngine {
    converter: UnitConverter,
    resolver: PeriodResolver,
}

impl ComplianceEngine {
    /// 创建新的合规计算引擎
    pub fn new() -> Self {
        Self {
            converter: UnitConverter::new(),
            resolver: PeriodResolver::new(),
        }
    }

    // ==========================================
    // 总量合规
    // ==========================================

    /// 计算周期的剩余总CE
    ///
    /// 步骤:
    /// 1) 解析证书的应修量/默认单位/换算比率
    /// 2) 筛选挂接到该周期、已完成、授予量>0 的活动
    /// 3) 逐个换算为证书默认单位 (同单位直通, 异单位经钟点学时中转)
    /// 4) remaining = 应修量 − 已修合计 (不截断, 负值=超额)
    /// 5) is_current = 该周期出现在参考日的当前周期列表中
    ///
    /// 应修量 ≤0 时直接返回"无应修要求"终态, 不是错误
    pub fn remaining_overall_ce(
        &self,
        credential: &Credential,
        renewal: &RenewalPeriod,
        all_periods: &[RenewalPeriod],
        activities: &[Activity],
        today: NaiveDate,
    ) -> OverallCompliance {
        let unit = credential.measurement_default;

        if !credential.has_requirement() {
            return OverallCompliance::nothing_required(unit);
        }

        let ratio = credential.effective_hours_per_unit();
        let earned: f64 = activities
            .iter()
            .filter(|a| a.counts_toward(&renewal.period_id))
            .map(|a| self.converter.convert(a.awarded_amount, a.unit, unit, ratio))
            .sum();

        let remaining = credential.required_ces - earned;

        let is_current = self
            .resolver
            .current_periods(all_periods, today)
            .iter()
            .any(|p| p.period_id == renewal.period_id);

        debug!(
            credential_id = %credential.credential_id,
            period_id = %renewal.period_id,
            required = credential.required_ces,
            earned,
            remaining,
            is_current,
            "总量合规计算完成"
        );

        OverallCompliance {
            remaining,
            is_current,
            unit,
        }
    }

    // ==========================================
    // 专项类别合规
    // ==========================================

    /// 计算周期内各专项类别的剩余量
    ///
    /// 口径:
    /// - 仅统计应修量 >0 且属于该证书的类别, 零要求类别不出现在结果中
    /// - 活动须挂接到该周期、已完成、授予量>0、且打了该类别标签
    /// - 活动授予量换算到类别的计量单位后再累加
    /// - remaining = 应修量 − 已修合计 (不截断)
    ///
    /// 无周期或无类别时返回空表, 不是错误
    pub fn remaining_special_category_ce(
        &self,
        credential: &Credential,
        renewal: Option<&RenewalPeriod>,
        categories: &[SpecialCategory],
        activities: &[Activity],
    ) -> HashMap<String, f64> {
        let mut remaining_by_name = HashMap::new();

        let renewal = match renewal {
            Some(r) => r,
            None => return remaining_by_name,
        };

        let ratio = credential.effective_hours_per_unit();

        for category in categories {
            if category.credential_id != credential.credential_id || !category.has_requirement() {
                continue;
            }

            let earned: f64 = activities
                .iter()
                .filter(|a| {
                    a.counts_toward(&renewal.period_id) && a.tagged_with(&category.category_id)
                })
                .map(|a| {
                    self.converter
                        .convert(a.awarded_amount, a.unit, category.measurement_default, ratio)
                })
                .sum();

            remaining_by_name.insert(category.name.clone(), category.required_hours - earned);
        }

        remaining_by_name
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const EPS: f64 = 1e-9;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn base_credential() -> Credential {
        Credential {
            credential_id: "CRED_1".to_string(),
            name: "注册会计师".to_string(),
            measurement_default: MeasurementUnit::Hours,
            hours_per_unit: 10.0,
            required_ces: 24.0,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    fn base_period(id: &str, start: NaiveDate, end: NaiveDate) -> RenewalPeriod {
        RenewalPeriod {
            period_id: id.to_string(),
            credential_id: "CRED_1".to_string(),
            start_date: start,
            end_date: end,
            application_window_start: None,
            late_fee_date: None,
            late_fee_amount: None,
            completed: false,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    fn base_activity(id: &str, amount: f64, unit: MeasurementUnit) -> Activity {
        Activity {
            activity_id: id.to_string(),
            title: "测试活动".to_string(),
            awarded_amount: amount,
            unit,
            completed: true,
            completion_date: Some(ymd(2026, 3, 1)),
            expiration_date: None,
            for_reinstatement: false,
            credential_ids: vec!["CRED_1".to_string()],
            renewal_period_id: Some("RP_1".to_string()),
            category_id: None,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    fn ethics_category(required: f64) -> SpecialCategory {
        SpecialCategory {
            category_id: "CAT_ETHICS".to_string(),
            credential_id: "CRED_1".to_string(),
            name: "职业道德".to_string(),
            required_hours: required,
            measurement_default: MeasurementUnit::Hours,
        }
    }

    #[test]
    fn test_scenario_1_overall_mixed_units() {
        // 场景1: 应修24学时, 两个活动分别授予10学时与1学分(比率10)
        //        remaining = 24 − (10 + 10) = 4, 周期为当前
        let engine = ComplianceEngine::new();
        let credential = base_credential();
        let today = ymd(2026, 6, 15);
        let periods = vec![base_period("RP_1", ymd(2026, 1, 1), ymd(2026, 12, 31))];
        let activities = vec![
            base_activity("ACT_1", 10.0, MeasurementUnit::Hours),
            base_activity("ACT_2", 1.0, MeasurementUnit::Units),
        ];

        let result =
            engine.remaining_overall_ce(&credential, &periods[0], &periods, &activities, today);

        assert!((result.remaining - 4.0).abs() < EPS);
        assert!(result.is_current);
        assert_eq!(result.unit, MeasurementUnit::Hours);
    }

    #[test]
    fn test_scenario_2_nothing_required_terminal() {
        // 场景2: 应修量 ≤0 直接返回终态 (0, false, 默认单位)
        let engine = ComplianceEngine::new();
        let mut credential = base_credential();
        credential.required_ces = 0.0;
        let periods = vec![base_period("RP_1", ymd(2026, 1, 1), ymd(2026, 12, 31))];

        let result = engine.remaining_overall_ce(
            &credential,
            &periods[0],
            &periods,
            &[base_activity("ACT_1", 5.0, MeasurementUnit::Hours)],
            ymd(2026, 6, 15),
        );

        assert_eq!(result.remaining, 0.0);
        assert!(!result.is_current);
        assert_eq!(result.unit, MeasurementUnit::Hours);
    }

    #[test]
    fn test_scenario_3_over_completion_negative() {
        // 场景3: 超额完成时剩余量为负, 不截断为0
        let engine = ComplianceEngine::new();
        let credential = base_credential();
        let periods = vec![base_period("RP_1", ymd(2026, 1, 1), ymd(2026, 12, 31))];
        let activities = vec![base_activity("ACT_1", 30.0, MeasurementUnit::Hours)];

        let result = engine.remaining_overall_ce(
            &credential,
            &periods[0],
            &periods,
            &activities,
            ymd(2026, 6, 15),
        );

        assert!((result.remaining - (-6.0)).abs() < EPS);
    }

    #[test]
    fn test_scenario_4_excludes_unlinked_and_incomplete() {
        // 场景4: 未挂接/未完成/零授予的活动不计入
        let engine = ComplianceEngine::new();
        let credential = base_credential();
        let periods = vec![base_period("RP_1", ymd(2026, 1, 1), ymd(2026, 12, 31))];

        let mut other_period = base_activity("ACT_1", 8.0, MeasurementUnit::Hours);
        other_period.renewal_period_id = Some("RP_OTHER".to_string());

        let mut incomplete = base_activity("ACT_2", 8.0, MeasurementUnit::Hours);
        incomplete.completed = false;

        let zero = base_activity("ACT_3", 0.0, MeasurementUnit::Hours);
        let counted = base_activity("ACT_4", 6.0, MeasurementUnit::Hours);

        let result = engine.remaining_overall_ce(
            &credential,
            &periods[0],
            &periods,
            &[other_period, incomplete, zero, counted],
            ymd(2026, 6, 15),
        );

        assert!((result.remaining - 18.0).abs() < EPS);
    }

    #[test]
    fn test_scenario_5_units_credential_converts_hours_activity() {
        // 场景5: 学分制证书 + 学时活动, 经钟点学时中转换算
        let engine = ComplianceEngine::new();
        let mut credential = base_credential();
        credential.measurement_default = MeasurementUnit::Units;
        credential.required_ces = 4.0; // 4学分
        let periods = vec![base_period("RP_1", ymd(2026, 1, 1), ymd(2026, 12, 31))];
        // 20学时 = 2学分 (比率10)
        let activities = vec![base_activity("ACT_1", 20.0, MeasurementUnit::Hours)];

        let result = engine.remaining_overall_ce(
            &credential,
            &periods[0],
            &periods,
            &activities,
            ymd(2026, 6, 15),
        );

        assert!((result.remaining - 2.0).abs() < EPS);
        assert_eq!(result.unit, MeasurementUnit::Units);
    }

    #[test]
    fn test_scenario_6_expired_period_not_current() {
        // 场景6: 已结束的周期 is_current = false, 剩余量照常计算
        let engine = ComplianceEngine::new();
        let credential = base_credential();
        let periods = vec![base_period("RP_1", ymd(2024, 1, 1), ymd(2024, 12, 31))];
        let mut act = base_activity("ACT_1", 10.0, MeasurementUnit::Hours);
        act.completion_date = Some(ymd(2024, 5, 1));

        let result = engine.remaining_overall_ce(
            &credential,
            &periods[0],
            &periods,
            &[act],
            ymd(2026, 6, 15),
        );

        assert!(!result.is_current);
        assert!((result.remaining - 14.0).abs() < EPS);
    }

    #[test]
    fn test_scenario_7_special_category_outstanding() {
        // 场景7: "职业道德"应修5学时, 已修2学时 → {"职业道德": 3.0}
        let engine = ComplianceEngine::new();
        let credential = base_credential();
        let period = base_period("RP_1", ymd(2026, 1, 1), ymd(2026, 12, 31));
        let categories = vec![ethics_category(5.0)];

        let mut act = base_activity("ACT_1", 2.0, MeasurementUnit::Hours);
        act.category_id = Some("CAT_ETHICS".to_string());

        let result = engine.remaining_special_category_ce(
            &credential,
            Some(&period),
            &categories,
            &[act],
        );

        assert_eq!(result.len(), 1);
        assert!((result["职业道德"] - 3.0).abs() < EPS);
    }

    #[test]
    fn test_scenario_8_zero_requirement_category_omitted() {
        // 场景8: 零要求类别不出现在结果中
        let engine = ComplianceEngine::new();
        let credential = base_credential();
        let period = base_period("RP_1", ymd(2026, 1, 1), ymd(2026, 12, 31));
        let categories = vec![ethics_category(0.0)];

        let result =
            engine.remaining_special_category_ce(&credential, Some(&period), &categories, &[]);

        assert!(result.is_empty());
    }

    #[test]
    fn test_scenario_9_no_renewal_empty_map() {
        // 场景9: 无周期时返回空表, 不是错误
        let engine = ComplianceEngine::new();
        let credential = base_credential();
        let categories = vec![ethics_category(5.0)];

        let result = engine.remaining_special_category_ce(&credential, None, &categories, &[]);

        assert!(result.is_empty());
    }

    #[test]
    fn test_scenario_10_untagged_activity_not_counted() {
        // 场景10: 未打类别标签的活动不计入专项统计
        let engine = ComplianceEngine::new();
        let credential = base_credential();
        let period = base_period("RP_1", ymd(2026, 1, 1), ymd(2026, 12, 31));
        let categories = vec![ethics_category(5.0)];

        // 挂接到周期但无类别标签
        let act = base_activity("ACT_1", 2.0, MeasurementUnit::Hours);

        let result = engine.remaining_special_category_ce(
            &credential,
            Some(&period),
            &categories,
            &[act],
        );

        assert!((result["职业道德"] - 5.0).abs() < EPS);
    }

    #[test]
    fn test_scenario_11_category_unit_conversion() {
        // 场景11: 学分活动计入学时制类别时按比率换算
        let engine = ComplianceEngine::new();
        let credential = base_credential();
        let period = base_period("RP_1", ymd(2026, 1, 1), ymd(2026, 12, 31));
        let categories = vec![ethics_category(15.0)];

        let mut act = base_activity("ACT_1", 1.0, MeasurementUnit::Units); // = 10学时
        act.category_id = Some("CAT_ETHICS".to_string());

        let result = engine.remaining_special_category_ce(
            &credential,
            Some(&period),
            &categories,
            &[act],
        );

        assert!((result["职业道德"] - 5.0).abs() < EPS);
    }
}
