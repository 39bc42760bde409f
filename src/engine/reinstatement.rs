// ==========================================
// 继续教育合规提醒系统 - 复证计算引擎
// ==========================================
// 职责: 计算失效证书恢复注册的额外CE缺口
//       — 总量 + 按专项类别
// 口径: 复证统一以钟点学时核算
// ==========================================

use crate::domain::activity::Activity;
use crate::domain::credential::Credential;
use crate::domain::renewal::{ReinstatementInfo, ReinstatementSpecialCat, RenewalPeriod};
use crate::domain::types::MeasurementUnit;
use crate::engine::unit_conversion::UnitConverter;
use std::collections::HashMap;
use tracing::debug;

// ==========================================
// ReinstatementRequirement - 复证总量要求
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ReinstatementRequirement {
    pub required_hours: f64, // 应修额外CE (钟点学时)
    pub earned_hours: f64,   // 已修额外CE (钟点学时)
}

impl ReinstatementRequirement {
    /// "无复证要求"的终态值
    fn nothing_required() -> Self {
        Self {
            required_hours: 0.0,
            earned_hours: 0.0,
        }
    }
}

// ==========================================
// SpecialCatReinstatement - 复证专项状态
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialCatReinstatement {
    pub met: bool,                          // 全部专项子要求是否已满足
    pub outstanding: HashMap<String, f64>,  // 未满足项: 类别ID → 缺口学时 (仅正值)
}

// ==========================================
// ReinstatementEngine - 复证计算引擎
// ==========================================
pub struct ReinstatementEngine {
    converter: UnitConverter,
}

impl ReinstatementEngine {
    /// 创建新的复证计算引擎
    pub fn new() -> Self {
        Self {
            converter: UnitConverter::new(),
        }
    }

    /// 将证书默认单位的量换算为钟点学时
    ///
    /// 学分制证书按比率放大, 学时制证书原样返回
    fn requirement_to_hours(&self, amount: f64, credential: &Credential) -> f64 {
        match credential.measurement_default {
            MeasurementUnit::Hours => amount,
            MeasurementUnit::Units => self.converter.to_clock_hours(
                amount,
                MeasurementUnit::Units,
                credential.effective_hours_per_unit(),
            ),
        }
    }

    // ==========================================
    // 总量要求
    // ==========================================

    /// 计算复证总量要求与已修量
    ///
    /// 前置: 周期必须带复证信息且能解析到证书,
    ///       否则返回 (0, 0) — "无复证要求"不是错误
    ///
    /// - required: total_extra_ces, 学分制证书换算为钟点学时
    /// - earned: 挂接到该周期且标记计入复证的活动,
    ///           授予量按证书比率换算为钟点学时后累加
    pub fn reinstatement_requirement(
        &self,
        credential: Option<&Credential>,
        renewal: &RenewalPeriod,
        reinstatement: Option<&ReinstatementInfo>,
        activities: &[Activity],
    ) -> ReinstatementRequirement {
        let (credential, reinstatement) = match (credential, reinstatement) {
            (Some(c), Some(r)) => (c, r),
            _ => return ReinstatementRequirement::nothing_required(),
        };

        let ratio = credential.effective_hours_per_unit();
        let required_hours = self.requirement_to_hours(reinstatement.total_extra_ces, credential);

        let earned_hours: f64 = activities
            .iter()
            .filter(|a| {
                a.for_reinstatement
                    && a.renewal_period_id.as_deref() == Some(renewal.period_id.as_str())
            })
            .map(|a| self.converter.to_clock_hours(a.awarded_amount, a.unit, ratio))
            .sum();

        debug!(
            period_id = %renewal.period_id,
            required_hours,
            earned_hours,
            "复证总量计算完成"
        );

        ReinstatementRequirement {
            required_hours,
            earned_hours,
        }
    }

    // ==========================================
    // 专项子要求
    // ==========================================

    /// 计算复证专项子要求的满足情况
    ///
    /// 两遍式结构 (先建应修/已修两张平行表, 再比对):
    /// 类别匹配与单位换算同比对逻辑隔离, 可各自独立验证
    ///
    /// - met: 每个应修项的已修 ≥ 应修 (零个子要求时平凡成立)
    /// - outstanding: 仅保留缺口 >0 的项 (类别ID → 缺口学时);
    ///   met 为 true 时恒为空表
    pub fn special_category_status(
        &self,
        credential: Option<&Credential>,
        renewal: &RenewalPeriod,
        reinstatement: Option<&ReinstatementInfo>,
        sub_requirements: &[ReinstatementSpecialCat],
        activities: &[Activity],
    ) -> SpecialCatReinstatement {
        let (credential, reinstatement) = match (credential, reinstatement) {
            (Some(c), Some(r)) => (c, r),
            _ => {
                return SpecialCatReinstatement {
                    met: true,
                    outstanding: HashMap::new(),
                }
            }
        };

        let ratio = credential.effective_hours_per_unit();

        // 第一遍: 应修表 (类别ID → 应修学时)
        let mut required_hours: HashMap<String, f64> = HashMap::new();
        for sub in sub_requirements {
            if sub.reinstatement_id != reinstatement.reinstatement_id {
                continue;
            }
            let hours = self.requirement_to_hours(sub.ces_required, credential);
            *required_hours.entry(sub.category_id.clone()).or_insert(0.0) += hours;
        }

        // 第二遍: 已修表 (类别ID → 已修学时)
        let mut earned_hours: HashMap<String, f64> = HashMap::new();
        for activity in activities {
            if activity.renewal_period_id.as_deref() != Some(renewal.period_id.as_str()) {
                continue;
            }
            let category_id = match &activity.category_id {
                Some(id) if required_hours.contains_key(id) => id.clone(),
                _ => continue,
            };
            let hours = self
                .converter
                .to_clock_hours(activity.awarded_amount, activity.unit, ratio);
            *earned_hours.entry(category_id).or_insert(0.0) += hours;
        }

        // 比对: 仅正缺口进入 outstanding
        let mut outstanding = HashMap::new();
        for (category_id, required) in &required_hours {
            let earned = earned_hours.get(category_id).copied().unwrap_or(0.0);
            let gap = required - earned;
            if gap > 0.0 {
                outstanding.insert(category_id.clone(), gap);
            }
        }

        SpecialCatReinstatement {
            met: outstanding.is_empty(),
            outstanding,
        }
    }
}

impl Default for ReinstatementEngine {
    fn default() -> Self {
        Self::new()
    }
}
