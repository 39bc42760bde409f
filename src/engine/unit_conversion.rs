// ==========================================
// 继续教育合规提醒系统 - 单位换算引擎
// ==========================================
// 职责: 学时(Hours)与学分(Units)之间的纯函数换算
// 红线: 全函数无失败路径; 非法比率静默替换为默认值
// ==========================================

use crate::domain::credential::DEFAULT_HOURS_PER_UNIT;
use crate::domain::types::MeasurementUnit;

// ==========================================
// UnitConverter - 单位换算引擎
// ==========================================
pub struct UnitConverter {
    // 无状态引擎,不需要注入依赖
}

impl UnitConverter {
    /// 创建新的单位换算引擎
    pub fn new() -> Self {
        Self {}
    }

    /// 规整换算比率
    ///
    /// 比率 ≤0 时替换为全局默认值 10.0,
    /// 保证后续换算恒为全函数
    fn normalize_ratio(hours_per_unit: f64) -> f64 {
        if hours_per_unit > 0.0 {
            hours_per_unit
        } else {
            DEFAULT_HOURS_PER_UNIT
        }
    }

    /// 换算为钟点学时
    ///
    /// 规则:
    /// - Hours → 原样返回
    /// - Units → amount × hours_per_unit
    pub fn to_clock_hours(&self, amount: f64, unit: MeasurementUnit, hours_per_unit: f64) -> f64 {
        match unit {
            MeasurementUnit::Hours => amount,
            MeasurementUnit::Units => amount * Self::normalize_ratio(hours_per_unit),
        }
    }

    /// 任意单位间换算
    ///
    /// 同单位恒等返回; 异单位以钟点学时为公共基准中转
    pub fn convert(
        &self,
        amount: f64,
        from_unit: MeasurementUnit,
        to_unit: MeasurementUnit,
        hours_per_unit: f64,
    ) -> f64 {
        if from_unit == to_unit {
            return amount;
        }

        let ratio = Self::normalize_ratio(hours_per_unit);
        let hours = self.to_clock_hours(amount, from_unit, ratio);

        match to_unit {
            MeasurementUnit::Hours => hours,
            MeasurementUnit::Units => hours / ratio,
        }
    }
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self::new()
    }
}
