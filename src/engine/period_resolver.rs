// ==========================================
// 继续教育合规提醒系统 - 周期解析引擎
// ==========================================
// 职责: 判定参考日的"当前"周期 + 将已完成活动
//       挂接到完成日所在的换证周期
// 输入: renewal_period 快照 + activity 快照
// 输出: 当前周期列表 / 更新后的活动挂接
// ==========================================

use crate::domain::activity::Activity;
use crate::domain::renewal::RenewalPeriod;
use chrono::NaiveDate;
use tracing::instrument;

// ==========================================
// PeriodResolver - 周期解析引擎
// ==========================================
pub struct PeriodResolver {
    // 无状态引擎,不需要注入依赖
}

impl PeriodResolver {
    /// 创建新的周期解析引擎
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 当前周期判定
    // ==========================================

    /// 返回参考日落在窗口内的全部周期 (两端闭区间)
    ///
    /// 输入数据若存在重叠周期, 可能返回多个;
    /// 本引擎不负责阻止重叠, 由上游数据录入约束
    pub fn current_periods(
        &self,
        periods: &[RenewalPeriod],
        as_of: NaiveDate,
    ) -> Vec<RenewalPeriod> {
        periods
            .iter()
            .filter(|p| p.contains(as_of))
            .cloned()
            .collect()
    }

    /// 判断指定周期在参考日是否为当前周期
    pub fn is_current(&self, period: &RenewalPeriod, as_of: NaiveDate) -> bool {
        period.contains(as_of)
    }

    // ==========================================
    // 活动挂接 (依据完成日期)
    // ==========================================

    /// 为单个活动解析应挂接的周期
    ///
    /// 规则(按活动关联证书顺序执行, 命中即返回):
    /// 1) 活动必须已完成且有完成日期, 否则不挂接
    /// 2) 在该证书的周期中筛选包含完成日的周期 (两端闭区间)
    /// 3) 恰好一个命中 → 挂接该周期
    /// 4) 零个或多个命中 → 本证书不挂接, 继续下一证书
    ///
    /// 找不到归属不是错误, 返回 None 表示"无匹配"
    pub fn resolve_period(
        &self,
        activity: &Activity,
        periods: &[RenewalPeriod],
    ) -> Option<String> {
        if !activity.eligible_for_assignment() {
            return None;
        }
        let completion_date = activity.completion_date?;

        for credential_id in &activity.credential_ids {
            let matches: Vec<&RenewalPeriod> = periods
                .iter()
                .filter(|p| &p.credential_id == credential_id && p.contains(completion_date))
                .collect();

            // 多个命中说明数据存在重叠周期, 不猜测归属
            if matches.len() == 1 {
                return Some(matches[0].period_id.clone());
            }
        }

        None
    }

    /// 批量重挂接 (推荐使用)
    ///
    /// 对每个活动重新解析周期归属并回写 renewal_period_id。
    /// 幂等: 相同输入多次执行得到相同挂接
    ///
    /// 返回挂接发生变化的活动列表
    #[instrument(skip(self, activities, periods), fields(count = activities.len()))]
    pub fn relink_batch(
        &self,
        activities: Vec<Activity>,
        periods: &[RenewalPeriod],
    ) -> Vec<Activity> {
        let mut changed = Vec::new();

        for mut activity in activities {
            let resolved = self.resolve_period(&activity, periods);
            if activity.renewal_period_id != resolved {
                activity.renewal_period_id = resolved;
                changed.push(activity);
            }
        }

        changed
    }
}

impl Default for PeriodResolver {
    fn default() -> Self {
        Self::new()
    }
}
