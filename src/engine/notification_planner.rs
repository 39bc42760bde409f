// ==========================================
// 继续教育合规提醒系统 - 提醒规划引擎
// ==========================================
// 职责: 生成带确定性稳定键的提醒调度请求
// 红线: 纯函数规划, 不触达平台调度器;
//       已过期的触发时刻逐条丢弃, 决不回溯调度
// ==========================================

use crate::domain::notification::ReminderRequest;
use crate::domain::types::{NotificationKind, TimeOfDay};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

// ==========================================
// NotificationPlanner - 提醒规划引擎
// ==========================================
pub struct NotificationPlanner {
    // 无状态引擎,不需要注入依赖
}

impl NotificationPlanner {
    /// 创建新的提醒规划引擎
    pub fn new() -> Self {
        Self {}
    }

    /// 锚定日 + 时段偏好 → 当日触发时刻
    fn at_time_of_day(date: NaiveDate, time_of_day: TimeOfDay) -> NaiveDateTime {
        // hour_offset 恒在 0..24 内, and_hms_opt 不会失败
        date.and_hms_opt(time_of_day.hour_offset(), 0, 0)
            .unwrap_or_else(|| date.and_hms_opt(9, 0, 0).expect("午夜偏移恒合法"))
    }

    // ==========================================
    // 按天提前规划
    // ==========================================

    /// 规划按天提前的提醒 (1~2条)
    ///
    /// 触发日规则:
    /// - 常规: 锚定日 − 提前天数 (主提醒用 primary, 次提醒用 secondary)
    /// - 指定自定义锚点时: 忽略提前天数, 单条提醒直接落在自定义日
    /// 触发时刻 = 触发日 + 时段偏好的固定偏移
    ///
    /// 丢弃规则: 触发时刻不严格晚于 now 的条目逐条静默丢弃
    /// 序号规则: 主提醒恒为0, 次提醒恒为1, 与丢弃与否无关
    ///           (保证稳定键不随时间漂移)
    pub fn plan_for_day_based(
        &self,
        kind: NotificationKind,
        entity_id: &str,
        title: &str,
        body: &str,
        anchor_date: NaiveDate,
        lead_days_primary: i64,
        lead_days_secondary: i64,
        time_of_day: TimeOfDay,
        single_only: bool,
        custom_anchor: Option<NaiveDate>,
        now: NaiveDateTime,
    ) -> Vec<ReminderRequest> {
        // (序号, 触发日) 序列
        let schedule: Vec<(u32, NaiveDate)> = match custom_anchor {
            Some(custom) => vec![(0, custom)],
            None => {
                let mut s = vec![(0u32, anchor_date - Duration::days(lead_days_primary))];
                if !single_only {
                    s.push((1, anchor_date - Duration::days(lead_days_secondary)));
                }
                s
            }
        };

        let entries: Vec<ReminderRequest> = schedule
            .into_iter()
            .filter_map(|(series_index, trigger_date)| {
                let trigger_at = Self::at_time_of_day(trigger_date, time_of_day);
                if trigger_at <= now {
                    debug!(
                        kind = %kind,
                        entity_id,
                        series_index,
                        trigger_at = %trigger_at,
                        "触发时刻已过, 丢弃该条提醒"
                    );
                    return None;
                }
                Some(ReminderRequest {
                    stable_key: ReminderRequest::stable_key(kind, entity_id, series_index),
                    kind,
                    title: title.to_string(),
                    body: body.to_string(),
                    trigger_at,
                    series_index,
                })
            })
            .collect();

        entries
    }

    // ==========================================
    // 线下活动规划 (按天 + 按分钟两路)
    // ==========================================

    /// 规划线下活动的提醒
    ///
    /// 按天路: 同 plan_for_day_based (类型 LiveEventDay, 锚定开始日)
    /// 按分钟路: 最多2条, 触发时刻 = 开始时刻 − 提前分钟数;
    ///           提前分钟数 ≤0 或触发时刻已过的条目逐条丢弃
    #[allow(clippy::too_many_arguments)]
    pub fn plan_for_live_event(
        &self,
        event_id: &str,
        starts_at: NaiveDateTime,
        lead_minutes_primary: i64,
        lead_minutes_secondary: i64,
        day_title: &str,
        day_body: &str,
        time_title: &str,
        time_body: &str,
        lead_days_primary: i64,
        lead_days_secondary: i64,
        time_of_day: TimeOfDay,
        now: NaiveDateTime,
    ) -> Vec<ReminderRequest> {
        let mut entries = self.plan_for_day_based(
            NotificationKind::LiveEventDay,
            event_id,
            day_title,
            day_body,
            starts_at.date(),
            lead_days_primary,
            lead_days_secondary,
            time_of_day,
            false,
            None,
            now,
        );

        for (series_index, lead_minutes) in
            [(0u32, lead_minutes_primary), (1, lead_minutes_secondary)]
        {
            if lead_minutes <= 0 {
                continue;
            }
            let trigger_at = starts_at - Duration::minutes(lead_minutes);
            if trigger_at <= now {
                continue;
            }
            entries.push(ReminderRequest {
                stable_key: ReminderRequest::stable_key(
                    NotificationKind::LiveEventTime,
                    event_id,
                    series_index,
                ),
                kind: NotificationKind::LiveEventTime,
                title: time_title.to_string(),
                body: time_body.to_string(),
                trigger_at,
                series_index,
            });
        }

        entries
    }
}

impl Default for NotificationPlanner {
    fn default() -> Self {
        Self::new()
    }
}
