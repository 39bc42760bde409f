// ==========================================
// 继续教育合规提醒系统 - 提醒编排器
// ==========================================
// 用途: 协调周期挂接、全量取消与逐类型重规划
// 不变式: 先 cancel_all 再按实体类型顺序重建,
//         决不并发重建 (避免取消与新建互相覆盖)
// 成就通知单独规划, 持久"已通知"集合不被全量取消清空
// ==========================================

use crate::config::NotificationConfigReader;
use crate::domain::activity::Activity;
use crate::domain::notification::ReminderRequest;
use crate::domain::types::{AuthorizationStatus, NotificationKind, TimeOfDay};
use crate::engine::gateway::{ReminderGateway, ScheduleOutcome};
use crate::engine::notification_planner::NotificationPlanner;
use crate::engine::period_resolver::PeriodResolver;
use crate::engine::repositories::ComplianceRepositories;
use crate::i18n::{t, t_with_args};
use crate::repository::ActivityFilter;
use chrono::{Duration, NaiveDateTime};
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ==========================================
// ReplanResult - 重规划结果
// ==========================================

#[derive(Debug, Clone)]
pub struct ReplanResult {
    // 平台授权状态 (Denied 时 planned 仍完整, 但不投递)
    pub authorization: AuthorizationStatus,

    // 周期挂接发生变化的活动数
    pub relinked_count: usize,

    // 本轮规划出的全部提醒请求
    pub planned: Vec<ReminderRequest>,

    // 实际进入平台调度队列的条数
    pub scheduled_count: usize,
}

// ==========================================
// DayLeadConfig - 按天规划参数快照
// ==========================================
// 配置在一轮 replan 开始时读取一次,
// 轮内各实体类型共用同一快照
struct DayLeadConfig {
    lead_days_primary: i64,
    lead_days_secondary: i64,
    time_of_day: TimeOfDay,
}

// ==========================================
// ReplanOrchestrator - 提醒编排器
// ==========================================

pub struct ReplanOrchestrator<C>
where
    C: NotificationConfigReader,
{
    config: Arc<C>,
    repos: ComplianceRepositories,
    gateway: Arc<dyn ReminderGateway>,
    resolver: PeriodResolver,
    planner: NotificationPlanner,
}

impl<C> ReplanOrchestrator<C>
where
    C: NotificationConfigReader,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - config: 配置读取器
    /// - repos: 仓储集合
    /// - gateway: 提醒调度网关
    pub fn new(
        config: Arc<C>,
        repos: ComplianceRepositories,
        gateway: Arc<dyn ReminderGateway>,
    ) -> Self {
        Self {
            config,
            repos,
            gateway,
            resolver: PeriodResolver::new(),
            planner: NotificationPlanner::new(),
        }
    }

    /// 执行完整重规划流程
    ///
    /// 全量取消后按实体类型顺序重建:
    /// 活动证明到期 → 换证截止 → 处分整改 → 复证截止 → 线下活动。
    /// 同输入同 now 重复执行得到相同稳定键集合 (幂等)。
    ///
    /// # 参数
    /// - now: 当前时刻 (触发时刻不晚于 now 的条目被丢弃)
    ///
    /// # 返回
    /// 重规划结果
    pub async fn replan(&self, now: NaiveDateTime) -> Result<ReplanResult, Box<dyn Error>> {
        info!(now = %now, "开始重规划提醒");

        // ==========================================
        // 步骤1: 周期挂接刷新
        // ==========================================
        debug!("步骤1: 刷新活动的周期挂接");

        let relinked_count = self.relink_activities()?;

        info!(relinked_count, "周期挂接刷新完成");

        // ==========================================
        // 步骤2: 全量取消既有提醒
        // ==========================================
        debug!("步骤2: 取消全部已调度提醒");

        self.gateway.cancel_all().map_err(|e| e as Box<dyn Error>)?;

        // ==========================================
        // 步骤3: 读取规划配置快照
        // ==========================================
        let day_config = DayLeadConfig {
            lead_days_primary: self.config.get_lead_days_primary().await?,
            lead_days_secondary: self.config.get_lead_days_secondary().await?,
            time_of_day: self.config.get_time_of_day_preference().await?,
        };

        let mut planned: Vec<ReminderRequest> = Vec::new();

        // ==========================================
        // 步骤4: 活动证明到期提醒
        // ==========================================
        debug!("步骤4: 规划活动证明到期提醒");

        if self
            .config
            .get_kind_enabled(NotificationKind::ActivityExpiry)
            .await?
        {
            planned.extend(self.plan_activity_expiries(&day_config, now)?);
        }

        // ==========================================
        // 步骤5: 换证周期截止提醒
        // ==========================================
        debug!("步骤5: 规划换证周期截止提醒");

        if self
            .config
            .get_kind_enabled(NotificationKind::RenewalDeadline)
            .await?
        {
            planned.extend(self.plan_renewal_deadlines(&day_config, now)?);
        }

        // ==========================================
        // 步骤6: 处分整改截止提醒
        // ==========================================
        debug!("步骤6: 规划处分整改截止提醒");

        if self
            .config
            .get_kind_enabled(NotificationKind::SanctionDeadline)
            .await?
        {
            planned.extend(self.plan_sanction_deadlines(&day_config, now)?);
        }

        // ==========================================
        // 步骤7: 复证截止提醒
        // ==========================================
        debug!("步骤7: 规划复证截止提醒");

        if self
            .config
            .get_kind_enabled(NotificationKind::ReinstatementDeadline)
            .await?
        {
            planned.extend(self.plan_reinstatement_deadlines(&day_config, now)?);
        }

        // ==========================================
        // 步骤8: 线下活动提醒 (按天 + 按分钟两路)
        // ==========================================
        debug!("步骤8: 规划线下活动提醒");

        planned.extend(self.plan_live_events(&day_config, now).await?);

        // ==========================================
        // 步骤9: 逐条投递
        // ==========================================
        debug!(planned_count = planned.len(), "步骤9: 逐条投递提醒");

        let authorization = self.gateway.authorization_status();
        let mut scheduled_count = 0usize;

        if authorization == AuthorizationStatus::Denied {
            // 授权被拒: 不投递, 状态值上报给调用方解释
            warn!("平台通知授权被拒, 本轮提醒全部不投递");
        } else {
            for request in &planned {
                match self.schedule_with_retry(request)? {
                    ScheduleOutcome::Scheduled => scheduled_count += 1,
                    ScheduleOutcome::AuthorizationPending => {
                        debug!(stable_key = %request.stable_key, "授权仍未确定, 放弃该条");
                    }
                    ScheduleOutcome::Denied => {
                        warn!(stable_key = %request.stable_key, "授权被拒, 放弃该条");
                    }
                }
            }
        }

        info!(
            relinked_count,
            planned_count = planned.len(),
            scheduled_count,
            authorization = %authorization,
            "重规划完成"
        );

        Ok(ReplanResult {
            authorization,
            relinked_count,
            planned,
            scheduled_count,
        })
    }

    // ==========================================
    // 成就通知 (replan 范围之外)
    // ==========================================

    /// 投递单条成就通知
    ///
    /// 持久"已通知"集合先行去重: 已通知过的成就直接跳过,
    /// 不受全量 replan 的取消影响
    ///
    /// # 返回
    /// - Ok(true): 本次完成投递
    /// - Ok(false): 此前已通知过, 跳过
    pub fn notify_award(
        &self,
        award_key: &str,
        title: &str,
        body: &str,
        now: NaiveDateTime,
    ) -> Result<bool, Box<dyn Error>> {
        if self.repos.notified_award_repo.is_notified(award_key)? {
            debug!(award_key, "成就已通知过, 跳过");
            return Ok(false);
        }

        let request = ReminderRequest {
            stable_key: ReminderRequest::stable_key(NotificationKind::Award, award_key, 0),
            kind: NotificationKind::Award,
            title: title.to_string(),
            body: body.to_string(),
            // 成就提醒在下一分钟触发
            trigger_at: now + Duration::minutes(1),
            series_index: 0,
        };

        match self.schedule_with_retry(&request)? {
            ScheduleOutcome::Scheduled => {
                self.repos.notified_award_repo.mark_notified(award_key)?;
                info!(award_key, "成就通知已投递");
                Ok(true)
            }
            outcome => {
                warn!(award_key, ?outcome, "成就通知未投递");
                Ok(false)
            }
        }
    }

    /// 显式撤销单条成就通知
    ///
    /// 同时移除持久记录, 使该成就可再次通知
    pub fn cancel_award(&self, award_key: &str) -> Result<(), Box<dyn Error>> {
        let stable_key = ReminderRequest::stable_key(NotificationKind::Award, award_key, 0);
        self.gateway.cancel(&stable_key).map_err(|e| e as Box<dyn Error>)?;
        self.repos.notified_award_repo.revoke(award_key)?;
        Ok(())
    }

    // ==========================================
    // 内部: 挂接与逐类型规划
    // ==========================================

    /// 刷新全部活动的周期挂接并回写
    fn relink_activities(&self) -> Result<usize, Box<dyn Error>> {
        let activities = self.repos.activity_repo.fetch(&ActivityFilter::default())?;
        let periods = self.repos.renewal_repo.list_all()?;

        let changed = self.resolver.relink_batch(activities, &periods);
        for activity in &changed {
            self.repos
                .activity_repo
                .update_period_link(&activity.activity_id, activity.renewal_period_id.as_deref())?;
        }

        Ok(changed.len())
    }

    /// 活动证明到期提醒
    fn plan_activity_expiries(
        &self,
        day_config: &DayLeadConfig,
        now: NaiveDateTime,
    ) -> Result<Vec<ReminderRequest>, Box<dyn Error>> {
        let filter = ActivityFilter {
            has_expiration: Some(true),
            ..Default::default()
        };
        let activities: Vec<Activity> = self.repos.activity_repo.fetch(&filter)?;

        let mut entries = Vec::new();
        for activity in &activities {
            let expiration = match activity.expiration_date {
                Some(d) => d,
                None => continue,
            };

            entries.extend(self.planner.plan_for_day_based(
                NotificationKind::ActivityExpiry,
                &activity.activity_id,
                &t("reminder.activity_expiry.title"),
                &t_with_args(
                    "reminder.activity_expiry.body",
                    &[
                        ("title", activity.title.as_str()),
                        ("date", &expiration.format("%Y-%m-%d").to_string()),
                    ],
                ),
                expiration,
                day_config.lead_days_primary,
                day_config.lead_days_secondary,
                day_config.time_of_day,
                false,
                None,
                now,
            ));
        }

        Ok(entries)
    }

    /// 换证周期截止提醒
    ///
    /// 设有滞纳金起算日的周期, 正文额外提示滞纳金
    fn plan_renewal_deadlines(
        &self,
        day_config: &DayLeadConfig,
        now: NaiveDateTime,
    ) -> Result<Vec<ReminderRequest>, Box<dyn Error>> {
        let periods = self.repos.renewal_repo.list_open()?;

        let mut entries = Vec::new();
        for period in &periods {
            let credential_name = self
                .repos
                .credential_repo
                .find_by_id(&period.credential_id)?
                .map(|c| c.name)
                .unwrap_or_else(|| period.credential_id.clone());
            let end = period.end_date.format("%Y-%m-%d").to_string();

            let body = match period.late_fee_date {
                Some(late_fee_date) => t_with_args(
                    "reminder.renewal_deadline.body_late_fee",
                    &[
                        ("name", credential_name.as_str()),
                        ("date", end.as_str()),
                        (
                            "late_fee_date",
                            &late_fee_date.format("%Y-%m-%d").to_string(),
                        ),
                    ],
                ),
                None => t_with_args(
                    "reminder.renewal_deadline.body",
                    &[("name", credential_name.as_str()), ("date", end.as_str())],
                ),
            };

            entries.extend(self.planner.plan_for_day_based(
                NotificationKind::RenewalDeadline,
                &period.period_id,
                &t("reminder.renewal_deadline.title"),
                &body,
                period.end_date,
                day_config.lead_days_primary,
                day_config.lead_days_secondary,
                day_config.time_of_day,
                false,
                None,
                now,
            ));
        }

        Ok(entries)
    }

    /// 处分整改截止提醒
    fn plan_sanction_deadlines(
        &self,
        day_config: &DayLeadConfig,
        now: NaiveDateTime,
    ) -> Result<Vec<ReminderRequest>, Box<dyn Error>> {
        let sanctions = self.repos.sanction_repo.list_unresolved()?;

        let mut entries = Vec::new();
        for sanction in &sanctions {
            if !sanction.needs_reminder() {
                continue;
            }
            let deadline = match sanction.resolution_deadline {
                Some(d) => d,
                None => continue,
            };

            entries.extend(self.planner.plan_for_day_based(
                NotificationKind::SanctionDeadline,
                &sanction.sanction_id,
                &t("reminder.sanction_deadline.title"),
                &t_with_args(
                    "reminder.sanction_deadline.body",
                    &[
                        ("title", sanction.title.as_str()),
                        ("date", &deadline.format("%Y-%m-%d").to_string()),
                    ],
                ),
                deadline,
                day_config.lead_days_primary,
                day_config.lead_days_secondary,
                day_config.time_of_day,
                false,
                None,
                now,
            ));
        }

        Ok(entries)
    }

    /// 复证截止提醒
    ///
    /// 关联周期设有换证申请窗口起始日时, 以该日为自定义锚点
    /// (单条提醒落在窗口开启当日)
    fn plan_reinstatement_deadlines(
        &self,
        day_config: &DayLeadConfig,
        now: NaiveDateTime,
    ) -> Result<Vec<ReminderRequest>, Box<dyn Error>> {
        let infos = self.repos.reinstatement_repo.list_all()?;

        let mut entries = Vec::new();
        for info in &infos {
            let custom_anchor = self
                .repos
                .renewal_repo
                .find_by_id(&info.period_id)?
                .and_then(|p| p.application_window_start);

            entries.extend(self.planner.plan_for_day_based(
                NotificationKind::ReinstatementDeadline,
                &info.reinstatement_id,
                &t("reminder.reinstatement_deadline.title"),
                &t_with_args(
                    "reminder.reinstatement_deadline.body",
                    &[("date", &info.deadline.format("%Y-%m-%d").to_string())],
                ),
                info.deadline,
                day_config.lead_days_primary,
                day_config.lead_days_secondary,
                day_config.time_of_day,
                false,
                custom_anchor,
                now,
            ));
        }

        Ok(entries)
    }

    /// 线下活动提醒 (按天 + 按分钟两路, 各自受开关控制)
    async fn plan_live_events(
        &self,
        day_config: &DayLeadConfig,
        now: NaiveDateTime,
    ) -> Result<Vec<ReminderRequest>, Box<dyn Error>> {
        let day_enabled = self
            .config
            .get_kind_enabled(NotificationKind::LiveEventDay)
            .await?;
        let time_enabled = self
            .config
            .get_kind_enabled(NotificationKind::LiveEventTime)
            .await?;

        if !day_enabled && !time_enabled {
            return Ok(Vec::new());
        }

        let lead_minutes_primary = self.config.get_lead_minutes_primary_live().await?;
        let lead_minutes_secondary = self.config.get_lead_minutes_secondary_live().await?;
        let events = self.repos.live_event_repo.list_all()?;

        let mut entries = Vec::new();
        for event in &events {
            let start = event.starts_at.format("%Y-%m-%d %H:%M").to_string();

            let planned = self.planner.plan_for_live_event(
                &event.event_id,
                event.starts_at,
                lead_minutes_primary,
                lead_minutes_secondary,
                &t("reminder.live_event.day_title"),
                &t_with_args(
                    "reminder.live_event.day_body",
                    &[("title", event.title.as_str()), ("start", start.as_str())],
                ),
                &t("reminder.live_event.time_title"),
                &t_with_args(
                    "reminder.live_event.time_body",
                    &[("title", event.title.as_str())],
                ),
                day_config.lead_days_primary,
                day_config.lead_days_secondary,
                day_config.time_of_day,
                now,
            );

            entries.extend(planned.into_iter().filter(|e| match e.kind {
                NotificationKind::LiveEventDay => day_enabled,
                NotificationKind::LiveEventTime => time_enabled,
                _ => true,
            }));
        }

        Ok(entries)
    }

    /// 投递单条提醒, 授权未定时重试一次后放弃
    fn schedule_with_retry(
        &self,
        request: &ReminderRequest,
    ) -> Result<ScheduleOutcome, Box<dyn Error>> {
        match self.gateway.schedule(request).map_err(|e| e as Box<dyn Error>)? {
            ScheduleOutcome::AuthorizationPending => {
                Ok(self.gateway.schedule(request).map_err(|e| e as Box<dyn Error>)?)
            }
            outcome => Ok(outcome),
        }
    }
}
