// ==========================================
// 继续教育合规提醒系统 - 调度网关
// ==========================================
// 职责: 定义提醒投递 trait, 实现依赖倒置
// 说明: Engine 层定义 trait, 平台适配层实现
//       (系统通知中心/推送服务)
// 红线: 规划引擎只产出请求, 投递细节全部隔离在网关之后
// ==========================================

use crate::domain::notification::ReminderRequest;
use crate::domain::types::AuthorizationStatus;
use std::error::Error;
use std::sync::Mutex;

// ==========================================
// 调度结果
// ==========================================

/// 单条提醒的调度结果
///
/// 授权问题不是错误: 以状态值上报, 由调用方决定重试或放弃
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// 已进入平台调度队列
    Scheduled,
    /// 平台授权尚未确定 (首次使用), 允许重试一次
    AuthorizationPending,
    /// 用户已拒绝授权, 放弃本条并上报状态
    Denied,
}

/// 网关统一结果类型
pub type GatewayResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// 调度网关 Trait
// ==========================================

/// 提醒调度网关
///
/// Engine 层定义, 平台层实现
/// 重规划以 cancel_all + 逐条 schedule 的方式进行,
/// 稳定键是两侧对账的唯一标识
pub trait ReminderGateway: Send + Sync {
    /// 查询平台授权状态
    fn authorization_status(&self) -> AuthorizationStatus;

    /// 调度单条提醒
    ///
    /// # 返回
    /// - Ok(ScheduleOutcome): 调度结果 (含授权未定/被拒两种状态值)
    /// - Err: 平台交互失败
    fn schedule(&self, request: &ReminderRequest) -> GatewayResult<ScheduleOutcome>;

    /// 取消全部已调度提醒
    fn cancel_all(&self) -> GatewayResult<()>;

    /// 按稳定键取消单条提醒
    fn cancel(&self, stable_key: &str) -> GatewayResult<()>;
}

// ==========================================
// NoOpReminderGateway - 空操作网关
// ==========================================

/// 空操作网关
///
/// 用于不需要真实投递的场景 (如单元测试/干跑)
#[derive(Debug, Clone, Default)]
pub struct NoOpReminderGateway;

impl ReminderGateway for NoOpReminderGateway {
    fn authorization_status(&self) -> AuthorizationStatus {
        AuthorizationStatus::Authorized
    }

    fn schedule(&self, request: &ReminderRequest) -> GatewayResult<ScheduleOutcome> {
        tracing::debug!(
            "NoOpReminderGateway: 跳过提醒投递 - stable_key={}, trigger_at={}",
            request.stable_key,
            request.trigger_at
        );
        Ok(ScheduleOutcome::Scheduled)
    }

    fn cancel_all(&self) -> GatewayResult<()> {
        Ok(())
    }

    fn cancel(&self, _stable_key: &str) -> GatewayResult<()> {
        Ok(())
    }
}

// ==========================================
// RecordingReminderGateway - 记录网关
// ==========================================

/// 记录网关
///
/// 把全部调度/取消动作记录在内存中, 供集成测试断言
/// 幂等性验证依赖它: 两轮 replan 后比较记录的稳定键集合
#[derive(Debug, Default)]
pub struct RecordingReminderGateway {
    scheduled: Mutex<Vec<ReminderRequest>>,
    cancel_all_count: Mutex<u32>,
}

impl RecordingReminderGateway {
    /// 创建新的记录网关
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前已调度的请求快照
    pub fn scheduled(&self) -> Vec<ReminderRequest> {
        self.scheduled.lock().expect("记录网关锁不可中毒").clone()
    }

    /// 当前已调度的稳定键集合 (排序后)
    pub fn scheduled_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .scheduled()
            .iter()
            .map(|r| r.stable_key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// cancel_all 的累计调用次数
    pub fn cancel_all_count(&self) -> u32 {
        *self.cancel_all_count.lock().expect("记录网关锁不可中毒")
    }
}

impl ReminderGateway for RecordingReminderGateway {
    fn authorization_status(&self) -> AuthorizationStatus {
        AuthorizationStatus::Authorized
    }

    fn schedule(&self, request: &ReminderRequest) -> GatewayResult<ScheduleOutcome> {
        let mut scheduled = self.scheduled.lock().expect("记录网关锁不可中毒");
        // 同键重复调度按平台语义覆盖旧条目
        scheduled.retain(|r| r.stable_key != request.stable_key);
        scheduled.push(request.clone());
        Ok(ScheduleOutcome::Scheduled)
    }

    fn cancel_all(&self) -> GatewayResult<()> {
        self.scheduled.lock().expect("记录网关锁不可中毒").clear();
        *self.cancel_all_count.lock().expect("记录网关锁不可中毒") += 1;
        Ok(())
    }

    fn cancel(&self, stable_key: &str) -> GatewayResult<()> {
        self.scheduled
            .lock()
            .expect("记录网关锁不可中毒")
            .retain(|r| r.stable_key != stable_key);
        Ok(())
    }
}
