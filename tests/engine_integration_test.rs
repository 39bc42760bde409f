// ==========================================
// 引擎间集成测试
// ==========================================
// 职责: 验证周期解析 → 合规计算 → 复证计算 → 提醒规划
//       多个引擎之间的协作和数据流转
// ==========================================

use chrono::{NaiveDate, NaiveDateTime, Utc};
use ce_compliance::domain::activity::Activity;
use ce_compliance::domain::credential::{Credential, SpecialCategory};
use ce_compliance::domain::renewal::{ReinstatementInfo, ReinstatementSpecialCat, RenewalPeriod};
use ce_compliance::domain::types::{MeasurementUnit, NotificationKind, TimeOfDay};
use ce_compliance::engine::{
    ComplianceEngine, NotificationPlanner, PeriodResolver, ReinstatementEngine,
};

// ==========================================
// 测试辅助函数
// ==========================================

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    ymd(y, m, d).and_hms_opt(h, min, 0).unwrap()
}

/// 创建测试用证书
fn create_test_credential(
    credential_id: &str,
    unit: MeasurementUnit,
    required_ces: f64,
) -> Credential {
    Credential {
        credential_id: credential_id.to_string(),
        name: "注册结构工程师".to_string(),
        measurement_default: unit,
        hours_per_unit: 10.0,
        required_ces,
        created_at: Utc::now().naive_utc(),
        updated_at: Utc::now().naive_utc(),
    }
}

/// 创建测试用换证周期
fn create_test_period(
    period_id: &str,
    credential_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> RenewalPeriod {
    RenewalPeriod {
        period_id: period_id.to_string(),
        credential_id: credential_id.to_string(),
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

/// 创建测试用学习活动 (未挂接周期)
fn create_test_activity(
    activity_id: &str,
    credential_id: &str,
    amount: f64,
    unit: MeasurementUnit,
    completion: NaiveDate,
) -> Activity {
    Activity {
        activity_id: activity_id.to_string(),
        title: "继续教育课程".to_string(),
        awarded_amount: amount,
        unit,
        completed: true,
        completion_date: Some(completion),
        expiration_date: None,
        for_reinstatement: false,
        credential_ids: vec![credential_id.to_string()],
        renewal_period_id: None,
        category_id: None,
        created_at: Utc::now().naive_utc(),
        updated_at: Utc::now().naive_utc(),
    }
}

// ==========================================
// 测试用例 1: 挂接 → 总量合规 全链路
// ==========================================

#[test]
fn test_relink_then_overall_compliance() {
    println!("\n=== 测试：周期挂接 → 总量合规全链路 ===");

    let resolver = PeriodResolver::new();
    let compliance = ComplianceEngine::new();

    let credential = create_test_credential("CRED_1", MeasurementUnit::Hours, 24.0);
    let periods = vec![create_test_period(
        "RP_1",
        "CRED_1",
        ymd(2026, 1, 1),
        ymd(2026, 12, 31),
    )];

    // 两个活动: 10学时 + 1学分 (比率10 ⇒ 10学时)
    let activities = vec![
        create_test_activity("ACT_1", "CRED_1", 10.0, MeasurementUnit::Hours, ymd(2026, 3, 1)),
        create_test_activity("ACT_2", "CRED_1", 1.0, MeasurementUnit::Units, ymd(2026, 4, 1)),
    ];

    // 先挂接
    let linked = resolver.relink_batch(activities, &periods);
    assert_eq!(linked.len(), 2);
    assert!(linked
        .iter()
        .all(|a| a.renewal_period_id == Some("RP_1".to_string())));

    // 再计算: remaining = 24 − (10 + 10) = 4
    let result = compliance.remaining_overall_ce(
        &credential,
        &periods[0],
        &periods,
        &linked,
        ymd(2026, 6, 15),
    );

    assert!((result.remaining - 4.0).abs() < 1e-9);
    assert!(result.is_current);
    assert_eq!(result.unit, MeasurementUnit::Hours);
}

// ==========================================
// 测试用例 2: 挂接失败的活动不计入合规
// ==========================================

#[test]
fn test_unlinked_activity_excluded_from_compliance() {
    println!("\n=== 测试：完成日落在周期外的活动不计入 ===");

    let resolver = PeriodResolver::new();
    let compliance = ComplianceEngine::new();

    let credential = create_test_credential("CRED_1", MeasurementUnit::Hours, 24.0);
    let periods = vec![create_test_period(
        "RP_1",
        "CRED_1",
        ymd(2026, 1, 1),
        ymd(2026, 12, 31),
    )];

    let activities = vec![
        create_test_activity("ACT_IN", "CRED_1", 10.0, MeasurementUnit::Hours, ymd(2026, 3, 1)),
        // 完成日在周期前一年, 挂接不上
        create_test_activity("ACT_OUT", "CRED_1", 8.0, MeasurementUnit::Hours, ymd(2025, 3, 1)),
    ];

    let linked = resolver.relink_batch(activities, &periods);
    let result = compliance.remaining_overall_ce(
        &credential,
        &periods[0],
        &periods,
        &linked,
        ymd(2026, 6, 15),
    );

    // 仅 ACT_IN 计入: 24 − 10 = 14
    assert!((result.remaining - 14.0).abs() < 1e-9);
}

// ==========================================
// 测试用例 3: 专项类别与总量同轮计算
// ==========================================

#[test]
fn test_special_category_alongside_overall() {
    println!("\n=== 测试：专项类别与总量同轮计算 ===");

    let compliance = ComplianceEngine::new();

    let credential = create_test_credential("CRED_1", MeasurementUnit::Hours, 24.0);
    let period = create_test_period("RP_1", "CRED_1", ymd(2026, 1, 1), ymd(2026, 12, 31));
    let categories = vec![SpecialCategory {
        category_id: "CAT_ETHICS".to_string(),
        credential_id: "CRED_1".to_string(),
        name: "职业道德".to_string(),
        required_hours: 5.0,
        measurement_default: MeasurementUnit::Hours,
    }];

    let mut ethics_act =
        create_test_activity("ACT_1", "CRED_1", 2.0, MeasurementUnit::Hours, ymd(2026, 3, 1));
    ethics_act.renewal_period_id = Some("RP_1".to_string());
    ethics_act.category_id = Some("CAT_ETHICS".to_string());

    let activities = vec![ethics_act];
    let periods = vec![period.clone()];

    let overall = compliance.remaining_overall_ce(
        &credential,
        &period,
        &periods,
        &activities,
        ymd(2026, 6, 15),
    );
    let special =
        compliance.remaining_special_category_ce(&credential, Some(&period), &categories, &activities);

    // 专项活动同时计入总量: 24 − 2 = 22; 专项: 5 − 2 = 3
    assert!((overall.remaining - 22.0).abs() < 1e-9);
    assert!((special["职业道德"] - 3.0).abs() < 1e-9);
}

// ==========================================
// 测试用例 4: 复证全链路 (学分制证书)
// ==========================================

#[test]
fn test_reinstatement_full_flow() {
    println!("\n=== 测试：复证总量与专项全链路 ===");

    let reinstatement = ReinstatementEngine::new();

    let credential = create_test_credential("CRED_1", MeasurementUnit::Units, 0.0);
    let lapsed = create_test_period("RP_LAPSED", "CRED_1", ymd(2024, 1, 1), ymd(2024, 12, 31));
    let info = ReinstatementInfo {
        reinstatement_id: "RI_1".to_string(),
        period_id: "RP_LAPSED".to_string(),
        total_extra_ces: 25.0,
        deadline: ymd(2026, 12, 31),
        created_at: Utc::now().naive_utc(),
    };
    let subs = vec![ReinstatementSpecialCat {
        reinstatement_id: "RI_1".to_string(),
        category_id: "CAT_LAW".to_string(),
        category_name: "法律法规".to_string(),
        ces_required: 2.0,
    }];

    let mut act =
        create_test_activity("ACT_1", "CRED_1", 100.0, MeasurementUnit::Hours, ymd(2026, 2, 1));
    act.for_reinstatement = true;
    act.renewal_period_id = Some("RP_LAPSED".to_string());
    act.category_id = Some("CAT_LAW".to_string());
    let activities = vec![act];

    // 总量: 25学分 × 10 = 250学时应修, 已修100学时
    let requirement = reinstatement.reinstatement_requirement(
        Some(&credential),
        &lapsed,
        Some(&info),
        &activities,
    );
    assert!((requirement.required_hours - 250.0).abs() < 1e-9);
    assert!((requirement.earned_hours - 100.0).abs() < 1e-9);

    // 专项: 应修2学分=20学时, 已修100学时 → 已满足
    let status = reinstatement.special_category_status(
        Some(&credential),
        &lapsed,
        Some(&info),
        &subs,
        &activities,
    );
    assert!(status.met);
    assert!(status.outstanding.is_empty());
}

// ==========================================
// 测试用例 5: 合规截止日进入提醒规划
// ==========================================

#[test]
fn test_period_end_feeds_planner() {
    println!("\n=== 测试：周期截止日进入提醒规划 ===");

    let planner = NotificationPlanner::new();
    let period = create_test_period("RP_1", "CRED_1", ymd(2026, 1, 1), ymd(2026, 12, 31));
    let now = dt(2026, 6, 1, 8, 0);

    let entries = planner.plan_for_day_based(
        NotificationKind::RenewalDeadline,
        &period.period_id,
        "换证截止提醒",
        "周期即将结束",
        period.end_date,
        30,
        7,
        TimeOfDay::Morning,
        false,
        None,
        now,
    );

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].stable_key, "renewal:RP_1-RENEWAL_DEADLINE.0");
    assert_eq!(entries[0].trigger_at, dt(2026, 12, 1, 9, 0));
    assert_eq!(entries[1].trigger_at, dt(2026, 12, 24, 9, 0));

    // 所有触发时刻严格在未来
    assert!(entries.iter().all(|e| e.trigger_at > now));
}

// ==========================================
// 测试用例 6: 规划对同输入幂等
// ==========================================

#[test]
fn test_planner_idempotent_over_resolver_output() {
    println!("\n=== 测试：挂接+规划两轮结果一致 ===");

    let resolver = PeriodResolver::new();
    let planner = NotificationPlanner::new();
    let now = dt(2026, 6, 1, 8, 0);

    let periods = vec![create_test_period(
        "RP_1",
        "CRED_1",
        ymd(2026, 1, 1),
        ymd(2026, 12, 31),
    )];
    let activities = vec![create_test_activity(
        "ACT_1",
        "CRED_1",
        10.0,
        MeasurementUnit::Hours,
        ymd(2026, 3, 1),
    )];

    let plan_once = || {
        let linked = resolver.relink_batch(activities.clone(), &periods);
        assert_eq!(linked.len(), 1);
        let anchor = periods[0].end_date;
        planner.plan_for_day_based(
            NotificationKind::RenewalDeadline,
            "RP_1",
            "标题",
            "正文",
            anchor,
            30,
            7,
            TimeOfDay::Morning,
            false,
            None,
            now,
        )
    };

    assert_eq!(plan_once(), plan_once());
}
