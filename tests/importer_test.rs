// ==========================================
// 学习活动CSV导入集成测试
// ==========================================
// 环境: 内存 SQLite + tempfile 临时CSV
// 覆盖: 合法行入库 / 非法行逐条跳过 / 文件级错误
// ==========================================

use chrono::{NaiveDate, Utc};
use ce_compliance::db::open_in_memory;
use ce_compliance::domain::credential::{Credential, SpecialCategory};
use ce_compliance::domain::types::MeasurementUnit;
use ce_compliance::importer::{ActivityImporter, ImportError};
use ce_compliance::repository::{
    ActivityFilter, ActivityRepository, CredentialRepository, SpecialCategoryRepository,
};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

// ==========================================
// 测试辅助函数
// ==========================================

/// 建立内存数据库并预置 CRED_1 / CRED_2 (活动的证书关联目标)
fn setup() -> (Arc<ActivityRepository>, ActivityImporter) {
    let conn = Arc::new(Mutex::new(open_in_memory().unwrap()));

    let credential_repo = CredentialRepository::from_connection(conn.clone());
    for credential_id in ["CRED_1", "CRED_2"] {
        credential_repo
            .upsert(&Credential {
                credential_id: credential_id.to_string(),
                name: "注册会计师".to_string(),
                measurement_default: MeasurementUnit::Hours,
                hours_per_unit: 10.0,
                required_ces: 24.0,
                created_at: Utc::now().naive_utc(),
                updated_at: Utc::now().naive_utc(),
            })
            .unwrap();
    }

    SpecialCategoryRepository::from_connection(conn.clone())
        .upsert(&SpecialCategory {
            category_id: "CAT_ETHICS".to_string(),
            credential_id: "CRED_1".to_string(),
            name: "职业道德".to_string(),
            required_hours: 5.0,
            measurement_default: MeasurementUnit::Hours,
        })
        .unwrap();

    let repo = Arc::new(ActivityRepository::from_connection(conn));
    let importer = ActivityImporter::new(repo.clone());
    (repo, importer)
}

/// 写入临时CSV文件 (保留 .csv 扩展名)
fn write_csv(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ==========================================
// 测试用例 1: 合法行全部入库
// ==========================================

#[test]
fn test_import_valid_rows() {
    println!("\n=== 测试：合法CSV行全部入库 ===");

    let (repo, importer) = setup();
    let csv = write_csv(
        "activity_id,title,awarded_amount,unit,completed,completion_date,expiration_date,for_reinstatement,credential_ids,category_id\n\
         ACT_1,伦理课程,2.5,HOURS,true,2026-03-10,,false,CRED_1,CAT_ETHICS\n\
         ,学分研讨会,1.0,UNITS,true,2026-04-02,2027-04-02,true,CRED_1;CRED_2,\n",
    );

    let report = importer.import_csv(csv.path()).unwrap();

    assert_eq!(report.total_rows, 2);
    assert_eq!(report.imported, 2);
    assert!(report.skipped.is_empty());

    let first = repo.find_by_id("ACT_1").unwrap().unwrap();
    assert_eq!(first.title, "伦理课程");
    assert_eq!(first.awarded_amount, 2.5);
    assert_eq!(first.unit, MeasurementUnit::Hours);
    assert_eq!(
        first.completion_date,
        Some(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap())
    );
    assert_eq!(first.category_id, Some("CAT_ETHICS".to_string()));

    // 留空ID自动生成; 多证书以分号拆分
    let all = repo.fetch(&ActivityFilter::default()).unwrap();
    assert_eq!(all.len(), 2);
    let generated = all.iter().find(|a| a.activity_id != "ACT_1").unwrap();
    assert!(!generated.activity_id.is_empty());
    assert_eq!(generated.credential_ids.len(), 2);
    assert!(generated.for_reinstatement);
}

// ==========================================
// 测试用例 2: 非法行逐条跳过, 不中断整批
// ==========================================

#[test]
fn test_invalid_rows_skipped_with_reasons() {
    println!("\n=== 测试：非法行记录原因后跳过 ===");

    let (repo, importer) = setup();
    let csv = write_csv(
        "title,awarded_amount,completion_date\n\
         合法课程,3.0,2026-03-10\n\
         ,2.0,2026-03-11\n\
         数值非法,abc,2026-03-12\n\
         负授予量,-1.5,2026-03-13\n\
         日期非法,2.0,2026/03/14\n",
    );

    let report = importer.import_csv(csv.path()).unwrap();

    assert_eq!(report.total_rows, 5);
    assert_eq!(report.imported, 1);
    assert_eq!(report.skipped.len(), 4);

    // 每条跳过记录带行号与具体原因
    assert_eq!(report.skipped[0].row, 2);
    assert!(report.skipped[0].reason.contains("title"));
    assert!(report.skipped[1].reason.contains("awarded_amount"));
    assert!(report.skipped[2].reason.contains("不可为负"));
    assert!(report.skipped[3].reason.contains("日期格式错误"));

    assert_eq!(repo.fetch(&ActivityFilter::default()).unwrap().len(), 1);
}

// ==========================================
// 测试用例 3: 空白行不计入
// ==========================================

#[test]
fn test_blank_rows_ignored() {
    println!("\n=== 测试：完全空白的行直接忽略 ===");

    let (_repo, importer) = setup();
    let csv = write_csv(
        "title,awarded_amount\n\
         课程A,1.0\n\
         ,\n\
         课程B,2.0\n",
    );

    let report = importer.import_csv(csv.path()).unwrap();
    assert_eq!(report.total_rows, 2);
    assert_eq!(report.imported, 2);
}

// ==========================================
// 测试用例 4: 文件级错误
// ==========================================

#[test]
fn test_file_level_errors() {
    println!("\n=== 测试：文件不存在/扩展名不支持 ===");

    let (_repo, importer) = setup();

    let missing = importer.import_csv(std::path::Path::new("/no/such/file.csv"));
    assert!(matches!(missing, Err(ImportError::FileNotFound(_))));

    let mut wrong_ext = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
    wrong_ext.write_all(b"not a csv").unwrap();
    let unsupported = importer.import_csv(wrong_ext.path());
    assert!(matches!(unsupported, Err(ImportError::UnsupportedFormat(_))));
}

// ==========================================
// 测试用例 5: 重复导入幂等 (同ID覆盖)
// ==========================================

#[test]
fn test_reimport_same_ids_idempotent() {
    println!("\n=== 测试：同ID重复导入覆盖而非累积 ===");

    let (repo, importer) = setup();
    let csv = write_csv(
        "activity_id,title,awarded_amount\n\
         ACT_1,第一版名称,2.0\n",
    );
    importer.import_csv(csv.path()).unwrap();

    let updated = write_csv(
        "activity_id,title,awarded_amount\n\
         ACT_1,修订后名称,3.0\n",
    );
    importer.import_csv(updated.path()).unwrap();

    let all = repo.fetch(&ActivityFilter::default()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "修订后名称");
    assert_eq!(all[0].awarded_amount, 3.0);
}
