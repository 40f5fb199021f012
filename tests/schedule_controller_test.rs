// ==========================================
// ScheduleQueryController 并发语义测试
// ==========================================
// 测试目标: last request wins / 取消 / 失败保屏 / 显式重试
// ==========================================

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use field_service_agenda::api::{FilterApi, QueryOutcome, QueryParams, ScheduleQueryController};
use field_service_agenda::config::SettingsStore;
use field_service_agenda::datasource::{
    QueryCache, RawScheduleResponse, StaticWorkOrderSource, TransportError, WorkOrderQuery,
    WorkOrderSource,
};
use field_service_agenda::engine::PeriodSelection;
use field_service_agenda::repository::SavedFilterRepository;
use field_service_agenda::{db, QueryState};
use tempfile::TempDir;

// ==========================================
// 测试辅助
// ==========================================

/// 逐次调用使用不同延迟的数据源（竞态编排用）
struct SequencedSource {
    delays: Vec<Duration>,
    calls: AtomicUsize,
    records: Vec<serde_json::Value>,
}

impl SequencedSource {
    fn new(delays: Vec<Duration>, records: Vec<serde_json::Value>) -> Self {
        Self {
            delays,
            calls: AtomicUsize::new(0),
            records,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkOrderSource for SequencedSource {
    async fn fetch_orders(
        &self,
        _query: &WorkOrderQuery,
    ) -> Result<RawScheduleResponse, TransportError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(index) {
            tokio::time::sleep(*delay).await;
        }
        Ok(RawScheduleResponse::Orders(self.records.clone()))
    }
}

struct TestHarness {
    _dir: TempDir,
    filter_api: Arc<FilterApi>,
    settings_store: Arc<SettingsStore>,
}

fn create_harness() -> TestHarness {
    let dir = TempDir::new().expect("临时目录创建失败");
    let db_path = dir.path().join("test.db");
    let conn = db::open_and_prepare(&db_path.to_string_lossy()).expect("数据库初始化失败");
    let conn = Arc::new(Mutex::new(conn));
    let repo = Arc::new(SavedFilterRepository::from_connection(conn.clone()).unwrap());
    TestHarness {
        _dir: dir,
        filter_api: Arc::new(FilterApi::new(repo)),
        settings_store: Arc::new(SettingsStore::from_connection(conn).unwrap()),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn record(id: &str, on: &str) -> serde_json::Value {
    json!({
        "id": id,
        "data_agendada": format!("{on} 09:00:00"),
        "status": "AG",
        "id_assunto": "17",
        "id_filial": "1"
    })
}

fn params(start: NaiveDate, days: u32) -> QueryParams {
    QueryParams {
        selection: PeriodSelection::Explicit { start, days },
        branch_id: None,
    }
}

// ==========================================
// last request wins
// ==========================================

#[tokio::test]
async fn test_late_first_response_is_discarded() {
    let harness = create_harness();
    // 第一次取数慢、第二次快：第一次的结果必然迟到
    let source = Arc::new(SequencedSource::new(
        vec![Duration::from_millis(200), Duration::from_millis(10)],
        vec![record("os-1", "2024-03-04")],
    ));
    let controller = Arc::new(ScheduleQueryController::new(
        source,
        harness.filter_api.clone(),
        harness.settings_store.clone(),
    ));
    let today = date(2024, 3, 4);

    let slow = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.submit(params(date(2024, 3, 4), 7), today).await })
    };
    // 让慢查询先领到代号并进入取数
    tokio::time::sleep(Duration::from_millis(50)).await;
    let fast = controller.submit(params(date(2024, 3, 4), 1), today).await.unwrap();

    let slow = slow.await.unwrap().unwrap();

    // 后发先至的那次落地；先发的被取代
    assert!(matches!(slow, QueryOutcome::Superseded));
    let view = match fast {
        QueryOutcome::Applied(view) => view,
        QueryOutcome::Superseded => panic!("最新查询不应被取代"),
    };
    assert_eq!(view.period.days, 1);

    // 屏上只反映第二次查询
    assert_eq!(controller.phase().unwrap(), QueryState::Ready);
    assert_eq!(controller.last_view().unwrap().unwrap().period.days, 1);
}

#[tokio::test]
async fn test_failure_keeps_previous_view_and_retry_recovers() {
    let harness = create_harness();
    let source = Arc::new(StaticWorkOrderSource::new(vec![record(
        "os-1",
        "2024-03-04",
    )]));
    let controller = ScheduleQueryController::new(
        source.clone(),
        harness.filter_api.clone(),
        harness.settings_store.clone(),
    );
    let today = date(2024, 3, 4);

    // 第一轮成功
    let first = controller.submit(params(today, 7), today).await.unwrap();
    assert!(matches!(first, QueryOutcome::Applied(_)));
    assert_eq!(controller.phase().unwrap(), QueryState::Ready);

    // 注入故障：同参数重新提交 → Failed，但上一幅视图保留
    source.set_fail(true);
    let err = controller.submit(params(today, 7), today).await.unwrap_err();
    assert!(matches!(
        err,
        field_service_agenda::ApiError::Transport(TransportError::Http { status: 502, .. })
    ));
    assert_eq!(controller.phase().unwrap(), QueryState::Failed);
    assert!(controller.last_error().unwrap().is_some());
    let kept = controller.last_view().unwrap().unwrap();
    assert_eq!(kept.total_orders(), 1);

    // 显式重试（同参数）恢复 Ready
    source.set_fail(false);
    let retried = controller.retry(today).await.unwrap();
    assert!(matches!(retried, QueryOutcome::Applied(_)));
    assert_eq!(controller.phase().unwrap(), QueryState::Ready);
    assert!(controller.last_error().unwrap().is_none());
}

#[tokio::test]
async fn test_retry_without_prior_query_is_invalid() {
    let harness = create_harness();
    let controller = ScheduleQueryController::new(
        Arc::new(StaticWorkOrderSource::new(vec![])),
        harness.filter_api.clone(),
        harness.settings_store.clone(),
    );
    let err = controller.retry(date(2024, 3, 4)).await.unwrap_err();
    assert!(matches!(err, field_service_agenda::ApiError::InvalidInput(_)));
}

// ==========================================
// 查询缓存
// ==========================================

#[tokio::test]
async fn test_cache_hit_bypasses_source() {
    let harness = create_harness();
    let source = Arc::new(SequencedSource::new(
        vec![],
        vec![record("os-1", "2024-03-04")],
    ));
    let controller = ScheduleQueryController::new(
        source.clone(),
        harness.filter_api.clone(),
        harness.settings_store.clone(),
    )
    .with_cache(Arc::new(QueryCache::new()));
    let today = date(2024, 3, 4);

    let first = controller.submit(params(today, 7), today).await.unwrap();
    assert!(matches!(first, QueryOutcome::Applied(_)));
    assert_eq!(source.call_count(), 1);

    // 同参数在 TTL 内重查：不再打数据源
    let second = controller.submit(params(today, 7), today).await.unwrap();
    assert!(matches!(second, QueryOutcome::Applied(_)));
    assert_eq!(source.call_count(), 1);

    // 参数不同 → 新键 → 重新取数
    let third = controller.submit(params(today, 1), today).await.unwrap();
    assert!(matches!(third, QueryOutcome::Applied(_)));
    assert_eq!(source.call_count(), 2);
}

// ==========================================
// 汇总与维护看板旁路
// ==========================================

#[tokio::test]
async fn test_summary_counts_through_controller() {
    let harness = create_harness();
    let records = vec![
        json!({
            "id": "I-1", "data_agendada": "2024-03-04 10:00:00",
            "status": "AG", "id_assunto": "1", "id_filial": "1"
        }),
        json!({
            "id": "M-1", "data_agendada": "2024-03-04 09:00:00",
            "status": "A", "id_assunto": "17", "id_filial": "1",
            "data_abertura": "2024-03-04 08:00:00"
        }),
    ];
    let controller = ScheduleQueryController::new(
        Arc::new(StaticWorkOrderSource::new(records)),
        harness.filter_api.clone(),
        harness.settings_store.clone(),
    );
    let today = date(2024, 3, 4);

    let summary = controller.summary(params(today, 7), today).await.unwrap();
    assert_eq!(summary.period.start, today);
    assert_eq!(summary.period.end, date(2024, 3, 10));
    assert_eq!(summary.installations.scheduled_today, 1);
    assert_eq!(summary.installations.total_period, 1);
    assert_eq!(summary.maintenances.opened_today, 1);
    assert_eq!(summary.maintenances.open_total, 1);
}

#[tokio::test]
async fn test_maintenance_board_through_controller() {
    let harness = create_harness();
    let records = vec![
        json!({
            "id": "M-ag", "data_agendada": "2024-03-05 09:00:00",
            "status": "AG", "id_assunto": "17", "id_filial": "1"
        }),
        json!({
            "id": "M-done", "data_agendada": "2024-03-05 10:00:00",
            "status": "F", "id_assunto": "17", "id_filial": "1"
        }),
        json!({
            "id": "I-1", "data_agendada": "2024-03-05 11:00:00",
            "status": "AG", "id_assunto": "1", "id_filial": "1"
        }),
    ];
    let controller = ScheduleQueryController::new(
        Arc::new(StaticWorkOrderSource::new(records)),
        harness.filter_api.clone(),
        harness.settings_store.clone(),
    );
    let today = date(2024, 3, 4);

    let scheduled = controller
        .maintenances(field_service_agenda::MaintenanceTab::Scheduled, None, None, today)
        .await
        .unwrap();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].id, "M-ag");

    let done = controller
        .maintenances(field_service_agenda::MaintenanceTab::Done, None, None, today)
        .await
        .unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].id, "M-done");
}
