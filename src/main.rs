// ==========================================
// 现场服务运营调度系统 - 演示入口
// ==========================================
// 用途: 在内存数据源上跑一轮完整查询链路
//       （配置 → 筛选 → 聚合 → 视图/汇总），输出 JSON
// ==========================================

use anyhow::Context;
use chrono::{Duration, Local, NaiveDate};
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use field_service_agenda::api::{FilterApi, QueryOutcome, QueryParams, ScheduleQueryController};
use field_service_agenda::config::SettingsStore;
use field_service_agenda::datasource::{QueryCache, StaticWorkOrderSource};
use field_service_agenda::engine::{NamedPeriod, PeriodSelection};
use field_service_agenda::repository::SavedFilterRepository;
use field_service_agenda::{db, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", field_service_agenda::APP_NAME);
    tracing::info!("系统版本: {}", field_service_agenda::VERSION);
    tracing::info!("==================================================");

    let db_path = default_db_path();
    tracing::info!("使用数据库: {}", db_path.display());
    let conn = db::open_and_prepare(&db_path.to_string_lossy()).context("数据库初始化失败")?;
    let conn = Arc::new(Mutex::new(conn));

    let repo = Arc::new(
        SavedFilterRepository::from_connection(conn.clone())
            .map_err(|e| anyhow::anyhow!("仓储初始化失败: {e}"))?,
    );
    let filter_api = Arc::new(FilterApi::new(repo));
    let settings_store = Arc::new(
        SettingsStore::from_connection(conn).map_err(|e| anyhow::anyhow!("配置初始化失败: {e}"))?,
    );

    let today = Local::now().date_naive();
    let source = Arc::new(StaticWorkOrderSource::new(demo_records(today)));
    let controller = ScheduleQueryController::new(source, filter_api, settings_store)
        .with_cache(Arc::new(QueryCache::new()));

    let params = QueryParams {
        selection: PeriodSelection::Named(NamedPeriod::Week),
        branch_id: None,
    };

    match controller.submit(params.clone(), today).await? {
        QueryOutcome::Applied(view) => {
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        QueryOutcome::Superseded => {
            // 单发查询不会被取代；此分支仅为完整性
            tracing::warn!("查询已被取代");
        }
    }

    let summary = controller.summary(params, today).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

/// 默认数据库路径：系统数据目录下，退化为当前目录
fn default_db_path() -> PathBuf {
    let dir = dirs::data_dir()
        .map(|base| base.join("field-service-agenda"))
        .unwrap_or_else(|| PathBuf::from("."));
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!("数据目录创建失败，退化为当前目录: {e}");
        return PathBuf::from("agenda.db");
    }
    dir.join("agenda.db")
}

/// 演示数据：围绕今天的少量工单（原始别名字段形态）
fn demo_records(today: NaiveDate) -> Vec<serde_json::Value> {
    let day = |offset: i64| (today + Duration::days(offset)).format("%Y-%m-%d").to_string();
    vec![
        json!({
            "id": "9001",
            "data_agendada": format!("{} 09:00:00", day(0)),
            "hora_agendada": "09:00",
            "status": "AG",
            "id_assunto": "1",
            "id_cliente": "100",
            "id_filial": "1",
            "cliente": "Dona Maria",
            "bairro": "Centro",
            "cidade": "Vitória",
            "protocolo": "P-1001"
        }),
        json!({
            "id": "9002",
            "data_agendada": format!("{} 14:00:00", day(0)),
            "status": "EX",
            "id_assunto": "17",
            "id_filial": "1",
            "cliente": "Seu José",
            "data_abertura": format!("{} 08:00:00", day(0))
        }),
        json!({
            "id": "9003",
            "data_agendada": format!("{} 10:00:00", day(2)),
            "status": "RAG",
            "id_assunto": "31",
            "id_filial": "2",
            "cliente": "Padaria Estrela"
        }),
        json!({
            "id": "9004",
            "data_agendada": format!("{} 11:00:00", day(1)),
            "status": "F",
            "id_assunto": "17",
            "id_filial": "2",
            "data_fechamento": format!("{} 12:30:00", day(0))
        }),
    ]
}
