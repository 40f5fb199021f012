// ==========================================
// 现场服务运营调度系统 - 周agenda查询控制器
// ==========================================
// 职责: 周期解析 → 取数 → 筛选 → 聚合 → 产出 ScheduleView
// 状态机: Idle → Loading → {Ready | Failed}
// 红线: 参数变更即刻取代在飞请求（last request wins），
//       迟到的过期结果只能丢弃，绝不覆盖更新的状态；
//       Failed 保留上一幅视图，绝不清屏
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::filter_api::FilterApi;
use crate::config::settings_store::SettingsStore;
use crate::datasource::cache::QueryCache;
use crate::datasource::normalize::OrderNormalizer;
use crate::datasource::source::{WorkOrderQuery, WorkOrderSource};
use crate::domain::filter::FilterDefinition;
use crate::domain::schedule::{DashboardSummary, ScheduleView};
use crate::domain::settings::AppSettings;
use crate::domain::types::MaintenanceTab;
use crate::domain::work_order::WorkOrder;
use crate::engine::aggregator::ScheduleAggregator;
use crate::engine::criteria::CriteriaEvaluator;
use crate::engine::maintenance::MaintenanceBoard;
use crate::engine::period::{PeriodResolver, PeriodSelection};
use crate::engine::summary::SummaryEngine;
use chrono::NaiveDate;
use futures::future::{AbortHandle, Abortable, Aborted};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, instrument, warn};

// ==========================================
// QueryState - 查询状态机
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryState {
    Idle,
    Loading,
    Ready,
    Failed,
}

// ==========================================
// QueryParams - 一次查询的参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub selection: PeriodSelection,
    pub branch_id: Option<String>,
}

// ==========================================
// QueryOutcome - 提交结果
// ==========================================
// Superseded 是取消语义的正常出口：调用方直接忽略即可，
// 新参数的那次提交会带来新视图
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Applied(ScheduleView),
    Superseded,
}

/// 控制器内部可变状态
struct ControllerState {
    phase: QueryState,
    /// 界面当前已选起始日（命名周期 7d/14d/30d 保持它不变）
    current_start: Option<NaiveDate>,
    /// 内联筛选定义；选中保存筛选器期间仍然保留，
    /// 取消选中时回退到它
    inline_definition: FilterDefinition,
    /// 当前选中的保存筛选器；显式选中永远压过内联定义
    saved_filter_id: Option<String>,
    /// 上一次提交的参数（显式重试用）
    last_params: Option<QueryParams>,
    /// 最近一幅成功视图（Failed 期间仍保留在屏）
    last_view: Option<ScheduleView>,
    last_error: Option<String>,
    /// 在飞请求的中止句柄
    abort: Option<AbortHandle>,
}

// ==========================================
// ScheduleQueryController - 周agenda查询控制器
// ==========================================
pub struct ScheduleQueryController {
    source: Arc<dyn WorkOrderSource>,
    filter_api: Arc<FilterApi>,
    settings_store: Arc<SettingsStore>,
    cache: Option<Arc<QueryCache>>,
    resolver: PeriodResolver,
    evaluator: CriteriaEvaluator,
    aggregator: ScheduleAggregator,
    summary_engine: SummaryEngine,
    board: MaintenanceBoard,
    /// 请求代号发生器；响应只在代号仍是最新时才允许落地
    generation: AtomicU64,
    state: Mutex<ControllerState>,
}

impl ScheduleQueryController {
    pub fn new(
        source: Arc<dyn WorkOrderSource>,
        filter_api: Arc<FilterApi>,
        settings_store: Arc<SettingsStore>,
    ) -> Self {
        Self {
            source,
            filter_api,
            settings_store,
            cache: None,
            resolver: PeriodResolver::new(),
            evaluator: CriteriaEvaluator::new(),
            aggregator: ScheduleAggregator::new(),
            summary_engine: SummaryEngine::new(),
            board: MaintenanceBoard::new(),
            generation: AtomicU64::new(0),
            state: Mutex::new(ControllerState {
                phase: QueryState::Idle,
                current_start: None,
                inline_definition: FilterDefinition::default(),
                saved_filter_id: None,
                last_params: None,
                last_view: None,
                last_error: None,
                abort: None,
            }),
        }
    }

    /// 注入查询缓存协作者
    pub fn with_cache(mut self, cache: Arc<QueryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    // ==========================================
    // 筛选器选择
    // ==========================================

    /// 选中/取消选中保存的筛选器
    ///
    /// 取消选中（None）回退到保留着的内联定义
    pub fn select_saved_filter(&self, filter_id: Option<String>) -> ApiResult<()> {
        let mut st = self.lock_state()?;
        st.saved_filter_id = filter_id;
        Ok(())
    }

    /// 改写内联筛选定义（选中保存筛选器期间也会保留）
    pub fn set_inline_definition(&self, definition: FilterDefinition) -> ApiResult<()> {
        let mut st = self.lock_state()?;
        st.inline_definition = definition;
        Ok(())
    }

    /// 解析当前激活定义：保存的筛选器优先，其次内联定义
    ///
    /// # 失败
    /// - NotFound: 选中的筛选器已不存在
    pub fn active_definition(&self) -> ApiResult<FilterDefinition> {
        let (saved_id, inline) = {
            let st = self.lock_state()?;
            (st.saved_filter_id.clone(), st.inline_definition.clone())
        };
        match saved_id {
            Some(id) => {
                let filter = self
                    .filter_api
                    .get(&id)?
                    .ok_or_else(|| ApiError::NotFound(format!("SavedFilter id={id}")))?;
                Ok(filter.definition)
            }
            None => Ok(inline),
        }
    }

    // ==========================================
    // 状态访问
    // ==========================================

    pub fn phase(&self) -> ApiResult<QueryState> {
        Ok(self.lock_state()?.phase)
    }

    /// 最近一幅成功视图（Failed 期间仍可取到）
    pub fn last_view(&self) -> ApiResult<Option<ScheduleView>> {
        Ok(self.lock_state()?.last_view.clone())
    }

    pub fn last_error(&self) -> ApiResult<Option<String>> {
        Ok(self.lock_state()?.last_error.clone())
    }

    // ==========================================
    // 查询提交
    // ==========================================

    /// 线上参数入口：起始日期字符串在这里校验
    ///
    /// 非法日期 → InvalidInput，就地拦截、无任何副作用
    /// （不改状态机、不发请求）
    pub async fn submit_raw(
        &self,
        start_raw: Option<&str>,
        days: u32,
        branch_id: Option<String>,
        today: NaiveDate,
    ) -> ApiResult<QueryOutcome> {
        let fallback = {
            let st = self.lock_state()?;
            st.current_start.unwrap_or(today)
        };
        let start = self.resolver.parse_start(start_raw, fallback)?;
        self.submit(
            QueryParams {
                selection: PeriodSelection::Explicit { start, days },
                branch_id,
            },
            today,
        )
        .await
    }

    /// 提交查询（参数变更即刻取代在飞请求）
    #[instrument(skip_all, fields(today = %today))]
    pub async fn submit(&self, params: QueryParams, today: NaiveDate) -> ApiResult<QueryOutcome> {
        match self.run_query(params, today).await {
            Ok(view) => Ok(QueryOutcome::Applied(view)),
            // 取消不是故障：内部信号到此为止，不再外传
            Err(ApiError::StaleResultDiscarded) => {
                debug!("过期结果已丢弃");
                Ok(QueryOutcome::Superseded)
            }
            Err(err) => Err(err),
        }
    }

    /// 显式重试：按上一次参数原样重新提交
    ///
    /// 失败不自动重试是刻意口径——Failed 停在原地等用户动作
    pub async fn retry(&self, today: NaiveDate) -> ApiResult<QueryOutcome> {
        let params = {
            let st = self.lock_state()?;
            st.last_params.clone()
        };
        match params {
            Some(params) => self.submit(params, today).await,
            None => Err(ApiError::InvalidInput("无可重试的查询".to_string())),
        }
    }

    /// 查询主流程
    ///
    /// 返回 Err(StaleResultDiscarded) 表示本次请求已被更新的
    /// 参数取代（上层转成 QueryOutcome::Superseded）
    async fn run_query(&self, params: QueryParams, today: NaiveDate) -> ApiResult<ScheduleView> {
        // 领取代号：此刻起任何更新的提交都会使本次过期
        let my_gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // 配置与激活定义解析（失败按本次查询失败处理）
        let settings = match self.settings_store.load() {
            Ok(settings) => settings,
            Err(err) => return self.fail_if_current(my_gen, err.into()),
        };
        let definition = match self.active_definition() {
            Ok(definition) => definition,
            Err(err) => return self.fail_if_current(my_gen, err),
        };

        // 取代上一个在飞请求，进入 Loading
        let (period, saved_id) = {
            let mut st = self.lock_state()?;
            if let Some(handle) = st.abort.take() {
                handle.abort();
            }
            let current_start = st.current_start.unwrap_or(today);
            let period = self.resolver.resolve(params.selection, current_start, today);
            st.phase = QueryState::Loading;
            st.last_params = Some(params.clone());
            (period, st.saved_filter_id.clone())
        };

        let query = WorkOrderQuery {
            start: period.start,
            end: period.end(),
            branch_id: params.branch_id.clone(),
            filter_id: saved_id.clone(),
            filter_json: if saved_id.is_some() {
                None
            } else {
                Some(definition.to_canonical_json())
            },
        };

        // 取数：缓存命中则跳过网络；未命中走可中止的 fetch
        let orders = match self.cached_orders(&query) {
            Some(orders) => orders,
            None => {
                let (handle, registration) = AbortHandle::new_pair();
                {
                    let mut st = self.lock_state()?;
                    st.abort = Some(handle);
                }
                let fetch = Abortable::new(self.source.fetch_orders(&query), registration);
                match fetch.await {
                    Err(Aborted) => return Err(ApiError::StaleResultDiscarded),
                    Ok(Err(transport)) => {
                        return self.fail_if_current(my_gen, transport.into());
                    }
                    Ok(Ok(raw)) => {
                        let normalizer = OrderNormalizer::new(settings.subject_groups.clone());
                        let orders = normalizer.normalize_response(&raw);
                        if let Some(cache) = &self.cache {
                            cache.put(&query.cache_key(), orders.clone());
                        }
                        orders
                    }
                }
            }
        };

        // 本地重过滤（与后端翻译同一结构化定义，口径必然一致）
        let matched: Vec<WorkOrder> = orders
            .into_iter()
            .filter(|order| self.evaluator.matches(&definition, order))
            .collect();
        let view = self.aggregator.aggregate(
            &matched,
            period,
            &settings.agenda_capacity,
            params.branch_id.as_deref(),
        );

        // 落地：仅当代号仍是最新（last request wins）
        let mut st = self.lock_state()?;
        if self.generation.load(Ordering::SeqCst) != my_gen {
            return Err(ApiError::StaleResultDiscarded);
        }
        st.phase = QueryState::Ready;
        st.current_start = Some(period.start);
        st.last_view = Some(view.clone());
        st.last_error = None;
        st.abort = None;
        Ok(view)
    }

    // ==========================================
    // 派生查询（汇总/维护看板）
    // ==========================================

    /// 驾驶舱头部指标
    ///
    /// 只读旁路：不参与 agenda 状态机，可走查询缓存
    pub async fn summary(&self, params: QueryParams, today: NaiveDate) -> ApiResult<DashboardSummary> {
        let settings = self.settings_store.load()?;
        let definition = self.active_definition()?;
        let current_start = {
            let st = self.lock_state()?;
            st.current_start.unwrap_or(today)
        };
        let period = self.resolver.resolve(params.selection, current_start, today);

        let query = WorkOrderQuery {
            start: period.start,
            end: period.end(),
            branch_id: params.branch_id.clone(),
            filter_id: None,
            filter_json: Some(definition.to_canonical_json()),
        };
        let orders = self.fetch_normalized(&query, &settings).await?;
        let matched: Vec<WorkOrder> = orders
            .into_iter()
            .filter(|order| self.evaluator.matches(&definition, order))
            .collect();
        Ok(self.summary_engine.build(&matched, period, today))
    }

    /// 维护看板列表（页签 × 日期窗口 × 激活筛选）
    pub async fn maintenances(
        &self,
        tab: MaintenanceTab,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
    ) -> ApiResult<Vec<WorkOrder>> {
        let settings = self.settings_store.load()?;
        let definition = self.active_definition()?;
        let window = self.resolver.resolve_maintenance_window(from, to, today);

        let query = WorkOrderQuery {
            start: window.0,
            end: window.1,
            branch_id: None,
            filter_id: None,
            filter_json: Some(definition.to_canonical_json()),
        };
        let orders = self.fetch_normalized(&query, &settings).await?;
        Ok(self.board.list(&orders, tab, window, &definition))
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn cached_orders(&self, query: &WorkOrderQuery) -> Option<Vec<WorkOrder>> {
        self.cache.as_ref()?.get(&query.cache_key())
    }

    /// 旁路取数（不挂状态机、不可取消）
    async fn fetch_normalized(
        &self,
        query: &WorkOrderQuery,
        settings: &AppSettings,
    ) -> ApiResult<Vec<WorkOrder>> {
        if let Some(hit) = self.cached_orders(query) {
            return Ok(hit);
        }
        let raw = self.source.fetch_orders(query).await?;
        let normalizer = OrderNormalizer::new(settings.subject_groups.clone());
        let orders = normalizer.normalize_response(&raw);
        if let Some(cache) = &self.cache {
            cache.put(&query.cache_key(), orders.clone());
        }
        Ok(orders)
    }

    /// 本次查询失败：仅当代号仍是最新才落 Failed
    ///
    /// 上一幅视图保留不动（绝不清屏）；已被取代的失败
    /// 不再打扰用户
    fn fail_if_current(&self, my_gen: u64, err: ApiError) -> ApiResult<ScheduleView> {
        let mut st = self.lock_state()?;
        if self.generation.load(Ordering::SeqCst) != my_gen {
            return Err(ApiError::StaleResultDiscarded);
        }
        warn!(error = %err, "查询失败");
        st.phase = QueryState::Failed;
        st.last_error = Some(err.to_string());
        st.abort = None;
        Err(err)
    }

    fn lock_state(&self) -> ApiResult<MutexGuard<'_, ControllerState>> {
        self.state
            .lock()
            .map_err(|e| ApiError::Internal(format!("状态锁获取失败: {e}")))
    }
}
