// ==========================================
// 现场服务运营调度系统 - 保存筛选器 API
// ==========================================
// 职责: 筛选器 CRUD 封装 + 场景级本地缓存 + 定义解析
// 红线: 每次成功变更后必须刷新对应场景的本地缓存，
//       列表/默认选中绝不允许读到陈旧数据
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::filter::{FilterDefinition, SavedFilter};
use crate::domain::settings::AppSettings;
use crate::domain::types::FilterScope;
use crate::repository::saved_filter_repo::SavedFilterRepository;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

// ==========================================
// FilterApi - 保存筛选器 API
// ==========================================
pub struct FilterApi {
    repo: Arc<SavedFilterRepository>,
    /// 场景 → 列表缓存（变更后整场景刷新）
    cache: Mutex<HashMap<FilterScope, Vec<SavedFilter>>>,
}

impl FilterApi {
    pub fn new(repo: Arc<SavedFilterRepository>) -> Self {
        Self {
            repo,
            cache: Mutex::new(HashMap::new()),
        }
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按场景列出筛选器（优先走缓存）
    pub fn list(&self, scope: FilterScope) -> ApiResult<Vec<SavedFilter>> {
        if let Ok(cache) = self.cache.lock() {
            if let Some(cached) = cache.get(&scope) {
                return Ok(cached.clone());
            }
        }
        self.refresh_scope(scope)
    }

    /// 按ID取单个筛选器
    pub fn get(&self, id: &str) -> ApiResult<Option<SavedFilter>> {
        Ok(self.repo.get(id)?)
    }

    /// 解析激活定义（与后端查询接口同口径）
    ///
    /// 优先级: 内联 JSON > 筛选器ID > 空约束
    ///
    /// # 失败
    /// - InvalidInput: 内联 JSON 无法解析
    /// - NotFound: 筛选器ID不存在
    pub fn resolve_definition(
        &self,
        filter_id: Option<&str>,
        filter_json: Option<&str>,
    ) -> ApiResult<FilterDefinition> {
        if let Some(raw) = filter_json {
            return Ok(FilterDefinition::from_json_str(raw)?);
        }
        if let Some(id) = filter_id {
            let filter = self
                .repo
                .get(id)?
                .ok_or_else(|| ApiError::NotFound(format!("SavedFilter id={id}")))?;
            return Ok(filter.definition);
        }
        Ok(FilterDefinition::default())
    }

    /// 解析场景默认筛选器
    ///
    /// 配置指向的筛选器已被删除时按"无默认"处理（只告警）
    pub fn default_for_scope(
        &self,
        settings: &AppSettings,
        scope: FilterScope,
    ) -> ApiResult<Option<SavedFilter>> {
        let Some(id) = settings.default_filters.for_scope(scope) else {
            return Ok(None);
        };
        let resolved = self.repo.get(id)?;
        if resolved.is_none() {
            warn!(id, scope = %scope, "默认筛选器已不存在，按无默认处理");
        }
        Ok(resolved)
    }

    // ==========================================
    // 变更（成功后刷新场景缓存）
    // ==========================================

    /// 创建筛选器
    pub fn create(
        &self,
        name: &str,
        scope: FilterScope,
        definition: &FilterDefinition,
    ) -> ApiResult<SavedFilter> {
        let created = self.repo.create(name, scope, definition)?;
        self.refresh_scope(scope)?;
        info!(id = %created.id, scope = %scope, "筛选器已创建");
        Ok(created)
    }

    /// 更新筛选器（整体替换；id 与 created_at 不变）
    pub fn update(
        &self,
        id: &str,
        name: &str,
        scope: FilterScope,
        definition: &FilterDefinition,
    ) -> ApiResult<SavedFilter> {
        let before_scope = self.repo.get(id)?.map(|f| f.scope);
        let updated = self.repo.update(id, name, scope, definition)?;
        // scope 变更会影响两个场景的列表
        if let Some(before) = before_scope {
            if before != scope {
                self.refresh_scope(before)?;
            }
        }
        self.refresh_scope(scope)?;
        info!(id, scope = %scope, "筛选器已更新");
        Ok(updated)
    }

    /// 删除筛选器（幂等）
    pub fn delete(&self, id: &str) -> ApiResult<()> {
        let scope = self.repo.get(id)?.map(|f| f.scope);
        self.repo.delete(id)?;
        match scope {
            Some(scope) => {
                self.refresh_scope(scope)?;
                info!(id, "筛选器已删除");
            }
            None => {
                // 本来就不存在：无缓存可刷
            }
        }
        Ok(())
    }

    /// 整场景重读并回填缓存
    fn refresh_scope(&self, scope: FilterScope) -> ApiResult<Vec<SavedFilter>> {
        let fresh = self.repo.list(scope)?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(scope, fresh.clone());
        }
        Ok(fresh)
    }
}
