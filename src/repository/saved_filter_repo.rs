// ==========================================
// 现场服务运营调度系统 - 保存筛选器仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 已知局限: 两个会话并发编辑同一筛选器时后写覆盖先写，
//           本核心不做合并（与后端口径一致）
// ==========================================

use crate::db::configure_sqlite_connection;
use crate::domain::filter::{FilterDefinition, SavedFilter};
use crate::domain::types::FilterScope;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

// ==========================================
// SavedFilterRepository - 保存筛选器仓储
// ==========================================

/// 保存筛选器仓储
/// 职责: 管理 saved_filter 表的CRUD操作
pub struct SavedFilterRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SavedFilterRepository {
    /// 创建新的仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_and_prepare(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            crate::db::ensure_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按场景列出筛选器
    ///
    /// 排序: created_at 降序（最近保存的在前），id 兜底保证稳定
    pub fn list(&self, scope: FilterScope) -> RepositoryResult<Vec<SavedFilter>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, scope, definition_json, created_at
            FROM saved_filter
            WHERE scope = ?1
            ORDER BY created_at DESC, id
            "#,
        )?;

        let filters = stmt
            .query_map(params![scope.as_str()], row_to_saved_filter)?
            .collect::<Result<Vec<_>, _>>()?;

        // 行内 scope/JSON 解析失败在映射层报错，正常路径直接返回
        filters.into_iter().collect()
    }

    /// 按ID查询单个筛选器
    pub fn get(&self, id: &str) -> RepositoryResult<Option<SavedFilter>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, scope, definition_json, created_at
            FROM saved_filter
            WHERE id = ?1
            "#,
        )?;

        let row = stmt.query_row(params![id], row_to_saved_filter).optional()?;
        row.transpose()
    }

    /// 创建筛选器
    ///
    /// # 失败
    /// - ValidationError: name 为空白
    pub fn create(
        &self,
        name: &str,
        scope: FilterScope,
        definition: &FilterDefinition,
    ) -> RepositoryResult<SavedFilter> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::ValidationError(
                "筛选器名称不能为空".to_string(),
            ));
        }

        let filter = SavedFilter {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            scope,
            definition: definition.clone(),
            created_at: Utc::now(),
        };

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO saved_filter (id, name, scope, definition_json, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                filter.id,
                filter.name,
                filter.scope.as_str(),
                serde_json::to_string(&filter.definition)?,
                filter.created_at.to_rfc3339(),
            ],
        )?;
        debug!(id = %filter.id, scope = %scope, "创建筛选器");

        Ok(filter)
    }

    /// 更新筛选器（整体替换 name/scope/definition）
    ///
    /// 约束: id 与 created_at 保持不变
    ///
    /// # 失败
    /// - ValidationError: name 为空白
    /// - NotFound: id 不存在
    pub fn update(
        &self,
        id: &str,
        name: &str,
        scope: FilterScope,
        definition: &FilterDefinition,
    ) -> RepositoryResult<SavedFilter> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::ValidationError(
                "筛选器名称不能为空".to_string(),
            ));
        }

        {
            let conn = self.get_conn()?;
            let changed = conn.execute(
                r#"
                UPDATE saved_filter
                SET name = ?2, scope = ?3, definition_json = ?4
                WHERE id = ?1
                "#,
                params![id, name, scope.as_str(), serde_json::to_string(definition)?],
            )?;
            if changed == 0 {
                return Err(RepositoryError::NotFound {
                    entity: "SavedFilter".to_string(),
                    id: id.to_string(),
                });
            }
        }

        // 回读以带回原 created_at
        self.get(id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "SavedFilter".to_string(),
            id: id.to_string(),
        })
    }

    /// 删除筛选器（幂等：不存在的 id 视为已删除）
    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let removed = conn.execute("DELETE FROM saved_filter WHERE id = ?1", params![id])?;
        if removed == 0 {
            debug!(id, "删除筛选器: id 不存在，按已删除处理");
        }
        Ok(())
    }
}

/// 行 → SavedFilter 映射
///
/// scope/定义 JSON 损坏属于数据质量问题，映射为仓储错误而不是 panic
fn row_to_saved_filter(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<SavedFilter>> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let scope_raw: String = row.get(2)?;
    let definition_raw: String = row.get(3)?;
    let created_raw: String = row.get(4)?;

    Ok(build_saved_filter(
        id,
        name,
        &scope_raw,
        &definition_raw,
        &created_raw,
    ))
}

fn build_saved_filter(
    id: String,
    name: String,
    scope_raw: &str,
    definition_raw: &str,
    created_raw: &str,
) -> RepositoryResult<SavedFilter> {
    let scope = FilterScope::parse(scope_raw).ok_or_else(|| {
        RepositoryError::ValidationError(format!("未知的筛选器场景: {scope_raw}"))
    })?;
    let definition = FilterDefinition::from_json_str(definition_raw)?;
    let created_at = DateTime::parse_from_rfc3339(created_raw)
        .map_err(|e| RepositoryError::ValidationError(format!("created_at 解析失败: {e}")))?
        .with_timezone(&Utc);

    Ok(SavedFilter {
        id,
        name,
        scope,
        definition,
        created_at,
    })
}
