// ==========================================
// 现场服务运营调度系统 - 应用配置存储
// ==========================================
// 职责: AppSettings 的加载/保存
// 存储: config_kv 表 (scope_id='global', key='app_settings')
// 口径: 读取时一律过 merge_defaults 规范化；库里的
//       payload 落后于默认结构时就地补齐
// ==========================================

use crate::db::configure_sqlite_connection;
use crate::domain::settings::AppSettings;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// 配置键
const SETTINGS_KEY: &str = "app_settings";
/// 全局作用域
const GLOBAL_SCOPE: &str = "global";

// ==========================================
// SettingsStore - 应用配置存储
// ==========================================
pub struct SettingsStore {
    conn: Arc<Mutex<Connection>>,
}

impl SettingsStore {
    /// 创建新的配置存储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_and_prepare(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（对传入连接补应用统一 PRAGMA，幂等）
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

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 加载配置
    ///
    /// - 无记录: 写入默认配置并返回
    /// - 有记录: merge_defaults 规范化；与库内不一致则回写
    pub fn load(&self) -> RepositoryResult<AppSettings> {
        let raw = self.read_raw()?;
        match raw {
            None => {
                let defaults = AppSettings::default();
                self.write(&defaults)?;
                debug!("配置不存在，写入默认配置");
                Ok(defaults)
            }
            Some(raw) => {
                let parsed: Value = serde_json::from_str(&raw)?;
                let merged = AppSettings::merge_defaults(&parsed);
                let canonical = serde_json::to_string(&merged)?;
                if canonical != raw {
                    self.write(&merged)?;
                    debug!("配置结构落后，已就地补齐");
                }
                Ok(merged)
            }
        }
    }

    /// 更新配置（外部 payload 先规范化再落库）
    pub fn update(&self, payload: &Value) -> RepositoryResult<AppSettings> {
        let normalized = AppSettings::merge_defaults(payload);
        self.write(&normalized)?;
        Ok(normalized)
    }

    fn read_raw(&self) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, SETTINGS_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, settings: &AppSettings) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (scope_id, key) DO UPDATE SET value = excluded.value
            "#,
            params![GLOBAL_SCOPE, SETTINGS_KEY, serde_json::to_string(settings)?],
        )?;
        Ok(())
    }
}
