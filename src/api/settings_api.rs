// ==========================================
// 现场服务运营调度系统 - 应用配置 API
// ==========================================
// 职责: 配置读取/更新的薄封装
// ==========================================

use crate::api::error::ApiResult;
use crate::config::settings_store::SettingsStore;
use crate::domain::settings::AppSettings;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

// ==========================================
// SettingsApi - 应用配置 API
// ==========================================
pub struct SettingsApi {
    store: Arc<SettingsStore>,
}

impl SettingsApi {
    pub fn new(store: Arc<SettingsStore>) -> Self {
        Self { store }
    }

    /// 读取配置（含规范化/缺省补齐）
    pub fn get(&self) -> ApiResult<AppSettings> {
        Ok(self.store.load()?)
    }

    /// 更新配置（payload 先规范化再落库）
    pub fn update(&self, payload: &Value) -> ApiResult<AppSettings> {
        let updated = self.store.update(payload)?;
        info!("应用配置已更新");
        Ok(updated)
    }
}
