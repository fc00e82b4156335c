//! src/config.rs
//!
//! 负责加载和解析配置文件。
//! 它的主要职责是将用户提供的、人类可读的配置 (UserConfigRaw)
//! 转换为程序内部使用的配置 (AppConfig)，并据此加载参考数据。

use crate::error::ConfigError;
use crate::manager::DataManager;
use crate::models::{AppConfig, LockAxis, PlannerOptions, SourceEncoding, UserConfigRaw};
use itertools::Itertools;
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件位于项目根目录。
pub fn default_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config.json")
}

pub fn load_and_build_config(config_path: &Path) -> Result<(AppConfig, DataManager), ConfigError> {
    let text = fs::read_to_string(config_path)
        .map_err(|source| ConfigError::Io { path: config_path.display().to_string(), source })?;
    let raw_config: UserConfigRaw = serde_json::from_str(&text)?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let app_config = build_app_config(&raw_config, base_dir)?;
    let manager = DataManager::load(&app_config)?;

    Ok((app_config, manager))
}

/// 相对路径以配置文件所在目录为基准。
pub fn build_app_config(raw_config: &UserConfigRaw, base_dir: &Path) -> Result<AppConfig, ConfigError> {
    let resolve = |p: &str| {
        let path = PathBuf::from(p);
        if path.is_absolute() { path } else { base_dir.join(path) }
    };

    let encoding = SourceEncoding::from_label(&raw_config.encoding)
        .ok_or_else(|| ConfigError::InvalidValue { field: "encoding", value: raw_config.encoding.clone() })?;

    let lock_axes = raw_config
        .lock_axes
        .iter()
        .map(|label| {
            LockAxis::from_label(label)
                .ok_or_else(|| ConfigError::InvalidValue { field: "lock_axes", value: label.clone() })
        })
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .unique()
        .collect::<Vec<_>>();
    if lock_axes.is_empty() {
        return Err(ConfigError::InvalidValue { field: "lock_axes", value: "[]".to_string() });
    }

    Ok(AppConfig {
        weapon_csv: resolve(&raw_config.weapon_csv),
        dungeon_csv: resolve(&raw_config.dungeon_csv),
        encoding,
        planner: PlannerOptions { lock_axes, extra_mains: raw_config.extra_mains },
        favorites_path: resolve(&raw_config.favorites_path),
    })
}
