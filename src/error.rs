//! src/error.rs
//!
//! 加载期错误与查询期错误。
//! 加载期错误（DataError / ConfigError）会中止启动；
//! 查询期错误（PlanError）作为值返回，调用方据此展示提示信息。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("无法读取数据文件 {origin}: {source}")]
    Io {
        origin: String,
        #[source]
        source: std::io::Error,
    },
    #[error("数据文件 {origin} 无法按 {encoding} 解码")]
    Encoding { origin: String, encoding: &'static str },
    #[error("数据文件 {origin} 缺少表头行")]
    MissingHeader { origin: String },
    #[error("数据文件 {origin} 缺少必需列: {column}")]
    MissingColumn { origin: String, column: &'static str },
    #[error("解析 CSV 失败 {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },
}

impl DataError {
    pub fn kind(&self) -> &'static str {
        match self {
            DataError::Encoding { .. } => "EncodingError",
            _ => "DataLoadError",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("无法读取配置文件 {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("配置文件格式错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error("配置项 {field} 的取值无效: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error(transparent)]
    Data(#[from] DataError),
}

/// 单次方案查询的失败原因。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("未找到武器: {0}")]
    UnknownWeapon(String),
    #[error("武器 {0} 的主词条为空或无法解析")]
    IneligibleWeapon(String),
    #[error("没有任何副本掉落武器 {0} 所需的主词条")]
    NoCandidateDungeon(String),
}

impl PlanError {
    pub fn kind(&self) -> &'static str {
        match self {
            PlanError::UnknownWeapon(_) => "UnknownWeaponError",
            PlanError::IneligibleWeapon(_) => "IneligibleWeaponError",
            PlanError::NoCandidateDungeon(_) => "NoCandidateDungeonError",
        }
    }
}

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("无法读写收藏文件 {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("无法序列化收藏: {0}")]
    Json(#[from] serde_json::Error),
}
