//! src/lib.rs
//!
//! 武器基质刷取方案推荐。
//! 读取武器词条表与副本掉落表，为选定武器穷举定向刷取方式，
//! 选出能顺带满足最多其他武器需求的方案。

pub mod calculator;
pub mod config;
pub mod error;
pub mod favorites;
pub mod index;
pub mod manager;
pub mod models;
pub mod store;
pub mod utils;

pub use error::{ConfigError, DataError, FavoritesError, PlanError};
pub use favorites::{FavoritePlan, FavoritesStore};
pub use manager::DataManager;
pub use models::{
    AppConfig, DropTuple, DungeonRecord, FarmingPlan, LockAxis, PlannerOptions, SourceEncoding, WeaponRecord,
};
pub use store::GameData;
