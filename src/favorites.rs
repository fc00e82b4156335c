//! src/favorites.rs
//!
//! 收藏的刷取方案，保存为 JSON 文件。

use crate::error::FavoritesError;
use crate::models::{FarmingPlan, LockAxis};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoritePlan {
    pub weapon_name: String,
    pub dungeon: String,
    pub strategy: LockAxis,
    pub fixed_val: String,
    /// Unix 毫秒时间戳。
    pub timestamp: i64,
}

impl FavoritePlan {
    fn same_plan(&self, weapon_name: &str, plan: &FarmingPlan) -> bool {
        self.weapon_name == weapon_name
            && self.dungeon == plan.dungeon
            && self.strategy == plan.strategy
            && self.fixed_val == plan.fixed_val
    }
}

#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    items: Vec<FavoritePlan>,
}

impl FavoritesStore {
    /// 文件不存在时为空列表；内容损坏时记录警告并从空列表开始。
    pub fn load(path: &Path) -> Result<Self, FavoritesError> {
        let items = match fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "收藏文件无法解析，已忽略");
                Vec::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(FavoritesError::Io { path: path.display().to_string(), source }),
        };
        Ok(FavoritesStore { path: path.to_path_buf(), items })
    }

    /// 最近收藏的在前。
    pub fn list(&self) -> &[FavoritePlan] {
        &self.items
    }

    pub fn is_favorite(&self, weapon_name: &str, plan: &FarmingPlan) -> bool {
        self.items.iter().any(|f| f.same_plan(weapon_name, plan))
    }

    /// 已收藏时不重复添加，返回是否新增。
    pub fn add(&mut self, weapon_name: &str, plan: &FarmingPlan) -> Result<bool, FavoritesError> {
        if self.is_favorite(weapon_name, plan) {
            return Ok(false);
        }
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.push(FavoritePlan {
            weapon_name: weapon_name.to_string(),
            dungeon: plan.dungeon.clone(),
            strategy: plan.strategy,
            fixed_val: plan.fixed_val.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
        items.extend(self.items.iter().cloned());
        self.commit(items)?;
        Ok(true)
    }

    /// 返回是否确实删除了条目。
    pub fn remove(&mut self, weapon_name: &str, plan: &FarmingPlan) -> Result<bool, FavoritesError> {
        if !self.is_favorite(weapon_name, plan) {
            return Ok(false);
        }
        let items = self.items.iter().filter(|f| !f.same_plan(weapon_name, plan)).cloned().collect();
        self.commit(items)?;
        Ok(true)
    }

    /// 写入成功后才替换内存中的列表，失败时保持原状。
    fn commit(&mut self, items: Vec<FavoritePlan>) -> Result<(), FavoritesError> {
        let text = serde_json::to_string_pretty(&items)?;
        fs::write(&self.path, text)
            .map_err(|source| FavoritesError::Io { path: self.path.display().to_string(), source })?;
        self.items = items;
        Ok(())
    }
}
