//! src/manager.rs
//!
//! 对外的查询入口：列出武器、查询详情、计算刷取方案。
//! 数据与倒排索引在构造时一次性建立，之后只读，可被多个调用方并发共享。

use crate::calculator;
use crate::error::{DataError, PlanError};
use crate::index::ByproductIndex;
use crate::models::{AppConfig, FarmingPlan, PlannerOptions, WeaponRecord};
use crate::store::GameData;
use crate::utils;
use tracing::warn;

#[derive(Debug)]
pub struct DataManager {
    data: GameData,
    index: ByproductIndex,
    options: PlannerOptions,
}

impl DataManager {
    /// 锁定维度为空时无法产生任何方案，退回默认维度。
    pub fn new(data: GameData, mut options: PlannerOptions) -> Self {
        if options.lock_axes.is_empty() {
            warn!("未指定锁定维度，使用默认的技能锁定");
            options.lock_axes = PlannerOptions::default().lock_axes;
        }
        let index = ByproductIndex::build(&data);
        DataManager { data, index, options }
    }

    /// 按配置加载数据文件并建立索引。
    pub fn load(config: &AppConfig) -> Result<Self, DataError> {
        let data = GameData::load(&config.weapon_csv, &config.dungeon_csv, config.encoding)?;
        Ok(Self::new(data, config.planner.clone()))
    }

    pub fn data(&self) -> &GameData {
        &self.data
    }

    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    pub fn list_weapon_names(&self) -> Vec<&str> {
        self.data.list_weapon_names()
    }

    /// 名称包含查询词的武器，保持列表顺序。
    pub fn search_weapons(&self, query: &str) -> Vec<&WeaponRecord> {
        self.data.weapons().iter().filter(|w| utils::matches_search(&w.name, query)).collect()
    }

    pub fn get_weapon_details(&self, name: &str) -> Option<&WeaponRecord> {
        self.data.get_weapon(name)
    }

    pub fn get_farming_plan(&self, name: &str) -> Result<FarmingPlan, PlanError> {
        calculator::get_farming_plan(&self.data, &self.index, &self.options, name)
    }

    pub fn rank_farming_plans(&self, name: &str) -> Result<Vec<FarmingPlan>, PlanError> {
        calculator::rank_farming_plans(&self.data, &self.index, &self.options, name)
    }

    pub fn plan_all(&self) -> Vec<(String, Result<FarmingPlan, PlanError>)> {
        calculator::plan_all(&self.data, &self.index, &self.options)
    }
}
