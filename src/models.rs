//! src/models.rs
//!
//! 定义了程序中所有核心的数据结构。

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use crate::utils;

/// 武器词条表中的一行，按名称唯一。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeaponRecord {
    pub name: String,
    /// 原始稀有度标签，例如 "5星"。
    pub rarity: String,
    #[serde(rename = "type")]
    pub weapon_type: String,
    /// 可接受的主词条候选（"3选1" 时为三个候选，任意一个即可）。
    pub main_stat: Vec<String>,
    pub sub_stat: Vec<String>,
    pub skill: String,
    /// 表格中的原始主词条文本，仅用于展示。
    pub main_stat_label: String,
    pub sub_stat_label: String,
}

impl WeaponRecord {
    /// 主词条无法解析的武器不参与评分，但仍然出现在列表中。
    pub fn is_eligible(&self) -> bool {
        !self.main_stat.is_empty()
    }

    /// 一个掉落组合能否满足该武器的词条需求。
    pub fn accepts(&self, tuple: &DropTuple) -> bool {
        self.main_stat.iter().any(|m| *m == tuple.main) && self.sub_stat.iter().any(|s| *s == tuple.sub)
    }

    pub fn rarity_tier(&self) -> Option<u8> {
        utils::parse_rarity_tier(&self.rarity)
    }

    /// 列表中使用的展示文本，例如 "5★长剑"。
    pub fn display_label(&self) -> String {
        format!("{}★{}", utils::strip_rarity_suffix(&self.rarity), self.name)
    }
}

/// 一次定向刷取可能产出的 (主词条, 副词条, 技能/部位) 组合。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DropTuple {
    pub main: String,
    pub sub: String,
    pub slot: String,
}

impl DropTuple {
    pub fn new(main: impl Into<String>, sub: impl Into<String>, slot: impl Into<String>) -> Self {
        DropTuple { main: main.into(), sub: sub.into(), slot: slot.into() }
    }

    /// 按锁定维度取值。
    pub fn axis_value(&self, axis: LockAxis) -> &str {
        match axis {
            LockAxis::Slot => &self.slot,
            LockAxis::Sub => &self.sub,
        }
    }
}

impl fmt::Display for DropTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.main, self.sub, self.slot)
    }
}

/// 代表一个副本及其完整的掉落组合表。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DungeonRecord {
    pub name: String,
    pub drops: Vec<DropTuple>,
}

impl DungeonRecord {
    pub fn offers_any_main(&self, mains: &[String]) -> bool {
        self.drops.iter().any(|t| mains.contains(&t.main))
    }
}

/// 定向时可以锁定的维度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LockAxis {
    /// 锁定技能/部位。排序在前，是默认的定向方式。
    #[serde(rename = "技能")]
    Slot,
    #[serde(rename = "副词条")]
    Sub,
}

impl LockAxis {
    pub fn label(self) -> &'static str {
        match self {
            LockAxis::Slot => "技能",
            LockAxis::Sub => "副词条",
        }
    }

    pub fn from_label(label: &str) -> Option<LockAxis> {
        match label.trim() {
            "技能" | "部位" | "slot" | "skill" => Some(LockAxis::Slot),
            "副词条" | "sub" | "sub_stat" => Some(LockAxis::Sub),
            _ => None,
        }
    }
}

impl fmt::Display for LockAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 为某把武器计算出的刷取方案。每次查询重新构造，返回后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FarmingPlan {
    pub weapon: String,
    pub dungeon: String,
    pub strategy: LockAxis,
    pub fixed_val: String,
    /// 目标武器可接受、并且在该定向下确实可能产出的主词条。
    pub selected_mains: Vec<String>,
    /// 额外定向的非目标主词条（extra_mains 为 0 时为空）。
    pub extra_mains: Vec<String>,
    #[serde(serialize_with = "serialize_by_products")]
    pub by_products: BTreeMap<DropTuple, BTreeSet<String>>,
    pub score: usize,
}

impl FarmingPlan {
    /// 所有副产物覆盖到的其他武器。
    pub fn covered(&self) -> BTreeSet<&str> {
        self.by_products.values().flatten().map(String::as_str).collect()
    }

    /// 按受益武器数量降序排列副产物，便于展示。
    pub fn by_products_for_display(&self) -> Vec<(&DropTuple, &BTreeSet<String>)> {
        let mut items: Vec<_> = self.by_products.iter().collect();
        items.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));
        items
    }
}

fn serialize_by_products<S: Serializer>(
    by_products: &BTreeMap<DropTuple, BTreeSet<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(by_products.len()))?;
    for (tuple, weapons) in by_products {
        map.serialize_entry(&tuple.to_string(), weapons)?;
    }
    map.end()
}

/// 数据文件的文本编码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceEncoding {
    #[default]
    Auto,
    Utf8,
    Gbk,
}

impl SourceEncoding {
    pub fn from_label(label: &str) -> Option<SourceEncoding> {
        match label.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Some(SourceEncoding::Auto),
            "utf-8" | "utf8" => Some(SourceEncoding::Utf8),
            "gbk" | "gb2312" | "gb18030" => Some(SourceEncoding::Gbk),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SourceEncoding::Auto => "auto",
            SourceEncoding::Utf8 => "utf-8",
            SourceEncoding::Gbk => "gbk",
        }
    }
}

/// 推荐器的可调参数。默认值对应只锁定技能、不额外定向主词条。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerOptions {
    pub lock_axes: Vec<LockAxis>,
    pub extra_mains: usize,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        PlannerOptions { lock_axes: vec![LockAxis::Slot], extra_mains: 0 }
    }
}

fn default_encoding() -> String { "auto".to_string() }
fn default_lock_axes() -> Vec<String> { vec!["技能".to_string()] }
fn default_favorites_path() -> String { "favorites.json".to_string() }

/// 代表从 config.json 加载的原始用户输入。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserConfigRaw {
    pub weapon_csv: String,
    pub dungeon_csv: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_lock_axes")]
    pub lock_axes: Vec<String>,
    #[serde(default)]
    pub extra_mains: usize,
    #[serde(default = "default_favorites_path")]
    pub favorites_path: String,
}

/// 解析后，供程序内部使用的最终配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub weapon_csv: PathBuf,
    pub dungeon_csv: PathBuf,
    pub encoding: SourceEncoding,
    pub planner: PlannerOptions,
    pub favorites_path: PathBuf,
}
