//! src/store.rs
//!
//! 参考数据仓库：负责读取并规范化武器词条表和副本掉落表。
//! 构造完成后只读，不提供任何修改接口，
//! 推荐器可以放心地在其之上构建并复用倒排索引。

use crate::error::DataError;
use crate::models::{DropTuple, DungeonRecord, SourceEncoding, WeaponRecord};
use crate::utils::{self, cell, find_column, normalize_cell};
use csv::{ReaderBuilder, StringRecord};
use encoding_rs::GB18030;
use itertools::iproduct;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const NAME_COLUMN: &[&str] = &["名称", "name"];
const RARITY_COLUMN: &[&str] = &["稀有度", "rarity"];
const TYPE_COLUMN: &[&str] = &["种类", "type"];
const MAIN_COLUMN: &[&str] = &["主词条", "main_stat", "main"];
const SUB_COLUMN: &[&str] = &["副词条", "sub_stat", "sub"];
const SKILL_COLUMN: &[&str] = &["技能", "skill"];
const DUNGEON_COLUMN: &[&str] = &["副本", "dungeon", "dungeon_name"];
const SLOT_COLUMN: &[&str] = &["技能", "部位", "slot", "skill"];

/// 块状布局中每个副本数据块的表头。
const BLOCK_HEADER: &str = "主词条";

/// 所有已加载的参考数据。
#[derive(Debug, Clone, Default)]
pub struct GameData {
    weapons: Vec<WeaponRecord>,
    weapon_index: HashMap<String, usize>,
    dungeons: Vec<DungeonRecord>,
}

impl GameData {
    /// 从磁盘加载两张表。任一文件不可读、缺表头或缺必需列都会使整体加载失败。
    pub fn load(weapon_path: &Path, dungeon_path: &Path, encoding: SourceEncoding) -> Result<Self, DataError> {
        let weapon_origin = weapon_path.display().to_string();
        let dungeon_origin = dungeon_path.display().to_string();

        let weapon_text = read_source(weapon_path, encoding)?;
        let dungeon_text = read_source(dungeon_path, encoding)?;

        let weapons = parse_weapons(&weapon_text, &weapon_origin)?;
        let dungeons = parse_dungeons(&dungeon_text, &dungeon_origin)?;
        Ok(Self::from_records(weapons, dungeons))
    }

    /// 直接从已解码的 CSV 文本构造，主要用于测试和内嵌数据。
    pub fn from_csv_text(weapon_csv: &str, dungeon_csv: &str) -> Result<Self, DataError> {
        let weapons = parse_weapons(weapon_csv, "<weapons>")?;
        let dungeons = parse_dungeons(dungeon_csv, "<dungeons>")?;
        Ok(Self::from_records(weapons, dungeons))
    }

    /// 同名武器只保留第一条。
    pub fn from_records(weapons: Vec<WeaponRecord>, dungeons: Vec<DungeonRecord>) -> Self {
        let mut data = GameData { dungeons, ..Default::default() };
        for weapon in weapons {
            if data.weapon_index.contains_key(&weapon.name) {
                warn!(weapon = %weapon.name, "武器名称重复，保留第一条记录");
                continue;
            }
            data.weapon_index.insert(weapon.name.clone(), data.weapons.len());
            data.weapons.push(weapon);
        }
        info!(weapons = data.weapons.len(), dungeons = data.dungeons.len(), "参考数据加载完成");
        data
    }

    /// 按源表顺序返回所有武器名称。
    pub fn list_weapon_names(&self) -> Vec<&str> {
        self.weapons.iter().map(|w| w.name.as_str()).collect()
    }

    pub fn weapons(&self) -> &[WeaponRecord] {
        &self.weapons
    }

    /// 精确匹配查找；名称未知时返回 None 而不是报错。
    pub fn get_weapon(&self, name: &str) -> Option<&WeaponRecord> {
        self.weapon_index.get(name).map(|&i| &self.weapons[i])
    }

    pub fn get_dungeons(&self) -> &[DungeonRecord] {
        &self.dungeons
    }
}

/// 读取文件并按指定编码解码。
pub fn read_source(path: &Path, encoding: SourceEncoding) -> Result<String, DataError> {
    let origin = path.display().to_string();
    let bytes = fs::read(path).map_err(|source| DataError::Io { origin: origin.clone(), source })?;
    decode_bytes(&bytes, encoding, &origin)
}

/// auto 模式下优先尝试 UTF-8（去掉 BOM），失败后严格按 GB18030 解码。
pub fn decode_bytes(bytes: &[u8], encoding: SourceEncoding, origin: &str) -> Result<String, DataError> {
    let utf8 = || {
        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        std::str::from_utf8(body).ok().map(str::to_owned)
    };
    let gbk = || {
        GB18030
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
    };

    let decoded = match encoding {
        SourceEncoding::Utf8 => utf8(),
        SourceEncoding::Gbk => gbk(),
        SourceEncoding::Auto => utf8().or_else(gbk),
    };
    decoded.ok_or_else(|| DataError::Encoding { origin: origin.to_string(), encoding: encoding.label() })
}

fn read_records(text: &str, origin: &str) -> Result<Vec<StringRecord>, DataError> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes())
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| DataError::Csv { origin: origin.to_string(), source })
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|c| normalize_cell(c).is_empty())
}

fn require_column(header: &StringRecord, aliases: &[&'static str], origin: &str) -> Result<usize, DataError> {
    find_column(header, aliases).ok_or_else(|| DataError::MissingColumn {
        origin: origin.to_string(),
        column: aliases[0],
    })
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

/// 解析武器词条表。表头: 名称,稀有度,种类,主词条,副词条,技能（顺序不限）。
pub fn parse_weapons(text: &str, origin: &str) -> Result<Vec<WeaponRecord>, DataError> {
    let records = read_records(text, origin)?;
    let mut rows = records.iter().skip_while(|r| is_blank(r));
    let header = rows.next().ok_or_else(|| DataError::MissingHeader { origin: origin.to_string() })?;

    let name_col = require_column(header, NAME_COLUMN, origin)?;
    let rarity_col = require_column(header, RARITY_COLUMN, origin)?;
    let type_col = require_column(header, TYPE_COLUMN, origin)?;
    let main_col = require_column(header, MAIN_COLUMN, origin)?;
    let sub_col = require_column(header, SUB_COLUMN, origin)?;
    let skill_col = require_column(header, SKILL_COLUMN, origin)?;

    let mut weapons = Vec::new();
    let mut seen = HashSet::new();
    for row in rows {
        if is_blank(row) { continue; }
        let name = cell(row, name_col);
        if name.is_empty() {
            warn!(origin, line = line_of(row), "武器行缺少名称，已跳过");
            continue;
        }
        if !seen.insert(name.to_string()) {
            warn!(origin, line = line_of(row), weapon = name, "武器名称重复，已跳过");
            continue;
        }

        let main_label = cell(row, main_col);
        let sub_label = cell(row, sub_col);
        let main_stat = utils::split_stat_alternatives(main_label);
        if main_stat.is_empty() {
            debug!(weapon = name, raw = main_label, "主词条无法解析，该武器不参与评分");
        }

        weapons.push(WeaponRecord {
            name: name.to_string(),
            rarity: cell(row, rarity_col).to_string(),
            weapon_type: cell(row, type_col).to_string(),
            main_stat,
            sub_stat: utils::split_stat_alternatives(sub_label),
            skill: cell(row, skill_col).to_string(),
            main_stat_label: main_label.to_string(),
            sub_stat_label: sub_label.to_string(),
        });
    }
    Ok(weapons)
}

/// 解析副本掉落表，自动识别逐行布局和块状布局。
pub fn parse_dungeons(text: &str, origin: &str) -> Result<Vec<DungeonRecord>, DataError> {
    let records = read_records(text, origin)?;
    let start = records.iter().position(|r| !is_blank(r))
        .ok_or_else(|| DataError::MissingHeader { origin: origin.to_string() })?;
    let header = &records[start];

    if find_column(header, DUNGEON_COLUMN).is_some() {
        return parse_row_layout(header, &records[start + 1..], origin);
    }
    if records.iter().any(|r| r.iter().any(|c| normalize_cell(c) == BLOCK_HEADER)) {
        return Ok(parse_block_layout(&records, origin));
    }
    Err(DataError::MissingColumn { origin: origin.to_string(), column: DUNGEON_COLUMN[0] })
}

/// 逐行布局：每行一条 (副本, 主词条, 副词条, 技能) 掉落。
fn parse_row_layout(header: &StringRecord, rows: &[StringRecord], origin: &str) -> Result<Vec<DungeonRecord>, DataError> {
    let dungeon_col = require_column(header, DUNGEON_COLUMN, origin)?;
    let main_col = require_column(header, MAIN_COLUMN, origin)?;
    let sub_col = require_column(header, SUB_COLUMN, origin)?;
    let slot_col = require_column(header, SLOT_COLUMN, origin)?;

    let mut dungeons: Vec<DungeonRecord> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut seen: HashSet<(usize, DropTuple)> = HashSet::new();

    for row in rows {
        if is_blank(row) { continue; }
        let (name, main, sub, slot) =
            (cell(row, dungeon_col), cell(row, main_col), cell(row, sub_col), cell(row, slot_col));
        if name.is_empty() || main.is_empty() || sub.is_empty() || slot.is_empty() {
            warn!(origin, line = line_of(row), "掉落行不完整，已跳过");
            continue;
        }

        let index = *by_name.entry(name.to_string()).or_insert_with(|| {
            dungeons.push(DungeonRecord { name: name.to_string(), drops: Vec::new() });
            dungeons.len() - 1
        });
        let tuple = DropTuple::new(main, sub, slot);
        if !seen.insert((index, tuple.clone())) {
            warn!(origin, line = line_of(row), dungeon = name, drop = %tuple, "重复的掉落组合，已跳过");
            continue;
        }
        dungeons[index].drops.push(tuple);
    }
    Ok(dungeons)
}

/// 块状布局：某个单元格为 "主词条" 时，其正上方是副本名称，
/// 向下三列依次列出主词条、副词条、技能，直到三列全空为止。
/// 副本的掉落组合为三列的笛卡尔积。
fn parse_block_layout(rows: &[StringRecord], origin: &str) -> Vec<DungeonRecord> {
    let mut dungeons: Vec<DungeonRecord> = Vec::new();

    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if normalize_cell(value) != BLOCK_HEADER || r == 0 { continue; }
            let name = cell(&rows[r - 1], c);
            if name.is_empty() { continue; }
            if dungeons.iter().any(|d| d.name == name) {
                warn!(origin, dungeon = name, "副本名称重复，已跳过后出现的数据块");
                continue;
            }

            let (mut mains, mut subs, mut skills) = (Vec::new(), Vec::new(), Vec::new());
            for (offset, data_row) in rows[r + 1..].iter().enumerate() {
                if cell(data_row, c) == BLOCK_HEADER { break; }
                // 下一行是新数据块的表头时，本行是新副本的名称行
                if rows.get(r + 2 + offset).is_some_and(|next| cell(next, c) == BLOCK_HEADER) { break; }

                let (m, s, k) = (cell(data_row, c), cell(data_row, c + 1), cell(data_row, c + 2));
                if m.is_empty() && s.is_empty() && k.is_empty() { break; }
                push_unique(&mut mains, m);
                push_unique(&mut subs, s);
                push_unique(&mut skills, k);
            }

            let drops: Vec<DropTuple> = iproduct!(&mains, &subs, &skills)
                .map(|(m, s, k)| DropTuple::new(m.as_str(), s.as_str(), k.as_str()))
                .collect();
            debug!(dungeon = name, mains = mains.len(), subs = subs.len(), skills = skills.len(), "解析副本数据块");
            dungeons.push(DungeonRecord { name: name.to_string(), drops });
        }
    }
    dungeons
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
