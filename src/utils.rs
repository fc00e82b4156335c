//! src/utils.rs
//!
//! 存放可复用的、无状态的工具函数。
//! 遵循模块化原则，保持其他模块的逻辑清晰。

use csv::StringRecord;

const STAT_SEPARATORS: &[char] = &['/', '|', '、', ',', '，', ';', '；', '或'];
const CN_DIGITS: &str = "零一二三四五六七八九十";

/// 将词条单元格拆分为按顺序去重的候选列表，同时去掉 "3选1" 之类的标注。
/// 其他括号内容属于词条名本身，例如 "攻击(固定值)"。
pub fn split_stat_alternatives(raw: &str) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for token in strip_choice_groups(raw).split(STAT_SEPARATORS) {
        let token = normalize_cell(token);
        if token.is_empty() || is_choice_annotation(token) {
            continue;
        }
        if !result.iter().any(|existing| existing == token) {
            result.push(token.to_string());
        }
    }
    result
}

/// 去掉括号包住的 "N选1" 标注，其余括号原样保留。
fn strip_choice_groups(raw: &str) -> String {
    let is_open = |c: char| c == '(' || c == '（';
    let is_close = |c: char| c == ')' || c == '）';

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find(is_open) {
        let open_end = open + rest[open..].chars().next().map_or(1, char::len_utf8);
        let inner = &rest[open_end..];
        match inner.find(is_close) {
            Some(close) if is_choice_annotation(normalize_cell(&inner[..close])) => {
                out.push_str(&rest[..open]);
                out.push('/');
                let close_end = close + inner[close..].chars().next().map_or(1, char::len_utf8);
                rest = &inner[close_end..];
            }
            _ => {
                out.push_str(&rest[..open_end]);
                rest = inner;
            }
        }
    }
    out.push_str(rest);
    out
}

/// 判断是否为 "3选1" / "三选一" 形式的标注。
fn is_choice_annotation(token: &str) -> bool {
    let Some((left, right)) = token.split_once('选') else { return false; };
    let is_count = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || CN_DIGITS.contains(c));
    is_count(left) && is_count(right)
}

/// 去掉首尾空白以及 Excel 导出时残留的 BOM。
pub fn normalize_cell(cell: &str) -> &str {
    cell.trim().trim_matches('\u{feff}').trim()
}

/// "5星" -> "5"，用于列表展示。
pub fn strip_rarity_suffix(rarity: &str) -> String {
    rarity.replace('星', "").trim().to_string()
}

/// 从稀有度标签中解析出数字等级。
pub fn parse_rarity_tier(rarity: &str) -> Option<u8> {
    let digits: String = rarity.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// 在表头中按别名查找列的位置，先出现的别名优先。
pub fn find_column(header: &StringRecord, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        header.iter().position(|cell| normalize_cell(cell).eq_ignore_ascii_case(alias))
    })
}

/// 读取某一列的单元格，越界时视为空。
pub fn cell<'r>(record: &'r StringRecord, index: usize) -> &'r str {
    record.get(index).map(normalize_cell).unwrap_or("")
}

/// 武器搜索：不区分大小写的子串匹配，空查询匹配全部。
pub fn matches_search(name: &str, query: &str) -> bool {
    let query = query.trim();
    query.is_empty() || name.to_lowercase().contains(&query.to_lowercase())
}

/// 将字符串截断到指定的最大宽度，如果发生截断则添加"..."
pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        return s.to_string();
    }

    if max_width < 3 {
        return s.chars().take(max_width).collect();
    }

    format!("{}...", s.chars().take(max_width - 3).collect::<String>())
}
