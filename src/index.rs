//! src/index.rs
//!
//! 副产物倒排索引：掉落组合 -> 能被该组合满足的武器。
//! 加载后构建一次，之后只读，可在任意多个查询之间共享。

use crate::models::DropTuple;
use crate::store::GameData;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct ByproductIndex {
    accepted_by: HashMap<DropTuple, BTreeSet<String>>,
}

impl ByproductIndex {
    pub fn build(data: &GameData) -> Self {
        let tuples: HashSet<&DropTuple> = data.get_dungeons().iter().flat_map(|d| &d.drops).collect();
        let distinct = tuples.len();

        let accepted_by: HashMap<DropTuple, BTreeSet<String>> = tuples
            .into_par_iter()
            .filter_map(|tuple| {
                let weapons: BTreeSet<String> = data
                    .weapons()
                    .iter()
                    .filter(|w| w.accepts(tuple))
                    .map(|w| w.name.clone())
                    .collect();
                (!weapons.is_empty()).then(|| (tuple.clone(), weapons))
            })
            .collect();

        debug!(distinct, useful = accepted_by.len(), "副产物索引构建完成");
        ByproductIndex { accepted_by }
    }

    /// 所有能被该组合满足的武器。
    pub fn weapons_for(&self, tuple: &DropTuple) -> Option<&BTreeSet<String>> {
        self.accepted_by.get(tuple)
    }

    /// 除目标武器之外、能被该组合满足的武器。
    pub fn others_for(&self, tuple: &DropTuple, target: &str) -> BTreeSet<String> {
        self.weapons_for(tuple)
            .map(|weapons| weapons.iter().filter(|w| w.as_str() != target).cloned().collect())
            .unwrap_or_default()
    }
}
