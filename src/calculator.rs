//! src/calculator.rs
//!
//! 包含程序最核心的计算逻辑。
//! 对 (副本, 锁定维度, 锁定值) 进行穷举，以副产物能覆盖的其他武器数量评分，
//! 选出唯一的最佳刷取方案。

use crate::error::PlanError;
use crate::index::ByproductIndex;
use crate::models::{DropTuple, DungeonRecord, FarmingPlan, LockAxis, PlannerOptions, WeaponRecord};
use crate::store::GameData;
use itertools::Itertools;
use rayon::prelude::*;
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// 顶层函数：为指定武器计算唯一的最佳方案。
pub fn get_farming_plan(
    data: &GameData,
    index: &ByproductIndex,
    options: &PlannerOptions,
    weapon_name: &str,
) -> Result<FarmingPlan, PlanError> {
    enumerate_candidates(data, index, options, weapon_name)?
        .into_iter()
        .min_by(compare_plans)
        .ok_or_else(|| PlanError::NoCandidateDungeon(weapon_name.to_string()))
}

/// 列出所有有副产物的方案，按评分排序并剔除被其他方案完全覆盖的方案。
pub fn rank_farming_plans(
    data: &GameData,
    index: &ByproductIndex,
    options: &PlannerOptions,
    weapon_name: &str,
) -> Result<Vec<FarmingPlan>, PlanError> {
    let mut plans: Vec<FarmingPlan> = enumerate_candidates(data, index, options, weapon_name)?
        .into_iter()
        .filter(|p| p.score > 0)
        .collect();
    plans.sort_by(compare_plans);

    let keep: Vec<bool> = {
        let covered: Vec<BTreeSet<&str>> = plans.iter().map(FarmingPlan::covered).collect();
        (0..plans.len()).map(|i| !is_dominated(i, &plans, &covered)).collect()
    };

    Ok(plans.into_iter().zip(keep).filter_map(|(plan, keep)| keep.then_some(plan)).collect())
}

/// 为每把武器计算最佳方案，结果按武器列表顺序返回。
pub fn plan_all(
    data: &GameData,
    index: &ByproductIndex,
    options: &PlannerOptions,
) -> Vec<(String, Result<FarmingPlan, PlanError>)> {
    data.list_weapon_names()
        .par_iter()
        .map(|&name| (name.to_string(), get_farming_plan(data, index, options, name)))
        .collect()
}

/// 评分高者优先；同分时依次比较副本名、锁定值、锁定维度、额外主词条，保证结果确定。
fn compare_plans(a: &FarmingPlan, b: &FarmingPlan) -> Ordering {
    rank_key(a).cmp(&rank_key(b))
}

fn rank_key(plan: &FarmingPlan) -> (Reverse<usize>, &str, &str, LockAxis, &[String]) {
    (Reverse(plan.score), plan.dungeon.as_str(), plan.fixed_val.as_str(), plan.strategy, plan.extra_mains.as_slice())
}

/// 当前方案的受益武器是另一方案的真子集，或与同一副本中排名更前的方案完全相同。
fn is_dominated(i: usize, plans: &[FarmingPlan], covered: &[BTreeSet<&str>]) -> bool {
    (0..plans.len()).any(|j| {
        if i == j || !covered[i].is_subset(&covered[j]) {
            return false;
        }
        covered[j].len() > covered[i].len() || (j < i && plans[i].dungeon == plans[j].dungeon)
    })
}

/// 校验目标武器并穷举所有候选方案。
fn enumerate_candidates(
    data: &GameData,
    index: &ByproductIndex,
    options: &PlannerOptions,
    weapon_name: &str,
) -> Result<Vec<FarmingPlan>, PlanError> {
    let weapon = data
        .get_weapon(weapon_name)
        .ok_or_else(|| PlanError::UnknownWeapon(weapon_name.to_string()))?;
    if !weapon.is_eligible() {
        return Err(PlanError::IneligibleWeapon(weapon_name.to_string()));
    }

    // --- 1. 只考虑掉落目标主词条的副本 ---
    let candidate_dungeons: Vec<&DungeonRecord> = data
        .get_dungeons()
        .iter()
        .filter(|d| d.offers_any_main(&weapon.main_stat))
        .collect();
    if candidate_dungeons.is_empty() {
        return Err(PlanError::NoCandidateDungeon(weapon_name.to_string()));
    }

    // --- 2. 每个副本独立枚举锁定方式，并行计算 ---
    let plans: Vec<FarmingPlan> = candidate_dungeons
        .par_iter()
        .flat_map_iter(|&dungeon| dungeon_candidates(dungeon, weapon, index, options))
        .collect();

    debug!(weapon = weapon_name, dungeons = candidate_dungeons.len(), candidates = plans.len(), "枚举候选方案");
    Ok(plans)
}

/// 单个副本内：按锁定维度的取值分组，每组（以及每种额外主词条组合）产生一个候选方案。
fn dungeon_candidates(
    dungeon: &DungeonRecord,
    weapon: &WeaponRecord,
    index: &ByproductIndex,
    options: &PlannerOptions,
) -> Vec<FarmingPlan> {
    let wants = |main: &str| weapon.main_stat.iter().any(|m| m == main);
    let mut plans = Vec::new();

    for &axis in options.lock_axes.iter().unique() {
        let mut groups: BTreeMap<&str, Vec<&DropTuple>> = BTreeMap::new();
        for tuple in &dungeon.drops {
            groups.entry(tuple.axis_value(axis)).or_default().push(tuple);
        }

        for (fixed, group) in groups {
            let selected_mains: Vec<String> = weapon
                .main_stat
                .iter()
                .filter(|m| group.iter().any(|t| t.main == **m))
                .cloned()
                .collect();
            // 该锁定值下刷不出目标主词条
            if selected_mains.is_empty() {
                continue;
            }

            for extra in extra_main_choices(&group, &wants, options.extra_mains) {
                let by_products = collect_by_products(
                    group.iter().copied().filter(|t| wants(t.main.as_str()) || extra.contains(&t.main.as_str())),
                    index,
                    &weapon.name,
                );
                let score = by_products.values().flatten().collect::<BTreeSet<_>>().len();

                plans.push(FarmingPlan {
                    weapon: weapon.name.clone(),
                    dungeon: dungeon.name.clone(),
                    strategy: axis,
                    fixed_val: fixed.to_string(),
                    selected_mains: selected_mains.clone(),
                    extra_mains: extra.iter().map(|m| m.to_string()).collect(),
                    by_products,
                    score,
                });
            }
        }
    }
    plans
}

/// 额外定向的非目标主词条组合。候选数量不足 k 个时全部选取。
fn extra_main_choices<'a>(group: &[&'a DropTuple], wants: &dyn Fn(&str) -> bool, k: usize) -> Vec<Vec<&'a str>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    let others: Vec<&str> = group
        .iter()
        .map(|t| t.main.as_str())
        .filter(|m| !wants(*m))
        .unique()
        .sorted()
        .collect();
    if others.len() <= k {
        return vec![others];
    }
    others.into_iter().combinations(k).collect()
}

/// 收集组合 -> 其他受益武器，受益武器为空的组合不记录。
fn collect_by_products<'a>(
    tuples: impl Iterator<Item = &'a DropTuple>,
    index: &ByproductIndex,
    target: &str,
) -> BTreeMap<DropTuple, BTreeSet<String>> {
    tuples
        .filter_map(|tuple| {
            let others = index.others_for(tuple, target);
            (!others.is_empty()).then(|| (tuple.clone(), others))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEAPON_HEADER: &str = "名称,稀有度,种类,主词条,副词条,技能\n";
    const DUNGEON_HEADER: &str = "副本,主词条,副词条,部位\n";

    fn setup(weapons: &str, dungeons: &str) -> (GameData, ByproductIndex) {
        let data = GameData::from_csv_text(&format!("{WEAPON_HEADER}{weapons}"), &format!("{DUNGEON_HEADER}{dungeons}"))
            .unwrap();
        let index = ByproductIndex::build(&data);
        (data, index)
    }

    fn plan(data: &GameData, index: &ByproductIndex, name: &str) -> Result<FarmingPlan, PlanError> {
        get_farming_plan(data, index, &PlannerOptions::default(), name)
    }

    fn tuple(main: &str, sub: &str, slot: &str) -> DropTuple {
        DropTuple::new(main, sub, slot)
    }

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn three_weapon_scenario() {
        let (data, index) = setup(
            "A,6星,长剑,攻击/暴击(3选1),暴击伤害,破甲\n\
             B,5星,长剑,攻击,暴击伤害,破甲\n\
             C,5星,重锤,防御,暴击伤害,坚守\n",
            "深渊回廊,攻击,暴击伤害,部位1\n\
             深渊回廊,攻击,生命,部位1\n",
        );
        let plan = plan(&data, &index, "A").unwrap();

        assert_eq!(plan.dungeon, "深渊回廊");
        assert_eq!(plan.strategy, LockAxis::Slot);
        assert_eq!(plan.fixed_val, "部位1");
        assert_eq!(plan.selected_mains, vec!["攻击"]);
        assert_eq!(plan.score, 1);
        // 生命副词条不满足 B 的需求，因此该组合不产生副产物
        assert_eq!(plan.by_products.len(), 1);
        assert_eq!(names(&plan.by_products[&tuple("攻击", "暴击伤害", "部位1")]), vec!["B"]);
    }

    #[test]
    fn both_tuples_listed_when_sub_stats_match() {
        let (data, index) = setup(
            "A,6星,长剑,攻击/暴击,暴击伤害,破甲\n\
             B,5星,长剑,攻击,暴击伤害/生命,破甲\n\
             C,5星,重锤,防御,生命,坚守\n",
            "深渊回廊,攻击,暴击伤害,部位1\n\
             深渊回廊,攻击,生命,部位1\n",
        );
        let plan = plan(&data, &index, "A").unwrap();
        assert_eq!(plan.score, 1);
        assert_eq!(plan.by_products.len(), 2);
        for weapons in plan.by_products.values() {
            assert_eq!(names(weapons), vec!["B"]);
        }
    }

    #[test]
    fn picks_fixed_value_with_widest_coverage() {
        let (data, index) = setup(
            "T,6星,长剑,攻击,暴击伤害,破甲\n\
             X,5星,长剑,攻击,生命,破甲\n\
             Y,5星,长剑,暴击,生命,破甲\n\
             Z,5星,长剑,攻击,防御,破甲\n",
            "回廊,攻击,生命,部位1\n\
             回廊,暴击,生命,部位1\n\
             回廊,攻击,生命,部位2\n\
             回廊,攻击,防御,部位2\n",
        );
        let plan = plan(&data, &index, "T").unwrap();
        // 部位1 组只保留目标主词条(攻击)的组合：覆盖 X；部位2 覆盖 X 与 Z
        assert_eq!(plan.fixed_val, "部位2");
        assert_eq!(plan.score, 2);
        assert_eq!(plan.covered().into_iter().collect::<Vec<_>>(), vec!["X", "Z"]);
    }

    #[test]
    fn tie_prefers_smaller_dungeon_name() {
        let (data, index) = setup(
            "T,6星,长剑,攻击,暴击伤害,破甲\n\
             X,5星,长剑,攻击,生命,破甲\n",
            "b副本,攻击,生命,部位1\n\
             a副本,攻击,生命,部位1\n",
        );
        let plan = plan(&data, &index, "T").unwrap();
        assert_eq!(plan.score, 1);
        assert_eq!(plan.dungeon, "a副本");
    }

    #[test]
    fn tie_prefers_smaller_fixed_value() {
        let (data, index) = setup(
            "T,6星,长剑,攻击,暴击伤害,破甲\n\
             X,5星,长剑,攻击,生命,破甲\n",
            "回廊,攻击,生命,部位2\n\
             回廊,攻击,生命,部位1\n",
        );
        assert_eq!(plan(&data, &index, "T").unwrap().fixed_val, "部位1");
    }

    #[test]
    fn zero_score_plan_is_still_returned() {
        let (data, index) = setup(
            "T,6星,长剑,攻击,暴击伤害,破甲\n",
            "回廊,攻击,生命,部位1\n",
        );
        let plan = plan(&data, &index, "T").unwrap();
        assert_eq!(plan.score, 0);
        assert!(plan.by_products.is_empty());
        assert_eq!(plan.selected_mains, vec!["攻击"]);
    }

    #[test]
    fn target_never_counts_itself() {
        let (data, index) = setup(
            "T,6星,长剑,攻击,生命,破甲\n",
            "回廊,攻击,生命,部位1\n",
        );
        assert_eq!(plan(&data, &index, "T").unwrap().score, 0);
    }

    #[test]
    fn query_errors_are_values() {
        let (data, index) = setup(
            "T,6星,长剑,攻击,生命,破甲\n\
             空,4星,法杖,,生命,治疗\n\
             盾,5星,重锤,防御,生命,坚守\n",
            "回廊,攻击,生命,部位1\n",
        );
        assert_eq!(plan(&data, &index, "不存在"), Err(PlanError::UnknownWeapon("不存在".into())));
        assert_eq!(plan(&data, &index, "空"), Err(PlanError::IneligibleWeapon("空".into())));
        let err = plan(&data, &index, "盾").unwrap_err();
        assert_eq!(err, PlanError::NoCandidateDungeon("盾".into()));
        assert_eq!(err.kind(), "NoCandidateDungeonError");
    }

    #[test]
    fn repeated_queries_are_identical() {
        let (data, index) = setup(
            "T,6星,长剑,攻击/暴击,暴击伤害,破甲\n\
             X,5星,长剑,攻击,生命,破甲\n\
             Y,5星,长剑,暴击,生命,破甲\n",
            "b,攻击,生命,部位1\n\
             a,暴击,生命,部位1\n\
             a,攻击,生命,部位2\n",
        );
        for name in data.list_weapon_names() {
            assert_eq!(plan(&data, &index, name), plan(&data, &index, name));
        }
    }

    #[test]
    fn score_matches_union_of_by_products() {
        let (data, index) = setup(
            "T,6星,长剑,攻击/暴击,暴击伤害,破甲\n\
             X,5星,长剑,攻击/暴击,生命,破甲\n\
             Y,5星,长剑,暴击,生命,破甲\n\
             Z,5星,长剑,攻击,防御,破甲\n",
            "回廊,攻击,生命,部位1\n\
             回廊,暴击,生命,部位1\n\
             回廊,攻击,防御,部位1\n",
        );
        let plan = plan(&data, &index, "T").unwrap();
        assert_eq!(plan.by_products.values().map(BTreeSet::len).sum::<usize>(), 4);
        assert_eq!(plan.score, 3);
        assert_eq!(plan.score, plan.covered().len());
    }

    #[test]
    fn sub_axis_can_be_enabled() {
        let (data, index) = setup(
            "T,6星,长剑,攻击,暴击伤害,破甲\n\
             X,5星,长剑,攻击,生命,破甲\n\
             Y,5星,长剑,攻击,生命,破甲2\n",
            "回廊,攻击,生命,部位1\n\
             回廊,攻击,防御,部位2\n",
        );
        let options = PlannerOptions { lock_axes: vec![LockAxis::Sub, LockAxis::Slot], extra_mains: 0 };
        let plan = get_farming_plan(&data, &index, &options, "T").unwrap();
        // 两种锁定方式都覆盖 X 与 Y，按锁定值排序 "生命" < "部位1"
        assert_eq!(plan.score, 2);
        assert_eq!(plan.strategy, LockAxis::Sub);
        assert_eq!(plan.fixed_val, "生命");
    }

    #[test]
    fn extra_mains_extend_coverage() {
        let (data, index) = setup(
            "T,6星,长剑,攻击,暴击伤害,破甲\n\
             X,5星,长剑,防御,生命,破甲\n\
             Y,5星,长剑,生命,生命,破甲\n\
             Z,5星,长剑,暴击,生命,破甲\n",
            "回廊,攻击,生命,部位1\n\
             回廊,防御,生命,部位1\n\
             回廊,生命,生命,部位1\n\
             回廊,暴击,生命,部位1\n",
        );
        let options = PlannerOptions { lock_axes: vec![LockAxis::Slot], extra_mains: 2 };
        let plan = get_farming_plan(&data, &index, &options, "T").unwrap();
        assert_eq!(plan.score, 2);
        // 三种组合同分，按字典序取最小的一组
        let mut expected = vec!["暴击", "生命", "防御"];
        expected.sort();
        expected.truncate(2);
        assert_eq!(plan.extra_mains, expected);
        assert_eq!(plan.selected_mains, vec!["攻击"]);
    }

    #[test]
    fn ranked_plans_drop_covered_subsets() {
        let (data, index) = setup(
            "T,6星,长剑,攻击,暴击伤害,破甲\n\
             X,5星,长剑,攻击,生命,破甲\n\
             Y,5星,长剑,攻击,防御,破甲\n",
            "回廊,攻击,生命,部位1\n\
             回廊,攻击,防御,部位1\n\
             回廊,攻击,生命,部位2\n\
             峡谷,攻击,生命,部位1\n\
             峡谷,攻击,防御,部位1\n",
        );
        let ranked = rank_farming_plans(&data, &index, &PlannerOptions::default(), "T").unwrap();
        let summary: Vec<_> = ranked.iter().map(|p| (p.dungeon.as_str(), p.fixed_val.as_str(), p.score)).collect();
        // 回廊/部位2 只覆盖 X，是其他方案的真子集
        assert_eq!(summary, vec![("回廊", "部位1", 2), ("峡谷", "部位1", 2)]);
        assert_eq!(ranked[0], plan(&data, &index, "T").unwrap());
    }

    #[test]
    fn plan_all_follows_list_order() {
        let (data, index) = setup(
            "T,6星,长剑,攻击,暴击伤害,破甲\n\
             空,4星,法杖,,生命,治疗\n\
             X,5星,长剑,攻击,生命,破甲\n",
            "回廊,攻击,生命,部位1\n",
        );
        let results = plan_all(&data, &index, &PlannerOptions::default());
        let order: Vec<_> = results.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(order, vec!["T", "空", "X"]);
        assert_eq!(results[0].1.as_ref().map(|p| p.score), Ok(1));
        assert!(matches!(results[1].1, Err(PlanError::IneligibleWeapon(_))));
    }

    #[test]
    fn parenthesised_stats_match_exactly() {
        let (data, index) = setup(
            "T,5星,长剑,攻击(固定值),暴击,破甲\n\
             X,5星,长剑,攻击,生命(百分比),破甲\n",
            "回廊,攻击,生命,破甲\n",
        );
        assert_eq!(data.get_weapon("T").unwrap().main_stat, vec!["攻击(固定值)"]);
        assert_eq!(plan(&data, &index, "T"), Err(PlanError::NoCandidateDungeon("T".into())));
        // X 的副词条是 "生命(百分比)"，不能被 "生命" 满足
        assert!(index.weapons_for(&tuple("攻击", "生命", "破甲")).is_none());
    }
}
