use std::fs;
use std::path::Path;
use tempfile::TempDir;
use weapon_essence_farm::config::load_and_build_config;
use weapon_essence_farm::{ConfigError, DataError, FavoritesStore, LockAxis, PlanError};

const WEAPONS: &str = "\
主词条,副词条,技能,稀有度,种类,名称
攻击/暴击(3选1),暴击伤害,破甲,6星,长剑,A
攻击,暴击伤害,破甲,5星,长剑,B
防御,生命,坚守,5星,重锤,C
,生命,治疗,3星,法杖,D
";

const DUNGEONS: &str = "\
副本,主词条,副词条,部位
深渊回廊,攻击,暴击伤害,部位1
深渊回廊,攻击,生命,部位1
";

fn write_fixture(dir: &Path, weapons: &[u8], dungeons: &[u8], extra: &str) -> std::path::PathBuf {
    fs::create_dir_all(dir.join("data")).unwrap();
    fs::write(dir.join("data/weapons.csv"), weapons).unwrap();
    fs::write(dir.join("data/dungeons.csv"), dungeons).unwrap();
    let config_path = dir.join("config.json");
    fs::write(
        &config_path,
        format!(r#"{{"weapon_csv": "data/weapons.csv", "dungeon_csv": "data/dungeons.csv"{extra}}}"#),
    )
    .unwrap();
    config_path
}

#[test]
fn end_to_end_plan_from_files() {
    let dir = TempDir::new().unwrap();
    let config_path = write_fixture(dir.path(), WEAPONS.as_bytes(), DUNGEONS.as_bytes(), "");
    let (_, dm) = load_and_build_config(&config_path).unwrap();

    assert_eq!(dm.list_weapon_names(), vec!["A", "B", "C", "D"]);

    let plan = dm.get_farming_plan("A").unwrap();
    assert_eq!(plan.dungeon, "深渊回廊");
    assert_eq!(plan.strategy, LockAxis::Slot);
    assert_eq!(plan.fixed_val, "部位1");
    assert_eq!(plan.selected_mains, vec!["攻击"]);
    assert_eq!(plan.score, 1);
    assert_eq!(plan.covered().into_iter().collect::<Vec<_>>(), vec!["B"]);

    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["strategy"], "技能");
    assert_eq!(json["by_products"]["攻击 | 暴击伤害 | 部位1"], serde_json::json!(["B"]));

    let weapon = serde_json::to_value(dm.get_weapon_details("A").unwrap()).unwrap();
    assert_eq!(weapon["type"], "长剑");
    assert_eq!(weapon["main_stat"], serde_json::json!(["攻击", "暴击"]));
    assert_eq!(weapon["main_stat_label"], "攻击/暴击(3选1)");

    assert_eq!(dm.get_farming_plan("D"), Err(PlanError::IneligibleWeapon("D".into())));
    assert!(matches!(dm.get_farming_plan("C"), Err(PlanError::NoCandidateDungeon(_))));
    assert!(matches!(dm.get_farming_plan("Z"), Err(PlanError::UnknownWeapon(_))));
}

#[test]
fn gbk_sources_load_in_auto_mode() {
    let dir = TempDir::new().unwrap();
    let (weapons, _, _) = encoding_rs::GBK.encode(WEAPONS);
    let (dungeons, _, _) = encoding_rs::GBK.encode(DUNGEONS);
    let config_path = write_fixture(dir.path(), &weapons, &dungeons, "");
    let (_, dm) = load_and_build_config(&config_path).unwrap();
    assert_eq!(dm.get_farming_plan("A").unwrap().score, 1);
}

#[test]
fn forced_utf8_rejects_gbk() {
    let dir = TempDir::new().unwrap();
    let (weapons, _, _) = encoding_rs::GBK.encode(WEAPONS);
    let config_path = write_fixture(dir.path(), &weapons, DUNGEONS.as_bytes(), r#", "encoding": "utf-8""#);
    let err = load_and_build_config(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Data(DataError::Encoding { .. })));
}

#[test]
fn missing_column_aborts_load() {
    let dir = TempDir::new().unwrap();
    let config_path = write_fixture(
        dir.path(),
        "名称,稀有度,种类,主词条,副词条\nA,5星,长剑,攻击,生命\n".as_bytes(),
        DUNGEONS.as_bytes(),
        "",
    );
    let err = load_and_build_config(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Data(DataError::MissingColumn { column: "技能", .. })));
}

#[test]
fn block_layout_file_with_favorites() {
    let dungeons = "\
深渊回廊,,
主词条,副词条,技能
攻击,暴击伤害,破甲
暴击,生命,
";
    let dir = TempDir::new().unwrap();
    let config_path = write_fixture(dir.path(), WEAPONS.as_bytes(), dungeons.as_bytes(), "");
    let (config, dm) = load_and_build_config(&config_path).unwrap();

    let plan = dm.get_farming_plan("A").unwrap();
    assert_eq!(plan.fixed_val, "破甲");
    assert_eq!(plan.selected_mains, vec!["攻击", "暴击"]);
    assert_eq!(plan.score, 1);

    let mut favorites = FavoritesStore::load(&config.favorites_path).unwrap();
    assert!(favorites.add("A", &plan).unwrap());
    assert!(config.favorites_path.exists());
    assert!(FavoritesStore::load(&config.favorites_path).unwrap().is_favorite("A", &plan));
}
