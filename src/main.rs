//! src/main.rs
//!
//! 命令行入口。
//! 负责加载配置与数据，调用推荐器，并向用户打印武器列表、方案详情和耗时。

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use weapon_essence_farm::{config, utils, AppConfig, DataManager, FarmingPlan, FavoritesStore, PlanError, WeaponRecord};

#[derive(Debug, Parser)]
#[command(name = "weapon-essence-farm", version, about = "武器基质刷取方案推荐")]
struct Args {
    /// 配置文件路径，默认使用项目根目录下的 config.json
    #[arg(short, long, env = "WEAPON_FARM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 列出武器，可按名称搜索
    List {
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// 显示武器详情及推荐方案
    Show {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// 计算刷取方案
    Plan {
        name: String,
        /// 列出所有未被覆盖的候选方案
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },
    /// 为所有武器计算最佳方案
    Report,
    /// 管理收藏的方案
    Fav {
        #[command(subcommand)]
        action: FavAction,
    },
}

#[derive(Debug, Subcommand)]
enum FavAction {
    List,
    Add { name: String },
    Remove { name: String },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "weapon_essence_farm=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    // 1. 启动计时器
    let start_time = Instant::now();

    // 2. 加载配置和参考数据，失败时拒绝继续
    let config_path = args.config.unwrap_or_else(config::default_config_path);
    let (app_config, dm) = match config::load_and_build_config(&config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n错误：加载数据失败。\n原因: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // 3. 执行命令
    let quiet = matches!(args.command, Command::Plan { json: true, .. } | Command::Show { json: true, .. });
    if let Err(e) = run(args.command, &app_config, &dm) {
        eprintln!("\n错误：{}", e);
        return ExitCode::FAILURE;
    }

    // 4. 打印耗时
    if !quiet {
        println!("\n总计算耗时: {:.2?}", start_time.elapsed());
    }
    ExitCode::SUCCESS
}

fn run(command: Command, app_config: &AppConfig, dm: &DataManager) -> Result<(), Box<dyn Error>> {
    match command {
        Command::List { search } => print_weapon_list(dm, &search),
        Command::Show { name, json: true } => {
            let value = match dm.get_weapon_details(&name) {
                Some(weapon) => {
                    let plan = match dm.get_farming_plan(&name) {
                        Ok(plan) => serde_json::to_value(plan)?,
                        Err(e) => error_json(&e),
                    };
                    serde_json::json!({ "weapon": weapon, "plan": plan })
                }
                None => error_json(&PlanError::UnknownWeapon(name)),
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Command::Show { name, json: false } => match dm.get_weapon_details(&name) {
            Some(weapon) => {
                print_weapon_details(weapon);
                print_plan_outcome(dm.get_farming_plan(&name));
            }
            None => println!("未找到武器: {}", name),
        },
        Command::Plan { name, all, json } => {
            if json {
                let value = if all {
                    dm.rank_farming_plans(&name).map(serde_json::to_value)
                } else {
                    dm.get_farming_plan(&name).map(serde_json::to_value)
                };
                let value = match value {
                    Ok(serialized) => serialized?,
                    Err(e) => error_json(&e),
                };
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else if all {
                match dm.rank_farming_plans(&name) {
                    Ok(plans) if plans.is_empty() => println!("没有能产生副产物的方案"),
                    Ok(plans) => {
                        for (i, plan) in plans.iter().enumerate() {
                            println!("\n方案 {}", i + 1);
                            print_plan(plan);
                        }
                    }
                    Err(e) => println!("错误: {}", e),
                }
            } else {
                print_plan_outcome(dm.get_farming_plan(&name));
            }
        }
        Command::Report => print_report(dm),
        Command::Fav { action } => {
            let mut favorites = FavoritesStore::load(&app_config.favorites_path)?;
            match action {
                FavAction::List => {
                    if favorites.list().is_empty() {
                        println!("暂无收藏");
                    }
                    for fav in favorites.list() {
                        println!("{} | {} | {} ({})", fav.weapon_name, fav.dungeon, fav.strategy, fav.fixed_val);
                    }
                }
                FavAction::Add { name } => match dm.get_farming_plan(&name) {
                    Ok(plan) => {
                        let added = favorites.add(&name, &plan)?;
                        println!("{}", if added { "已收藏" } else { "该方案已在收藏中" });
                    }
                    Err(e) => println!("错误: {}", e),
                },
                FavAction::Remove { name } => match dm.get_farming_plan(&name) {
                    Ok(plan) => {
                        let removed = favorites.remove(&name, &plan)?;
                        println!("{}", if removed { "已取消收藏" } else { "该方案不在收藏中" });
                    }
                    Err(e) => println!("错误: {}", e),
                },
            }
        }
    }
    Ok(())
}

fn error_json(e: &PlanError) -> serde_json::Value {
    serde_json::json!({ "error": e.to_string(), "kind": e.kind() })
}

fn print_weapon_list(dm: &DataManager, search: &str) {
    let weapons = dm.search_weapons(search);
    println!("{:<20} | {:<6} | {:<8} | {}", "名称", "稀有度", "种类", "主词条");
    println!("{:-<20}-+-{:-<8}-+-{:-<10}-+-{:-<20}", "", "", "", "");
    for weapon in &weapons {
        println!(
            "{:<20} | {:<6} | {:<8} | {}",
            utils::truncate_string(&weapon.display_label(), 18),
            weapon.rarity_tier().map_or_else(|| weapon.rarity.clone(), |t| format!("{}★", t)),
            utils::truncate_string(&weapon.weapon_type, 8),
            weapon.main_stat_label,
        );
    }
    println!("共 {} 把武器", weapons.len());
}

fn print_weapon_details(weapon: &WeaponRecord) {
    println!("{}", weapon.name);
    println!("稀有度: {} | 种类: {}", weapon.rarity, weapon.weapon_type);
    println!("主词条: {}", weapon.main_stat_label);
    println!("副词条: {}", weapon.sub_stat_label);
    println!("技能: {}", weapon.skill);
}

/// 查询期错误只作为提示打印，不中断程序。
fn print_plan_outcome(outcome: Result<FarmingPlan, PlanError>) {
    match outcome {
        Ok(plan) => print_plan(&plan),
        Err(e) => println!("\n错误: {}", e),
    }
}

fn print_plan(plan: &FarmingPlan) {
    println!("\n推荐刷取方案");
    println!("副本: {}", plan.dungeon);
    println!("定向策略: {} ({})", plan.strategy, plan.fixed_val);
    println!("定向主词条 (3选1): {}", plan.selected_mains.join(", "));
    if !plan.extra_mains.is_empty() {
        println!("额外定向主词条: {}", plan.extra_mains.join(", "));
    }
    println!("可能产出的有用副产物 (共帮助 {} 把其他武器):", plan.score);

    if plan.by_products.is_empty() {
        println!("  无其他适用武器产生的副产物");
    }
    for (tuple, weapons) in plan.by_products_for_display() {
        let names: Vec<&str> = weapons.iter().map(String::as_str).collect();
        println!("  [{}]  适用: {}", tuple, names.join(", "));
    }
}

fn print_report(dm: &DataManager) {
    println!("{:<20} | {:<12} | {:<16} | {}", "武器", "副本", "定向", "覆盖");
    println!("{:-<20}-+-{:-<14}-+-{:-<18}-+-{:-<6}", "", "", "", "");
    for (name, outcome) in dm.plan_all() {
        let name = utils::truncate_string(&name, 18);
        match outcome {
            Ok(plan) => println!(
                "{:<20} | {:<12} | {:<16} | {}",
                name,
                utils::truncate_string(&plan.dungeon, 12),
                utils::truncate_string(&format!("{}({})", plan.strategy, plan.fixed_val), 16),
                plan.score,
            ),
            Err(e) => println!("{:<20} | {}", name, e),
        }
    }
}
