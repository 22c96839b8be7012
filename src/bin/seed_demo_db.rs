// ==========================================
// 看板补货调度 - 演示库初始化
// ==========================================
// 用法: seed_demo_db [db_path]
// 已存在的库先备份为 <db_path>.bak.<时间戳> 再重建
// ==========================================

use std::error::Error;
use std::fs;
use std::path::Path;

use chrono::Local;

use carbon_kanban::config::{config_keys, get_default_db_path, ConfigManager};
use carbon_kanban::db::open_shared_connection;
use carbon_kanban::domain::{
    Item, ItemReplenishment, Kanban, MakeMethod, MethodOperation, PickMethod, ReplenishmentSystem,
    SupplierPart,
};
use carbon_kanban::engine::DispatchRepositories;
use carbon_kanban::repository::SequenceTable;

const COMPANY_ID: &str = "DEMO";
const SUPPLIER_ID: &str = "SUP-ACME";
const LOCATION_ID: &str = "LOC-MAIN";

fn main() -> Result<(), Box<dyn Error>> {
    carbon_kanban::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    if let Some(parent) = Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    backup_and_reset_db(&db_path)?;

    let conn = open_shared_connection(&db_path)?;
    let repos = DispatchRepositories::from_connection(conn.clone());
    let config = ConfigManager::from_connection(conn).map_err(|e| e.to_string())?;

    config
        .set_global_config_value(config_keys::DEFAULT_LEAD_TIME_DAYS, "7")
        .map_err(|e| e.to_string())?;
    config
        .set_global_config_value(config_keys::AUTO_RELEASE_MAX_RETRIES, "3")
        .map_err(|e| e.to_string())?;

    for table in [SequenceTable::Job, SequenceTable::PurchaseOrder] {
        repos
            .sequence_repo
            .ensure(table, COMPANY_ID, table.default_prefix(), 6)?;
    }

    seed_items(&repos)?;
    seed_kanbans(&repos)?;

    tracing::info!(db_path = %db_path, company_id = COMPANY_ID, "演示库初始化完成");
    println!("Seeded demo database at {}", db_path);
    println!("  Make:  GET /x/kanban/KB-BRACKET   (x-company-id: {})", COMPANY_ID);
    println!("  Auto:  GET /x/kanban/KB-SHAFT");
    println!("  Buy:   GET /x/kanban/KB-BOLT");
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_items(repos: &DispatchRepositories) -> Result<(), Box<dyn Error>> {
    let items = [
        ("IT-BRACKET", "BRK-100", "Steel Bracket", "Part", Some(4.5)),
        ("IT-SHAFT", "SHF-200", "Drive Shaft", "Part", Some(38.0)),
        ("IT-BOLT", "BLT-M8", "M8 Hex Bolt", "Consumable", Some(0.12)),
    ];

    for (id, readable_id, name, item_type, unit_cost) in items {
        repos.item_repo.upsert_item(&Item {
            id: id.to_string(),
            company_id: COMPANY_ID.to_string(),
            readable_id: readable_id.to_string(),
            name: name.to_string(),
            item_type: item_type.to_string(),
            unit_of_measure_code: "EA".to_string(),
            unit_cost,
        })?;
        repos.item_repo.upsert_pick_method(&PickMethod {
            item_id: id.to_string(),
            location_id: LOCATION_ID.to_string(),
            company_id: COMPANY_ID.to_string(),
            default_shelf_id: Some(format!("SH-{}", readable_id)),
        })?;
    }

    repos.item_repo.upsert_replenishment(&ItemReplenishment {
        item_id: "IT-BRACKET".to_string(),
        company_id: COMPANY_ID.to_string(),
        lead_time: Some(5),
        conversion_factor: None,
        purchasing_unit_of_measure_code: None,
        preferred_supplier_id: None,
    })?;
    repos.item_repo.upsert_replenishment(&ItemReplenishment {
        item_id: "IT-BOLT".to_string(),
        company_id: COMPANY_ID.to_string(),
        lead_time: Some(3),
        conversion_factor: Some(100.0),
        purchasing_unit_of_measure_code: Some("BOX".to_string()),
        preferred_supplier_id: Some(SUPPLIER_ID.to_string()),
    })?;
    repos.item_repo.upsert_supplier_part(&SupplierPart {
        item_id: "IT-BOLT".to_string(),
        supplier_id: SUPPLIER_ID.to_string(),
        company_id: COMPANY_ID.to_string(),
        supplier_part_id: Some("ACME-8812".to_string()),
        unit_price: Some(9.5),
        supplier_unit_of_measure_code: Some("BOX".to_string()),
    })?;

    for (method_id, item_id) in [("MM-BRACKET", "IT-BRACKET"), ("MM-SHAFT", "IT-SHAFT")] {
        repos.item_repo.replace_make_method(&MakeMethod {
            id: method_id.to_string(),
            item_id: item_id.to_string(),
            company_id: COMPANY_ID.to_string(),
            operations: vec![
                MethodOperation {
                    operation_order: 1,
                    description: "Cut".to_string(),
                    work_center_id: Some("WC-SAW".to_string()),
                    setup_time: 10.0,
                    machine_time: 2.0,
                    labor_time: 0.0,
                },
                MethodOperation {
                    operation_order: 2,
                    description: "Finish".to_string(),
                    work_center_id: Some("WC-BENCH".to_string()),
                    setup_time: 0.0,
                    machine_time: 0.0,
                    labor_time: 4.0,
                },
            ],
        })?;
    }

    Ok(())
}

fn seed_kanbans(repos: &DispatchRepositories) -> Result<(), Box<dyn Error>> {
    let base = Kanban {
        id: String::new(),
        company_id: COMPANY_ID.to_string(),
        item_id: String::new(),
        replenishment_system: ReplenishmentSystem::Make,
        quantity: 0.0,
        location_id: LOCATION_ID.to_string(),
        supplier_id: None,
        shelf_id: None,
        purchase_unit_of_measure_code: None,
        conversion_factor: None,
        auto_release: false,
        auto_start_job: false,
        job_id: None,
        job_readable_id: None,
        active: true,
    };

    let kanbans = [
        Kanban {
            id: "KB-BRACKET".to_string(),
            item_id: "IT-BRACKET".to_string(),
            quantity: 25.0,
            ..base.clone()
        },
        Kanban {
            id: "KB-SHAFT".to_string(),
            item_id: "IT-SHAFT".to_string(),
            quantity: 4.0,
            auto_release: true,
            auto_start_job: true,
            ..base.clone()
        },
        Kanban {
            id: "KB-BOLT".to_string(),
            item_id: "IT-BOLT".to_string(),
            replenishment_system: ReplenishmentSystem::Buy,
            quantity: 2.0,
            supplier_id: Some(SUPPLIER_ID.to_string()),
            ..base.clone()
        },
        Kanban {
            id: "KB-RETIRED".to_string(),
            item_id: "IT-BOLT".to_string(),
            quantity: 1.0,
            active: false,
            ..base
        },
    ];

    for kanban in &kanbans {
        repos.kanban_repo.upsert(kanban)?;
    }
    Ok(())
}
