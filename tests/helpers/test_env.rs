// ==========================================
// 集成测试环境
// ==========================================
// 职责: 临时数据库 + 仓储 + 调度器 + 计划服务记录器
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::NamedTempFile;

use carbon_kanban::db::{open_shared_connection, SharedConnection};
use carbon_kanban::domain::{
    Item, ItemReplenishment, Kanban, MakeMethod, MethodOperation, PickMethod, SupplierPart,
};
use carbon_kanban::engine::{
    AutoReleaseWorker, DispatchContext, DispatchLocks, DispatchRepositories, DispatchResult,
    KanbanDispatcher, OptionalEventPublisher, OutboxEventPublisher,
};
use carbon_kanban::repository::SequenceTable;

use super::mock_config::MockConfig;
use super::mock_planning::RecordingPlanningServices;
use super::test_data_builder::{COMPANY_ID, LOCATION_ID, USER_ID};

/// 固定业务日期
pub fn test_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

pub struct TestEnv {
    _temp_file: NamedTempFile,
    pub db_path: String,
    pub conn: SharedConnection,
    pub repos: DispatchRepositories,
    pub dispatcher: Arc<KanbanDispatcher>,
    pub planning: Arc<RecordingPlanningServices>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with(MockConfig::default(), RecordingPlanningServices::new())
    }

    pub fn with_config(config: MockConfig) -> Self {
        Self::with(config, RecordingPlanningServices::new())
    }

    pub fn with(config: MockConfig, planning: RecordingPlanningServices) -> Self {
        carbon_kanban::logging::init_test();

        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();
        let conn = open_shared_connection(&db_path).unwrap();

        let repos = DispatchRepositories::from_connection(conn.clone());
        let config = Arc::new(config);
        let publisher = OptionalEventPublisher::with_publisher(Arc::new(OutboxEventPublisher::new(
            repos.outbox_repo.clone(),
            config.clone(),
        )));
        let dispatcher = Arc::new(KanbanDispatcher::new(
            repos.clone(),
            config,
            publisher,
            Arc::new(DispatchLocks::new()),
        ));

        let env = Self {
            _temp_file: temp_file,
            db_path,
            conn,
            repos,
            dispatcher,
            planning: Arc::new(planning),
        };
        env.seed_sequence(SequenceTable::Job);
        env.seed_sequence(SequenceTable::PurchaseOrder);
        env
    }

    pub fn ctx(&self) -> DispatchContext {
        DispatchContext::with_today(COMPANY_ID, USER_ID, test_today())
    }

    pub async fn dispatch(&self, kanban_id: &str) -> DispatchResult<String> {
        self.dispatcher.dispatch(kanban_id, &self.ctx()).await
    }

    pub fn worker(&self) -> AutoReleaseWorker {
        AutoReleaseWorker::new(self.repos.outbox_repo.clone(), self.planning.clone())
    }

    // ==========================================
    // 主数据准备
    // ==========================================

    pub fn seed_sequence(&self, table: SequenceTable) {
        self.repos
            .sequence_repo
            .ensure(table, COMPANY_ID, table.default_prefix(), 6)
            .unwrap();
    }

    pub fn remove_sequence(&self, table: SequenceTable) {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM sequence WHERE table_name = ?1 AND company_id = ?2",
            rusqlite::params![table.as_str(), COMPANY_ID],
        )
        .unwrap();
    }

    /// 安装触发器，使指定表的 INSERT / UPDATE 全部失败
    pub fn reject_writes(&self, operation: &str, table: &str) {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(&format!(
            "CREATE TRIGGER reject_{op}_{table} BEFORE {op} ON {table}
             BEGIN SELECT RAISE(ABORT, 'write rejected'); END;",
            op = operation,
            table = table,
        ))
        .unwrap();
    }

    pub fn seed_item(&self, item_id: &str, unit_cost: Option<f64>) {
        self.repos
            .item_repo
            .upsert_item(&Item {
                id: item_id.to_string(),
                company_id: COMPANY_ID.to_string(),
                readable_id: format!("R-{}", item_id),
                name: format!("Item {}", item_id),
                item_type: "Part".to_string(),
                unit_of_measure_code: "EA".to_string(),
                unit_cost,
            })
            .unwrap();
    }

    pub fn seed_lead_time(&self, item_id: &str, lead_time: i64) {
        self.seed_replenishment(ItemReplenishment {
            item_id: item_id.to_string(),
            company_id: COMPANY_ID.to_string(),
            lead_time: Some(lead_time),
            conversion_factor: None,
            purchasing_unit_of_measure_code: None,
            preferred_supplier_id: None,
        });
    }

    pub fn seed_replenishment(&self, replenishment: ItemReplenishment) {
        self.repos
            .item_repo
            .upsert_replenishment(&replenishment)
            .unwrap();
    }

    pub fn seed_default_shelf(&self, item_id: &str, shelf_id: &str) {
        self.repos
            .item_repo
            .upsert_pick_method(&PickMethod {
                item_id: item_id.to_string(),
                location_id: LOCATION_ID.to_string(),
                company_id: COMPANY_ID.to_string(),
                default_shelf_id: Some(shelf_id.to_string()),
            })
            .unwrap();
    }

    pub fn seed_make_method(&self, item_id: &str, operations: Vec<MethodOperation>) {
        self.repos
            .item_repo
            .replace_make_method(&MakeMethod {
                id: format!("MM-{}", item_id),
                item_id: item_id.to_string(),
                company_id: COMPANY_ID.to_string(),
                operations,
            })
            .unwrap();
    }

    pub fn seed_supplier_part(
        &self,
        item_id: &str,
        supplier_id: &str,
        unit_price: Option<f64>,
        uom: Option<&str>,
    ) {
        self.repos
            .item_repo
            .upsert_supplier_part(&SupplierPart {
                item_id: item_id.to_string(),
                supplier_id: supplier_id.to_string(),
                company_id: COMPANY_ID.to_string(),
                supplier_part_id: Some(format!("SP-{}", item_id)),
                unit_price,
                supplier_unit_of_measure_code: uom.map(str::to_string),
            })
            .unwrap();
    }

    pub fn insert_kanban(&self, kanban: &Kanban) {
        self.repos.kanban_repo.upsert(kanban).unwrap();
    }

    pub fn reload_kanban(&self, kanban_id: &str) -> Kanban {
        self.repos
            .kanban_repo
            .find_for_company(kanban_id, COMPANY_ID)
            .unwrap()
    }
}
