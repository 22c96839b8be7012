// ==========================================
// 看板补货调度 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为 (外键 / busy_timeout)
// - 建库脚本幂等 (CREATE TABLE IF NOT EXISTS), 启动时可重复执行
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 共享连接句柄
pub type SharedConnection = Arc<Mutex<Connection>>;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开连接、建表并包装为共享句柄
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<SharedConnection> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 内存库（测试用）
pub fn open_in_memory_connection() -> rusqlite::Result<SharedConnection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化全部表结构
///
/// 所有业务表均按 company_id 隔离
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
          version INTEGER PRIMARY KEY,
          applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
          scope_id TEXT NOT NULL DEFAULT 'global',
          key TEXT NOT NULL,
          value TEXT NOT NULL,
          updated_at TEXT NOT NULL DEFAULT (datetime('now')),
          PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS sequence (
          table_name TEXT NOT NULL,
          company_id TEXT NOT NULL,
          prefix TEXT NOT NULL,
          next INTEGER NOT NULL DEFAULT 1,
          size INTEGER NOT NULL DEFAULT 6,
          step INTEGER NOT NULL DEFAULT 1,
          PRIMARY KEY (table_name, company_id)
        );

        CREATE TABLE IF NOT EXISTS item (
          id TEXT PRIMARY KEY,
          company_id TEXT NOT NULL,
          readable_id TEXT NOT NULL,
          name TEXT NOT NULL,
          item_type TEXT NOT NULL DEFAULT 'Part',
          unit_of_measure_code TEXT NOT NULL DEFAULT 'EA',
          unit_cost REAL
        );

        CREATE TABLE IF NOT EXISTS item_replenishment (
          item_id TEXT NOT NULL REFERENCES item(id) ON DELETE CASCADE,
          company_id TEXT NOT NULL,
          lead_time INTEGER,
          conversion_factor REAL,
          purchasing_unit_of_measure_code TEXT,
          preferred_supplier_id TEXT,
          PRIMARY KEY (item_id, company_id)
        );

        CREATE TABLE IF NOT EXISTS pick_method (
          item_id TEXT NOT NULL REFERENCES item(id) ON DELETE CASCADE,
          location_id TEXT NOT NULL,
          company_id TEXT NOT NULL,
          default_shelf_id TEXT,
          PRIMARY KEY (item_id, location_id, company_id)
        );

        CREATE TABLE IF NOT EXISTS supplier_part (
          item_id TEXT NOT NULL REFERENCES item(id) ON DELETE CASCADE,
          supplier_id TEXT NOT NULL,
          company_id TEXT NOT NULL,
          supplier_part_id TEXT,
          unit_price REAL,
          supplier_unit_of_measure_code TEXT,
          PRIMARY KEY (item_id, supplier_id, company_id)
        );

        CREATE TABLE IF NOT EXISTS make_method (
          id TEXT PRIMARY KEY,
          item_id TEXT NOT NULL REFERENCES item(id) ON DELETE CASCADE,
          company_id TEXT NOT NULL,
          UNIQUE (item_id, company_id)
        );

        CREATE TABLE IF NOT EXISTS method_operation (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          make_method_id TEXT NOT NULL REFERENCES make_method(id) ON DELETE CASCADE,
          operation_order INTEGER NOT NULL,
          description TEXT NOT NULL DEFAULT '',
          work_center_id TEXT,
          setup_time REAL NOT NULL DEFAULT 0,
          machine_time REAL NOT NULL DEFAULT 0,
          labor_time REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS kanban (
          id TEXT PRIMARY KEY,
          company_id TEXT NOT NULL,
          item_id TEXT NOT NULL,
          replenishment_system TEXT NOT NULL,
          quantity REAL NOT NULL,
          location_id TEXT NOT NULL,
          supplier_id TEXT,
          shelf_id TEXT,
          purchase_unit_of_measure_code TEXT,
          conversion_factor REAL,
          auto_release INTEGER NOT NULL DEFAULT 0,
          auto_start_job INTEGER NOT NULL DEFAULT 0,
          job_id TEXT,
          job_readable_id TEXT,
          active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS job (
          id TEXT PRIMARY KEY,
          job_id TEXT NOT NULL,
          company_id TEXT NOT NULL,
          item_id TEXT NOT NULL,
          quantity REAL NOT NULL,
          location_id TEXT NOT NULL,
          shelf_id TEXT,
          unit_of_measure_code TEXT,
          start_date TEXT NOT NULL,
          due_date TEXT NOT NULL,
          deadline_type TEXT NOT NULL,
          status TEXT NOT NULL DEFAULT 'Draft',
          created_by TEXT NOT NULL,
          created_at TEXT NOT NULL DEFAULT (datetime('now')),
          updated_by TEXT,
          updated_at TEXT,
          UNIQUE (job_id, company_id)
        );

        CREATE TABLE IF NOT EXISTS job_make_method (
          job_id TEXT PRIMARY KEY REFERENCES job(id) ON DELETE CASCADE,
          item_id TEXT NOT NULL,
          make_method_id TEXT NOT NULL,
          company_id TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS job_operation (
          id TEXT PRIMARY KEY,
          job_id TEXT NOT NULL REFERENCES job(id) ON DELETE CASCADE,
          company_id TEXT NOT NULL,
          operation_order INTEGER NOT NULL,
          description TEXT NOT NULL DEFAULT '',
          work_center_id TEXT,
          setup_time REAL NOT NULL DEFAULT 0,
          machine_time REAL NOT NULL DEFAULT 0,
          labor_time REAL NOT NULL DEFAULT 0,
          status TEXT NOT NULL DEFAULT 'Todo'
        );

        CREATE TABLE IF NOT EXISTS purchase_order (
          id TEXT PRIMARY KEY,
          purchase_order_id TEXT NOT NULL,
          company_id TEXT NOT NULL,
          supplier_id TEXT NOT NULL,
          status TEXT NOT NULL DEFAULT 'Draft',
          purchase_order_type TEXT NOT NULL DEFAULT 'Purchase',
          location_id TEXT,
          order_date TEXT NOT NULL,
          created_by TEXT NOT NULL,
          created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
          UNIQUE (purchase_order_id, company_id)
        );

        CREATE TABLE IF NOT EXISTS purchase_order_line (
          id TEXT PRIMARY KEY,
          purchase_order_id TEXT NOT NULL REFERENCES purchase_order(id) ON DELETE CASCADE,
          company_id TEXT NOT NULL,
          purchase_order_line_type TEXT NOT NULL,
          item_id TEXT NOT NULL,
          description TEXT NOT NULL DEFAULT '',
          purchase_quantity REAL NOT NULL,
          purchase_unit_of_measure_code TEXT,
          inventory_unit_of_measure_code TEXT,
          conversion_factor REAL NOT NULL DEFAULT 1,
          supplier_unit_price REAL NOT NULL DEFAULT 0,
          location_id TEXT,
          shelf_id TEXT,
          kanban_id TEXT,
          created_by TEXT NOT NULL,
          created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        );

        CREATE TABLE IF NOT EXISTS dispatch_event_outbox (
          event_id TEXT PRIMARY KEY,
          event_type TEXT NOT NULL,
          company_id TEXT NOT NULL,
          job_id TEXT NOT NULL,
          payload TEXT NOT NULL,
          status TEXT NOT NULL DEFAULT 'PENDING',
          retry_count INTEGER NOT NULL DEFAULT 0,
          max_retries INTEGER NOT NULL DEFAULT 3,
          created_at TEXT NOT NULL,
          started_at TEXT,
          completed_at TEXT,
          error_message TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_kanban_company ON kanban(company_id, id);
        CREATE INDEX IF NOT EXISTS idx_job_operation_job ON job_operation(job_id, operation_order);
        CREATE INDEX IF NOT EXISTS idx_purchase_order_supplier
          ON purchase_order(company_id, supplier_id, status);
        CREATE INDEX IF NOT EXISTS idx_purchase_order_line_order
          ON purchase_order_line(purchase_order_id);
        CREATE INDEX IF NOT EXISTS idx_outbox_status
          ON dispatch_event_outbox(status, created_at);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}
