// ==========================================
// 看板补货调度 - 采购路径 (Buy)
// ==========================================
// 流程:
// 1. 校验供应商
// 2. (按公司+供应商串行) 复用最早的未下达订单, 否则新建 Draft 订单
// 3. 并行: 物料 / 补货策略 / 供应商物料 / 默认货架
// 4. 追加订单行 (记录 kanban_id)
// 说明: 重复调度会重复追加订单行 (至少一次语义)
// ==========================================

use std::sync::Arc;

use crate::domain::item::{Item, ItemReplenishment, SupplierPart};
use crate::domain::kanban::Kanban;
use crate::domain::purchasing::{NewPurchaseOrder, NewPurchaseOrderLine, PurchaseOrder};
use crate::engine::blocking::run_blocking;
use crate::engine::context::DispatchContext;
use crate::engine::error::{DispatchError, DispatchResult};
use crate::engine::locks::DispatchLocks;
use crate::engine::redirect;
use crate::engine::repositories::DispatchRepositories;
use crate::repository::SequenceTable;

pub struct BuyPath {
    repos: DispatchRepositories,
    locks: Arc<DispatchLocks>,
}

impl BuyPath {
    pub fn new(repos: DispatchRepositories, locks: Arc<DispatchLocks>) -> Self {
        Self { repos, locks }
    }

    pub async fn run(&self, kanban: &Kanban, ctx: &DispatchContext) -> DispatchResult<String> {
        let supplier_id = kanban
            .supplier_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(DispatchError::MissingSupplier)?
            .to_string();

        let order = {
            let _guard = self
                .locks
                .acquire(&DispatchLocks::supplier_key(&ctx.company_id, &supplier_id))
                .await;
            self.find_or_create_order(kanban, &supplier_id, ctx).await?
        };

        self.append_line(kanban, &order, &supplier_id, ctx).await?;

        Ok(redirect::purchase_order_details(&order.id))
    }

    async fn find_or_create_order(
        &self,
        kanban: &Kanban,
        supplier_id: &str,
        ctx: &DispatchContext,
    ) -> DispatchResult<PurchaseOrder> {
        let po_repo = self.repos.purchase_order_repo.clone();
        let (company_id, supplier) = (ctx.company_id.clone(), supplier_id.to_string());
        let existing = run_blocking(move || po_repo.find_open_for_supplier(&company_id, &supplier)).await;

        match existing {
            Ok(Some(order)) => {
                tracing::info!(
                    kanban_id = %kanban.id,
                    purchase_order_id = %order.purchase_order_id,
                    "复用未下达采购订单"
                );
                return Ok(order);
            }
            Ok(None) => {}
            Err(e) => {
                // 查询失败时不新建, 避免重复订单
                tracing::error!(kanban_id = %kanban.id, supplier_id, error = %e, "未下达订单查询失败");
                return Err(DispatchError::PurchaseOrderCreateFailed);
            }
        }

        let sequence_repo = self.repos.sequence_repo.clone();
        let company_id = ctx.company_id.clone();
        let readable_id =
            match run_blocking(move || sequence_repo.next(SequenceTable::PurchaseOrder, &company_id)).await {
                Ok(Some(id)) => id,
                Ok(None) => {
                    tracing::error!(company_id = %ctx.company_id, "未配置采购订单序列号");
                    return Err(DispatchError::PurchaseOrderSequenceFailed);
                }
                Err(e) => {
                    tracing::error!(company_id = %ctx.company_id, error = %e, "采购订单序列号分配失败");
                    return Err(DispatchError::PurchaseOrderSequenceFailed);
                }
            };

        let new_order = NewPurchaseOrder {
            purchase_order_id: readable_id,
            company_id: ctx.company_id.clone(),
            supplier_id: supplier_id.to_string(),
            location_id: Some(kanban.location_id.clone()),
            order_date: ctx.today,
            created_by: ctx.user_id.clone(),
        };
        let po_repo = self.repos.purchase_order_repo.clone();
        match run_blocking(move || po_repo.insert(&new_order)).await {
            Ok(order) => {
                tracing::info!(
                    kanban_id = %kanban.id,
                    purchase_order_id = %order.purchase_order_id,
                    supplier_id,
                    "采购订单已创建"
                );
                Ok(order)
            }
            Err(e) => {
                tracing::error!(kanban_id = %kanban.id, error = %e, "采购订单创建失败");
                Err(DispatchError::PurchaseOrderCreateFailed)
            }
        }
    }

    async fn append_line(
        &self,
        kanban: &Kanban,
        order: &PurchaseOrder,
        supplier_id: &str,
        ctx: &DispatchContext,
    ) -> DispatchResult<()> {
        let (item, replenishment, supplier_part, default_shelf) = {
            let item_repo = self.repos.item_repo.clone();
            let (r1, r2, r3, r4) = (item_repo.clone(), item_repo.clone(), item_repo.clone(), item_repo);
            let item_id = kanban.item_id.clone();
            let company_id = ctx.company_id.clone();
            let (i1, i2, i3, i4) = (item_id.clone(), item_id.clone(), item_id.clone(), item_id);
            let (c1, c2, c3, c4) = (company_id.clone(), company_id.clone(), company_id.clone(), company_id);
            let supplier = supplier_id.to_string();
            let location_id = kanban.location_id.clone();

            tokio::join!(
                run_blocking(move || r1.find_item(&i1, &c1)),
                run_blocking(move || r2.find_replenishment(&i2, &c2)),
                run_blocking(move || r3.find_supplier_part(&i3, &supplier, &c3)),
                run_blocking(move || r4.find_default_shelf(&i4, &location_id, &c4)),
            )
        };

        let item = match item {
            Ok(Some(item)) => item,
            Ok(None) => {
                tracing::error!(kanban_id = %kanban.id, item_id = %kanban.item_id, "物料不存在");
                return Err(DispatchError::PurchaseOrderLineCreateFailed);
            }
            Err(e) => {
                tracing::error!(kanban_id = %kanban.id, item_id = %kanban.item_id, error = %e, "物料查询失败");
                return Err(DispatchError::PurchaseOrderLineCreateFailed);
            }
        };
        let replenishment = replenishment.unwrap_or_else(|e| {
            tracing::warn!(item_id = %kanban.item_id, error = %e, "补货策略查询失败，按未配置处理");
            None
        });
        let supplier_part = supplier_part.unwrap_or_else(|e| {
            tracing::warn!(item_id = %kanban.item_id, supplier_id, error = %e, "供应商物料查询失败，按未配置处理");
            None
        });
        let default_shelf = default_shelf.unwrap_or_else(|e| {
            tracing::warn!(item_id = %kanban.item_id, error = %e, "默认货架查询失败，按未配置处理");
            None
        });

        let line = build_line(
            kanban,
            order,
            &item,
            replenishment.as_ref(),
            supplier_part.as_ref(),
            default_shelf,
            ctx,
        );

        let po_repo = self.repos.purchase_order_repo.clone();
        match run_blocking(move || po_repo.insert_line(&line)).await {
            Ok(line) => {
                tracing::info!(
                    kanban_id = %kanban.id,
                    purchase_order_id = %order.purchase_order_id,
                    line_id = %line.id,
                    quantity = line.purchase_quantity,
                    unit_price = line.supplier_unit_price,
                    "采购订单行已追加"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(kanban_id = %kanban.id, error = %e, "采购订单行创建失败");
                Err(DispatchError::PurchaseOrderLineCreateFailed)
            }
        }
    }
}

/// 组装订单行
pub fn build_line(
    kanban: &Kanban,
    order: &PurchaseOrder,
    item: &Item,
    replenishment: Option<&ItemReplenishment>,
    supplier_part: Option<&SupplierPart>,
    default_shelf: Option<String>,
    ctx: &DispatchContext,
) -> NewPurchaseOrderLine {
    let purchase_unit_of_measure_code = first_non_blank([
        kanban.purchase_unit_of_measure_code.as_deref(),
        supplier_part.and_then(|p| p.supplier_unit_of_measure_code.as_deref()),
        replenishment.and_then(|r| r.purchasing_unit_of_measure_code.as_deref()),
        Some(item.unit_of_measure_code.as_str()),
    ]);

    NewPurchaseOrderLine {
        purchase_order_id: order.id.clone(),
        company_id: ctx.company_id.clone(),
        purchase_order_line_type: item.item_type.clone(),
        item_id: item.id.clone(),
        description: item.name.clone(),
        purchase_quantity: kanban.quantity,
        purchase_unit_of_measure_code,
        inventory_unit_of_measure_code: Some(item.unit_of_measure_code.clone()),
        conversion_factor: resolve_conversion_factor(
            kanban.conversion_factor,
            replenishment.and_then(|r| r.conversion_factor),
        ),
        supplier_unit_price: resolve_unit_price(
            supplier_part.and_then(|p| p.unit_price),
            item.unit_cost,
        ),
        location_id: Some(kanban.location_id.clone()),
        shelf_id: kanban.shelf_id.clone().or(default_shelf),
        kanban_id: Some(kanban.id.clone()),
        created_by: ctx.user_id.clone(),
    }
}

/// 单价: 供应商协议价 → 物料标准成本 → 0
pub fn resolve_unit_price(supplier_price: Option<f64>, item_unit_cost: Option<f64>) -> f64 {
    supplier_price.or(item_unit_cost).unwrap_or(0.0)
}

/// 换算系数: 看板 → 补货策略 → 1
pub fn resolve_conversion_factor(kanban_factor: Option<f64>, policy_factor: Option<f64>) -> f64 {
    kanban_factor.or(policy_factor).unwrap_or(1.0)
}

fn first_non_blank<const N: usize>(candidates: [Option<&str>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
