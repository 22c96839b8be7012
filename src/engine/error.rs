// ==========================================
// 看板补货调度 - 调度错误类型
// ==========================================
// Display 文案即返回给前端的错误消息（英文原文，不做本地化）
// code() 为稳定错误码，仅用于日志
// ==========================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Kanban is not active")]
    KanbanNotActive,

    #[error("{0} is not supported")]
    UnsupportedSystem(String),

    // ===== 自制路径 =====
    #[error("Failed to create job")]
    JobCreateFailed,

    #[error("Failed to associate kanban with job")]
    KanbanLinkFailed,

    // ===== 采购路径 =====
    #[error("Kanban does not have a supplier")]
    MissingSupplier,

    #[error("Failed to get next purchase order sequence")]
    PurchaseOrderSequenceFailed,

    #[error("Failed to create purchase order")]
    PurchaseOrderCreateFailed,

    #[error("Failed to create purchase order line")]
    PurchaseOrderLineCreateFailed,
}

impl DispatchError {
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::KanbanNotActive => "KANBAN_NOT_ACTIVE",
            DispatchError::UnsupportedSystem(_) => "UNSUPPORTED_REPLENISHMENT_SYSTEM",
            DispatchError::JobCreateFailed => "JOB_CREATE_FAILED",
            DispatchError::KanbanLinkFailed => "KANBAN_LINK_FAILED",
            DispatchError::MissingSupplier => "MISSING_SUPPLIER",
            DispatchError::PurchaseOrderSequenceFailed => "PO_SEQUENCE_FAILED",
            DispatchError::PurchaseOrderCreateFailed => "PO_CREATE_FAILED",
            DispatchError::PurchaseOrderLineCreateFailed => "PO_LINE_CREATE_FAILED",
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_exact() {
        assert_eq!(DispatchError::KanbanNotActive.to_string(), "Kanban is not active");
        assert_eq!(
            DispatchError::UnsupportedSystem("Transfer".to_string()).to_string(),
            "Transfer is not supported"
        );
        assert_eq!(DispatchError::JobCreateFailed.to_string(), "Failed to create job");
        assert_eq!(
            DispatchError::KanbanLinkFailed.to_string(),
            "Failed to associate kanban with job"
        );
        assert_eq!(
            DispatchError::MissingSupplier.to_string(),
            "Kanban does not have a supplier"
        );
        assert_eq!(
            DispatchError::PurchaseOrderSequenceFailed.to_string(),
            "Failed to get next purchase order sequence"
        );
        assert_eq!(
            DispatchError::PurchaseOrderCreateFailed.to_string(),
            "Failed to create purchase order"
        );
        assert_eq!(
            DispatchError::PurchaseOrderLineCreateFailed.to_string(),
            "Failed to create purchase order line"
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(DispatchError::KanbanNotActive.code(), "KANBAN_NOT_ACTIVE");
        assert_eq!(
            DispatchError::UnsupportedSystem(String::new()).code(),
            "UNSUPPORTED_REPLENISHMENT_SYSTEM"
        );
    }
}
