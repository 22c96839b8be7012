// ==========================================
// 看板补货调度 - 领域类型定义
// ==========================================
// 说明: 状态值与数据库文本保持一致 (as_str / FromStr 互逆)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 补货方式 (Replenishment System)
// ==========================================
// Make = 自制, Buy = 采购; 其余取值原样保留, 由调度入口拒绝
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplenishmentSystem {
    Make,
    Buy,
    Other(String),
}

impl ReplenishmentSystem {
    /// 从数据库文本解析（不会失败）
    pub fn parse(value: &str) -> Self {
        match value {
            "Make" => ReplenishmentSystem::Make,
            "Buy" => ReplenishmentSystem::Buy,
            other => ReplenishmentSystem::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ReplenishmentSystem::Make => "Make",
            ReplenishmentSystem::Buy => "Buy",
            ReplenishmentSystem::Other(value) => value.as_str(),
        }
    }
}

impl fmt::Display for ReplenishmentSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 作业状态 (Job Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Draft,
    Planned,
    Ready,
    InProgress,
    Paused,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "Draft",
            JobStatus::Planned => "Planned",
            JobStatus::Ready => "Ready",
            JobStatus::InProgress => "In Progress",
            JobStatus::Paused => "Paused",
            JobStatus::Completed => "Completed",
            JobStatus::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(JobStatus::Draft),
            "Planned" => Ok(JobStatus::Planned),
            "Ready" => Ok(JobStatus::Ready),
            "In Progress" => Ok(JobStatus::InProgress),
            "Paused" => Ok(JobStatus::Paused),
            "Completed" => Ok(JobStatus::Completed),
            "Cancelled" => Ok(JobStatus::Cancelled),
            other => Err(format!("未知作业状态: {}", other)),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 工序状态 (Job Operation Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobOperationStatus {
    Todo,
    Ready,
    Waiting,
    InProgress,
    Paused,
    Done,
    Canceled,
}

impl JobOperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobOperationStatus::Todo => "Todo",
            JobOperationStatus::Ready => "Ready",
            JobOperationStatus::Waiting => "Waiting",
            JobOperationStatus::InProgress => "In Progress",
            JobOperationStatus::Paused => "Paused",
            JobOperationStatus::Done => "Done",
            JobOperationStatus::Canceled => "Canceled",
        }
    }

    /// 已完成或已取消的工序不再视为活动工序
    pub fn is_active(&self) -> bool {
        !matches!(self, JobOperationStatus::Done | JobOperationStatus::Canceled)
    }
}

impl FromStr for JobOperationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Todo" => Ok(JobOperationStatus::Todo),
            "Ready" => Ok(JobOperationStatus::Ready),
            "Waiting" => Ok(JobOperationStatus::Waiting),
            "In Progress" => Ok(JobOperationStatus::InProgress),
            "Paused" => Ok(JobOperationStatus::Paused),
            "Done" => Ok(JobOperationStatus::Done),
            "Canceled" => Ok(JobOperationStatus::Canceled),
            other => Err(format!("未知工序状态: {}", other)),
        }
    }
}

impl fmt::Display for JobOperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 采购订单状态 (Purchase Order Status)
// ==========================================
// Draft / Planned 视为"未下达", 看板采购需求可追加到此类订单
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderStatus {
    Draft,
    Planned,
    ToReview,
    ToReceive,
    ToReceiveAndInvoice,
    ToInvoice,
    Completed,
    Closed,
    Rejected,
}

impl PurchaseOrderStatus {
    /// 可复用的未下达状态
    pub const OPEN: [PurchaseOrderStatus; 2] =
        [PurchaseOrderStatus::Planned, PurchaseOrderStatus::Draft];

    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Draft => "Draft",
            PurchaseOrderStatus::Planned => "Planned",
            PurchaseOrderStatus::ToReview => "To Review",
            PurchaseOrderStatus::ToReceive => "To Receive",
            PurchaseOrderStatus::ToReceiveAndInvoice => "To Receive and Invoice",
            PurchaseOrderStatus::ToInvoice => "To Invoice",
            PurchaseOrderStatus::Completed => "Completed",
            PurchaseOrderStatus::Closed => "Closed",
            PurchaseOrderStatus::Rejected => "Rejected",
        }
    }

    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }
}

impl FromStr for PurchaseOrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(PurchaseOrderStatus::Draft),
            "Planned" => Ok(PurchaseOrderStatus::Planned),
            "To Review" => Ok(PurchaseOrderStatus::ToReview),
            "To Receive" => Ok(PurchaseOrderStatus::ToReceive),
            "To Receive and Invoice" => Ok(PurchaseOrderStatus::ToReceiveAndInvoice),
            "To Invoice" => Ok(PurchaseOrderStatus::ToInvoice),
            "Completed" => Ok(PurchaseOrderStatus::Completed),
            "Closed" => Ok(PurchaseOrderStatus::Closed),
            "Rejected" => Ok(PurchaseOrderStatus::Rejected),
            other => Err(format!("未知采购订单状态: {}", other)),
        }
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 工序开工模式 (Operation Start Mode)
// ==========================================
// 优先级: Setup > Machine > Labor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStartMode {
    Setup,
    Machine,
    Labor,
}

impl OperationStartMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStartMode::Setup => "Setup",
            OperationStartMode::Machine => "Machine",
            OperationStartMode::Labor => "Labor",
        }
    }
}

impl fmt::Display for OperationStartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replenishment_system_parse() {
        assert_eq!(ReplenishmentSystem::parse("Make"), ReplenishmentSystem::Make);
        assert_eq!(ReplenishmentSystem::parse("Buy"), ReplenishmentSystem::Buy);

        // 未知取值原样保留，用于错误消息
        let other = ReplenishmentSystem::parse("Transfer");
        assert_eq!(other, ReplenishmentSystem::Other("Transfer".to_string()));
        assert_eq!(other.to_string(), "Transfer");
    }

    #[test]
    fn test_status_text_round_trip() {
        for status in [JobStatus::Draft, JobStatus::InProgress, JobStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("Unknown".parse::<JobStatus>().is_err());
        assert_eq!(
            "To Receive and Invoice".parse::<PurchaseOrderStatus>().unwrap(),
            PurchaseOrderStatus::ToReceiveAndInvoice
        );
    }

    #[test]
    fn test_open_purchase_order_status() {
        assert!(PurchaseOrderStatus::Draft.is_open());
        assert!(PurchaseOrderStatus::Planned.is_open());
        assert!(!PurchaseOrderStatus::ToReceive.is_open());
        assert!(!PurchaseOrderStatus::Closed.is_open());
    }

    #[test]
    fn test_operation_status_active() {
        assert!(JobOperationStatus::Todo.is_active());
        assert!(JobOperationStatus::InProgress.is_active());
        assert!(!JobOperationStatus::Done.is_active());
        assert!(!JobOperationStatus::Canceled.is_active());
    }
}
