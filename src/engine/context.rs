// ==========================================
// 看板补货调度 - 请求上下文
// ==========================================
// 每次调度显式携带: 操作公司 / 操作人 / 业务日期
// ==========================================

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext {
    pub company_id: String,
    pub user_id: String,
    /// 业务日期（作业开工日 / 订单日期）
    pub today: NaiveDate,
}

impl DispatchContext {
    /// 以本地当天为业务日期
    pub fn new(company_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::with_today(company_id, user_id, chrono::Local::now().date_naive())
    }

    pub fn with_today(
        company_id: impl Into<String>,
        user_id: impl Into<String>,
        today: NaiveDate,
    ) -> Self {
        Self {
            company_id: company_id.into(),
            user_id: user_id.into(),
            today,
        }
    }
}
