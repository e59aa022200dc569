use serde::{Deserialize, Serialize};

/// Financial summary from `/info`. Values are display strings; missing ones hold the placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub company_name: String,
    pub market_cap: String,
    pub revenues: String,
    pub gross_profit: String,
    pub net_income: String,
    pub operating_cash_flows: String,
}

impl CompanyInfo {
    pub fn display_rows(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Company name", self.company_name.as_str()),
            ("Market cap", self.market_cap.as_str()),
            ("Revenues", self.revenues.as_str()),
            ("Gross Profit", self.gross_profit.as_str()),
            ("Net Income", self.net_income.as_str()),
            ("Operating Cash Flows", self.operating_cash_flows.as_str()),
        ]
    }
}
