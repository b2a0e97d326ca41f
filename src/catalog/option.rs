//! Investment option records as listed in the comparison catalog

use serde::{Deserialize, Serialize};

/// Risk level of an investment product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Parse the catalog tag (`muy_bajo`, `bajo`, `medio`, `alto`) or its English form
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim() {
            "muy_bajo" | "very_low" => Some(RiskLevel::VeryLow),
            "bajo" | "low" => Some(RiskLevel::Low),
            "medio" | "medium" => Some(RiskLevel::Medium),
            "alto" | "high" => Some(RiskLevel::High),
            _ => None,
        }
    }

    /// Tag used in API payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "muy_bajo",
            RiskLevel::Low => "bajo",
            RiskLevel::Medium => "medio",
            RiskLevel::High => "alto",
        }
    }
}

/// How quickly money can be withdrawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liquidity {
    Immediate,
    High,
    Medium,
    Low,
}

impl Liquidity {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim() {
            "inmediata" | "immediate" => Some(Liquidity::Immediate),
            "alta" | "high" => Some(Liquidity::High),
            "media" | "medium" => Some(Liquidity::Medium),
            "baja" | "low" => Some(Liquidity::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Liquidity::Immediate => "inmediata",
            Liquidity::High => "alta",
            Liquidity::Medium => "media",
            Liquidity::Low => "baja",
        }
    }
}

/// User-selected risk tolerance used to filter candidate options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTolerance {
    /// Very low and low risk options
    Low,
    /// Low and medium risk options
    Medium,
    /// No filter
    Any,
}

impl RiskTolerance {
    /// `bajo` and `medio` select a filter; anything else (or nothing) means no filter
    pub fn parse(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            Some("bajo") | Some("low") => RiskTolerance::Low,
            Some("medio") | Some("medium") => RiskTolerance::Medium,
            _ => RiskTolerance::Any,
        }
    }

    /// Whether an option with this risk level is eligible
    pub fn admits(&self, level: RiskLevel) -> bool {
        match self {
            RiskTolerance::Low => matches!(level, RiskLevel::VeryLow | RiskLevel::Low),
            RiskTolerance::Medium => matches!(level, RiskLevel::Low | RiskLevel::Medium),
            RiskTolerance::Any => true,
        }
    }
}

/// A single investment product from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentOption {
    /// Catalog identifier
    pub id: u32,

    pub name: String,

    /// Product type (government bond, savings account, fund, ...)
    pub kind: String,

    pub institution: String,

    /// Nominal annual rate in percent
    pub annual_rate_percent: f64,

    /// Smallest amount accepted by the institution
    pub minimum_amount: f64,

    pub minimum_term_days: u32,

    pub risk_level: RiskLevel,

    pub liquidity: Liquidity,

    #[serde(default)]
    pub description: String,

    /// Referral link prefix; the tracking suffix is appended per click
    #[serde(default)]
    pub affiliate_url: String,

    /// Commission paid by the institution per referred customer
    #[serde(default)]
    pub referral_commission: f64,

    /// Featured products are listed first
    #[serde(default)]
    pub featured: bool,

    /// Inactive products are hidden from listings and plans
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl InvestmentOption {
    /// Create an active, non-featured option
    pub fn new(
        id: u32,
        name: &str,
        institution: &str,
        annual_rate_percent: f64,
        risk_level: RiskLevel,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind: String::new(),
            institution: institution.to_string(),
            annual_rate_percent,
            minimum_amount: 0.0,
            minimum_term_days: 0,
            risk_level,
            liquidity: Liquidity::High,
            description: String::new(),
            affiliate_url: String::new(),
            referral_commission: 0.0,
            featured: false,
            active: true,
        }
    }

    /// Referral link for one recorded click: `{affiliate_url}{institution}_{user}_{conversion}`
    pub fn affiliate_link(&self, user_id: u64, conversion_id: u64) -> String {
        format!(
            "{}{}_{}_{}",
            self.affiliate_url,
            self.institution.to_lowercase(),
            user_id,
            conversion_id
        )
    }
}
