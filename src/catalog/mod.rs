//! Investment option catalog: records, risk filtering and storage access

mod option;
pub mod loader;

pub use option::{InvestmentOption, Liquidity, RiskLevel, RiskTolerance};
pub use loader::{load_options, load_options_from_reader, DEFAULT_CATALOG_PATH};

use std::cmp::Ordering;

/// Pick the options a goal plan is evaluated against.
///
/// Keeps active options admitted by `tolerance`, ordered by descending annual
/// rate (ties keep catalog order), and returns at most `limit` of them.
pub fn select_candidates(
    options: &[InvestmentOption],
    tolerance: RiskTolerance,
    limit: usize,
) -> Vec<InvestmentOption> {
    let mut eligible: Vec<InvestmentOption> = options
        .iter()
        .filter(|o| o.active && tolerance.admits(o.risk_level))
        .cloned()
        .collect();

    eligible.sort_by(|a, b| by_rate_desc(a, b));
    eligible.truncate(limit);
    eligible
}

fn by_rate_desc(a: &InvestmentOption, b: &InvestmentOption) -> Ordering {
    b.annual_rate_percent.total_cmp(&a.annual_rate_percent)
}

/// Read access to the option catalog
pub trait OptionRepository {
    /// Active options, featured first, then by descending annual rate
    fn list_active(&self) -> Vec<InvestmentOption>;

    /// A single active option
    fn get(&self, id: u32) -> Option<InvestmentOption>;
}

/// Catalog held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    options: Vec<InvestmentOption>,
}

impl InMemoryCatalog {
    pub fn new(options: Vec<InvestmentOption>) -> Self {
        Self { options }
    }

    /// Catalog seeded with the built-in products
    pub fn with_defaults() -> Self {
        Self::new(default_catalog())
    }

    /// Load the catalog from a CSV file
    pub fn from_csv_path(path: &std::path::Path) -> Result<Self, crate::error::CatalogError> {
        Ok(Self::new(load_options(path)?))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl OptionRepository for InMemoryCatalog {
    fn list_active(&self) -> Vec<InvestmentOption> {
        let mut active: Vec<InvestmentOption> =
            self.options.iter().filter(|o| o.active).cloned().collect();
        active.sort_by(|a, b| b.featured.cmp(&a.featured).then_with(|| by_rate_desc(a, b)));
        active
    }

    fn get(&self, id: u32) -> Option<InvestmentOption> {
        self.options.iter().find(|o| o.id == id && o.active).cloned()
    }
}

/// Built-in product catalog; `data/investment_options.csv` holds the same records
pub fn default_catalog() -> Vec<InvestmentOption> {
    vec![
        InvestmentOption {
            id: 1,
            name: "CETES 28 días".to_string(),
            kind: "Gubernamental".to_string(),
            institution: "CetesDirecto".to_string(),
            annual_rate_percent: 11.25,
            minimum_amount: 100.0,
            minimum_term_days: 28,
            risk_level: RiskLevel::VeryLow,
            liquidity: Liquidity::High,
            description: "Certificados de la Tesorería, respaldados por el gobierno.".to_string(),
            affiliate_url: "https://www.cetesdirecto.com/".to_string(),
            referral_commission: 0.0,
            featured: true,
            active: true,
        },
        InvestmentOption {
            id: 2,
            name: "Hey Banco".to_string(),
            kind: "Cuenta de ahorro".to_string(),
            institution: "Hey Banco".to_string(),
            annual_rate_percent: 15.0,
            minimum_amount: 1.0,
            minimum_term_days: 0,
            risk_level: RiskLevel::Low,
            liquidity: Liquidity::Immediate,
            description: "Cuenta digital con rendimientos diarios.".to_string(),
            affiliate_url: "https://www.heybanco.com/?ref=".to_string(),
            referral_commission: 100.0,
            featured: true,
            active: true,
        },
        InvestmentOption {
            id: 3,
            name: "GBM+ Smart Cash".to_string(),
            kind: "Fondo de inversión".to_string(),
            institution: "GBM+".to_string(),
            annual_rate_percent: 12.8,
            minimum_amount: 1000.0,
            minimum_term_days: 0,
            risk_level: RiskLevel::Low,
            liquidity: Liquidity::High,
            description: "Fondo de deuda gubernamental.".to_string(),
            affiliate_url: "https://gbm.com/registro?ref=".to_string(),
            referral_commission: 200.0,
            featured: false,
            active: true,
        },
        InvestmentOption {
            id: 4,
            name: "Kuspit Diversificado".to_string(),
            kind: "Fondo de inversión".to_string(),
            institution: "Kuspit".to_string(),
            annual_rate_percent: 18.0,
            minimum_amount: 100.0,
            minimum_term_days: 0,
            risk_level: RiskLevel::Medium,
            liquidity: Liquidity::Medium,
            description: "Cartera diversificada de deuda y renta variable.".to_string(),
            affiliate_url: "https://kuspit.com/registro?ref=".to_string(),
            referral_commission: 150.0,
            featured: true,
            active: true,
        },
        InvestmentOption {
            id: 5,
            name: "Nu Cuenta".to_string(),
            kind: "Cuenta de ahorro".to_string(),
            institution: "Nu México".to_string(),
            annual_rate_percent: 14.5,
            minimum_amount: 1.0,
            minimum_term_days: 0,
            risk_level: RiskLevel::Low,
            liquidity: Liquidity::Immediate,
            description: "Cuenta con rendimientos automáticos, sin comisiones.".to_string(),
            affiliate_url: "https://nu.com.mx/?ref=".to_string(),
            referral_commission: 50.0,
            featured: false,
            active: true,
        },
    ]
}
