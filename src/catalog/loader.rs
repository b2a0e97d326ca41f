//! Load investment options from a catalog CSV

use super::{InvestmentOption, Liquidity, RiskLevel};
use crate::error::CatalogError;
use csv::Reader;
use std::path::Path;

/// Default path to the catalog file
pub const DEFAULT_CATALOG_PATH: &str = "data/investment_options.csv";

/// Raw CSV row matching investment_options.csv columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    id: u32,
    name: String,
    kind: String,
    institution: String,
    annual_rate_percent: f64,
    #[serde(default)]
    minimum_amount: f64,
    #[serde(default)]
    minimum_term_days: u32,
    risk_level: String,
    liquidity: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    affiliate_url: String,
    #[serde(default)]
    referral_commission: f64,
    #[serde(default)]
    featured: bool,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

impl CsvRow {
    fn into_option(self) -> Result<InvestmentOption, CatalogError> {
        let risk_level = RiskLevel::parse(&self.risk_level)
            .ok_or_else(|| CatalogError::UnknownRiskLevel(self.risk_level.clone()))?;
        let liquidity = Liquidity::parse(&self.liquidity)
            .ok_or_else(|| CatalogError::UnknownLiquidity(self.liquidity.clone()))?;

        Ok(InvestmentOption {
            id: self.id,
            name: self.name,
            kind: self.kind,
            institution: self.institution,
            annual_rate_percent: self.annual_rate_percent,
            minimum_amount: self.minimum_amount,
            minimum_term_days: self.minimum_term_days,
            risk_level,
            liquidity,
            description: self.description,
            affiliate_url: self.affiliate_url,
            referral_commission: self.referral_commission,
            featured: self.featured,
            active: self.active,
        })
    }
}

/// Load all options from a CSV file
pub fn load_options<P: AsRef<Path>>(path: P) -> Result<Vec<InvestmentOption>, CatalogError> {
    let reader = Reader::from_path(path)?;
    collect_options(reader)
}

/// Load options from any reader (e.g., string buffer, network stream)
pub fn load_options_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<Vec<InvestmentOption>, CatalogError> {
    collect_options(Reader::from_reader(reader))
}

fn collect_options<R: std::io::Read>(
    mut reader: Reader<R>,
) -> Result<Vec<InvestmentOption>, CatalogError> {
    let mut options = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        options.push(row.into_option()?);
    }

    log::debug!("loaded {} investment options", options.len());
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
id,name,kind,institution,annual_rate_percent,minimum_amount,minimum_term_days,risk_level,liquidity,description,featured,active
1,CETES 28 días,Gubernamental,CetesDirecto,11.25,100,28,muy_bajo,alta,Bonos del gobierno,true,true
2,Kuspit Diversificado,Fondo de inversión,Kuspit,18.0,100,0,medio,media,,false,false
";

    #[test]
    fn test_load_from_reader() {
        let options = load_options_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(options.len(), 2);

        let cetes = &options[0];
        assert_eq!(cetes.id, 1);
        assert_eq!(cetes.risk_level, RiskLevel::VeryLow);
        assert_eq!(cetes.liquidity, Liquidity::High);
        assert_eq!(cetes.minimum_term_days, 28);
        assert!(cetes.featured);

        assert!(!options[1].active);
        assert_eq!(options[1].description, "");
    }

    #[test]
    fn test_affiliate_columns_are_read() {
        let data = "\
id,name,kind,institution,annual_rate_percent,minimum_amount,minimum_term_days,risk_level,liquidity,description,affiliate_url,referral_commission,featured,active
3,GBM+ Smart Cash,Fondo de inversión,GBM+,12.8,1000,0,bajo,alta,,https://gbm.com/registro?ref=,200,false,true
";
        let options = load_options_from_reader(data.as_bytes()).unwrap();
        assert_eq!(options[0].affiliate_url, "https://gbm.com/registro?ref=");
        assert_eq!(options[0].referral_commission, 200.0);

        // Catalogs without the columns still load
        let options = load_options_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(options[0].affiliate_url, "");
        assert_eq!(options[0].referral_commission, 0.0);
    }

    #[test]
    fn test_unknown_risk_level_rejected() {
        let bad = "\
id,name,kind,institution,annual_rate_percent,minimum_amount,minimum_term_days,risk_level,liquidity,description,featured,active
9,Cripto,Especulativo,Exchange,40,1,0,extremo,alta,,false,true
";
        let err = load_options_from_reader(bad.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownRiskLevel(tag) if tag == "extremo"));
    }

    #[test]
    fn test_load_default_catalog_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CATALOG_PATH);
        let options = load_options(path).unwrap();
        assert_eq!(options, super::super::default_catalog());
    }
}
