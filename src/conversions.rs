//! Referral click tracking for affiliate commissions
//!
//! Every click on an institution's referral link is stored as a conversion in
//! `Click` state. The link handed back to the client carries the institution,
//! user and conversion id so the institution can report the sign-up later.

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::OptionRepository;
use crate::error::ConversionError;

/// Lifecycle of a referral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    Pending,
    Click,
    Completed,
}

impl ConversionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionStatus::Pending => "pendiente",
            ConversionStatus::Click => "click",
            ConversionStatus::Completed => "completado",
        }
    }
}

/// One referral of a user to a catalog option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub id: u64,
    pub user_id: u64,
    pub option_id: u32,
    /// Amount the user said they intend to invest
    pub estimated_amount: Option<f64>,
    pub status: ConversionStatus,
    /// Paid out once the institution confirms the account
    pub commission_earned: f64,
    pub clicked_at: DateTime<Utc>,
    pub converted_at: Option<DateTime<Utc>>,
}

/// Returned to the client after a click is recorded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickReceipt {
    pub conversion_id: u64,
    pub affiliate_url: String,
}

/// Per-user referral totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConversionStats {
    pub total_conversions: usize,
    /// Commission from completed conversions only
    pub total_earned: f64,
}

pub trait ConversionStore {
    /// Store a new conversion in `Click` state and return it with its id
    fn record(
        &self,
        user_id: u64,
        option_id: u32,
        estimated_amount: Option<f64>,
    ) -> Result<Conversion, ConversionError>;

    /// Mark a conversion as completed with the commission the institution paid
    fn complete(&self, conversion_id: u64, commission: f64) -> Result<Conversion, ConversionError>;

    /// Conversions of a user, newest first
    fn list_for_user(&self, user_id: u64) -> Result<Vec<Conversion>, ConversionError>;

    fn stats_for_user(&self, user_id: u64) -> Result<ConversionStats, ConversionError>;

    /// Conversions across all users
    fn count(&self) -> Result<usize, ConversionError>;
}

#[derive(Debug, Default)]
struct ConversionTable {
    next_id: u64,
    rows: BTreeMap<u64, Conversion>,
}

/// Conversion store held in memory, shareable across request handlers
#[derive(Debug, Default)]
pub struct InMemoryConversionStore {
    table: RwLock<ConversionTable>,
}

impl InMemoryConversionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversionStore for InMemoryConversionStore {
    fn record(
        &self,
        user_id: u64,
        option_id: u32,
        estimated_amount: Option<f64>,
    ) -> Result<Conversion, ConversionError> {
        let mut table = self.table.write().map_err(|_| ConversionError::Poisoned)?;
        table.next_id += 1;
        let id = table.next_id;

        let conversion = Conversion {
            id,
            user_id,
            option_id,
            estimated_amount,
            status: ConversionStatus::Click,
            commission_earned: 0.0,
            clicked_at: Utc::now(),
            converted_at: None,
        };
        table.rows.insert(id, conversion.clone());
        Ok(conversion)
    }

    fn complete(&self, conversion_id: u64, commission: f64) -> Result<Conversion, ConversionError> {
        if !commission.is_finite() || commission < 0.0 {
            return Err(ConversionError::Invalid(format!(
                "commission must be zero or positive, got {}",
                commission
            )));
        }

        let mut table = self.table.write().map_err(|_| ConversionError::Poisoned)?;
        let conversion = table.rows.get_mut(&conversion_id).ok_or_else(|| {
            ConversionError::Invalid(format!("conversion {} does not exist", conversion_id))
        })?;

        if conversion.status != ConversionStatus::Completed {
            conversion.converted_at = Some(Utc::now());
        }
        conversion.status = ConversionStatus::Completed;
        conversion.commission_earned = commission;
        Ok(conversion.clone())
    }

    fn list_for_user(&self, user_id: u64) -> Result<Vec<Conversion>, ConversionError> {
        let table = self.table.read().map_err(|_| ConversionError::Poisoned)?;
        Ok(table
            .rows
            .values()
            .rev()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    fn stats_for_user(&self, user_id: u64) -> Result<ConversionStats, ConversionError> {
        let table = self.table.read().map_err(|_| ConversionError::Poisoned)?;
        Ok(table
            .rows
            .values()
            .filter(|c| c.user_id == user_id)
            .fold(ConversionStats::default(), |mut stats, c| {
                stats.total_conversions += 1;
                if c.status == ConversionStatus::Completed {
                    stats.total_earned += c.commission_earned;
                }
                stats
            }))
    }

    fn count(&self) -> Result<usize, ConversionError> {
        let table = self.table.read().map_err(|_| ConversionError::Poisoned)?;
        Ok(table.rows.len())
    }
}

/// Record a click on an option's referral link and build the tracked link.
///
/// A zero estimate is stored as no estimate.
pub fn record_click(
    store: &dyn ConversionStore,
    catalog: &dyn OptionRepository,
    user_id: u64,
    option_id: u32,
    estimated_amount: Option<f64>,
) -> Result<ClickReceipt, ConversionError> {
    if let Some(amount) = estimated_amount {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ConversionError::Invalid(format!(
                "estimated amount must be zero or positive, got {}",
                amount
            )));
        }
    }
    let option = catalog
        .get(option_id)
        .ok_or(ConversionError::OptionNotFound(option_id))?;

    let estimated_amount = estimated_amount.filter(|amount| *amount > 0.0);
    let conversion = store.record(user_id, option.id, estimated_amount)?;

    log::info!(
        "user {} clicked referral for option {} (conversion {})",
        user_id,
        option.id,
        conversion.id
    );

    Ok(ClickReceipt {
        conversion_id: conversion.id,
        affiliate_url: option.affiliate_link(user_id, conversion.id),
    })
}
