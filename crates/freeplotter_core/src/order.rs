//! crates/freeplotter_core/src/order.rs
//!
//! License purchase orders: the price list, the quote shown before transfer,
//! and validation of the order form.

use crate::domain::{LicenseType, OrderReceipt, OrderSubmission, ReceiptImage};
use crate::ports::{PortError, PortResult};
use chrono::{DateTime, Months, Utc};

pub const NAME_LIMIT: usize = 200;
pub const MIN_DURATION_STEP: u8 = 1;
pub const MAX_DURATION_STEP: u8 = 7;

/// Range of the random amount added to a transfer so it can be matched to the order.
pub const UNIQUE_CODE_RANGE: std::ops::Range<u32> = 50..1000;

/// Months bought for each duration step.
const DURATION_MONTHS: [u32; 7] = [1, 3, 6, 12, 15, 18, 24];

/// Quotas and prices for one license type. Prices are in Indonesian rupiah.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LicenseTier {
    pub license_type: LicenseType,
    pub label: &'static str,
    pub max_story: u32,
    pub max_paragraph: u32,
    pub max_outline_generation: u32,
    pub base_price: u64,
    /// Bundle price per duration step; step 1 has none.
    bundles: [Option<u64>; 7],
}

pub const TIERS: [LicenseTier; 2] = [
    LicenseTier {
        license_type: LicenseType::Standard,
        label: "Standard",
        max_story: 12,
        max_paragraph: 20,
        max_outline_generation: 12,
        base_price: 35_000,
        bundles: [
            None,
            Some(100_000),
            Some(195_000),
            Some(395_000),
            Some(490_000),
            Some(585_000),
            Some(790_000),
        ],
    },
    LicenseTier {
        license_type: LicenseType::Premium,
        label: "Premium",
        max_story: 35,
        max_paragraph: 25,
        max_outline_generation: 30,
        base_price: 50_000,
        bundles: [
            None,
            Some(125_000),
            Some(265_000),
            Some(550_000),
            Some(695_000),
            Some(800_000),
            Some(1_000_000),
        ],
    },
];

pub fn tier(license_type: LicenseType) -> &'static LicenseTier {
    match license_type {
        LicenseType::Standard => &TIERS[0],
        LicenseType::Premium => &TIERS[1],
    }
}

fn step_index(duration_step: u8) -> PortResult<usize> {
    if !(MIN_DURATION_STEP..=MAX_DURATION_STEP).contains(&duration_step) {
        return Err(PortError::Validation(format!(
            "Duration must be between {} and {}",
            MIN_DURATION_STEP, MAX_DURATION_STEP
        )));
    }
    Ok(usize::from(duration_step - 1))
}

pub fn duration_months(duration_step: u8) -> PortResult<u32> {
    Ok(DURATION_MONTHS[step_index(duration_step)?])
}

/// Human-readable duration as shown on the order page.
pub fn duration_label(duration_step: u8) -> PortResult<String> {
    let months = duration_months(duration_step)?;
    let label = match duration_step {
        1..=3 => format!("{} bulan", months),
        5 => format!("{} tahun 3 bulan", months / 12),
        6 => format!("{} tahun 6 bulan", months / 12),
        _ => format!("{} tahun", months / 12),
    };
    Ok(label)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    /// Base price times months.
    pub list_price: u64,
    pub bundle_price: Option<u64>,
    pub unique_code: u32,
    /// What the buyer transfers: the bundle price if any, else the list price,
    /// plus the unique code.
    pub total: u64,
}

pub fn quote(license_type: LicenseType, duration_step: u8, unique_code: u32) -> PortResult<Quote> {
    let index = step_index(duration_step)?;
    let tier = tier(license_type);
    let list_price = tier.base_price * u64::from(DURATION_MONTHS[index]);
    let bundle_price = tier.bundles[index];
    let total = bundle_price.unwrap_or(list_price) + u64::from(unique_code);
    Ok(Quote {
        list_price,
        bundle_price,
        unique_code,
        total,
    })
}

/// Refuses a new order while the previous one is still on record.
pub fn ensure_no_pending_order(last_order: Option<&OrderReceipt>) -> PortResult<()> {
    match last_order {
        Some(_) => Err(PortError::Validation(
            "An order was already placed. Reset it before placing a new one.".to_string(),
        )),
        None => Ok(()),
    }
}

/// The order form as entered by the buyer.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub license_type: LicenseType,
    pub duration_step: u8,
    pub receipt: Option<ReceiptImage>,
}

impl OrderForm {
    /// Validates the form and prices it. The license starts at `now` and runs
    /// for the number of months of the chosen duration.
    pub fn into_submission(self, unique_code: u32, now: DateTime<Utc>) -> PortResult<OrderSubmission> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > NAME_LIMIT {
            return Err(PortError::Validation(format!(
                "Name is required and may be at most {} characters.",
                NAME_LIMIT
            )));
        }

        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(PortError::Validation(
                "A valid email address is required.".to_string(),
            ));
        }

        let receipt = self
            .receipt
            .filter(|receipt| !receipt.bytes.is_empty())
            .ok_or_else(|| PortError::Validation("Please attach the transfer receipt.".to_string()))?;

        let months = duration_months(self.duration_step)?;
        let price = quote(self.license_type, self.duration_step, unique_code)?.total;
        let end_date = now
            .checked_add_months(Months::new(months))
            .ok_or_else(|| PortError::Unexpected("License end date out of range".to_string()))?;

        let phone = self
            .phone
            .map(|phone| phone.trim().to_string())
            .filter(|phone| !phone.is_empty());

        Ok(OrderSubmission {
            name: name.to_string(),
            email: email.to_string(),
            phone,
            license_type: self.license_type,
            price,
            start_date: now,
            end_date,
            receipt,
        })
    }
}
