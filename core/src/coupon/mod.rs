// shopflow/src/coupon/mod.rs

//! Promotional coupons: the persisted record, its validity rules, and the
//! admin-side draft/patch types.

pub mod validator;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CommerceError, Result};
use crate::money::is_valid_percentage;

pub use validator::{normalize_code, validate_coupon, CouponQuote, CouponRejection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus {
  Active,
  Inactive,
}

impl CouponStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      CouponStatus::Active => "active",
      CouponStatus::Inactive => "inactive",
    }
  }

  pub fn parse(raw: &str) -> Option<Self> {
    match raw {
      "active" => Some(CouponStatus::Active),
      "inactive" => Some(CouponStatus::Inactive),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
  pub id: Uuid,
  pub code: String,
  pub percentage: Decimal,
  pub status: CouponStatus,
  pub note: String,
  pub expiry_date: Option<DateTime<Utc>>,
  pub no_expiry: bool,
  pub usage_count: u32,
  /// Orders that consumed this coupon. Never holds the same id twice.
  pub order_ids: Vec<Uuid>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Coupon {
  /// Checks status and the activity window at `now`. The expiry instant
  /// itself is still valid.
  pub fn check(&self, now: DateTime<Utc>) -> std::result::Result<(), CouponRejection> {
    if self.status != CouponStatus::Active {
      return Err(CouponRejection::Inactive);
    }
    if self.no_expiry {
      return Ok(());
    }
    match self.expiry_date {
      Some(expiry) if now <= expiry => Ok(()),
      _ => Err(CouponRejection::Expired),
    }
  }

  pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
    self.check(now).is_ok()
  }

  /// Records that `order_id` consumed this coupon. Returns `false` and leaves
  /// the coupon untouched when the order was already recorded.
  pub fn record_usage(&mut self, order_id: Uuid) -> bool {
    if self.order_ids.contains(&order_id) {
      return false;
    }
    self.order_ids.push(order_id);
    self.usage_count += 1;
    true
  }

  pub fn total_orders(&self) -> usize {
    self.order_ids.len()
  }

  fn validate_fields(&self) -> Result<()> {
    let mut problems = Vec::new();
    if self.code.is_empty() {
      problems.push("code is required".to_string());
    }
    if !is_valid_percentage(self.percentage) {
      problems.push(format!("percentage must be between 0 and 100, got {}", self.percentage));
    }
    if !self.no_expiry && self.expiry_date.is_none() {
      problems.push("expiryDate is required unless noExpiry is set".to_string());
    }
    if problems.is_empty() {
      Ok(())
    } else {
      Err(CommerceError::Validation(format!("Validation error: {}", problems.join(" | "))))
    }
  }
}

/// Admin payload for creating a coupon.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponDraft {
  pub code: String,
  pub percentage: Decimal,
  #[serde(default)]
  pub status: Option<CouponStatus>,
  #[serde(default)]
  pub note: Option<String>,
  #[serde(default)]
  pub expiry_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub no_expiry: bool,
}

impl CouponDraft {
  pub fn into_coupon(self, now: DateTime<Utc>) -> Result<Coupon> {
    let coupon = Coupon {
      id: Uuid::new_v4(),
      code: normalize_code(&self.code),
      percentage: self.percentage,
      status: self.status.unwrap_or(CouponStatus::Active),
      note: self.note.unwrap_or_default(),
      expiry_date: if self.no_expiry { None } else { self.expiry_date },
      no_expiry: self.no_expiry,
      usage_count: 0,
      order_ids: Vec::new(),
      created_at: now,
      updated_at: now,
    };
    coupon.validate_fields()?;
    Ok(coupon)
  }
}

/// Partial admin update. Usage tracking fields are not editable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponPatch {
  pub code: Option<String>,
  pub percentage: Option<Decimal>,
  pub status: Option<CouponStatus>,
  pub note: Option<String>,
  pub expiry_date: Option<DateTime<Utc>>,
  pub no_expiry: Option<bool>,
}

impl CouponPatch {
  pub fn apply(self, coupon: &mut Coupon, now: DateTime<Utc>) -> Result<()> {
    if let Some(code) = self.code {
      coupon.code = normalize_code(&code);
    }
    if let Some(percentage) = self.percentage {
      coupon.percentage = percentage;
    }
    if let Some(status) = self.status {
      coupon.status = status;
    }
    if let Some(note) = self.note {
      coupon.note = note;
    }
    if let Some(expiry) = self.expiry_date {
      coupon.expiry_date = Some(expiry);
    }
    if let Some(no_expiry) = self.no_expiry {
      coupon.no_expiry = no_expiry;
    }
    if coupon.no_expiry {
      coupon.expiry_date = None;
    }
    coupon.updated_at = now;
    coupon.validate_fields()
  }
}

#[async_trait]
pub trait CouponStore: Send + Sync {
  async fn coupon(&self, id: Uuid) -> Result<Option<Coupon>>;

  /// Exact match on an already normalized code.
  async fn coupon_by_code(&self, code: &str) -> Result<Option<Coupon>>;

  /// Fails with `CommerceError::Duplicate` when the code is taken.
  async fn insert_coupon(&self, coupon: &Coupon) -> Result<()>;

  /// Writes the admin-editable fields only; `usage_count` and `order_ids` are
  /// owned by payment settlement and are never overwritten here.
  async fn update_coupon(&self, coupon: &Coupon) -> Result<()>;

  async fn delete_coupon(&self, id: Uuid) -> Result<bool>;

  /// Newest first.
  async fn list_coupons(&self) -> Result<Vec<Coupon>>;
}
