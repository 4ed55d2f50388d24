// shopflow/src/coupon/validator.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{Coupon, CouponStore};
use crate::error::{CommerceError, Result};

/// Codes are stored trimmed and uppercased; lookups normalize the same way.
pub fn normalize_code(raw: &str) -> String {
  raw.trim().to_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponRejection {
  NotFound,
  Inactive,
  Expired,
}

impl CouponRejection {
  pub fn reason(self) -> &'static str {
    match self {
      CouponRejection::NotFound => "not found",
      CouponRejection::Inactive => "inactive",
      CouponRejection::Expired => "expired",
    }
  }
}

impl From<CouponRejection> for CommerceError {
  fn from(rejection: CouponRejection) -> Self {
    match rejection {
      CouponRejection::NotFound => CommerceError::NotFound("Invalid coupon code".to_string()),
      CouponRejection::Inactive => CommerceError::Validation("Coupon is inactive".to_string()),
      CouponRejection::Expired => CommerceError::Validation("Coupon has expired".to_string()),
    }
  }
}

/// What a shopper sees after a successful validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponQuote {
  pub id: Uuid,
  pub code: String,
  pub discount_percentage: Decimal,
  pub note: String,
  pub expiry_date: Option<DateTime<Utc>>,
  pub no_expiry: bool,
}

impl From<&Coupon> for CouponQuote {
  fn from(coupon: &Coupon) -> Self {
    Self {
      id: coupon.id,
      code: coupon.code.clone(),
      discount_percentage: coupon.percentage,
      note: coupon.note.clone(),
      expiry_date: if coupon.no_expiry { None } else { coupon.expiry_date },
      no_expiry: coupon.no_expiry,
    }
  }
}

/// Looks a code up and checks it is usable at `now`.
#[instrument(name = "coupon::validate", skip(store), fields(code = %raw_code))]
pub async fn validate_coupon(store: &dyn CouponStore, raw_code: &str, now: DateTime<Utc>) -> Result<CouponQuote> {
  let code = normalize_code(raw_code);
  if code.is_empty() {
    return Err(CommerceError::Validation("Coupon code is required".to_string()));
  }
  let coupon = store.coupon_by_code(&code).await?.ok_or(CouponRejection::NotFound)?;
  if let Err(rejection) = coupon.check(now) {
    debug!(reason = rejection.reason(), "Coupon rejected.");
    return Err(rejection.into());
  }
  Ok(CouponQuote::from(&coupon))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalizes_whitespace_and_case() {
    assert_eq!(normalize_code("  save10 "), "SAVE10");
    assert_eq!(normalize_code("Save10"), "SAVE10");
  }

  #[test]
  fn rejections_map_to_status_classes() {
    assert_eq!(CommerceError::from(CouponRejection::NotFound).status_code(), 404);
    assert_eq!(CommerceError::from(CouponRejection::Inactive).status_code(), 400);
    assert_eq!(CommerceError::from(CouponRejection::Expired).status_code(), 400);
  }
}
