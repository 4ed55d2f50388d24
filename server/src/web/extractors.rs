// shopflow_server/src/web/extractors.rs

//! Principal extraction. Identity is asserted by a trusted upstream through
//! `X-User-ID` and `X-User-Role`; this service does not authenticate.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  Customer,
  Admin,
}

impl Role {
  fn parse(raw: &str) -> Option<Self> {
    match raw.trim().to_ascii_lowercase().as_str() {
      "customer" => Some(Role::Customer),
      "admin" => Some(Role::Admin),
      _ => None,
    }
  }

  fn as_str(self) -> &'static str {
    match self {
      Role::Customer => "customer",
      Role::Admin => "admin",
    }
  }
}

/// Any authenticated principal.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub role: Role,
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
  req.headers().get(name).and_then(|v| v.to_str().ok())
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
  let user_id = header(req, USER_ID_HEADER)
    .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
    .ok_or_else(|| {
      warn!("Missing or invalid {USER_ID_HEADER} header.");
      AppError::unauthorized("Authentication required")
    })?;
  // No role header means an ordinary customer.
  let role = match header(req, USER_ROLE_HEADER) {
    None => Role::Customer,
    Some(raw) => Role::parse(raw).ok_or_else(|| {
      warn!(role = raw, "Unknown {USER_ROLE_HEADER} value.");
      AppError::unauthorized("Authentication required")
    })?,
  };
  Ok(AuthenticatedUser { user_id, role })
}

fn require(req: &HttpRequest, role: Role) -> Result<AuthenticatedUser, AppError> {
  let user = authenticate(req)?;
  if user.role != role {
    warn!(user_id = %user.user_id, required = role.as_str(), actual = user.role.as_str(), "Role check failed.");
    return Err(AppError::forbidden(format!("This action requires the {} role", role.as_str())));
  }
  Ok(user)
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(authenticate(req))
  }
}

/// Principal holding the `customer` role.
#[derive(Debug, Clone, Copy)]
pub struct CustomerUser(pub AuthenticatedUser);

impl FromRequest for CustomerUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(require(req, Role::Customer).map(CustomerUser))
  }
}

/// Principal holding the `admin` role.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(require(req, Role::Admin).map(AdminUser))
  }
}
