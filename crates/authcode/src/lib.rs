//! OAuth2 authorization code grant for a confidential client
//!
//! Covers the two protocol interactions the client initiates:
//! 1. Build the authorization request URL the user agent is redirected to
//!    (`authorize::build_authorization_url`)
//! 2. Exchange the returned code at the token endpoint using HTTP Basic
//!    client authentication (`token::TokenExchanger::exchange_code`)
//!
//! The crate has no dependency on the HTTP service that drives it.

pub mod authorize;
pub mod constants;
pub mod error;
pub mod token;

pub use authorize::build_authorization_url;
pub use constants::*;
pub use error::{Error, Result};
pub use token::{ClientCredentials, TokenExchanger, TokenResponse};
