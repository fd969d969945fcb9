/// MyDataHelps platform integration module
///
/// This module handles authentication against the platform and the
/// authenticated administration API.
///
/// ## Authentication Flow
///
/// 1. Build a client assertion (`iss`/`sub` = service account, `aud` = token endpoint)
/// 2. Sign it with the service account's RSA private key (RS256)
/// 3. Exchange it at `/identityserver/connect/token` with a client-credentials request
/// 4. Use the returned bearer token for every administration API call in the run
pub mod client;
pub mod resources;
pub mod token;
pub mod types;

pub use client::MdhClient;
pub use resources::*;
pub use token::{AccessToken, Assertion, ServiceAccountCredential, TokenIssuer};
pub use types::{ApiError, MdhError};
