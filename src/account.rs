//! Default-account discovery via the OAuth userinfo endpoint.
//!
//! The userinfo response lists every account the impersonated user belongs
//! to; the default-flagged one (or the first, when none is flagged) supplies
//! the account id and REST base URI all authenticated calls are made
//! against.

use serde::Deserialize;

/// Path segment appended to an account's base URI to reach the REST API.
pub(crate) const REST_API_PATH: &str = "/restapi";

#[derive(Debug, Deserialize)]
pub(crate) struct UserInfo {
    #[serde(default)]
    pub accounts: Vec<UserInfoAccount>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserInfoAccount {
    pub account_id: String,
    #[serde(default)]
    pub is_default: bool,
    pub base_uri: String,
}

/// Account identity and REST base URI resolved from userinfo.
///
/// Computed once per client instance; constructing a new client is the only
/// way to invalidate it.
#[derive(Debug, Clone)]
pub struct ResolvedAccount {
    /// The account identifier used in REST paths.
    pub account_id: String,

    /// Fully-qualified REST base URI (`{base_uri}/restapi`).
    pub rest_base_uri: String,
}

/// Pick the default account, falling back to the first.
pub(crate) fn select_account(info: UserInfo) -> Option<ResolvedAccount> {
    let index = info.accounts.iter().position(|a| a.is_default).unwrap_or(0);
    info.accounts.into_iter().nth(index).map(|account| ResolvedAccount {
        account_id: account.account_id,
        rest_base_uri: format!("{}{}", account.base_uri.trim_end_matches('/'), REST_API_PATH),
    })
}
