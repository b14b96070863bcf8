//! Where a page controller wants the host to go next. Executing the
//! navigation is left to the host.

use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Login,
    EditAccount,
    PostListing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    To(Page),
}

/// Result of opening a gated page.
#[derive(Debug)]
pub enum Gate<T> {
    Open(T),
    Redirect(Page),
}
