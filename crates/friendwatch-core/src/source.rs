//! The friend-count lookup seam.
//!
//! The runner implements [`FriendSource`] over HTTP; tests use scripted
//! stand-ins.

use friendwatch_types::{Account, FetchOutcome};

/// Retrieves the current friend count for one account.
///
/// Implementations classify every failure into
/// [`FetchOutcome::Unavailable`] rather than returning an error, so one bad
/// account can never abort the fan-out.
pub trait FriendSource {
    /// Fetch the friend count for `account` with a single attempt.
    fn fetch(&self, account: &Account) -> impl Future<Output = FetchOutcome> + Send;
}
