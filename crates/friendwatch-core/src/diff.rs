//! Change detection between two snapshots.

use friendwatch_types::{Account, ChangeEvent, Snapshot};

/// Compare `current` against `previous` and return one event per account
/// whose count changed.
///
/// Events follow the order of `accounts`. Accounts missing from either
/// snapshot are skipped, and a first run never produces events since it
/// only establishes the baseline.
pub fn diff(
    accounts: &[Account],
    previous: &Snapshot,
    current: &Snapshot,
    first_run: bool,
) -> Vec<ChangeEvent> {
    if first_run {
        return Vec::new();
    }

    accounts
        .iter()
        .filter_map(|account| {
            let before = previous.get(&account.id)?;
            let after = current.get(&account.id)?;
            ChangeEvent::between(account.clone(), before, after)
        })
        .collect()
}
