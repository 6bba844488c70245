//! Ledger domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use meridian_shared::types::{AccountId, Currency, TransactionId, UserId};

/// Monetary account types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Day-to-day checking account.
    Checking,
    /// Interest-bearing savings account.
    Savings,
    /// Credit line account.
    Credit,
    /// Crypto-style wallet.
    Wallet,
}

impl AccountKind {
    /// Parses an account kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "checking" => Some(Self::Checking),
            "savings" => Some(Self::Savings),
            "credit" => Some(Self::Credit),
            "wallet" => Some(Self::Wallet),
            _ => None,
        }
    }

    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::Credit => "credit",
            Self::Wallet => "wallet",
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer's monetary account.
///
/// Invariant: `available_balance <= balance`, and a workflow-initiated debit
/// never drives `balance` negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Owning user.
    pub owner: UserId,
    /// Account type.
    pub kind: AccountKind,
    /// Account currency.
    pub currency: Currency,
    /// Settled balance.
    pub balance: Decimal,
    /// Balance available for outbound transactions.
    pub available_balance: Decimal,
}

impl Account {
    /// Creates a new account with equal settled and available balances.
    #[must_use]
    pub fn new(owner: UserId, kind: AccountKind, currency: Currency, balance: Decimal) -> Self {
        Self {
            id: AccountId::new(),
            owner,
            kind,
            currency,
            balance,
            available_balance: balance,
        }
    }

    /// Returns true if `amount` is covered by the available balance.
    #[must_use]
    pub fn has_available(&self, amount: Decimal) -> bool {
        self.available_balance >= amount
    }
}

/// Idempotency key for a ledger mutation.
///
/// A transaction settles under `Settlement(id)` and unwinds under
/// `Reversal(id)`; each key applies its effect at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKey {
    /// Settlement of an approved transaction.
    Settlement(TransactionId),
    /// Reversal of a settled transaction.
    Reversal(TransactionId),
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Settlement(id) => write!(f, "stl-{id}"),
            Self::Reversal(id) => write!(f, "rev-{id}"),
        }
    }
}

/// One account's balance update inside an atomic commit.
///
/// `expected_balance` carries the balance the caller computed from; the
/// store rejects the whole commit if it no longer matches, which keeps
/// read-compute-write linearizable without holding locks across awaits.
#[derive(Debug, Clone)]
pub struct BalanceWrite {
    /// Account being written.
    pub account_id: AccountId,
    /// Balance the caller read before computing the update.
    pub expected_balance: Decimal,
    /// New settled balance.
    pub new_balance: Decimal,
    /// New available balance.
    pub new_available: Decimal,
}

/// Outcome of an atomic commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The writes were applied.
    Applied,
    /// The key was seen before; nothing changed.
    AlreadyApplied,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_account_kind_parse() {
        assert_eq!(AccountKind::parse("checking"), Some(AccountKind::Checking));
        assert_eq!(AccountKind::parse("SAVINGS"), Some(AccountKind::Savings));
        assert_eq!(AccountKind::parse("wallet"), Some(AccountKind::Wallet));
        assert_eq!(AccountKind::parse("bond"), None);
    }

    #[test]
    fn test_new_account_available_equals_balance() {
        let account = Account::new(
            UserId::new(),
            AccountKind::Checking,
            Currency::Usd,
            dec!(1000),
        );
        assert_eq!(account.balance, account.available_balance);
        assert!(account.has_available(dec!(1000)));
        assert!(!account.has_available(dec!(1000.01)));
    }

    #[test]
    fn test_entry_keys_are_distinct_per_direction() {
        let id = TransactionId::new();
        assert_ne!(EntryKey::Settlement(id), EntryKey::Reversal(id));
        assert!(EntryKey::Settlement(id).to_string().starts_with("stl-"));
        assert!(EntryKey::Reversal(id).to_string().starts_with("rev-"));
    }
}
