//! Account and currency type definitions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// User identifier (zero-cost wrapper).
///
/// The newtype prevents mixing user ids with deposit ids or raw integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Creates a new user id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the inner value.
    #[inline]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// The two currencies an account holds.
///
/// Yield accrues and commissions cascade in [`Currency::Token`]; the
/// settlement currency [`Currency::Usdt`] is credited by boost purchases and
/// debited by withdrawals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// Principal-yield currency.
    Token,
    /// Secondary settlement currency.
    Usdt,
}

impl Currency {
    /// Canonical lowercase code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Token => "token",
            Currency::Usdt => "usdt",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One account per user, holding a non-negative balance per currency.
///
/// Balances are mutated only through atomic transactional credits; nothing in
/// the engine ever reads a balance and writes it back outside a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Owning user.
    pub user: UserId,
    /// Referral code other users register with.
    pub ref_code: String,
    /// Yield-currency balance.
    pub token_balance: Decimal,
    /// Settlement-currency balance.
    pub usdt_balance: Decimal,
    /// Creation timestamp, milliseconds since the Unix epoch.
    pub created_at_ms: i64,
}

impl Account {
    /// Creates an account with zero balances.
    pub fn new(user: UserId, ref_code: impl Into<String>, created_at_ms: i64) -> Self {
        Self {
            user,
            ref_code: ref_code.into(),
            token_balance: Decimal::ZERO,
            usdt_balance: Decimal::ZERO,
            created_at_ms,
        }
    }

    /// Returns the balance held in `currency`.
    #[inline]
    pub fn balance(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Token => self.token_balance,
            Currency::Usdt => self.usdt_balance,
        }
    }

    /// Returns a mutable reference to the balance held in `currency`.
    /// Store-internal: only transaction code may call this.
    pub(crate) fn balance_mut(&mut self, currency: Currency) -> &mut Decimal {
        match currency {
            Currency::Token => &mut self.token_balance,
            Currency::Usdt => &mut self.usdt_balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_account_has_zero_balances() {
        let acc = Account::new(UserId::new(1), "ref-1", 1_700_000_000_000);
        assert_eq!(acc.balance(Currency::Token), Decimal::ZERO);
        assert_eq!(acc.balance(Currency::Usdt), Decimal::ZERO);
    }

    #[test]
    fn balance_selects_currency() {
        let mut acc = Account::new(UserId::new(1), "ref-1", 0);
        *acc.balance_mut(Currency::Token) = dec!(5.5);
        *acc.balance_mut(Currency::Usdt) = dec!(1.25);
        assert_eq!(acc.balance(Currency::Token), dec!(5.5));
        assert_eq!(acc.balance(Currency::Usdt), dec!(1.25));
    }

    #[test]
    fn currency_codes() {
        assert_eq!(Currency::Token.to_string(), "token");
        assert_eq!(Currency::Usdt.to_string(), "usdt");
    }

    #[test]
    fn user_id_display_and_from() {
        let id: UserId = 42.into();
        assert_eq!(id.to_string(), "42");
        assert_eq!(id.as_i64(), 42);
    }
}
