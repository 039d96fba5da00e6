//! Voting power and quorum arithmetic.

use kycdao_types::{TokenAmount, VoteWeight};

/// Voting power of one address from its base weight and token balance.
///
/// Saturates at `u128::MAX`.
pub fn voting_power(formula: VoteWeight, base_weight: u128, balance: TokenAmount) -> u128 {
    match formula {
        VoteWeight::BaseOnly => base_weight,
        VoteWeight::BalanceOnly => balance.raw(),
        VoteWeight::BasePlusBalance => base_weight.saturating_add(balance.raw()),
    }
}

/// `floor(quorum_percentage * total_supply / 100)`, without overflow.
pub fn quorum_threshold(quorum_percentage: u32, total_supply: TokenAmount) -> u128 {
    let supply = total_supply.raw();
    let pct = u128::from(quorum_percentage);
    // supply = 100q + r, so pct * supply / 100 = pct * q + pct * r / 100.
    (supply / 100) * pct + (supply % 100) * pct / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formulas() {
        let balance = TokenAmount::new(200);
        assert_eq!(voting_power(VoteWeight::BaseOnly, 2, balance), 2);
        assert_eq!(voting_power(VoteWeight::BalanceOnly, 2, balance), 200);
        assert_eq!(voting_power(VoteWeight::BasePlusBalance, 2, balance), 202);
    }

    #[test]
    fn sum_saturates() {
        let balance = TokenAmount::new(u128::MAX);
        assert_eq!(voting_power(VoteWeight::BasePlusBalance, 5, balance), u128::MAX);
    }

    #[test]
    fn removed_member_keeps_only_balance() {
        assert_eq!(voting_power(VoteWeight::BasePlusBalance, 0, TokenAmount::new(9)), 9);
        assert_eq!(voting_power(VoteWeight::BaseOnly, 0, TokenAmount::new(9)), 0);
    }

    #[test]
    fn threshold_floors() {
        assert_eq!(quorum_threshold(50, TokenAmount::new(200)), 100);
        assert_eq!(quorum_threshold(50, TokenAmount::new(201)), 100);
        assert_eq!(quorum_threshold(33, TokenAmount::new(10)), 3);
        assert_eq!(quorum_threshold(100, TokenAmount::new(7)), 7);
        assert_eq!(quorum_threshold(1, TokenAmount::new(99)), 0);
        assert_eq!(quorum_threshold(50, TokenAmount::ZERO), 0);
    }

    #[test]
    fn threshold_does_not_overflow() {
        assert_eq!(
            quorum_threshold(100, TokenAmount::new(u128::MAX)),
            u128::MAX
        );
        let expected = u128::MAX / 2;
        assert_eq!(quorum_threshold(50, TokenAmount::new(u128::MAX)), expected);
    }
}
