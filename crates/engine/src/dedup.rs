//! Tolerant matching of candidate transactions against the ones a
//! destination already holds.
//!
//! Destinations assign their own ids, so there is no key to look up: a
//! candidate is considered present when some remote transaction has the same
//! account and date, an amount within one major unit and an equivalent payee.

use crate::{NormalizedTransaction, RemoteTransaction};

/// `amount_scale` is the minor units per major unit used when normalizing;
/// amounts closer than that are treated as rounding noise.
pub fn is_same_transaction(
    candidate: &NormalizedTransaction,
    remote: &RemoteTransaction,
    amount_scale: i64,
) -> bool {
    candidate.account_id == remote.account_id
        && candidate.date == remote.date
        && candidate.amount.abs_diff(remote.amount) < amount_scale.unsigned_abs()
        // Destinations rewrite the payee of transfers.
        && (remote.is_transfer()
            || are_strings_equal_ignore_case_and_whitespace(
                Some(&candidate.payee_name),
                remote.payee_name.as_deref(),
            ))
}

/// Missing values compare as the empty string.
pub fn are_strings_equal_ignore_case_and_whitespace(a: Option<&str>, b: Option<&str>) -> bool {
    normalize_whitespace(&a.unwrap_or_default().to_lowercase())
        == normalize_whitespace(&b.unwrap_or_default().to_lowercase())
}

fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps the candidates without a matching remote transaction.
pub fn filter_new_transactions(
    candidates: Vec<NormalizedTransaction>,
    existing: &[RemoteTransaction],
    amount_scale: i64,
) -> Vec<NormalizedTransaction> {
    candidates
        .into_iter()
        .filter(|candidate| {
            !existing
                .iter()
                .any(|remote| is_same_transaction(candidate, remote, amount_scale))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALE: i64 = 1000;

    fn candidate() -> NormalizedTransaction {
        NormalizedTransaction {
            account_id: "acc-1".to_string(),
            date: "2020-03-04".to_string(),
            amount: -25_500,
            payee_name: "Coffee  Shop".to_string(),
            category_id: None,
            memo: None,
        }
    }

    fn remote() -> RemoteTransaction {
        RemoteTransaction {
            id: "r-1".to_string(),
            account_id: "acc-1".to_string(),
            date: "2020-03-04".to_string(),
            amount: -25_500,
            payee_name: Some(" coffee shop ".to_string()),
            transfer_account_id: None,
        }
    }

    #[test]
    fn matching_transactions_are_the_same() {
        assert!(is_same_transaction(&candidate(), &remote(), SCALE));
    }

    #[test]
    fn any_key_difference_breaks_the_match() {
        let mut other_account = remote();
        other_account.account_id = "acc-2".to_string();
        assert!(!is_same_transaction(&candidate(), &other_account, SCALE));

        let mut other_date = remote();
        other_date.date = "2020-03-05".to_string();
        assert!(!is_same_transaction(&candidate(), &other_date, SCALE));

        let mut other_amount = remote();
        other_amount.amount = -26_500;
        assert!(!is_same_transaction(&candidate(), &other_amount, SCALE));

        let mut other_payee = remote();
        other_payee.payee_name = Some("Tea House".to_string());
        assert!(!is_same_transaction(&candidate(), &other_payee, SCALE));
    }

    #[test]
    fn sub_unit_amount_noise_is_tolerated() {
        let mut close = remote();
        close.amount = -25_500 + 999;
        assert!(is_same_transaction(&candidate(), &close, SCALE));

        close.amount = -25_500 - 999;
        assert!(is_same_transaction(&candidate(), &close, SCALE));

        close.amount = -25_500 + 1000;
        assert!(!is_same_transaction(&candidate(), &close, SCALE));
    }

    #[test]
    fn transfers_ignore_the_payee() {
        let mut transfer = remote();
        transfer.payee_name = Some("Transfer : Savings".to_string());
        transfer.transfer_account_id = Some("acc-savings".to_string());
        assert!(is_same_transaction(&candidate(), &transfer, SCALE));

        transfer.date = "2020-03-05".to_string();
        assert!(!is_same_transaction(&candidate(), &transfer, SCALE));
    }

    #[test]
    fn string_comparison_ignores_case_and_whitespace() {
        assert!(are_strings_equal_ignore_case_and_whitespace(
            Some("Coffee  Shop"),
            Some("coffee shop")
        ));
        assert!(are_strings_equal_ignore_case_and_whitespace(Some(" A "), Some("a")));
        assert!(!are_strings_equal_ignore_case_and_whitespace(Some("A"), Some("B")));
        assert!(are_strings_equal_ignore_case_and_whitespace(None, None));
        assert!(are_strings_equal_ignore_case_and_whitespace(None, Some("  ")));
        assert!(are_strings_equal_ignore_case_and_whitespace(
            Some("a\t\nb"),
            Some("A B")
        ));
    }

    #[test]
    fn filter_keeps_only_unmatched_candidates() {
        let mut new_one = candidate();
        new_one.payee_name = "Bakery".to_string();

        let kept = filter_new_transactions(vec![candidate(), new_one.clone()], &[remote()], SCALE);
        assert_eq!(kept, vec![new_one]);
    }

    #[test]
    fn filter_with_no_remote_keeps_everything() {
        let kept = filter_new_transactions(vec![candidate()], &[], SCALE);
        assert_eq!(kept.len(), 1);
    }
}
