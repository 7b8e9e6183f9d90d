use log::debug;

use crate::packer::BlockState;
use crate::transaction::Transaction;

/// Tops the block up with individual working-set transactions, ignoring
/// address exclusivity.
///
/// Unselected transactions are visited by fee per unit of gas, highest first,
/// which is `gas_fee_cap` itself, so zero-gas transactions need no special
/// case. Each one that fits the remaining gas is admitted; one that does not
/// fit is skipped and the walk continues. Returns the number admitted.
pub fn fill(txs: &[Transaction], working: &[usize], gas_limit: u64, state: &mut BlockState<'_>) -> usize {
    let mut remaining: Vec<usize> = working
        .iter()
        .copied()
        .filter(|i| !state.selected.contains(i))
        .collect();
    remaining.sort_by(|&a, &b| txs[b].gas_fee_cap.cmp(&txs[a].gas_fee_cap));

    let mut admitted = 0;
    for i in remaining {
        let gas = txs[i].gas;
        if !state.fits(gas, gas_limit) {
            continue;
        }
        state.admit(i, gas);
        admitted += 1;
    }

    debug!(
        "fill phase admitted {} transactions, gas used {}/{}",
        admitted, state.gas_used, gas_limit
    );
    admitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::fixtures::tx;

    #[test]
    fn fills_by_fee_rate_ignoring_addresses() {
        let txs = vec![
            tx("t0", "a", "b", 10, 1),
            tx("t1", "a", "b", 10, 5),
            tx("t2", "a", "b", 10, 3),
        ];
        let working = vec![0, 1, 2];
        let mut state = BlockState::new();
        let admitted = fill(&txs, &working, 20, &mut state);

        assert_eq!(admitted, 2);
        assert_eq!(state.order, vec![1, 2]);
        assert_eq!(state.gas_used, 20);
    }

    #[test]
    fn skips_what_does_not_fit_and_keeps_going() {
        let txs = vec![
            tx("t0", "a", "b", 50, 9),
            tx("t1", "c", "d", 80, 8),
            tx("t2", "e", "f", 30, 1),
        ];
        let working = vec![0, 1, 2];
        let mut state = BlockState::new();
        fill(&txs, &working, 100, &mut state);

        // t1 does not fit after t0, the cheaper t2 still does
        assert_eq!(state.order, vec![0, 2]);
        assert_eq!(state.gas_used, 80);
    }

    #[test]
    fn leaves_selected_and_occupied_alone() {
        let txs = vec![tx("t0", "a", "b", 10, 1), tx("t1", "a", "c", 10, 2)];
        let working = vec![0, 1];
        let mut state = BlockState::new();
        state.admit(0, 10);
        state.occupied.extend(["a", "b"]);

        fill(&txs, &working, 100, &mut state);
        assert_eq!(state.order, vec![0, 1]);
        assert_eq!(state.occupied.len(), 2);
        assert_eq!(state.gas_used, 20);
    }

    #[test]
    fn zero_gas_transactions_are_admitted() {
        let txs = vec![tx("t0", "a", "b", 0, 7)];
        let mut state = BlockState::new();
        assert_eq!(fill(&txs, &[0], 0, &mut state), 1);
        assert_eq!(state.gas_used, 0);
    }

    #[test]
    fn full_block_at_maximum_gas_takes_nothing_more() {
        let txs = vec![tx("t0", "a", "b", u64::MAX, 2), tx("t1", "c", "d", 1, 1)];
        let mut state = BlockState::new();
        assert_eq!(fill(&txs, &[0, 1], u64::MAX, &mut state), 1);
        assert_eq!(state.order, vec![0]);
        assert_eq!(state.gas_used, u64::MAX);
    }

    #[test]
    fn equal_rates_keep_working_order() {
        let txs = vec![
            tx("t0", "a", "b", 10, 4),
            tx("t1", "c", "d", 10, 4),
            tx("t2", "e", "f", 10, 4),
        ];
        let working = vec![2, 0, 1];
        let mut state = BlockState::new();
        fill(&txs, &working, 20, &mut state);
        assert_eq!(state.order, vec![2, 0]);
    }
}
