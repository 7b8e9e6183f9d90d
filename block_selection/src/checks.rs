use std::collections::HashSet;

use anyhow::{ensure, Result};
use block_engine::{BuiltBlock, Transaction};

//check for duplicates and budget overruns before anything is written
pub fn verify_block(block: &BuiltBlock, txs: &[Transaction], gas_limit: u64) -> Result<()> {
    let mut seen = HashSet::with_capacity(block.selected.len());
    for &i in &block.selected {
        ensure!(i < txs.len(), "selected position {i} outside the transaction set");
        ensure!(seen.insert(i), "transaction {} selected twice", txs[i].hash);
    }

    let gas: u128 = block.selected.iter().map(|&i| txs[i].gas as u128).sum();
    ensure!(
        gas == block.summary.gas_used as u128,
        "summary reports {} gas but the block uses {gas}",
        block.summary.gas_used
    );
    ensure!(
        gas <= gas_limit as u128,
        "block uses {gas} gas, limit is {gas_limit}"
    );
    ensure!(
        block.summary.included == block.selected.len(),
        "summary reports {} transactions, block has {}",
        block.summary.included,
        block.selected.len()
    );
    Ok(())
}
