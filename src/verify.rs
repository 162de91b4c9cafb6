use bitcoin::Transaction;
use bitcoin::consensus::encode::serialize;

use crate::error::ForgeError;
use crate::input::PrevOuts;

/// Replays the locking script of input `input_index` against the signed
/// transaction through libbitcoinconsensus.
///
/// The locking script and spent value come from the prior-output table built
/// during input encoding; the scriptSig and witness come from the transaction
/// itself. Any execution failure surfaces as `ScriptVerificationFailed`.
pub(crate) fn verify_input(
    tx: &Transaction,
    input_index: usize,
    prev_outs: &PrevOuts,
) -> Result<(), ForgeError> {
    let out_point = tx.input[input_index].previous_output;
    let spent = prev_outs
        .get(&out_point)
        .ok_or(ForgeError::MissingPriorOutput { out_point })?;

    let spending_tx = serialize(tx);
    spent
        .script_pubkey
        .verify(input_index, spent.value, &spending_tx)
        .map_err(|e| ForgeError::ScriptVerificationFailed {
            input_index,
            reason: e.to_string(),
        })
}
