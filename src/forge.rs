use std::str::FromStr;

use bitcoin::absolute::LockTime;
use bitcoin::secp256k1::Secp256k1;
use bitcoin::transaction::Version;
use bitcoin::{Address, Amount, Transaction, TxOut};

use crate::error::ForgeError;
use crate::input::{PrevOuts, encode_input};
use crate::sign::sign_inputs;
use crate::types::{ForgeParams, ForgeSummary, ForgeTxIn, ForgeTxOut};
use crate::verify::verify_input;

/// Forges a transaction with the fee deducted from the outputs.
///
/// Two passes: a first assembly with the outputs exactly as given yields the
/// provisional transaction whose virtual size prices the fee, then a second
/// assembly with the fee-adjusted outputs produces the returned transaction.
/// The fee is charged to the outputs in order; an output too small to absorb
/// the remaining fee is dropped entirely and the shortfall carries over to
/// the next one.
pub fn forge_tx(
    inputs: &[ForgeTxIn],
    outputs: &[ForgeTxOut],
    params: &ForgeParams,
) -> Result<(Transaction, ForgeSummary), ForgeError> {
    let (provisional, _) = assemble(inputs, outputs, params)?;

    // Witness bytes cost 1 weight unit, non-witness bytes cost 4.
    let size_with_witness = provisional.total_size();
    let stripped_size = provisional.base_size();
    let vsize = (stripped_size * 3 + size_with_witness) / 4;
    let fee = (vsize as u64).checked_mul(params.fee_rate).ok_or_else(|| {
        ForgeError::Internal(format!("fee overflows u64 at rate {}", params.fee_rate))
    })?;

    log::debug!(
        "estimate pass: stripped={stripped_size} total={size_with_witness} vsize={vsize} fee={fee}"
    );

    let adjusted = apply_fee(outputs, fee);
    if adjusted.is_empty() {
        return Err(ForgeError::FeeExceedsOutputs { fee });
    }

    // The fee is not recomputed after an output is dropped, so the charged
    // fee can differ slightly from vsize * fee_rate of the final transaction.
    assemble(inputs, &adjusted, params)
}

// Walks the outputs in order, subtracting the fee from the first output able
// to absorb it. A smaller output is consumed whole and the remainder carries
// forward; the result is empty when the fee eats everything.
fn apply_fee(outputs: &[ForgeTxOut], fee: u64) -> Vec<ForgeTxOut> {
    let mut remaining = fee;
    let mut adjusted = Vec::with_capacity(outputs.len());

    for out in outputs {
        if out.value < remaining {
            remaining -= out.value;
            continue;
        }
        adjusted.push(ForgeTxOut {
            address: out.address.clone(),
            value: out.value - remaining,
        });
        remaining = 0;
    }

    adjusted
}

/// Builds (and, when requested, signs and verifies) a transaction using the
/// input and output values exactly as given — no fee subtraction here.
pub(crate) fn assemble(
    inputs: &[ForgeTxIn],
    outputs: &[ForgeTxOut],
    params: &ForgeParams,
) -> Result<(Transaction, ForgeSummary), ForgeError> {
    if inputs.is_empty() || outputs.is_empty() {
        return Err(ForgeError::InsufficientParts {
            inputs: inputs.len(),
            outputs: outputs.len(),
        });
    }
    if params.fee_rate < 1 {
        return Err(ForgeError::InvalidFeeRate { fee_rate: params.fee_rate });
    }
    let network = params.network.ok_or(ForgeError::MissingNetwork)?;

    let secp = Secp256k1::new();

    let mut prev_outs = PrevOuts::with_capacity(inputs.len());
    let mut tx_ins = Vec::with_capacity(inputs.len());
    let mut redeem_scripts = Vec::with_capacity(inputs.len());
    let mut total_input: u64 = 0;

    for txin in inputs {
        total_input = total_input
            .checked_add(txin.utxo.value)
            .ok_or_else(|| ForgeError::Internal("total input value overflows u64".to_string()))?;
        let (tx_in, redeem_script) =
            encode_input(txin, network, params.sign, &mut prev_outs, &secp)?;
        tx_ins.push(tx_in);
        redeem_scripts.push(redeem_script);
    }

    let mut tx_outs = Vec::with_capacity(outputs.len());
    let mut total_output: u64 = 0;

    for out in outputs {
        let address = Address::from_str(&out.address)
            .map_err(|e| ForgeError::InvalidAddress {
                address: out.address.clone(),
                reason: e.to_string(),
            })?
            .require_network(network)
            .map_err(|_| ForgeError::WrongNetwork {
                subject: out.address.clone(),
                network,
            })?;

        total_output = total_output
            .checked_add(out.value)
            .ok_or_else(|| ForgeError::Internal("total output value overflows u64".to_string()))?;
        tx_outs.push(TxOut {
            value: Amount::from_sat(out.value),
            script_pubkey: address.script_pubkey(),
        });
    }

    if total_output > total_input {
        return Err(ForgeError::Overspend { total_output, total_input });
    }

    let mut tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: tx_ins,
        output: tx_outs,
    };

    if params.sign {
        sign_inputs(&mut tx, inputs, &redeem_scripts, &prev_outs, &secp)?;

        // Every signed input must unlock its own locking script before the
        // transaction leaves this function.
        for (input_index, redeem_script) in redeem_scripts.iter().enumerate() {
            if redeem_script.is_some() {
                verify_input(&tx, input_index, &prev_outs)?;
            }
        }
    }

    Ok((
        tx,
        ForgeSummary {
            fee: total_input - total_output,
            total_input,
            total_output,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out(address: &str, value: u64) -> ForgeTxOut {
        ForgeTxOut { address: address.to_string(), value }
    }

    #[test]
    fn apply_fee_charges_first_output() {
        let adjusted = apply_fee(&[out("a", 1000), out("b", 500)], 266);
        assert_eq!(adjusted, vec![out("a", 734), out("b", 500)]);
    }

    #[test]
    fn apply_fee_drops_small_output_and_carries_shortfall() {
        let adjusted = apply_fee(&[out("a", 200), out("b", 1000)], 330);
        assert_eq!(adjusted, vec![out("b", 870)]);
    }

    #[test]
    fn apply_fee_keeps_output_consumed_to_exactly_zero() {
        let adjusted = apply_fee(&[out("a", 266), out("b", 500)], 266);
        assert_eq!(adjusted, vec![out("a", 0), out("b", 500)]);
    }

    #[test]
    fn apply_fee_returns_empty_when_fee_eats_everything() {
        let adjusted = apply_fee(&[out("a", 100), out("b", 100)], 266);
        assert!(adjusted.is_empty());
    }
}
