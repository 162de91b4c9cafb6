use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{All, Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{PrivateKey, ScriptBuf, Transaction, Witness, ecdsa};

use crate::error::ForgeError;
use crate::input::PrevOuts;
use crate::types::ForgeTxIn;

// A computed sighash waiting for its signature, decoupling the immutable
// sighash pass from the witness-writing pass.
struct PendingSignature {
    input_index: usize,
    message: Message,
    private_key: PrivateKey,
}

/// Signs every keyed input of `tx` in place.
///
/// Phase one computes the BIP143 sighash of each input over the unsigned
/// transaction, committing to the spent value and script code recorded in
/// `prev_outs`. Phase two signs the digests and installs the two-element
/// witness stack `[signature ‖ sighash byte, compressed pubkey]`. Inputs
/// without a redeem script (no-sign inputs) are left untouched.
pub(crate) fn sign_inputs(
    tx: &mut Transaction,
    inputs: &[ForgeTxIn],
    redeem_scripts: &[Option<ScriptBuf>],
    prev_outs: &PrevOuts,
    secp: &Secp256k1<All>,
) -> Result<(), ForgeError> {
    let mut pending: Vec<PendingSignature> = Vec::with_capacity(inputs.len());

    {
        let unsigned = &*tx;
        let mut cache = SighashCache::new(unsigned);

        for (input_index, txin) in inputs.iter().enumerate() {
            let (Some(key), Some(redeem_script)) = (&txin.private_key, &redeem_scripts[input_index])
            else {
                continue;
            };

            let out_point = unsigned.input[input_index].previous_output;
            let spent = prev_outs
                .get(&out_point)
                .ok_or(ForgeError::MissingPriorOutput { out_point })?;

            let sighash = cache
                .p2wpkh_signature_hash(
                    input_index,
                    redeem_script,
                    spent.value,
                    EcdsaSighashType::All,
                )
                .map_err(|e| ForgeError::SigningFailed {
                    input_index,
                    reason: e.to_string(),
                })?;

            pending.push(PendingSignature {
                input_index,
                message: Message::from_digest(sighash.to_byte_array()),
                private_key: *key,
            });
        }
    }

    for pending_sig in pending {
        let signature = secp.sign_ecdsa(&pending_sig.message, &pending_sig.private_key.inner);
        let signature = ecdsa::Signature::sighash_all(signature);
        let public_key = pending_sig.private_key.public_key(secp);

        let mut witness = Witness::new();
        witness.push(signature.to_vec());
        witness.push(public_key.to_bytes());
        tx.input[pending_sig.input_index].witness = witness;

        log::debug!("signed input {}", pending_sig.input_index);
    }

    Ok(())
}
