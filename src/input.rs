use std::collections::HashMap;
use std::str::FromStr;

use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::secp256k1::{All, Secp256k1};
use bitcoin::{
    Amount, Network, OutPoint, PrivateKey, Script, ScriptBuf, Sequence, TxIn, TxOut, Txid, Witness,
};

use crate::error::ForgeError;
use crate::types::{ForgeTxIn, ScriptFamily};

/// Prior outputs recorded while encoding inputs, keyed by outpoint.
///
/// Populated once per forge call, before any signing, and read-only
/// afterwards: BIP143 sighash computation and script verification both need
/// the spent value and locking script of every input.
pub(crate) type PrevOuts = HashMap<OutPoint, TxOut>;

// Stands in for the 22-byte P2WPKH witness program when the input has no key,
// keeping the unlocking script in the same length class for size estimation.
const WITNESS_PROGRAM_PLACEHOLDER: [u8; 22] = [
    0, 1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 6, 0, 7, 0, 8, 0, 9, 0, 10, 0, 11,
];

/// Encodes one input: parses the outpoint, records the prior output in
/// `prev_outs` and builds the unlocking script. Returns the `TxIn` plus the
/// redeem script when the input will be signed.
pub(crate) fn encode_input(
    txin: &ForgeTxIn,
    network: Network,
    sign: bool,
    prev_outs: &mut PrevOuts,
    secp: &Secp256k1<All>,
) -> Result<(TxIn, Option<ScriptBuf>), ForgeError> {
    let txid = Txid::from_str(&txin.utxo.txid).map_err(|e| ForgeError::MalformedInput {
        txid: txin.utxo.txid.clone(),
        reason: e.to_string(),
    })?;
    let out_point = OutPoint::new(txid, txin.utxo.vout);

    prev_outs.insert(
        out_point,
        TxOut {
            value: Amount::from_sat(txin.utxo.value),
            script_pubkey: txin.utxo.script_pubkey.clone(),
        },
    );

    let (script_sig, redeem_script) = match txin.family {
        ScriptFamily::P2shP2wpkh => match (&txin.private_key, sign) {
            (Some(key), true) => {
                let program = witness_program(key, network, secp)?;
                let push = PushBytesBuf::try_from(program.to_bytes()).map_err(|_| {
                    ForgeError::Internal(format!(
                        "witness program for {out_point} is not pushable"
                    ))
                })?;
                (Builder::new().push_slice(push).into_script(), Some(program))
            }
            _ => (
                Builder::new().push_slice(WITNESS_PROGRAM_PLACEHOLDER).into_script(),
                None,
            ),
        },
        family => return Err(ForgeError::UnsupportedScriptFamily { family }),
    };

    log::debug!(
        "encoded input {}:{}, value={} sats, signed={}",
        txin.utxo.txid,
        txin.utxo.vout,
        txin.utxo.value,
        redeem_script.is_some()
    );

    Ok((
        TxIn {
            previous_output: out_point,
            script_sig,
            sequence: Sequence::MAX,
            witness: Witness::new(),
        },
        redeem_script,
    ))
}

/// Derives the P2WPKH witness program for `key`.
///
/// The program doubles as the redeem script pushed into the scriptSig of a
/// P2SH-P2WPKH input, and its HASH160 is what the P2SH locking script
/// commits to — see [`pk_script_from_witness_program`]. Useful on its own to
/// predict a deposit address before funds arrive.
pub fn witness_program_from_private_key(
    key: &PrivateKey,
    network: Network,
) -> Result<ScriptBuf, ForgeError> {
    let secp = Secp256k1::new();
    witness_program(key, network, &secp)
}

pub(crate) fn witness_program(
    key: &PrivateKey,
    network: Network,
    secp: &Secp256k1<All>,
) -> Result<ScriptBuf, ForgeError> {
    if key.network != network.into() {
        return Err(ForgeError::WrongNetwork {
            subject: "private key".to_string(),
            network,
        });
    }

    let public_key = key.public_key(secp);
    let wpkh = public_key
        .wpubkey_hash()
        .map_err(|e| ForgeError::KeyDerivationFailed { reason: e.to_string() })?;

    Ok(ScriptBuf::new_p2wpkh(&wpkh))
}

/// Wraps a witness program into its P2SH locking script:
/// `OP_HASH160 <hash160(program)> OP_EQUAL`.
pub fn pk_script_from_witness_program(program: &Script) -> ScriptBuf {
    ScriptBuf::new_p2sh(&program.script_hash())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Testnet fixtures carried over from the reference wallet: each pkScript
    // is the P2SH-P2WPKH locking script of the matching private key.
    const FIXTURES: [(&str, &str); 5] = [
        (
            "cMdRNN4Fwmvbictryk69BA5fDGxHqFe7iNDxCC3H9yhxCWoKvUML",
            "a91490c6addad6abcb929b6edd2833397aed1b5c6f5e87",
        ),
        (
            "cNsAQ7t1SFFDvXsLaMZ4xTg9bqK9RZNWnQDHmPGEPpn5QVRgGGXV",
            "a914481b778229c23b93e685e499ba55d0c0f1bc183b87",
        ),
        (
            "cVUJncM2GPMBnb3TFS8zU4CQ1qHgZLRdEwg3iFyZwds3AL3EK56U",
            "a9145e48546efaa8d0a471ebbe3a190197e58aede88a87",
        ),
        (
            "cTrswWxoZEqaPwMizFtnezNk8nKwHaQqC4i6LTeHumQTackhk8Bz",
            "a914bdacd5e162c6643254ddfd4a7610149256e8753687",
        ),
        (
            "cUmudPVY1D5vevqQLkmToJxXWVzgZLW2prpts9DnSsHpqnkFq4kp",
            "a914e806b73ffa3f86193e126c69ef58c1ec7cd36a2487",
        ),
    ];

    #[test]
    fn pk_script_matches_known_fixtures() {
        for (wif, want_pk_script) in FIXTURES {
            let key = PrivateKey::from_wif(wif).expect("valid wif");
            let program =
                witness_program_from_private_key(&key, Network::Testnet).expect("derivable");
            let pk_script = pk_script_from_witness_program(&program);
            assert_eq!(hex::encode(pk_script.as_bytes()), want_pk_script);
        }
    }

    #[test]
    fn pk_script_differs_across_keys() {
        let mismatches = [(0usize, 1usize), (1, 0), (2, 3), (3, 4)];
        for (key_idx, script_idx) in mismatches {
            let key = PrivateKey::from_wif(FIXTURES[key_idx].0).expect("valid wif");
            let program =
                witness_program_from_private_key(&key, Network::Testnet).expect("derivable");
            let pk_script = pk_script_from_witness_program(&program);
            assert_ne!(hex::encode(pk_script.as_bytes()), FIXTURES[script_idx].1);
        }
    }

    #[test]
    fn witness_program_rejects_foreign_network_key() {
        let key = PrivateKey::from_wif(FIXTURES[0].0).expect("valid wif");
        let err = witness_program_from_private_key(&key, Network::Bitcoin).unwrap_err();
        assert!(matches!(err, ForgeError::WrongNetwork { .. }));
    }
}
