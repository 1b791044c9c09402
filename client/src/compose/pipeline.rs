//! Key and signature resolution.
//!
//! ```text
//! key provider ──► private keys ──► public keys
//!                                       │
//!                     chain.get_required_keys
//!                                       │
//!                        required keys (ordered)
//!                                       │
//!              sign provider(buf, required, matching private keys)
//!                                       │
//!                        signatures (same order)
//! ```

use anyhow::anyhow;
use std::collections::HashMap;
use tracing::debug;

use super::error::ComposeError;
use super::provider::{KeyProvider, KeyRequest, KeyringSigner, SignProvider, SigningContext};
use crate::chain::ChainApi;
use crate::crypto::{self, PrivateKey};
use crate::transaction::Transaction;

/// Produce the signatures for `transaction`, in required-key order.
///
/// With a key provider, the chain decides which keys must sign and the
/// signature count is checked against that. Without one, the sign provider
/// is trusted to pick keys itself.
pub(crate) async fn sign_transaction(
    chain: &dyn ChainApi,
    key_provider: Option<&dyn KeyProvider>,
    sign_provider: Option<&dyn SignProvider>,
    transaction: &Transaction,
    chain_id: &[u8],
) -> Result<Vec<String>, ComposeError> {
    let buf = transaction.signing_buffer(chain_id);

    let Some(key_provider) = key_provider else {
        let Some(sign_provider) = sign_provider else {
            return Err(ComposeError::NoSigningKeys);
        };
        debug!("no key provider, delegating key selection to sign provider");
        let ctx = SigningContext {
            buf,
            sign: crypto::sign,
            transaction: transaction.clone(),
            required_keys: Vec::new(),
            private_keys: Vec::new(),
        };
        return sign_provider
            .sign(ctx)
            .await
            .map(|s| s.into_vec())
            .map_err(ComposeError::Signing);
    };

    let keys = key_provider
        .keys(KeyRequest {
            transaction: transaction.clone(),
        })
        .await
        .map_err(ComposeError::KeyProvider)?
        .into_vec();
    if keys.is_empty() {
        return Err(ComposeError::NoSigningKeys);
    }

    // public key -> private key, first occurrence wins.
    let mut by_public: HashMap<String, String> = HashMap::with_capacity(keys.len());
    let mut available = Vec::with_capacity(keys.len());
    for encoded in keys {
        let public = encoded.parse::<PrivateKey>()?.public_key().to_string();
        if !by_public.contains_key(&public) {
            available.push(public.clone());
            by_public.insert(public, encoded);
        }
    }

    let required = chain
        .get_required_keys(transaction, &available)
        .await
        .map_err(ComposeError::Resolver)?
        .required_keys;
    debug!(
        available = available.len(),
        required = required.len(),
        "resolved required keys"
    );

    let private_keys = required
        .iter()
        .map(|public| {
            by_public.get(public).cloned().ok_or_else(|| {
                ComposeError::Signing(anyhow!(
                    "chain requires key {} which the key provider did not supply",
                    public
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let expected = required.len();
    let ctx = SigningContext {
        buf,
        sign: crypto::sign,
        transaction: transaction.clone(),
        required_keys: required,
        private_keys,
    };
    let signatures = sign_provider
        .unwrap_or(&KeyringSigner)
        .sign(ctx)
        .await
        .map_err(ComposeError::Signing)?
        .into_vec();

    if signatures.len() != expected {
        return Err(ComposeError::Signing(anyhow!(
            "expected {} signatures, sign provider returned {}",
            expected,
            signatures.len()
        )));
    }
    Ok(signatures)
}
