use tracing::{info, warn};

use crate::activator::Engine;
use crate::error::ActivatorError;
use crate::flows::{lookup_query, now_millis, require, FlowInput, FlowKind, Mismatch, Outcome};
use crate::store::UserPatch;

/// Validate a presented code and apply the terminal mutation.
///
/// Mismatch and expiry both leave the pending record untouched: an
/// expired code is rejected on every attempt until a fresh issuance
/// overwrites it. Consuming a code unsets it, so a second completion
/// with the same code fails.
pub(crate) async fn validate(
    engine: &Engine,
    kind: FlowKind,
    input: &FlowInput,
) -> Result<Outcome, ActivatorError> {
    let profile = kind.profile();
    let config = &engine.config;

    let identity = require(&input.user, "Missing User")?;
    let code = require(&input.code, kind.missing_code_message())?;
    let password = if profile.sets_password {
        Some(require(&input.password, "Missing Password")?)
    } else {
        None
    };

    let query = lookup_query(profile.lookup, config, &identity);

    let user = engine
        .store
        .find(&query)
        .await?
        .ok_or(ActivatorError::NotFound)?;

    if user.get_str(profile.code_field).as_deref() != Some(code.as_str()) {
        warn!(kind = ?kind, "presented code does not match");
        return Err(match profile.mismatch {
            Mismatch::Forbidden => ActivatorError::Forbidden,
            Mismatch::InvalidResetCode => ActivatorError::bad_request("Invalid Reset Code"),
        });
    }

    // expiry is re-checked even on a matching code; an absent expiry
    // value counts as non-expiring
    if let Some(expiry_field) = profile.expiry_field {
        if let Some(expires_at) = user.get_i64(expiry_field) {
            if expires_at < now_millis() {
                warn!(kind = ?kind, expires_at, "presented code has expired");
                return Err(ActivatorError::bad_request("Expired Reset Code"));
            }
        }
    }

    let id = user
        .get_str(&config.id_property)
        .unwrap_or_else(|| identity.clone());

    let mut patch = UserPatch::new().unset(profile.code_field);
    if let Some(expiry_field) = profile.expiry_field {
        patch = patch.unset(expiry_field);
    }
    if let Some(password) = password {
        patch = patch.set("password", password);
    }
    engine.store.save(&id, patch).await?;

    info!(kind = ?kind, user_id = %id, "code consumed");
    Ok(Outcome::completed())
}
