use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::activator::Engine;
use crate::error::ActivatorError;
use crate::flows::{lookup_query, now_millis, require, FlowInput, FlowKind, Outcome};
use crate::mailer::NotifyData;
use crate::store::UserPatch;

/// Issue a one-time code: resolve the user, run the store's throttle
/// hook, persist a fresh token (replacing any outstanding one), and
/// notify the recipient. A failure at the mail step leaves the persisted
/// code active.
pub(crate) async fn issue(
    engine: &Engine,
    kind: FlowKind,
    input: &FlowInput,
) -> Result<Outcome, ActivatorError> {
    let profile = kind.profile();
    let config = &engine.config;

    let identity = require(&input.user, "Missing User")?;

    let query = lookup_query(profile.lookup, config, &identity);

    let user = engine
        .store
        .find(&query)
        .await?
        .ok_or(ActivatorError::NotFound)?;
    let user = engine.store.throttle(user).await?;

    let email = user.get_str(&config.email_property).ok_or_else(|| {
        warn!(kind = ?kind, "user record has no email field");
        ActivatorError::common(500, "User record missing email")
    })?;
    let id = user
        .get_str(&config.id_property)
        .unwrap_or_else(|| identity.clone());

    let code = Uuid::new_v4().to_string();
    let mut patch = UserPatch::new().set(profile.code_field, code.clone());
    if let Some(expiry_field) = profile.expiry_field {
        let expires_at = now_millis() + config.reset_expire_minutes * 60_000;
        patch = patch.set(expiry_field, expires_at);
    }
    engine.store.save(&id, patch).await?;
    debug!(kind = ?kind, user_id = %id, "code persisted");

    let data = NotifyData {
        code,
        email: email.clone(),
        id: Some(id.clone()),
        request: input.request.clone(),
    };
    engine
        .notifier
        .send(
            profile.template,
            &config.language,
            &data,
            &email,
            kind.subject(config),
        )
        .await?;

    info!(kind = ?kind, user_id = %id, "code issued");
    Ok(Outcome::created(input.body_override.clone()))
}
