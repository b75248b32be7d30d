//! First-run setup

use tracing::info;

use core_kernel::{EmailAddress, PhoneNumber};
use domain_accounts::{AccountValidator, Moderator};

use crate::config::BootstrapModerator;
use crate::error::ApiError;
use crate::state::AppState;

/// Creates the configured moderator when no moderator exists yet
///
/// Returns the created moderator, or `None` when nothing was configured or
/// moderators already exist.
pub async fn ensure_bootstrap_moderator(state: &AppState) -> Result<Option<Moderator>, ApiError> {
    let Some(seed) = state.config.bootstrap_moderator.clone() else {
        return Ok(None);
    };
    if !state.moderators.list_moderators().await?.is_empty() {
        return Ok(None);
    }

    let moderator = build_moderator(&seed, &state.config.default_country_code)?;
    let moderator = state.moderators.create_moderator(moderator).await?;
    info!(moderator_id = %moderator.id, phone = %moderator.phone.masked(), "Bootstrap moderator created");
    Ok(Some(moderator))
}

fn build_moderator(seed: &BootstrapModerator, country_code: &str) -> Result<Moderator, ApiError> {
    AccountValidator::validate_name("Moderator name", &seed.name).into_result()?;
    let phone = PhoneNumber::parse(&seed.phone, country_code)?;
    let email = EmailAddress::parse(&seed.email)?;
    Ok(Moderator::new(seed.name.clone(), phone, email, None))
}
