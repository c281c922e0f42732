//! Access password gate for commands that spend API quota.

use anyhow::{Result, bail};
use dialoguer::Password;

use crosscheck_infra::secret::ApiCredentials;

/// Ask for the access password when one is configured.
///
/// Does nothing when no password is set.
pub fn require_access(credentials: &ApiCredentials) -> Result<()> {
    if !credentials.requires_password() {
        return Ok(());
    }

    let input = Password::new()
        .with_prompt("Access password")
        .interact()?;

    if credentials.verify_access_password(&input) {
        tracing::debug!("access password accepted");
        Ok(())
    } else {
        tracing::warn!("access password rejected");
        bail!("incorrect access password")
    }
}
