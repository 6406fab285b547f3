//! One-time startup configuration of the VPN client
//!
//! Every setting is applied independently. A failure is logged and the
//! remaining settings are still attempted.

use crate::config::StartupSettings;
use crate::error::ConfigError;
use crate::vpn::control::{bounded, VpnControl};
use crate::vpn::shutdown::Shutdown;
use crate::vpn::status::StatusMatcher;
use std::time::Duration;
use tracing::{info, warn};

/// Applies [`StartupSettings`] through a [`VpnControl`]
pub struct Configurator<'a> {
    control: &'a dyn VpnControl,
    settings: &'a StartupSettings,
    timeout: Duration,
    matcher: StatusMatcher,
}

impl<'a> Configurator<'a> {
    pub fn new(
        control: &'a dyn VpnControl,
        settings: &'a StartupSettings,
        timeout: Duration,
    ) -> Self {
        Self {
            control,
            settings,
            timeout,
            matcher: StatusMatcher::default(),
        }
    }

    /// Apply all startup settings, best effort
    ///
    /// Idempotent: settings are re-applied on every start regardless of the
    /// client's current values.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if every step succeeded
    /// * `Err(ConfigError::PartiallyApplied)` if some steps failed; each
    ///   failure has already been logged
    #[tracing::instrument(skip(self), fields(settings = self.settings.apply.len()))]
    pub async fn apply_startup_settings(&self) -> Result<(), ConfigError> {
        let mut failed = 0;
        let mut total = 0;

        if self.settings.meshnet {
            total += 1;
            if let Err(e) = self.ensure_meshnet().await {
                warn!(error = %e, "Meshnet setup failed");
                failed += 1;
            }
        }

        for setting in &self.settings.apply {
            total += 1;
            let command = format!("set {} {}", setting.option, setting.value);
            let result = bounded(
                &command,
                self.timeout,
                self.control.set(&setting.option, &setting.value),
            )
            .await;

            match result {
                Ok(()) => info!(option = %setting.option, value = %setting.value, "Applied setting"),
                Err(e) => {
                    let error = ConfigError::SettingFailed {
                        option: setting.option.clone(),
                        value: setting.value.clone(),
                        reason: e.to_string(),
                    };
                    warn!("{}", error);
                    failed += 1;
                }
            }
        }

        if failed == 0 {
            info!("VPN client settings configured");
            Ok(())
        } else {
            Err(ConfigError::PartiallyApplied { failed, total })
        }
    }

    /// Apply startup settings unless shutdown is requested first
    ///
    /// Returns `None` when shutdown cut the sequence short; the in-flight
    /// command is dropped, which kills it.
    pub async fn apply_until_shutdown(
        &self,
        shutdown: &mut Shutdown,
    ) -> Option<Result<(), ConfigError>> {
        tokio::select! {
            biased;
            _ = shutdown.wait() => {
                info!("Shutdown requested during startup configuration");
                None
            }
            result = self.apply_startup_settings() => Some(result),
        }
    }

    /// Turn meshnet on if the settings listing says it is off, then refresh peers
    async fn ensure_meshnet(&self) -> Result<(), ConfigError> {
        let listing = bounded("settings", self.timeout, self.control.settings())
            .await
            .map_err(|e| ConfigError::SettingFailed {
                option: "meshnet".to_string(),
                value: "on".to_string(),
                reason: e.to_string(),
            })?;

        if self.matcher.meshnet_enabled(&listing) {
            info!("Meshnet is already enabled");
            return Ok(());
        }

        info!("Meshnet is not enabled, enabling");
        let step_failed = |e: crate::error::ControlError| ConfigError::SettingFailed {
            option: "meshnet".to_string(),
            value: "on".to_string(),
            reason: e.to_string(),
        };

        bounded("set meshnet on", self.timeout, self.control.set("meshnet", "on"))
            .await
            .map_err(step_failed)?;
        tokio::time::sleep(Duration::from_secs(self.settings.meshnet_settle_secs)).await;
        bounded(
            "meshnet peer refresh",
            self.timeout,
            self.control.refresh_meshnet_peers(),
        )
        .await
        .map_err(step_failed)?;

        info!("Meshnet enabled and peers refreshed");
        Ok(())
    }
}
