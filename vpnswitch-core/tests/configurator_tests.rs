//! Tests for best-effort startup configuration

mod common;

use common::{test_config, Call, FakeControl, Step};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use vpnswitch_core::config::{Setting, StartupSettings};
use vpnswitch_core::error::ConfigError;
use vpnswitch_core::vpn::shutdown;
use vpnswitch_core::vpn::{Configurator, Rotator, StopReason};

fn set(option: &str, value: &str) -> Call {
    Call::Set(option.to_string(), value.to_string())
}

#[tokio::test]
async fn test_applies_default_settings_in_order() {
    let fake = FakeControl::new(Step::Connected);
    let settings = StartupSettings::default();

    let result = Configurator::new(&fake, &settings, Duration::from_secs(30))
        .apply_startup_settings()
        .await;

    assert!(result.is_ok());
    assert_eq!(
        fake.calls(),
        vec![
            set("killswitch", "off"),
            set("cybersec", "off"),
            set("autoconnect", "off"),
            set("firewall", "off"),
        ]
    );
}

#[tokio::test]
async fn test_failed_setting_does_not_abort_the_rest() {
    let fake = FakeControl::new(Step::Connected).failing_option("cybersec");
    let settings = StartupSettings::default();

    let result = Configurator::new(&fake, &settings, Duration::from_secs(30))
        .apply_startup_settings()
        .await;

    assert_eq!(
        result,
        Err(ConfigError::PartiallyApplied {
            failed: 1,
            total: 4
        })
    );
    assert_eq!(fake.calls().len(), 4);
    assert_eq!(fake.calls().last(), Some(&set("firewall", "off")));
}

#[tokio::test(start_paused = true)]
async fn test_hanging_setting_times_out() {
    let fake = FakeControl::new(Step::Connected).hanging_option("killswitch");
    let settings = StartupSettings {
        apply: vec![Setting::new("killswitch", "off"), Setting::new("protocol", "udp")],
        ..StartupSettings::default()
    };

    let result = Configurator::new(&fake, &settings, Duration::from_secs(30))
        .apply_startup_settings()
        .await;

    assert_eq!(
        result,
        Err(ConfigError::PartiallyApplied {
            failed: 1,
            total: 2
        })
    );
    assert_eq!(fake.calls().last(), Some(&set("protocol", "udp")));
}

#[tokio::test]
async fn test_is_idempotent() {
    let fake = FakeControl::new(Step::Connected);
    let settings = StartupSettings::default();
    let configurator = Configurator::new(&fake, &settings, Duration::from_secs(30));

    assert!(configurator.apply_startup_settings().await.is_ok());
    assert!(configurator.apply_startup_settings().await.is_ok());
    assert_eq!(fake.calls().len(), 8);
}

#[tokio::test(start_paused = true)]
async fn test_enables_meshnet_when_disabled() {
    let fake = FakeControl::new(Step::Connected);
    let settings = StartupSettings {
        apply: vec![Setting::new("autoconnect", "off")],
        meshnet: true,
        ..StartupSettings::default()
    };

    let result = Configurator::new(&fake, &settings, Duration::from_secs(30))
        .apply_startup_settings()
        .await;

    assert!(result.is_ok());
    assert_eq!(
        fake.calls(),
        vec![
            Call::Settings,
            set("meshnet", "on"),
            Call::RefreshPeers,
            set("autoconnect", "off"),
        ]
    );
}

#[tokio::test]
async fn test_skips_meshnet_when_already_enabled() {
    let fake = FakeControl::new(Step::Connected).with_settings_text("Meshnet: enabled\n");
    let settings = StartupSettings {
        apply: Vec::new(),
        meshnet: true,
        ..StartupSettings::default()
    };

    let result = Configurator::new(&fake, &settings, Duration::from_secs(30))
        .apply_startup_settings()
        .await;

    assert!(result.is_ok());
    assert_eq!(fake.calls(), vec![Call::Settings]);
}

#[tokio::test]
async fn test_meshnet_failure_counts_as_partial() {
    let fake = FakeControl::new(Step::Connected).failing_option("meshnet");
    let settings = StartupSettings {
        apply: vec![Setting::new("firewall", "off")],
        meshnet: true,
        ..StartupSettings::default()
    };

    let result = Configurator::new(&fake, &settings, Duration::from_secs(30))
        .apply_startup_settings()
        .await;

    assert_eq!(
        result,
        Err(ConfigError::PartiallyApplied {
            failed: 1,
            total: 2
        })
    );
    assert!(!fake.calls().contains(&Call::RefreshPeers));
    assert_eq!(fake.calls().last(), Some(&set("firewall", "off")));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_hanging_settings_and_still_disconnects() {
    let fake = Arc::new(
        FakeControl::new(Step::Connected)
            .hanging_option("killswitch")
            .hanging_option("cybersec")
            .hanging_option("autoconnect")
            .hanging_option("firewall"),
    );
    let config = test_config(&["se"], 3600);
    let (handle, shutdown) = shutdown::channel();
    let started = Instant::now();

    let task = {
        let fake = fake.clone();
        tokio::spawn(async move {
            let configurator = Configurator::new(
                fake.as_ref(),
                &config.settings,
                config.control.command_timeout(),
            );
            let applied = configurator.apply_until_shutdown(&mut shutdown.clone()).await;
            let stopped = Rotator::new(fake, &config).run(shutdown).await;
            (applied, stopped)
        })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    handle.trigger();
    let (applied, stopped) = task.await.expect("startup task panicked");

    assert_eq!(applied, None);
    assert_eq!(stopped, Ok(StopReason::Shutdown));
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "shutdown took {:?}",
        started.elapsed()
    );
    assert_eq!(fake.calls(), vec![set("killswitch", "off"), Call::Disconnect]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_meshnet_settle() {
    let fake = FakeControl::new(Step::Connected);
    let settings = StartupSettings {
        apply: Vec::new(),
        meshnet: true,
        ..StartupSettings::default()
    };
    let (handle, mut shutdown) = shutdown::channel();
    let configurator = Configurator::new(&fake, &settings, Duration::from_secs(30));

    let trigger = async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        handle.trigger();
    };
    let (applied, ()) = tokio::join!(configurator.apply_until_shutdown(&mut shutdown), trigger);

    assert_eq!(applied, None);
    assert_eq!(
        fake.calls(),
        vec![Call::Settings, set("meshnet", "on")],
        "peer refresh must not run after shutdown"
    );
}

#[tokio::test]
async fn test_apply_until_shutdown_passes_result_through() {
    let fake = FakeControl::new(Step::Connected).failing_option("firewall");
    let settings = StartupSettings::default();
    let (_handle, mut shutdown) = shutdown::channel();

    let applied = Configurator::new(&fake, &settings, Duration::from_secs(30))
        .apply_until_shutdown(&mut shutdown)
        .await;

    assert_eq!(
        applied,
        Some(Err(ConfigError::PartiallyApplied {
            failed: 1,
            total: 4
        }))
    );
}
