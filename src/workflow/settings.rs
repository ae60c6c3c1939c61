use super::access::require_permission;
use crate::attachments::AttachmentStore;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Permission, SettingsUpdate, SystemSettings, User};

/// Current settings. The row is created with defaults on first read.
pub fn get_settings(store: &dyn Store) -> Result<SystemSettings> {
    if let Some(settings) = store.get_settings()? {
        return Ok(settings);
    }

    let settings = SystemSettings::default();
    store.save_settings(&settings)?;
    tracing::info!("Initialized default system settings");
    Ok(settings)
}

fn check_margin(name: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidInput(format!(
            "{name} must be a non-negative number"
        )));
    }
    Ok(value)
}

/// Merge a partial update into `settings`. Nothing is modified on error.
pub fn apply_update(settings: &mut SystemSettings, update: SettingsUpdate) -> Result<()> {
    let mut next = settings.clone();

    if let Some(v) = update.header_text {
        next.header_text = v;
    }
    if let Some(v) = update.commander_name {
        next.commander_name = v.trim().to_string();
    }
    if let Some(v) = update.paper_size {
        if v.trim().is_empty() {
            return Err(Error::InvalidInput("paper_size cannot be empty".to_string()));
        }
        next.paper_size = v.trim().to_string();
    }
    if let Some(v) = update.margin_top {
        next.margin_top = check_margin("margin_top", v)?;
    }
    if let Some(v) = update.margin_bottom {
        next.margin_bottom = check_margin("margin_bottom", v)?;
    }
    if let Some(v) = update.margin_right {
        next.margin_right = check_margin("margin_right", v)?;
    }
    if let Some(v) = update.margin_left {
        next.margin_left = check_margin("margin_left", v)?;
    }
    if let Some(v) = update.font_family {
        next.font_family = v;
    }
    if let Some(v) = update.font_size {
        if v == 0 {
            return Err(Error::InvalidInput("font_size must be positive".to_string()));
        }
        next.font_size = v;
    }
    if let Some(v) = update.show_logo {
        next.show_logo = v;
    }
    if let Some(v) = update.show_header {
        next.show_header = v;
    }
    if let Some(v) = update.show_signature {
        next.show_signature = v;
    }
    if let Some(v) = update.show_image {
        next.show_image = v;
    }
    if let Some(v) = update.footer_text {
        next.footer_text = v;
    }

    *settings = next;
    Ok(())
}

/// Apply an update and optionally replace the logo. Requires the
/// `system_settings` capability.
pub async fn update_settings(
    store: &dyn Store,
    attachments: &AttachmentStore,
    actor: &User,
    update: SettingsUpdate,
    logo: Option<Vec<u8>>,
) -> Result<SystemSettings> {
    require_permission(actor, Permission::SYSTEM_SETTINGS)?;

    let mut settings = get_settings(store)?;
    apply_update(&mut settings, update)?;

    if let Some(bytes) = logo.filter(|b| !b.is_empty()) {
        settings.logo_path = Some(attachments.store_logo(&bytes).await?);
    }

    store.save_settings(&settings)?;
    tracing::info!(
        actor = %actor.username,
        commander = %settings.commander_name,
        "Updated system settings"
    );
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::testing::{TestEnv, regular};

    #[test]
    fn test_first_read_creates_defaults() {
        let env = TestEnv::new();
        assert!(env.store().get_settings().unwrap().is_none());

        let settings = get_settings(env.store()).unwrap();
        assert_eq!(settings, SystemSettings::default());
        assert_eq!(env.store().get_settings().unwrap(), Some(settings));
    }

    #[test]
    fn test_apply_update_merges_fields() {
        let mut settings = SystemSettings::default();
        apply_update(
            &mut settings,
            SettingsUpdate {
                commander_name: Some("  chief ".to_string()),
                font_size: Some(16),
                show_logo: Some(false),
                ..SettingsUpdate::default()
            },
        )
        .unwrap();

        assert_eq!(settings.commander_name, "chief");
        assert_eq!(settings.font_size, 16);
        assert!(!settings.show_logo);
        assert_eq!(settings.paper_size, "A4");
        assert!(settings.show_header);
    }

    #[test]
    fn test_apply_update_rejects_invalid_values() {
        let mut settings = SystemSettings::default();
        let bad = [
            SettingsUpdate {
                margin_left: Some(-1.0),
                ..SettingsUpdate::default()
            },
            SettingsUpdate {
                font_size: Some(0),
                ..SettingsUpdate::default()
            },
            SettingsUpdate {
                margin_top: Some(f64::NAN),
                ..SettingsUpdate::default()
            },
        ];
        for update in bad {
            let update = SettingsUpdate {
                header_text: Some("changed".to_string()),
                ..update
            };
            assert!(matches!(
                apply_update(&mut settings, update),
                Err(Error::InvalidInput(_))
            ));
        }
        assert_eq!(settings, SystemSettings::default());
    }

    #[tokio::test]
    async fn test_update_requires_capability() {
        let env = TestEnv::new();
        let user = regular(&env, "clerk");

        let result = update_settings(
            env.store(),
            &env.attachments,
            &user,
            SettingsUpdate {
                commander_name: Some("clerk".to_string()),
                ..SettingsUpdate::default()
            },
            None,
        )
        .await;
        assert!(matches!(result, Err(Error::PermissionDenied)));
        assert_eq!(get_settings(env.store()).unwrap().commander_name, "");
    }

    #[tokio::test]
    async fn test_update_persists_and_stores_logo() {
        let env = TestEnv::new();

        let settings = update_settings(
            env.store(),
            &env.attachments,
            &env.admin,
            SettingsUpdate {
                header_text: Some("Northern Division".to_string()),
                ..SettingsUpdate::default()
            },
            Some(b"png-bytes".to_vec()),
        )
        .await
        .unwrap();

        assert_eq!(settings.logo_path.as_deref(), Some("logo.png"));
        assert!(env.data_dir().join("logo.png").exists());

        let stored = get_settings(env.store()).unwrap();
        assert_eq!(stored.header_text, "Northern Division");
        assert_eq!(stored.logo_path.as_deref(), Some("logo.png"));
    }

    #[tokio::test]
    async fn test_invalid_update_does_not_write_logo() {
        let env = TestEnv::new();

        let result = update_settings(
            env.store(),
            &env.attachments,
            &env.admin,
            SettingsUpdate {
                font_size: Some(0),
                ..SettingsUpdate::default()
            },
            Some(b"png-bytes".to_vec()),
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(!env.data_dir().join("logo.png").exists());
    }
}
