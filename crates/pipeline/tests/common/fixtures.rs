use std::collections::BTreeMap;
use tokensync_core::config::{RetryConfig, SyncConfig};
use tokensync_core::{AppId, ContentUnitId, LicenseGrant, PackageId, PaymentMethod};
use tokensync_session::{AppInfo, Catalog, ContentUnitDecl, PackageInfo};

/// Three grants, two described packages, one described application.
///
/// Package 3 is auto-granted, so app 20 ends up skip-listed; app 10 declares
/// content unit 30 next to its own default unit.
#[allow(dead_code)]
pub fn scenario_catalog() -> Catalog {
    Catalog {
        identity: "acct-e2e".to_string(),
        licenses: vec![
            LicenseGrant::new(PackageId::new(1), 0, PaymentMethod::Purchase),
            LicenseGrant::new(PackageId::new(2), 5, PaymentMethod::Purchase),
            LicenseGrant::new(PackageId::new(3), 0, PaymentMethod::AutoGrant),
        ],
        packages: vec![
            PackageInfo {
                package_id: PackageId::new(2),
                app_ids: vec![AppId::new(10), AppId::new(11)],
                content_unit_ids: vec![],
            },
            PackageInfo {
                package_id: PackageId::new(3),
                app_ids: vec![AppId::new(20)],
                content_unit_ids: vec![],
            },
        ],
        access_tokens: BTreeMap::from([(AppId::new(10), 7), (AppId::new(11), 0)]),
        apps: vec![AppInfo {
            app_id: AppId::new(10),
            content_units: vec![ContentUnitDecl::new("10"), ContentUnitDecl::new("30")],
        }],
        decryption_keys: BTreeMap::from([
            (ContentUnitId::new(10), "0a0a".to_string()),
            (ContentUnitId::new(11), "0b0b".to_string()),
            (ContentUnitId::new(20), "1414".to_string()),
            (ContentUnitId::new(30), "1e1e".to_string()),
        ]),
        ..Catalog::default()
    }
}

/// Default sync settings with retry delays short enough for tests.
#[allow(dead_code)]
pub fn fast_config() -> SyncConfig {
    SyncConfig {
        retry: RetryConfig {
            attempts: 3,
            min_delay_ms: 1,
            max_delay_ms: 5,
        },
        batch_timeout_secs: 2,
        key_timeout_secs: 1,
        ..SyncConfig::default()
    }
}
