//! License classification.
//!
//! Turns the account's license grants into the package request list, seeds
//! `Subs` with every package token and skip-lists auto-granted packages.

use crate::state::PipelineState;
use std::collections::HashMap;
use tokensync_core::config::SyncConfig;
use tokensync_core::{LicenseGrant, PackageId, PackageRequest};

/// Classify license grants. No remote calls.
///
/// Every licensed package is requested, with or without a token. Duplicate
/// grants collapse onto the first occurrence. Each package keeps the first
/// non-zero token any of its grants carries, in both `Subs` and the request.
pub fn classify_licenses(
    grants: &[LicenseGrant],
    config: &SyncConfig,
    state: &mut PipelineState,
) -> Vec<PackageRequest> {
    let mut requests: Vec<PackageRequest> = Vec::with_capacity(grants.len());
    let mut index: HashMap<PackageId, usize> = HashMap::with_capacity(grants.len());
    let mut skipped: Vec<PackageId> = Vec::new();

    for grant in grants {
        if config.skip_auto_grant && grant.is_auto_grant() && state.skip_package(grant.package_id) {
            skipped.push(grant.package_id);
        }

        let request = match index.get(&grant.package_id) {
            Some(&i) => &mut requests[i],
            None => {
                index.insert(grant.package_id, requests.len());
                requests.push(PackageRequest::new(grant.package_id, None));
                let last = requests.len() - 1;
                &mut requests[last]
            }
        };
        if request.access_token.is_none() {
            if let Some(token) = grant.token() {
                request.access_token = Some(token);
                state.result.insert_sub(grant.package_id, token);
            }
        }
    }

    state.stats.licenses = grants.len();

    if !skipped.is_empty() {
        let ids: Vec<String> = skipped.iter().map(ToString::to_string).collect();
        tracing::info!(
            count = skipped.len(),
            "Skipping auto-granted packages: {}",
            ids.join(", ")
        );
    }

    requests
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokensync_core::PaymentMethod;

    fn grant(id: u32, token: u64, method: PaymentMethod) -> LicenseGrant {
        LicenseGrant::new(PackageId::new(id), token, method)
    }

    #[test]
    fn requests_every_package_and_records_tokens() {
        let grants = vec![
            grant(1, 0, PaymentMethod::Purchase),
            grant(2, 5, PaymentMethod::Purchase),
            grant(3, 0, PaymentMethod::AutoGrant),
        ];
        let mut state = PipelineState::new("acct");

        let requests = classify_licenses(&grants, &SyncConfig::default(), &mut state);

        let ids: Vec<u32> = requests.iter().map(|r| r.package_id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(requests[1].access_token, Some(5));
        assert_eq!(requests[0].access_token, None);

        assert_eq!(state.result.subs.len(), 1);
        assert_eq!(state.result.subs[&PackageId::new(2)], "5");
        assert!(state.is_package_skipped(PackageId::new(3)));
        assert_eq!(state.skipped_packages().len(), 1);
    }

    #[test]
    fn auto_grant_kept_when_skip_disabled() {
        let grants = vec![grant(3, 0, PaymentMethod::AutoGrant)];
        let config = SyncConfig {
            skip_auto_grant: false,
            ..SyncConfig::default()
        };
        let mut state = PipelineState::new("acct");

        let requests = classify_licenses(&grants, &config, &mut state);

        assert_eq!(requests.len(), 1);
        assert!(state.skipped_packages().is_empty());
    }

    #[test]
    fn auto_granted_package_with_token_still_lands_in_subs() {
        let grants = vec![grant(4, 9, PaymentMethod::AutoGrant)];
        let mut state = PipelineState::new("acct");

        classify_licenses(&grants, &SyncConfig::default(), &mut state);

        assert_eq!(state.result.subs[&PackageId::new(4)], "9");
        assert!(state.is_package_skipped(PackageId::new(4)));
    }

    #[test]
    fn duplicate_grants_collapse_and_keep_token() {
        let grants = vec![
            grant(7, 0, PaymentMethod::Complimentary),
            grant(7, 11, PaymentMethod::Purchase),
        ];
        let mut state = PipelineState::new("acct");

        let requests = classify_licenses(&grants, &SyncConfig::default(), &mut state);

        assert_eq!(requests, vec![PackageRequest::new(PackageId::new(7), Some(11))]);
        assert_eq!(state.stats.licenses, 2);
        assert_eq!(state.result.subs[&PackageId::new(7)], "11");
    }

    #[test]
    fn first_nonzero_token_wins_in_subs_and_request() {
        let grants = vec![
            grant(7, 11, PaymentMethod::Purchase),
            grant(7, 12, PaymentMethod::Purchase),
        ];
        let mut state = PipelineState::new("acct");

        let requests = classify_licenses(&grants, &SyncConfig::default(), &mut state);

        assert_eq!(requests, vec![PackageRequest::new(PackageId::new(7), Some(11))]);
        assert_eq!(state.result.subs.len(), 1);
        assert_eq!(state.result.subs[&PackageId::new(7)], "11");
    }
}
