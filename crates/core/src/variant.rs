//! Default variant pre-selected for a follow-up.

use crate::catalog::ProfileCatalog;
use crate::types::{AttemptData, RunReason};

/// Variant to pre-select for the next follow-up.
///
/// The most recent coding-agent process that recorded a variant wins. Only
/// when the attempt has no coding-agent process at all does the catalog's
/// first variant for the attempt's declared profile apply.
pub fn default_follow_up_variant(
    data: &AttemptData,
    attempt_profile: Option<&str>,
    catalog: &ProfileCatalog,
) -> Option<String> {
    let agents: Vec<_> = data
        .processes
        .iter()
        .filter(|p| p.run_reason == RunReason::CodingAgent)
        .collect();

    if !agents.is_empty() {
        return agents
            .iter()
            .rev()
            .find_map(|p| data.profile_of(&p.id).and_then(|pv| pv.variant.clone()));
    }

    attempt_profile
        .and_then(|label| catalog.first_variant(label))
        .map(str::to_string)
}
