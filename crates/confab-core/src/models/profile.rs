use serde::{Deserialize, Serialize};

/// Social identity payload for a peer, as delivered by the identity service.
///
/// Field names follow the service's JSON (camelCase); the whole payload is
/// cached raw and parsed on demand, so a malformed record degrades a single
/// title resolution instead of poisoning the cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileSocials {
    pub lens_handles: Vec<LensHandle>,
    pub ens_names: Vec<EnsName>,
    pub unstoppable_domains: Vec<UnstoppableDomain>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LensHandle {
    pub handle: String,
    pub profile_id: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnsName {
    pub name: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnstoppableDomain {
    pub domain: String,
    pub is_primary: bool,
}

/// Resolve a conversation's display title from cached socials.
///
/// Resolution order: handle linked to the conversation's context id, then the
/// primary verified name, then the primary domain, else `None`. Never touches
/// the network.
pub fn resolve_conversation_title(
    context_conversation_id: Option<&str>,
    socials: &ProfileSocials,
) -> Option<String> {
    let linked_handle = context_conversation_id.and_then(|context_id| {
        socials
            .lens_handles
            .iter()
            .find(|h| !h.profile_id.is_empty() && context_id.contains(&h.profile_id))
            .map(|h| h.handle.clone())
    });

    let primary_name = socials
        .ens_names
        .iter()
        .find(|e| e.is_primary)
        .map(|e| e.name.clone());

    let primary_domain = socials
        .unstoppable_domains
        .iter()
        .find(|u| u.is_primary)
        .map(|u| u.domain.clone());

    linked_handle.or(primary_name).or(primary_domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn socials() -> ProfileSocials {
        ProfileSocials {
            lens_handles: vec![LensHandle {
                handle: "alice.lens".to_string(),
                profile_id: "0x01".to_string(),
                is_default: true,
            }],
            ens_names: vec![EnsName {
                name: "alice.eth".to_string(),
                is_primary: true,
            }],
            unstoppable_domains: vec![UnstoppableDomain {
                domain: "alice.crypto".to_string(),
                is_primary: true,
            }],
        }
    }

    #[test]
    fn test_linked_handle_wins_when_context_matches() {
        let title = resolve_conversation_title(Some("lens.dev/dm/0x01-0x02"), &socials());
        assert_eq!(title.as_deref(), Some("alice.lens"));
    }

    #[test]
    fn test_primary_name_when_context_does_not_match() {
        let title = resolve_conversation_title(Some("some-app/abc"), &socials());
        assert_eq!(title.as_deref(), Some("alice.eth"));
    }

    #[test]
    fn test_primary_name_without_context() {
        let title = resolve_conversation_title(None, &socials());
        assert_eq!(title.as_deref(), Some("alice.eth"));
    }

    #[test]
    fn test_domain_when_no_primary_name() {
        let mut socials = socials();
        socials.ens_names.clear();
        let title = resolve_conversation_title(None, &socials);
        assert_eq!(title.as_deref(), Some("alice.crypto"));
    }

    #[test]
    fn test_none_when_nothing_resolvable() {
        let title = resolve_conversation_title(None, &ProfileSocials::default());
        assert_eq!(title, None);
    }

    #[test]
    fn test_non_primary_entries_are_skipped() {
        let mut socials = socials();
        socials.ens_names[0].is_primary = false;
        socials.unstoppable_domains[0].is_primary = false;
        let title = resolve_conversation_title(None, &socials);
        assert_eq!(title, None);
    }

    #[test]
    fn test_parses_identity_service_payload() {
        let json = r#"{
            "lensHandles": [{"handle": "bob.lens", "profileId": "0x2a", "isDefault": true}],
            "ensNames": [{"name": "bob.eth", "isPrimary": false}],
            "unstoppableDomains": []
        }"#;
        let socials: ProfileSocials = serde_json::from_str(json).unwrap();
        assert_eq!(socials.lens_handles[0].handle, "bob.lens");
        assert!(!socials.ens_names[0].is_primary);
    }
}
