//! Share links and compact share codes for a proposal. The code is a
//! URL-safe base64 wrapping of `proposal:{id}` so it survives chat apps that
//! mangle long URLs; decoding accepts either form, or a bare id.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use shared::domain::ProposalId;

const SHARE_PREFIX: &str = "proposal:";

pub fn share_link(public_base_url: &str, id: &ProposalId) -> String {
    format!("{}/proposal/{}", public_base_url.trim_end_matches('/'), id)
}

pub fn encode_share_code(id: &ProposalId) -> String {
    URL_SAFE_NO_PAD.encode(format!("{SHARE_PREFIX}{id}").as_bytes())
}

/// Resolves whatever the recipient pasted (full link, share code, or bare
/// id) to a proposal id. `None` when nothing usable is left after trimming.
pub fn decode_share_target(input: &str) -> Option<ProposalId> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Some((_, tail)) = input.rsplit_once("/proposal/") {
        let id = tail
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_matches('/');
        if !id.is_empty() {
            return Some(ProposalId(id.to_string()));
        }
        return None;
    }

    if let Ok(decoded) = URL_SAFE_NO_PAD.decode(input.as_bytes()) {
        if let Ok(text) = String::from_utf8(decoded) {
            if let Some(id) = text.strip_prefix(SHARE_PREFIX) {
                if !id.is_empty() {
                    return Some(ProposalId(id.to_string()));
                }
            }
        }
    }

    if input.contains(['/', ' ']) {
        return None;
    }
    Some(ProposalId(input.to_string()))
}
