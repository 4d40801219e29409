use url::Url;

use crate::error::ApiError;

/// Canonicalize a channel source URL so that equivalent spellings compare
/// equal. Deterministic and idempotent: normalizing an already-normalized
/// URL returns it unchanged.
///
/// Rules: http/https only; scheme and host lowercased; default ports and
/// fragments dropped; a leading `www.` stripped; trailing slashes trimmed.
pub fn normalize(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidUrl);
    }

    // The parser already lowercases scheme and host and drops a default
    // port for the scheme.
    let mut url = Url::parse(trimmed).map_err(|_| ApiError::InvalidUrl)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidUrl);
    }

    let host = url.host_str().ok_or(ApiError::InvalidUrl)?;
    let stripped = host
        .strip_prefix("www.")
        .filter(|rest| !rest.is_empty())
        .map(str::to_string);
    if let Some(host) = stripped {
        url.set_host(Some(&host)).map_err(|_| ApiError::InvalidUrl)?;
    }

    url.set_fragment(None);

    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);

    let mut out = url.to_string();
    // A bare host serializes with a lone "/" path; trim it so the root
    // form is stable too.
    if url.path() == "/" && url.query().is_none() && out.ends_with('/') {
        out.pop();
    }

    Ok(out)
}
