//! String policies used while reconciling: endpoint normalization and slug matching.

/// Placeholder tokens the registry leaves in templated endpoints.
const PLACEHOLDER_TOKENS: &[&str] = &["${INFURA_API_KEY}", "${ALCHEMY_API_KEY}", "${API_KEY}"];

/// Strip trailing slashes (`https://a.com//` -> `https://a.com`).
pub fn strip_trailing_slash(rpc: &str) -> &str {
    rpc.trim_end_matches('/')
}

/// True if the endpoint still contains an unresolved credential template.
pub fn has_unresolved_placeholder(rpc: &str) -> bool {
    if PLACEHOLDER_TOKENS.iter().any(|t| rpc.contains(t)) {
        return true;
    }
    // Any other `${...}` template is just as unusable.
    match rpc.find("${") {
        Some(start) => rpc[start..].contains('}'),
        None => false,
    }
}

/// Build the endpoint list for one chain: own endpoints first, then
/// supplemental ones, all slash-stripped, templated endpoints dropped from
/// both, first occurrence wins.
pub fn normalize_rpcs<'a, I, J>(own: I, supplemental: J) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
    J: IntoIterator<Item = &'a String>,
{
    let mut out: Vec<String> = Vec::new();
    let candidates = own
        .into_iter()
        .chain(supplemental)
        .filter(|rpc| !has_unresolved_placeholder(rpc));
    for rpc in candidates {
        let rpc = strip_trailing_slash(rpc);
        if !out.iter().any(|seen| seen == rpc) {
            out.push(rpc.to_string());
        }
    }
    out
}

/// Lookup key for slugs and TVL feed names.
pub fn slug_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Case-insensitive comparison of a TVL feed name against a chain slug.
pub fn slug_matches(feed_name: &str, slug: &str) -> bool {
    slug_key(feed_name) == slug_key(slug)
}
