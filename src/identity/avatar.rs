/// Absolute URLs pass through, empty falls back to `default_avatar`,
/// anything else is treated as a server-relative path under `base_api`.
pub fn resolve_avatar(raw: Option<&str>, base_api: &str, default_avatar: &str) -> String {
    let avatar = raw.unwrap_or("");
    if is_http(avatar) {
        return avatar.to_string();
    }
    if avatar.is_empty() {
        return default_avatar.to_string();
    }
    format!("{}{}", base_api, avatar)
}

fn is_http(url: &str) -> bool {
    url.contains("http://") || url.contains("https://")
}
