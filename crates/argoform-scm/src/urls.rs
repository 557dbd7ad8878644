//! Repository URL helpers

/// Append `.git` to an HTTP(S) repository URL that lacks it
pub fn add_git_suffix_if_necessary(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.is_empty() || trimmed.ends_with(".git") {
        return trimmed.to_string();
    }
    format!("{}.git", trimmed)
}

/// Repository name from its URL, used as the default output directory
pub fn repo_name_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(|name| name.trim_end_matches(".git").to_string())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "gitops".to_string())
}
