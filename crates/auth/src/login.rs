//! Login normalization.
//!
//! Some clients submit their e-mail address as the username. The
//! authentication service serves many domains from one user namespace, so
//! the domain part carries no information and is dropped.

/// Strip everything from the first `@` onwards.
///
/// Returns `None` when nothing is left (`""`, `"@"`, `"@example.com"`);
/// such a login can never authenticate and must not reach the network.
#[must_use]
pub fn normalize_login(raw: &str) -> Option<&str> {
    let local = raw.split_once('@').map_or(raw, |(local, _domain)| local);
    (!local.is_empty()).then_some(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_login_is_unchanged() {
        assert_eq!(normalize_login("alice"), Some("alice"));
    }

    #[test]
    fn domain_is_stripped() {
        assert_eq!(normalize_login("alice@example.com"), Some("alice"));
    }

    #[test]
    fn only_first_at_counts() {
        assert_eq!(normalize_login("alice@example.com@evil.org"), Some("alice"));
    }

    #[test]
    fn degenerate_logins_are_empty() {
        assert_eq!(normalize_login(""), None);
        assert_eq!(normalize_login("@"), None);
        assert_eq!(normalize_login("@example.com"), None);
        assert_eq!(normalize_login("@@"), None);
    }

    #[test]
    fn no_case_folding_or_trimming() {
        assert_eq!(normalize_login(" Alice @example.com"), Some(" Alice "));
    }
}
