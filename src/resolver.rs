//! Destination folder naming rules.
//!
//! Emails in the mapping file spell the at-sign as the literal `atsym`
//! placeholder. An email containing both `atsym` and `.com` is treated as a
//! placeholder address, and the folder name comes from the legacy account id
//! cut at the trim token. Any other email is used verbatim as the folder name.

const AT_PLACEHOLDER: &str = "atsym";
const DOT_COM: &str = ".com";

/// Returns the destination folder name for an account, or `None` when no
/// usable name can be derived.
///
/// If the trim token does not occur in the account id, the whole trimmed id is
/// used. A prefix that comes out empty (token at index 0, or an empty token)
/// yields `None`.
pub fn resolve_folder_name(email: &str, legacy_id: &str, trim_token: &str) -> Option<String> {
    let email = email.trim();
    let legacy_id = legacy_id.trim();
    if email.is_empty() || legacy_id.is_empty() {
        return None;
    }

    if !is_placeholder_email(email) {
        return Some(email.to_string());
    }

    let name = match find_ignore_ascii_case(legacy_id, trim_token) {
        Some(idx) => &legacy_id[..idx],
        None => legacy_id,
    };

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

pub fn is_placeholder_email(email: &str) -> bool {
    find_ignore_ascii_case(email, AT_PLACEHOLDER).is_some()
        && find_ignore_ascii_case(email, DOT_COM).is_some()
}

/// Byte offset of the first ASCII-case-insensitive match of `needle`.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    // ASCII folding keeps byte offsets aligned with the original string
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_inputs() {
        assert_eq!(resolve_folder_name("", "jdoe", "END"), None);
        assert_eq!(resolve_folder_name("   ", "jdoe", "END"), None);
        assert_eq!(resolve_folder_name("userATSYMx.com", "", "END"), None);
        assert_eq!(resolve_folder_name("userATSYMx.com", " \t", "END"), None);
    }

    #[test]
    fn test_real_email_is_used_verbatim() {
        assert_eq!(
            resolve_folder_name("user@domain.com", "jdoe123END", "END"),
            Some("user@domain.com".to_string())
        );
        assert_eq!(
            resolve_folder_name("  user@domain.com  ", "jdoe123END", "END"),
            Some("user@domain.com".to_string())
        );
    }

    #[test]
    fn test_placeholder_email_trims_account() {
        assert_eq!(
            resolve_folder_name("userATSYMdomain.com", "jdoe123END", "END"),
            Some("jdoe123".to_string())
        );
        assert_eq!(
            resolve_folder_name("useratsymdomain.COM", " jdoe123end_x ", "END"),
            Some("jdoe123".to_string())
        );
    }

    #[test]
    fn test_placeholder_needs_both_markers() {
        // atsym without .com
        assert_eq!(
            resolve_folder_name("userATSYMdomain.org", "jdoe123END", "END"),
            Some("userATSYMdomain.org".to_string())
        );
        assert!(!is_placeholder_email("user@domain.com"));
        assert!(is_placeholder_email("xAtSyMy.CoM"));
    }

    #[test]
    fn test_missing_trim_token_keeps_whole_account() {
        assert_eq!(
            resolve_folder_name("userATSYMdomain.com", "jdoe123", "END"),
            Some("jdoe123".to_string())
        );
    }

    #[test]
    fn test_empty_prefix_is_none() {
        assert_eq!(resolve_folder_name("userATSYMdomain.com", "ENDjdoe", "END"), None);
        assert_eq!(resolve_folder_name("userATSYMdomain.com", "jdoe", ""), None);
    }

    #[test]
    fn test_first_token_occurrence_wins() {
        assert_eq!(
            resolve_folder_name("aATSYMb.com", "abENDcdEND", "end"),
            Some("ab".to_string())
        );
    }
}
