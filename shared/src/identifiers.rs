//! Generated identifiers: slugs, invite tokens, SKUs, usernames and channel names
//!
//! Randomness is always supplied by the caller so every function here is
//! deterministic and testable.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

/// Lowercase and collapse every run of non-alphanumeric characters into a
/// single `-`, trimming dashes from both ends.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Build a shareable board invite token: `<shortToken>-<slug(title)>`
pub fn board_invite_token(random: &[u8; 8], board_title: &str) -> String {
    let short = URL_SAFE_NO_PAD.encode(random);
    format!("{}-{}", short, slugify(board_title))
}

/// Build a workspace invitation token: `<shortToken>-<slug(workspace id)>`
pub fn workspace_invite_token(random: &[u8; 8], workspace_id: &uuid::Uuid) -> String {
    let short = URL_SAFE_NO_PAD.encode(random);
    format!("{}-{}", short, slugify(&workspace_id.to_string()))
}

/// Split an invite token into its random prefix and slug.
///
/// The prefix is the 11-character base64url encoding of 8 bytes, so it may
/// itself contain `-`; the split is positional.
pub fn split_invite_token(token: &str) -> Option<(&str, &str)> {
    const PREFIX_LEN: usize = 11;
    if token.len() < PREFIX_LEN + 1 || !token.is_char_boundary(PREFIX_LEN) {
        return None;
    }
    let (prefix, rest) = token.split_at(PREFIX_LEN);
    let slug = rest.strip_prefix('-')?;
    let valid_prefix = prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid_prefix.then_some((prefix, slug))
}

/// Meeting channel name: `meeting-<hex(8 bytes)>`
pub fn meeting_channel_name(random: &[u8; 8]) -> String {
    let hex: String = random.iter().map(|b| format!("{:02x}", b)).collect();
    format!("meeting-{}", hex)
}

/// Stock keeping unit: `<INITIALS(4)>-<ATTR(4)|BASE>-<NNNN>`
pub fn generate_sku(name: &str, attribute_value: Option<&str>, random_digits: u16) -> String {
    let initials: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(4)
        .collect();

    let suffix = match attribute_value {
        Some(value) => value
            .to_uppercase()
            .chars()
            .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            .take(4)
            .collect(),
        None => "BASE".to_string(),
    };

    format!("{}-{}-{:04}", initials, suffix, random_digits % 10_000)
}

/// Initials shown in avatars.
///
/// Several words give the first letter of each; a single word gives its
/// first two letters.
pub fn derive_initials(full_name: &str) -> String {
    let parts: Vec<&str> = full_name.split_whitespace().collect();

    match parts.as_slice() {
        [] => String::new(),
        [word] => word.chars().take(2).flat_map(char::to_uppercase).collect(),
        words => words
            .iter()
            .filter_map(|w| w.chars().next())
            .flat_map(char::to_uppercase)
            .collect(),
    }
}

/// Username base: lowercased name with whitespace runs replaced by `.`
pub fn username_base(full_name: &str) -> String {
    full_name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(".")
}

/// The n-th candidate for a unique name: the base itself, then `base1`, `base2`, ...
pub fn numbered_candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{}{}", base, attempt)
    }
}

/// The n-th candidate for a unique slug: the base itself, then `base-1`, `base-2`, ...
pub fn dashed_candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Sprint Planning"), "sprint-planning");
        assert_eq!(slugify("  Q3 -- Roadmap!! "), "q3-roadmap");
        assert_eq!(slugify("***"), "");
        assert_eq!(slugify("Already-slugged"), "already-slugged");
    }

    #[test]
    fn test_board_invite_token_format() {
        let token = board_invite_token(&[0u8; 8], "Team Board");
        assert_eq!(token, "AAAAAAAAAAA-team-board");
        let (prefix, slug) = split_invite_token(&token).unwrap();
        assert_eq!(prefix.len(), 11);
        assert_eq!(slug, "team-board");
    }

    #[test]
    fn test_workspace_invite_token_uses_id_slug() {
        let id = uuid::Uuid::nil();
        let token = workspace_invite_token(&[255u8; 8], &id);
        assert!(token.ends_with("00000000-0000-0000-0000-000000000000"));
        assert!(token.starts_with("__________8-"));
    }

    #[test]
    fn test_meeting_channel_name() {
        assert_eq!(
            meeting_channel_name(&[0xde, 0xad, 0xbe, 0xef, 0, 1, 2, 3]),
            "meeting-deadbeef00010203"
        );
    }

    #[test]
    fn test_generate_sku() {
        assert_eq!(generate_sku("Cotton Crew Neck Tee", Some("x-large"), 42), "CCNT-XLAR-0042");
        assert_eq!(generate_sku("Running Shoes", None, 9999), "RS-BASE-9999");
        assert_eq!(generate_sku("Mug", Some("12 oz"), 7), "M-12OZ-0007");
    }

    #[test]
    fn test_derive_initials() {
        assert_eq!(derive_initials("Ada Lovelace"), "AL");
        assert_eq!(derive_initials("madonna"), "MA");
        assert_eq!(derive_initials("  grace  brewster hopper "), "GBH");
        assert_eq!(derive_initials("x"), "X");
        assert_eq!(derive_initials(""), "");
    }

    #[test]
    fn test_username_candidates() {
        let base = username_base("  Ada   King Lovelace ");
        assert_eq!(base, "ada.king.lovelace");
        assert_eq!(numbered_candidate(&base, 0), "ada.king.lovelace");
        assert_eq!(numbered_candidate(&base, 2), "ada.king.lovelace2");
        assert_eq!(dashed_candidate("shoes", 3), "shoes-3");
    }
}
