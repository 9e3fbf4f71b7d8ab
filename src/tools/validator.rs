//! Command Validation Module
//!
//! This module decides whether a raw command string may be executed.
//! It combines a substring blocklist with a prefix allowlist; the blocklist
//! is checked first and always wins.

use serde::{Deserialize, Serialize};

/// Forbidden substrings, matched anywhere in the lowercased command
pub const DEFAULT_BLOCKLIST: &[&str] = &[
    "sudo",
    "rm -rf",
    "rm -r /",
    "shutdown",
    "poweroff",
    "reboot",
    "mkfs",
    "mount",
    "umount",
    "dd",
    "chown /",
    "chmod 777 /",
    "passwd",
    "useradd",
    "usermod",
];

/// Permitted command prefixes, matched at the start of the lowercased command
pub const DEFAULT_ALLOWLIST: &[&str] = &[
    "ls",
    "cat",
    "echo",
    "pwd",
    "whoami",
    "df",
    "du",
    "ps",
    "date",
    "uptime",
    "head",
    "tail",
    "grep",
    "uname",
    "top -l 1",
    "ifconfig",
    "ipconfig",
];

/// Classification of a single command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum Verdict {
    /// Command starts with a permitted prefix and contains no forbidden pattern
    Allowed,

    /// Command contains a forbidden pattern
    Blocked(String),

    /// Command does not start with any permitted prefix
    NotWhitelisted(String),
}

impl Verdict {
    /// Whether the command may be executed
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }

    /// Human-readable rejection reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Allowed => None,
            Verdict::Blocked(reason) | Verdict::NotWhitelisted(reason) => Some(reason),
        }
    }

    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Verdict::Allowed => "allowed",
            Verdict::Blocked(_) => "blocked",
            Verdict::NotWhitelisted(_) => "not_whitelisted",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Allowed => write!(f, "Allowed"),
            Verdict::Blocked(reason) => write!(f, "Blocked: {}", reason),
            Verdict::NotWhitelisted(reason) => write!(f, "Not whitelisted: {}", reason),
        }
    }
}

/// Command validator that enforces the blocklist/allowlist policy
///
/// # Matching Rules
///
/// 1. **Normalize**: the command is trimmed and lowercased for matching only
/// 2. **Blocklist**: a forbidden pattern anywhere in the command blocks it
/// 3. **Allowlist**: the command must start with one of the permitted prefixes
///
/// Matching is plain substring/prefix comparison over literal text. It does
/// not understand tokens, so `echo address` is blocked by `dd`.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    /// Forbidden substrings, lowercased, in match order
    blocklist: Vec<String>,

    /// Permitted prefixes, lowercased, in match order
    allowlist: Vec<String>,
}

impl Default for CommandValidator {
    fn default() -> Self {
        Self::with_default_policy()
    }
}

impl CommandValidator {
    /// Create a validator with the built-in blocklist and allowlist
    pub fn with_default_policy() -> Self {
        Self::with_policy(
            DEFAULT_BLOCKLIST.iter().map(|s| s.to_string()).collect(),
            DEFAULT_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Create a validator with custom lists
    ///
    /// Patterns are lowercased so matching stays case-insensitive.
    pub fn with_policy(blocklist: Vec<String>, allowlist: Vec<String>) -> Self {
        Self {
            blocklist: blocklist.into_iter().map(|p| p.to_lowercase()).collect(),
            allowlist: allowlist.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Classify a raw command
    ///
    /// # Example
    ///
    /// ```
    /// use safeterm::tools::{CommandValidator, Verdict};
    ///
    /// let validator = CommandValidator::default();
    /// assert_eq!(validator.validate("ls -la"), Verdict::Allowed);
    /// assert!(matches!(validator.validate("sudo ls"), Verdict::Blocked(_)));
    /// assert!(matches!(validator.validate("vim"), Verdict::NotWhitelisted(_)));
    /// ```
    pub fn validate(&self, raw: &str) -> Verdict {
        let normalized = raw.trim().to_lowercase();

        if let Some(pattern) = self.find_blocked(&normalized) {
            return Verdict::Blocked(format!(
                "Command blocked: contains forbidden pattern '{}'",
                pattern
            ));
        }

        if self.allowlist.iter().any(|p| normalized.starts_with(p.as_str())) {
            return Verdict::Allowed;
        }

        Verdict::NotWhitelisted(format!(
            "Command not in whitelist. Allowed: {}",
            self.allowlist.join(", ")
        ))
    }

    /// First forbidden pattern contained in an already-normalized command
    fn find_blocked(&self, normalized: &str) -> Option<&str> {
        self.blocklist
            .iter()
            .map(String::as_str)
            .find(|p| normalized.contains(p))
    }

    /// Get the forbidden patterns
    pub fn blocklist(&self) -> &[String] {
        &self.blocklist
    }

    /// Get the permitted prefixes
    pub fn allowlist(&self) -> &[String] {
        &self.allowlist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_allowed_commands() {
        let validator = CommandValidator::default();

        for cmd in ["ls", "ls -la /tmp", "pwd", "echo hello", "date", "uname -a", "top -l 1"] {
            assert_eq!(validator.validate(cmd), Verdict::Allowed, "{}", cmd);
        }
    }

    #[test]
    fn test_blocked_commands() {
        let validator = CommandValidator::default();

        let cases = [
            ("sudo ls", "sudo"),
            ("rm -rf /", "rm -rf"),
            ("shutdown -h now", "shutdown"),
            ("mkfs.ext4 /dev/sda1", "mkfs"),
            ("dd if=/dev/zero of=/dev/sda", "dd"),
            ("chmod 777 /", "chmod 777 /"),
            ("passwd root", "passwd"),
        ];

        for (cmd, pattern) in cases {
            match validator.validate(cmd) {
                Verdict::Blocked(reason) => {
                    assert!(reason.contains(&format!("'{}'", pattern)), "{}: {}", cmd, reason)
                }
                other => panic!("{} should be blocked, got {:?}", cmd, other),
            }
        }
    }

    #[test]
    fn test_blocklist_wins_over_allowlist() {
        let validator = CommandValidator::default();

        assert!(matches!(validator.validate("cat /etc/passwd"), Verdict::Blocked(_)));
        assert!(matches!(validator.validate("echo sudo"), Verdict::Blocked(_)));
        assert!(matches!(validator.validate("ls; rm -rf ~"), Verdict::Blocked(_)));
    }

    #[test]
    fn test_substring_matching_inside_tokens() {
        let validator = CommandValidator::default();

        // "dd" inside "address"
        assert!(matches!(validator.validate("echo address"), Verdict::Blocked(_)));
        // "mount" is matched before "umount"
        assert_eq!(
            validator.validate("umount /mnt"),
            Verdict::Blocked("Command blocked: contains forbidden pattern 'mount'".to_string())
        );
    }

    #[test]
    fn test_case_insensitive() {
        let validator = CommandValidator::default();

        assert_eq!(validator.validate("LS -LA"), Verdict::Allowed);
        assert!(matches!(validator.validate("SuDo whoami"), Verdict::Blocked(_)));
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let validator = CommandValidator::default();
        assert_eq!(validator.validate("   pwd \t\n"), Verdict::Allowed);
    }

    #[test]
    fn test_empty_input_not_whitelisted() {
        let validator = CommandValidator::default();

        for cmd in ["", "   ", "\t\n"] {
            assert!(matches!(validator.validate(cmd), Verdict::NotWhitelisted(_)));
        }
    }

    #[test]
    fn test_not_whitelisted_reason_lists_prefixes() {
        let validator = CommandValidator::default();

        let verdict = validator.validate("vim /etc/hosts");
        let reason = verdict.reason().unwrap();
        assert!(reason.starts_with("Command not in whitelist. Allowed: ls, cat, echo"));
        assert!(reason.ends_with("ifconfig, ipconfig"));
    }

    #[test]
    fn test_prefix_matching_is_not_word_based() {
        let validator = CommandValidator::default();

        // Prefix comparison only; "lsblk" starts with "ls"
        assert_eq!(validator.validate("lsblk"), Verdict::Allowed);
        assert!(matches!(validator.validate("xls"), Verdict::NotWhitelisted(_)));
    }

    #[test]
    fn test_custom_policy_is_lowercased() {
        let validator = CommandValidator::with_policy(
            vec!["FORBIDDEN".to_string()],
            vec!["Tool".to_string()],
        );

        assert_eq!(validator.blocklist(), &["forbidden".to_string()]);
        assert_eq!(validator.validate("TOOL run"), Verdict::Allowed);
        assert!(matches!(validator.validate("tool forbidden"), Verdict::Blocked(_)));
        assert!(matches!(validator.validate("ls"), Verdict::NotWhitelisted(_)));
    }

    #[test]
    fn test_verdict_helpers() {
        assert!(Verdict::Allowed.is_allowed());
        assert_eq!(Verdict::Allowed.reason(), None);
        assert_eq!(Verdict::Blocked("x".into()).kind(), "blocked");
        assert_eq!(Verdict::NotWhitelisted("y".into()).reason(), Some("y"));
        assert_eq!(Verdict::Blocked("x".into()).to_string(), "Blocked: x");
    }

    fn blocklist_strategy() -> impl Strategy<Value = &'static str> {
        prop::sample::select(DEFAULT_BLOCKLIST)
    }

    fn allowlist_strategy() -> impl Strategy<Value = &'static str> {
        prop::sample::select(DEFAULT_ALLOWLIST)
    }

    proptest! {
        #[test]
        fn prop_blocked_anywhere(
            prefix in allowlist_strategy(),
            before in "[a-z ]{0,8}",
            pattern in blocklist_strategy(),
            after in "[a-z ]{0,8}",
            upper in any::<bool>(),
        ) {
            let validator = CommandValidator::default();
            let mut cmd = format!("{} {}{}{}", prefix, before, pattern, after);
            if upper {
                cmd = cmd.to_uppercase();
            }
            prop_assert!(matches!(validator.validate(&cmd), Verdict::Blocked(_)));
        }

        #[test]
        fn prop_allowed_prefix_without_blocked_pattern(
            prefix in allowlist_strategy(),
            args in "[0-9/._-]{0,12}",
        ) {
            // Digits and punctuation cannot spell any forbidden pattern
            let validator = CommandValidator::default();
            let cmd = format!("{} {}", prefix, args);
            prop_assert_eq!(validator.validate(&cmd), Verdict::Allowed);
        }

        #[test]
        fn prop_unknown_prefix_not_whitelisted(cmd in "[0-9][0-9a-z ]{0,16}") {
            // No permitted prefix starts with a digit
            let validator = CommandValidator::default();
            let verdict = validator.validate(&cmd);
            prop_assert!(!verdict.is_allowed());
            if validator.find_blocked(&cmd.trim().to_lowercase()).is_none() {
                prop_assert!(matches!(verdict, Verdict::NotWhitelisted(_)));
            }
        }
    }
}
