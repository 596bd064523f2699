//! Base/business classification of modules.

/// Identifier prefixes of modules shipped in the base bundle.
pub const DEFAULT_BASE_PREFIXES: &[&str] = &[
    "node_modules/react-native/",
    "node_modules/@sdp.nd/nd-react-wrapper/",
];

/// Decides which modules belong to the shared base bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPolicy {
    base_prefixes: Vec<String>,
}

impl SplitPolicy {
    pub fn new(base_prefixes: Vec<String>) -> Self {
        SplitPolicy { base_prefixes }
    }

    /// Whether the module with this identifier is part of the base tier.
    pub fn is_base_module(&self, id: &str) -> bool {
        self.base_prefixes.iter().any(|prefix| id.starts_with(prefix.as_str()))
    }
}

impl Default for SplitPolicy {
    fn default() -> Self {
        SplitPolicy::new(DEFAULT_BASE_PREFIXES.iter().map(|p| p.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefixes() {
        let policy = SplitPolicy::default();
        assert!(policy.is_base_module("node_modules/react-native/Libraries/Image/Image.ios.js"));
        assert!(policy.is_base_module("node_modules/@sdp.nd/nd-react-wrapper/bundleUtil.js"));
        assert!(!policy.is_base_module("node_modules/react-native-video/index.js"));
        assert!(!policy.is_base_module("src/App.js"));
        assert!(!policy.is_base_module("/abs/node_modules/react-native/index.js"));
    }
}
