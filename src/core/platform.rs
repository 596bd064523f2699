//! Platform tokens.

use std::fmt;

/// The platform-agnostic native token (`foo.native.js`).
pub const NATIVE: &str = "native";

/// Key under which the short-name index stores a file variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlatformKey {
    /// A concrete platform such as `ios` or `android`.
    Named(String),
    /// `.native.` files, shared by every native platform.
    Native,
    /// Files without a recognised platform infix.
    Generic,
}

impl PlatformKey {
    /// Map a platform token to its key; `native` gets its own tier.
    pub fn from_token(token: &str) -> Self {
        if token == NATIVE {
            PlatformKey::Native
        } else {
            PlatformKey::Named(token.to_string())
        }
    }

    /// Detect the key from a path of the form `name.<platform>.ext`.
    ///
    /// Only the second-to-last dotted segment is considered, and it must be a
    /// member of `platforms`.
    pub fn detect(path: &str, platforms: &[String]) -> Self {
        let Some(last) = path.rfind('.') else {
            return PlatformKey::Generic;
        };
        let Some(second) = path[..last].rfind('.') else {
            return PlatformKey::Generic;
        };
        let candidate = &path[second + 1..last];
        if candidate.contains('/') || candidate.contains('\\') {
            return PlatformKey::Generic;
        }
        if platforms.iter().any(|p| p == candidate) {
            PlatformKey::from_token(candidate)
        } else {
            PlatformKey::Generic
        }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformKey::Named(name) => write!(f, "{}", name),
            PlatformKey::Native => write!(f, "native"),
            PlatformKey::Generic => write!(f, "generic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platforms() -> Vec<String> {
        ["android", "ios", "native", "web"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_detect_platform() {
        let p = platforms();
        assert_eq!(
            PlatformKey::detect("/tmp/Image.android.js", &p),
            PlatformKey::Named("android".into())
        );
        assert_eq!(
            PlatformKey::detect("/tmp/Image.ios.js", &p),
            PlatformKey::Named("ios".into())
        );
        assert_eq!(PlatformKey::detect("/tmp/Image.js", &p), PlatformKey::Generic);
        assert_eq!(
            PlatformKey::detect("/tmp/Image.invalid.js", &p),
            PlatformKey::Generic
        );
        assert_eq!(
            PlatformKey::detect("/tmp/Image.some.info.ios.js", &p),
            PlatformKey::Named("ios".into())
        );
        assert_eq!(
            PlatformKey::detect("/tmp/Lib/some/info/Image.some.info.ios.json", &p),
            PlatformKey::Named("ios".into())
        );
        assert_eq!(PlatformKey::detect("/tmp/View.native.js", &p), PlatformKey::Native);
    }

    #[test]
    fn test_dot_in_directory_is_not_a_platform() {
        let p = platforms();
        assert_eq!(PlatformKey::detect("/tmp/a.ios/index.js", &p), PlatformKey::Generic);
    }
}
