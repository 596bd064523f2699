//! Asset file name grammar: `<name>[@<scale>x][.<platform>].<type>`.

use once_cell::sync::Lazy;
use regex::Regex;

static FILE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)(\.([^.]+))?\.([^.]+)$").expect("valid file name pattern")
});

static BASE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)(@([\d.]+)x)?$").expect("valid base name pattern"));

/// The parts of an asset file name.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPathParts {
    /// `<name>.<type>`, the name callers require.
    pub asset_name: String,
    pub name: String,
    pub platform: Option<String>,
    pub scale: f64,
    /// Extension without the dot.
    pub kind: String,
}

/// Split a file name into asset parts.
///
/// A platform segment is only recognised when it is one of `platforms`;
/// otherwise it stays part of the name. Returns `None` for names without an
/// extension.
pub fn try_parse<S: AsRef<str>>(file_name: &str, platforms: &[S]) -> Option<AssetPathParts> {
    let caps = FILE_NAME_RE.captures(file_name)?;
    let stem = caps.get(1).map_or("", |m| m.as_str());
    let kind = caps.get(4)?.as_str().to_string();

    let (base_name, platform) = match caps.get(3).map(|m| m.as_str()) {
        None => (stem.to_string(), None),
        Some(p) if platforms.iter().any(|known| known.as_ref() == p) => {
            (stem.to_string(), Some(p.to_string()))
        }
        Some(p) => (format!("{}.{}", stem, p), None),
    };

    let (name, scale) = parse_base_name(&base_name);
    Some(AssetPathParts {
        asset_name: format!("{}.{}", name, kind),
        name,
        platform,
        scale,
        kind,
    })
}

fn parse_base_name(base_name: &str) -> (String, f64) {
    let Some(caps) = BASE_NAME_RE.captures(base_name) else {
        return (base_name.to_string(), 1.0);
    };
    let name = caps.get(1).map_or(base_name, |m| m.as_str()).to_string();
    let scale = caps
        .get(3)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|s| s.is_finite())
        .unwrap_or(1.0);
    (name, scale)
}

/// Android density qualifier for a scale.
pub fn android_suffix(scale: f64) -> Option<&'static str> {
    let suffix = if scale == 0.75 {
        "ldpi"
    } else if scale == 1.0 {
        "mdpi"
    } else if scale == 1.5 {
        "hdpi"
    } else if scale == 2.0 {
        "xhdpi"
    } else if scale == 3.0 {
        "xxhdpi"
    } else if scale == 4.0 {
        "xxxhdpi"
    } else {
        return None;
    };
    Some(suffix)
}

/// `drawable-<density>` folder for a scale.
pub fn android_drawable_folder(scale: f64) -> Option<String> {
    android_suffix(scale).map(|suffix| format!("drawable-{}", suffix))
}

/// Strip one leading `/` from a server location.
pub fn base_path(http_server_location: &str) -> &str {
    http_server_location
        .strip_prefix('/')
        .unwrap_or(http_server_location)
}

/// Android resource name: folder structure flattened into the file name,
/// lower-cased, restricted to `[a-z0-9_]`, without the `assets_` prefix.
pub fn android_resource_identifier(http_server_location: &str, name: &str) -> String {
    let flattened: String = format!("{}/{}", base_path(http_server_location), name)
        .to_lowercase()
        .replace('/', "_")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect();
    match flattened.strip_prefix("assets_") {
        Some(rest) => rest.to_string(),
        None => flattened,
    }
}

/// Render a number the way the runtime prints it: `2` not `2.0`.
pub fn format_scale(scale: f64) -> String {
    if scale.fract() == 0.0 && scale.abs() < 1e15 {
        format!("{}", scale as i64)
    } else {
        format!("{}", scale)
    }
}
