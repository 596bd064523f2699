//! Per-platform asset scale filtering.

/// Scales a platform ships, if it restricts them.
fn allowed_scales(platform: &str) -> Option<&'static [f64]> {
    match platform {
        "ios" => Some(&[1.0, 2.0, 3.0]),
        _ => None,
    }
}

/// Keep the scales `platform` accepts.
///
/// When none of the available scales is allowed, the closest scale above the
/// largest allowed one is used, else the largest available scale.
/// Platforms without a whitelist keep every scale.
pub fn filter_platform_scales(platform: &str, scales: &[f64]) -> Vec<f64> {
    let Some(allowed) = allowed_scales(platform) else {
        return scales.to_vec();
    };

    let mut result: Vec<f64> = scales
        .iter()
        .copied()
        .filter(|scale| allowed.contains(scale))
        .collect();

    if result.is_empty() && !scales.is_empty() {
        let max_allowed = allowed[allowed.len() - 1];
        match scales.iter().find(|scale| **scale > max_allowed) {
            Some(larger) => result.push(*larger),
            None => result.push(scales[scales.len() - 1]),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ios_whitelist() {
        assert_eq!(
            filter_platform_scales("ios", &[1.0, 1.5, 2.0, 3.0, 4.0]),
            vec![1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn test_ios_closest_larger() {
        assert_eq!(filter_platform_scales("ios", &[0.5, 4.0, 100.0]), vec![4.0]);
    }

    #[test]
    fn test_ios_largest_available() {
        assert_eq!(filter_platform_scales("ios", &[0.25, 0.75]), vec![0.75]);
        assert!(filter_platform_scales("ios", &[]).is_empty());
    }

    #[test]
    fn test_other_platforms_unchanged() {
        assert_eq!(
            filter_platform_scales("android", &[1.0, 1.5, 2.0, 3.0, 4.0]),
            vec![1.0, 1.5, 2.0, 3.0, 4.0]
        );
    }
}
