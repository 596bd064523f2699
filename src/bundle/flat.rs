//! Flat text bundles.

use std::sync::Arc;

use crate::bundle::compiled;
use crate::core::error::BundleResult;
use crate::core::module::Module;

/// Concatenate the code of compiled modules in order.
pub fn concat(modules: &[Arc<Module>]) -> BundleResult<String> {
    let mut out = String::new();
    for module in modules {
        let (_, code) = compiled(module)?;
        out.push_str(code);
    }
    Ok(out)
}

/// Business bundle: module definitions followed by the startup code.
pub fn business_bundle(modules: &[Arc<Module>], startup_code: &str) -> BundleResult<String> {
    let mut out = concat(modules)?;
    out.push_str(startup_code);
    Ok(out)
}

/// Base bundle: prelude, module definitions, then the run-before-main calls.
pub fn base_bundle(
    pre_code: &str,
    modules: &[Arc<Module>],
    post_code: &str,
) -> BundleResult<String> {
    let body = concat(modules)?;
    let mut out = String::with_capacity(pre_code.len() + body.len() + post_code.len());
    out.push_str(pre_code);
    out.push_str(&body);
    out.push_str(post_code);
    Ok(out)
}
