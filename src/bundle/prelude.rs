//! Code run around the module definitions: the environment prelude with
//! polyfills, and the eager `__r` calls.

use std::collections::HashMap;
use std::path::Path;

use crate::core::error::BundleResult;
use crate::graph::scan::quote;
use crate::graph::transform::{ContentKind, SourceUnit, Transformer};
use crate::graph::wrap::wrap_script;
use crate::util::{fs, paths};

/// Environment globals defined before anything else runs.
pub fn env_globals(dev: bool) -> String {
    let env = if dev { "development" } else { "production" };
    format!(
        "var __DEV__={},\
         __BUNDLE_START_TIME__=this.nativePerformanceNow?nativePerformanceNow():Date.now(),\
         process=this.process||{{}};\
         process.env=process.env||{{}};\
         process.env.NODE_ENV=\"{}\";\n",
        dev, env
    )
}

/// Environment globals followed by every polyfill, each wrapped as a script.
///
/// Polyfill paths are relative to `project_root` unless absolute. Production
/// builds minify each wrapped polyfill.
pub fn pre_code<T: Transformer + ?Sized>(
    project_root: &Path,
    polyfills: &[String],
    dev: bool,
    transformer: &T,
) -> BundleResult<String> {
    let mut code = env_globals(dev);
    let no_ids = HashMap::new();

    for polyfill in polyfills {
        let path = paths::join(project_root, polyfill);
        let source = fs::read_to_string(&path)?;
        let transformed = transformer.transform(&SourceUnit {
            path: &path,
            kind: ContentKind::Script,
            source: &source,
        })?;
        let wrapped = wrap_script(&transformer.rewrite(&transformed, &no_ids)?);
        if dev {
            code.push_str(&wrapped);
        } else {
            code.push_str(&transformer.minify(&path, &wrapped)?);
        }
        tracing::debug!("polyfill {}", path.display());
    }

    Ok(code)
}

/// One `__r("<id>")` call per module identifier.
pub fn post_code(ids: &[String]) -> String {
    ids.iter().map(|id| format!("__r({})\n", quote(id))).collect()
}
