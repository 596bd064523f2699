//! Module record wrappers.

use crate::graph::scan::quote;

const MODULE_PARAMS: &str =
    "global, require, _$$_IMPORT_DEFAULT, _$$_IMPORT_ALL, module, exports, _dependencyMap";
const JSON_PARAMS: &str = "global, require, _aUnused, _bUnused, module, exports, _cUnused";
const GLOBAL_THIS: &str =
    "typeof global !== 'undefined' ? global : typeof window !== 'undefined' ? window : this";

/// Wrap module code into a `__d` definition.
pub fn wrap_module(code: &str, id: &str, relative_path: &str) -> String {
    define(MODULE_PARAMS, code, id, relative_path)
}

/// Wrap a JSON document into a `__d` definition exporting it.
pub fn wrap_json(json: &str, id: &str, relative_path: &str) -> String {
    let body = format!("  module.exports = {};", json.trim_end());
    define(JSON_PARAMS, &body, id, relative_path)
}

/// Wrap a script into an immediately invoked function over the global object.
pub fn wrap_script(code: &str) -> String {
    format!("(function (global) {{\n{}\n}})({});\n", code.trim_end(), GLOBAL_THIS)
}

fn define(params: &str, body: &str, id: &str, relative_path: &str) -> String {
    format!(
        "__d(function({}) {{\n{}\n}},{},null,{});\n",
        params,
        body.trim_end(),
        quote(id),
        quote(relative_path)
    )
}
