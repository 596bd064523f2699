//! Pre-built project trees for common test scenarios.

use super::ProjectTree;

/// Smallest PNG header that carries the given dimensions.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes
}

/// The runtime package with the modules the packager references by default.
pub fn with_runtime(tree: ProjectTree) -> ProjectTree {
    tree.file(
        "node_modules/react-native/package.json",
        r#"{"name": "react-native", "main": "Libraries/react-native/react-native-implementation.js"}"#,
    )
    .file(
        "node_modules/react-native/Libraries/react-native/react-native-implementation.js",
        "module.exports = {Image: require('Image')};\n",
    )
    .file(
        "node_modules/react-native/Libraries/Image/Image.ios.js",
        "module.exports = 'Image.ios';\n",
    )
    .file(
        "node_modules/react-native/Libraries/Image/Image.android.js",
        "module.exports = 'Image.android';\n",
    )
    .file(
        "node_modules/react-native/Libraries/Image/AssetRegistry.js",
        "var assets = [];\nmodule.exports = {registerAsset: function(a) { return assets.push(a); }};\n",
    )
    .file(
        "node_modules/react-native/Libraries/Core/InitializeCore.js",
        "global.__initialized = true;\n",
    )
    .file(
        "node_modules/react-native/Libraries/polyfills/Object.es6.js",
        "Object.assign = Object.assign || function() {};\n",
    )
    .file(
        "node_modules/metro/src/lib/polyfills/require.js",
        "global.__r = function() {};\nglobal.__d = function() {};\n",
    )
    .file(
        "node_modules/@sdp.nd/nd-react-wrapper/package.json",
        r#"{"name": "@sdp.nd/nd-react-wrapper"}"#,
    )
    .file(
        "node_modules/@sdp.nd/nd-react-wrapper/bundleUtil.js",
        "module.exports = {};\n",
    )
}

/// A small application using relative, package, short-name and asset
/// requires.
pub fn demo_app() -> ProjectTree {
    with_runtime(ProjectTree::new())
        .file("package.json", r#"{"name": "demo"}"#)
        .file(
            "index.js",
            "var App = require('./src/App');\nvar Image = require('Image');\nvar split = require('split');\n",
        )
        .file(
            "src/App.js",
            "// entry component\nvar logo = require('./logo.png');\nvar info = require('./info.json');\nmodule.exports = {logo: logo, info: info};\n",
        )
        .file("src/info.json", r#"{"name": "info"}"#)
        .bytes("src/logo.png", &png(40, 20))
        .bytes("src/logo@2x.png", &png(80, 40))
        .file("node_modules/split/package.json", r#"{"name": "split"}"#)
        .file("node_modules/split/index.js", "module.exports = 'split';\n")
}
