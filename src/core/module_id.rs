//! Module identifiers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::util::paths;

/// Assigns each module a stable identifier: its path relative to the project
/// root, `/` separated. Identifiers are memoised per path.
#[derive(Debug)]
pub struct ModuleIdFactory {
    project_root: PathBuf,
    ids: Mutex<HashMap<PathBuf, String>>,
}

impl ModuleIdFactory {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        ModuleIdFactory {
            project_root: project_root.into(),
            ids: Mutex::new(HashMap::new()),
        }
    }

    /// Project root the identifiers are relative to.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Identifier for an absolute module path.
    pub fn id_for(&self, path: &Path) -> String {
        let mut ids = self.ids.lock();
        if let Some(id) = ids.get(path) {
            return id.clone();
        }
        let id = paths::to_slash(&paths::relative_path(&self.project_root, path));
        ids.insert(path.to_path_buf(), id.clone());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_relative_and_stable() {
        let factory = ModuleIdFactory::new("/tmp/pro");
        let path = Path::new("/tmp/pro/node_modules/react-native/Libraries/Image/Image.ios.js");

        let id = factory.id_for(path);
        assert_eq!(id, "node_modules/react-native/Libraries/Image/Image.ios.js");
        assert_eq!(factory.id_for(path), id);
        assert_eq!(factory.id_for(Path::new("/tmp/pro/index.js")), "index.js");
    }
}
