//! Dependency graph construction.
//!
//! A build runs in three phases:
//!
//! 1. **Discovery** walks the graph breadth-first. Each frontier is read,
//!    transformed and resolved in parallel; results are merged back in
//!    frontier order so every path is processed once.
//! 2. **Classification** replays a depth-first, pre-order traversal over the
//!    recorded dependency lists and sorts modules into the base and business
//!    tiers. This order is the bundle order.
//! 3. **Compilation** substitutes identifiers, wraps and (outside dev)
//!    minifies every classified module in parallel.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::data::{AssetData, AssetInfo};
use crate::core::error::{BundleError, BundleResult};
use crate::core::module::Module;
use crate::core::module_id::ModuleIdFactory;
use crate::graph::split::SplitPolicy;
use crate::graph::transform::{ContentKind, SourceUnit, Transformed, Transformer};
use crate::graph::wrap;
use crate::resolver::{resolve, ProjectContext, Resolution, ResolutionContext};
use crate::util::{fs, paths};

/// Settings of one graph build.
#[derive(Debug, Clone)]
pub struct GraphOptions {
    pub platform: String,
    pub dev: bool,
    /// When unset, base-tier modules are left out entirely.
    pub split: bool,
    pub split_policy: SplitPolicy,
    /// Specifier of the module assets register with.
    pub asset_registry: String,
}

/// The built graph, ready for serialization.
#[derive(Debug)]
pub struct BuildGraph {
    pub entry: PathBuf,
    pub entry_id: String,
    /// Base-tier modules in traversal order.
    pub base: Vec<Arc<Module>>,
    /// Business-tier modules in traversal order.
    pub business: Vec<Arc<Module>>,
    /// Every asset file registered by an asset module.
    pub assets: BTreeMap<PathBuf, AssetInfo>,
}

/// Mutable state of one build.
#[derive(Debug, Default)]
pub struct BuildContext {
    nodes: HashMap<PathBuf, Node>,
    visited: HashSet<PathBuf>,
    base: Vec<PathBuf>,
    business: Vec<PathBuf>,
    assets: BTreeMap<PathBuf, AssetInfo>,
}

#[derive(Debug)]
enum Node {
    /// A base-tier module of a build that does not split.
    Skipped,
    Unit(Unit),
}

#[derive(Debug)]
struct Unit {
    kind: ContentKind,
    id: String,
    body: Transformed,
    dependencies: Vec<(String, Resolution)>,
}

impl Unit {
    fn resolved(&self) -> impl DoubleEndedIterator<Item = &PathBuf> {
        self.dependencies.iter().filter_map(|(_, resolution)| match resolution {
            Resolution::Resolved(path) => Some(path),
            Resolution::PassThrough => None,
        })
    }
}

struct Discovered {
    node: Node,
    assets: Vec<(PathBuf, AssetInfo)>,
}

pub struct GraphBuilder<'a, T: Transformer> {
    ctx: &'a ProjectContext,
    transformer: &'a T,
    options: GraphOptions,
    ids: ModuleIdFactory,
    state: BuildContext,
}

impl<'a, T: Transformer> GraphBuilder<'a, T> {
    pub fn new(ctx: &'a ProjectContext, transformer: &'a T, options: GraphOptions) -> Self {
        let ids = ModuleIdFactory::new(ctx.haste().files().project_root());
        GraphBuilder {
            ctx,
            transformer,
            options,
            ids,
            state: BuildContext::default(),
        }
    }

    /// Build the graph reachable from `entry`.
    pub fn build(mut self, entry: &Path) -> BundleResult<BuildGraph> {
        self.discover_all(entry)?;
        self.classify(entry);
        self.compile()?;

        let cache = self.ctx.cache();
        let modules = |list: &[PathBuf]| -> Vec<Arc<Module>> {
            list.iter().map(|p| cache.get_module(p)).collect()
        };
        let graph = BuildGraph {
            entry: entry.to_path_buf(),
            entry_id: self.ids.id_for(entry),
            base: modules(&self.state.base),
            business: modules(&self.state.business),
            assets: self.state.assets,
        };
        tracing::info!(
            "built graph: {} base modules, {} business modules, {} asset files",
            graph.base.len(),
            graph.business.len(),
            graph.assets.len()
        );
        Ok(graph)
    }

    fn discover_all(&mut self, entry: &Path) -> BundleResult<()> {
        let mut seen: HashSet<PathBuf> = HashSet::from([entry.to_path_buf()]);
        let mut frontier = vec![(entry.to_path_buf(), ContentKind::Module)];

        while !frontier.is_empty() {
            let this = &*self;
            let results: Vec<BundleResult<Discovered>> = frontier
                .par_iter()
                .map(|(path, kind)| this.discover(path, *kind))
                .collect();

            let mut next = Vec::new();
            for ((path, _), result) in frontier.into_iter().zip(results) {
                let discovered = result?;
                if let Node::Unit(unit) = &discovered.node {
                    for dep in unit.resolved() {
                        if seen.insert(dep.clone()) {
                            let kind = ContentKind::of(dep, |p| self.ctx.is_asset_file(p));
                            next.push((dep.clone(), kind));
                        }
                    }
                }
                self.state.assets.extend(discovered.assets);
                self.state.nodes.insert(path, discovered.node);
            }
            frontier = next;
        }
        Ok(())
    }

    /// Read, transform and resolve one module.
    fn discover(&self, path: &Path, kind: ContentKind) -> BundleResult<Discovered> {
        let id = self.ids.id_for(path);
        if !self.options.split && self.options.split_policy.is_base_module(&id) {
            tracing::debug!("skipping base module {}", id);
            return Ok(Discovered {
                node: Node::Skipped,
                assets: Vec::new(),
            });
        }

        let (source, assets) = match kind {
            ContentKind::Asset => {
                let data = self.asset_data(path)?;
                (data.module_source(&self.options.asset_registry)?, data.infos())
            }
            _ => (fs::read_to_string(path)?, Vec::new()),
        };
        let body = self.transformer.transform(&SourceUnit {
            path,
            kind,
            source: &source,
        })?;

        let dependencies = body
            .dependencies
            .iter()
            .map(|spec| {
                let resolution = resolve(self.ctx, path, spec, &self.options.platform)?;
                Ok((spec.clone(), resolution))
            })
            .collect::<BundleResult<Vec<_>>>()?;

        tracing::debug!("processed {} {} ({} deps)", kind, id, dependencies.len());
        Ok(Discovered {
            node: Node::Unit(Unit {
                kind,
                id,
                body,
                dependencies,
            }),
            assets,
        })
    }

    fn asset_data(&self, path: &Path) -> BundleResult<AssetData> {
        let dir = paths::parent(path);
        let listing = self
            .ctx
            .assets()
            .file_names(dir)
            .ok_or_else(|| BundleError::AssetParse {
                path: path.to_path_buf(),
                reason: "asset directory was never indexed".to_string(),
            })?;
        let relative = self.ctx.haste().files().relative_path(path);
        AssetData::build(
            path,
            &relative,
            &self.options.platform,
            listing,
            self.ctx.is_image_file(path),
        )
    }

    /// Pre-order traversal; a path is marked before its dependencies are
    /// pushed, so cycles end at the second visit.
    fn classify(&mut self, entry: &Path) {
        let state = &mut self.state;
        let mut stack = vec![entry.to_path_buf()];

        while let Some(path) = stack.pop() {
            if !state.visited.insert(path.clone()) {
                continue;
            }
            let Some(Node::Unit(unit)) = state.nodes.get(&path) else {
                continue;
            };
            stack.extend(
                unit.resolved()
                    .rev()
                    .filter(|dep| !state.visited.contains(*dep))
                    .cloned(),
            );
            if self.options.split_policy.is_base_module(&unit.id) {
                state.base.push(path);
            } else {
                state.business.push(path);
            }
        }
    }

    fn compile(&self) -> BundleResult<()> {
        let order: Vec<&PathBuf> = self.state.base.iter().chain(&self.state.business).collect();
        let results: Vec<BundleResult<()>> =
            order.par_iter().map(|path| self.compile_one(path)).collect();
        results.into_iter().collect()
    }

    fn compile_one(&self, path: &Path) -> BundleResult<()> {
        let Some(Node::Unit(unit)) = self.state.nodes.get(path) else {
            return Err(BundleError::Invariant(format!(
                "{} was classified but never processed",
                path.display()
            )));
        };

        let ids: HashMap<String, String> = unit
            .dependencies
            .iter()
            .map(|(spec, resolution)| {
                let id = match resolution {
                    Resolution::Resolved(dep) => self.ids.id_for(dep),
                    Resolution::PassThrough => spec.clone(),
                };
                (spec.clone(), id)
            })
            .collect();

        let mut code = match unit.kind {
            ContentKind::Json => wrap::wrap_json(&unit.body.code, &unit.id, &unit.id),
            ContentKind::Script => wrap::wrap_script(&self.transformer.rewrite(&unit.body, &ids)?),
            ContentKind::Module | ContentKind::Asset => {
                let body = self.transformer.rewrite(&unit.body, &ids)?;
                wrap::wrap_module(&body, &unit.id, &unit.id)
            }
        };
        if !self.options.dev {
            code = self.transformer.minify(path, &code)?;
        }
        self.ctx.cache().get_module(path).set_compiled(unit.id.clone(), code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::transform::ScanTransformer;
    use crate::test_support::{demo_app, project_context, ProjectTree};

    const ASYNC: &str = "metro/src/lib/bundle-modules/asyncRequire";

    fn options(platform: &str, split: bool, dev: bool) -> GraphOptions {
        GraphOptions {
            platform: platform.to_string(),
            dev,
            split,
            split_policy: SplitPolicy::default(),
            asset_registry: "react-native/Libraries/Image/AssetRegistry".to_string(),
        }
    }

    fn ids(modules: &[Arc<Module>]) -> Vec<&str> {
        modules.iter().map(|m| m.id().unwrap()).collect()
    }

    #[test]
    fn test_business_order_without_split() {
        let project = demo_app();
        let ctx = project_context(&project);
        let transformer = ScanTransformer::new(ASYNC);

        let graph = GraphBuilder::new(&ctx, &transformer, options("ios", false, true))
            .build(&project.path("index.js"))
            .unwrap();

        assert_eq!(graph.entry_id, "index.js");
        assert!(graph.base.is_empty());
        assert_eq!(
            ids(&graph.business),
            vec![
                "index.js",
                "src/App.js",
                "src/logo.png",
                "src/info.json",
                "node_modules/split/index.js",
            ]
        );
        assert_eq!(graph.assets.len(), 2);
    }

    #[test]
    fn test_split_classifies_base_modules() {
        let project = demo_app();
        let ctx = project_context(&project);
        let transformer = ScanTransformer::new(ASYNC);

        let graph = GraphBuilder::new(&ctx, &transformer, options("android", true, true))
            .build(&project.path("index.js"))
            .unwrap();

        assert_eq!(
            ids(&graph.base),
            vec![
                "node_modules/react-native/Libraries/Image/AssetRegistry.js",
                "node_modules/react-native/Libraries/Image/Image.android.js",
            ]
        );
        assert_eq!(graph.business.len(), 5);
    }

    #[test]
    fn test_compiled_code_uses_identifiers() {
        let project = demo_app();
        let ctx = project_context(&project);
        let transformer = ScanTransformer::new(ASYNC);

        let graph = GraphBuilder::new(&ctx, &transformer, options("ios", false, true))
            .build(&project.path("index.js"))
            .unwrap();

        let entry = graph.business[0].code().unwrap();
        assert!(entry.starts_with("__d(function(global, require,"));
        assert!(entry.contains("require(\"src/App.js\")"));
        assert!(entry.contains("require(\"node_modules/react-native/Libraries/Image/Image.ios.js\")"));
        assert!(entry.ends_with("},\"index.js\",null,\"index.js\");\n"));

        let asset = graph.business[2].code().unwrap();
        assert!(asset.contains(
            "require(\"node_modules/react-native/Libraries/Image/AssetRegistry.js\").registerAsset("
        ));
        assert!(asset.contains("\"scales\":[1,2]"));
        assert!(asset.contains("\"width\":40,\"height\":20"));

        let json = graph.business[3].code().unwrap();
        assert!(json.contains("module.exports = {\"name\": \"info\"};"));
    }

    #[test]
    fn test_cycles_are_visited_once() {
        let project = ProjectTree::new()
            .file("index.js", "require('./a');")
            .file("a.js", "require('./b');")
            .file("b.js", "require('./a'); require('./index');");
        let ctx = project_context(&project);
        let transformer = ScanTransformer::new(ASYNC);

        let graph = GraphBuilder::new(&ctx, &transformer, options("ios", false, true))
            .build(&project.path("index.js"))
            .unwrap();

        assert_eq!(ids(&graph.business), vec!["index.js", "a.js", "b.js"]);
        let b = graph.business[2].code().unwrap();
        assert!(b.contains("require(\"a.js\"); require(\"index.js\");"));
    }

    #[test]
    fn test_pre_order_follows_first_reference() {
        let project = ProjectTree::new()
            .file("index.js", "require('./a'); require('./b');")
            .file("a.js", "require('./c');")
            .file("b.js", "require('./c');")
            .file("c.js", "module.exports = 1;");
        let ctx = project_context(&project);
        let transformer = ScanTransformer::new(ASYNC);

        let graph = GraphBuilder::new(&ctx, &transformer, options("ios", false, true))
            .build(&project.path("index.js"))
            .unwrap();

        assert_eq!(ids(&graph.business), vec!["index.js", "a.js", "c.js", "b.js"]);
    }

    #[test]
    fn test_excluded_dependency_is_left_as_is() {
        let project = ProjectTree::new()
            .file(
                "package.json",
                r#"{"name": "app", "browser": {"fs": false}}"#,
            )
            .file("index.js", "var fs = require('fs');");
        let ctx = project_context(&project);
        let transformer = ScanTransformer::new(ASYNC);

        let graph = GraphBuilder::new(&ctx, &transformer, options("ios", false, true))
            .build(&project.path("index.js"))
            .unwrap();

        assert_eq!(graph.business.len(), 1);
        assert!(graph.business[0].code().unwrap().contains("require(\"fs\")"));
    }

    #[test]
    fn test_production_build_is_minified() {
        let project = ProjectTree::new().file("index.js", "// comment\nvar  a = 1;\n\n\nmodule.exports = a;\n");
        let ctx = project_context(&project);
        let transformer = ScanTransformer::new(ASYNC);

        let graph = GraphBuilder::new(&ctx, &transformer, options("ios", false, false))
            .build(&project.path("index.js"))
            .unwrap();

        let code = graph.business[0].code().unwrap();
        assert!(!code.contains("// comment"));
        assert!(!code.contains("\n\n"));
        assert!(code.starts_with("__d(function("));
        assert!(code.contains("module.exports"));
        assert!(code.contains("\"index.js\""));
    }

    #[test]
    fn test_unresolvable_dependency_fails_the_build() {
        let project = ProjectTree::new().file("index.js", "require('./missing');");
        let ctx = project_context(&project);
        let transformer = ScanTransformer::new(ASYNC);

        let err = GraphBuilder::new(&ctx, &transformer, options("ios", false, true))
            .build(&project.path("index.js"))
            .unwrap_err();
        assert!(matches!(err, BundleError::Resolution { ref to, .. } if to == "./missing"));
    }
}
