//! Expansion of raw configuration into a [`ConfigTree`].
//!
//! Expansion is a pure, synchronous walk over the raw mapping:
//!
//! 1. factories are invoked with the effective options of their owner;
//! 2. `options` is deep-merged onto the inherited options;
//! 3. every other key is classified (target / scaffold / error) and expanded,
//!    preserving declaration order.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde_json::Value;

use crate::domain::{
    classify::{Classifier, NodeKind, ShapeClassifier},
    entities::{
        plugin::InlineSteps,
        tree::{ConfigTree, FileSet, Scaffold, Target, join_path, name_problem},
    },
    error::DomainError,
    options::{OptionMap, kind_of, merge},
    raw::RawNode,
};

/// Name given to a tree whose root does not declare `name`.
pub const DEFAULT_ROOT_NAME: &str = "boilerplate";

const ROOT_LABEL: &str = "<root>";

type Children = (IndexMap<String, Scaffold>, IndexMap<String, Target>);

/// Turns raw configuration into expanded trees.
pub struct Expander {
    classifier: Box<dyn Classifier>,
}

impl Expander {
    pub fn new() -> Self {
        Self::with_classifier(ShapeClassifier)
    }

    pub fn with_classifier(classifier: impl Classifier + 'static) -> Self {
        Self {
            classifier: Box::new(classifier),
        }
    }

    /// Expand with no inherited options.
    pub fn expand(&self, raw: impl Into<RawNode>) -> Result<ConfigTree, DomainError> {
        self.expand_with(raw, &OptionMap::new())
    }

    /// Expand a root configuration on top of `inherited` options.
    pub fn expand_with(
        &self,
        raw: impl Into<RawNode>,
        inherited: &OptionMap,
    ) -> Result<ConfigTree, DomainError> {
        let raw = resolve_factory(raw.into(), inherited, ROOT_LABEL)?;
        let mut entries = raw
            .into_entries()
            .map_err(|other| DomainError::UnrecognizedShape {
                path: ROOT_LABEL.into(),
                found: other.describe(),
            })?;

        let mut inline = InlineSteps::new();
        let name = take_name(&mut entries).unwrap_or_else(|| DEFAULT_ROOT_NAME.to_string());
        let own_options = take_options(&mut entries, "", &mut inline)?;
        let effective_options = merge(inherited, &own_options);
        let (scaffolds, targets) =
            self.expand_children(entries, &effective_options, "", &mut inline)?;

        Ok(ConfigTree {
            name,
            own_options,
            effective_options,
            scaffolds,
            targets,
            inline,
        })
    }

    fn expand_children(
        &self,
        entries: IndexMap<String, RawNode>,
        effective: &OptionMap,
        parent: &str,
        inline: &mut InlineSteps,
    ) -> Result<Children, DomainError> {
        let mut scaffolds = IndexMap::new();
        let mut targets = IndexMap::new();

        for (key, value) in entries {
            if let Some(reason) = name_problem(&key) {
                return Err(DomainError::InvalidName {
                    parent: label(parent).into(),
                    name: key,
                    reason: reason.into(),
                });
            }
            let path = join_path(parent, &key);
            let value = resolve_factory(value, effective, &path)?;

            match self.classifier.classify(&value) {
                Some(NodeKind::Target) => {
                    let target = expand_target(&key, &path, value, effective, inline)?;
                    targets.insert(key, target);
                }
                Some(NodeKind::Scaffold) => {
                    let scaffold = self.expand_scaffold(&key, &path, value, effective, inline)?;
                    scaffolds.insert(key, scaffold);
                }
                None => {
                    return Err(DomainError::UnrecognizedShape {
                        path,
                        found: value.describe(),
                    });
                }
            }
        }

        Ok((scaffolds, targets))
    }

    fn expand_scaffold(
        &self,
        key: &str,
        path: &str,
        value: RawNode,
        inherited: &OptionMap,
        inline: &mut InlineSteps,
    ) -> Result<Scaffold, DomainError> {
        let mut entries = mapping(value, path)?;
        take_name(&mut entries);
        let own_options = take_options(&mut entries, path, inline)?;
        if entries.is_empty() {
            return Err(DomainError::EmptyNode { path: path.into() });
        }

        let effective_options = merge(inherited, &own_options);
        let (scaffolds, targets) =
            self.expand_children(entries, &effective_options, path, inline)?;

        Ok(Scaffold {
            name: key.to_string(),
            path: path.to_string(),
            own_options,
            effective_options,
            scaffolds,
            targets,
        })
    }
}

impl Default for Expander {
    fn default() -> Self {
        Self::new()
    }
}

// ── Targets ───────────────────────────────────────────────────────────────────

fn expand_target(
    key: &str,
    path: &str,
    value: RawNode,
    inherited: &OptionMap,
    inline: &mut InlineSteps,
) -> Result<Target, DomainError> {
    let mut entries = mapping(value, path)?;
    take_name(&mut entries);
    let declared = take_options(&mut entries, path, inline)?;

    let src = entries.shift_remove("src");
    let dest = entries
        .shift_remove("dest")
        .map(|v| path_value(v, path, "dest"))
        .transpose()?;
    let cwd = entries
        .shift_remove("cwd")
        .map(|v| path_value(v, path, "cwd"))
        .transpose()?;
    let files = entries.shift_remove("files");

    // Leftover keys are shorthand for options; an explicit `options` wins.
    let extras = options_from_entries(entries, path, inline)?;
    let own_options = merge(&extras, &declared);
    let effective_options = merge(inherited, &own_options);

    let mut sets = Vec::new();
    if let Some(src) = src {
        sets.push(FileSet {
            src: patterns(src, path)?,
            dest: dest.clone(),
            cwd: cwd.clone(),
        });
    }
    if let Some(files) = files {
        sets.extend(file_sets(files, path, &dest, &cwd)?);
    }

    if sets.is_empty() {
        return Err(DomainError::MissingSource { path: path.into() });
    }
    for set in &sets {
        if set.src.is_empty() {
            return Err(DomainError::MissingSource { path: path.into() });
        }
        if set.dest_with(&effective_options).is_none() {
            return Err(DomainError::MissingDestination { path: path.into() });
        }
    }

    Ok(Target {
        name: key.to_string(),
        path: path.to_string(),
        own_options,
        effective_options,
        files: sets,
    })
}

/// `files` is either a list of `{src, dest, cwd}` mappings or a mapping of
/// destination to source patterns.
fn file_sets(
    files: RawNode,
    path: &str,
    dest: &Option<PathBuf>,
    cwd: &Option<PathBuf>,
) -> Result<Vec<FileSet>, DomainError> {
    let files_path = format!("{path}.files");
    let items = match files {
        RawNode::List(items) => items,
        RawNode::Value(Value::Array(items)) => items.into_iter().map(RawNode::Value).collect(),
        other => {
            let entries = other.into_entries().map_err(|other| DomainError::UnrecognizedShape {
                path: files_path.clone(),
                found: other.describe(),
            })?;
            return entries
                .into_iter()
                .map(|(target_dest, src)| {
                    Ok(FileSet {
                        src: patterns(src, path)?,
                        dest: Some(PathBuf::from(target_dest)),
                        cwd: cwd.clone(),
                    })
                })
                .collect();
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let item_path = format!("{files_path}[{i}]");
            let mut entries = mapping(item, &item_path)?;
            let src = entries
                .shift_remove("src")
                .ok_or_else(|| DomainError::MissingSource {
                    path: item_path.clone(),
                })?;
            let item_dest = entries
                .shift_remove("dest")
                .map(|v| path_value(v, &item_path, "dest"))
                .transpose()?;
            let item_cwd = entries
                .shift_remove("cwd")
                .map(|v| path_value(v, &item_path, "cwd"))
                .transpose()?;
            Ok(FileSet {
                src: patterns(src, &item_path)?,
                dest: item_dest.or_else(|| dest.clone()),
                cwd: item_cwd.or_else(|| cwd.clone()),
            })
        })
        .collect()
}

fn patterns(node: RawNode, path: &str) -> Result<Vec<String>, DomainError> {
    let invalid = |reason: String| DomainError::InvalidOption {
        path: path.into(),
        key: "src".into(),
        reason,
    };
    let value = node.into_value().map_err(|found| invalid(format!("found {found}")))?;
    let patterns = match value {
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(invalid(format!("pattern is {}", kind_of(&other)))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        other => return Err(invalid(format!("expected a pattern, found {}", kind_of(&other)))),
    };

    if patterns.iter().any(|p| p.trim().is_empty()) {
        return Err(DomainError::MissingSource { path: path.into() });
    }
    Ok(patterns)
}

fn path_value(node: RawNode, path: &str, key: &str) -> Result<PathBuf, DomainError> {
    match node.into_value() {
        Ok(Value::String(s)) if !s.is_empty() => Ok(PathBuf::from(s)),
        Ok(other) => Err(DomainError::InvalidOption {
            path: path.into(),
            key: key.into(),
            reason: format!("expected a non-empty path, found {}", kind_of(&other)),
        }),
        Err(found) => Err(DomainError::InvalidOption {
            path: path.into(),
            key: key.into(),
            reason: format!("found {found}"),
        }),
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

fn resolve_factory(node: RawNode, options: &OptionMap, path: &str) -> Result<RawNode, DomainError> {
    match node {
        RawNode::Factory(factory) => {
            let produced = factory(options);
            if produced.is_mapping() {
                Ok(produced)
            } else {
                Err(DomainError::FactoryNotMapping { path: path.into() })
            }
        }
        other => Ok(other),
    }
}

fn mapping(value: RawNode, path: &str) -> Result<IndexMap<String, RawNode>, DomainError> {
    value
        .into_entries()
        .map_err(|other| DomainError::UnrecognizedShape {
            path: path.into(),
            found: other.describe(),
        })
}

/// Remove a string-valued `name`; a mapping under `name` is a child node.
fn take_name(entries: &mut IndexMap<String, RawNode>) -> Option<String> {
    match entries.get("name") {
        Some(RawNode::Value(Value::String(_))) => match entries.shift_remove("name") {
            Some(RawNode::Value(Value::String(name))) => Some(name),
            _ => None,
        },
        _ => None,
    }
}

fn take_options(
    entries: &mut IndexMap<String, RawNode>,
    path: &str,
    inline: &mut InlineSteps,
) -> Result<OptionMap, DomainError> {
    let Some(options) = entries.shift_remove("options") else {
        return Ok(OptionMap::new());
    };
    let options = options
        .into_entries()
        .map_err(|other| DomainError::InvalidOption {
            path: label(path).into(),
            key: "options".into(),
            reason: format!("expected a mapping, found {}", other.describe()),
        })?;
    options_from_entries(options, path, inline)
}

fn options_from_entries(
    entries: IndexMap<String, RawNode>,
    path: &str,
    inline: &mut InlineSteps,
) -> Result<OptionMap, DomainError> {
    let mut options = OptionMap::new();
    for (key, node) in entries {
        let value = if key == "pipeline" {
            pipeline_value(node, path, inline)?
        } else {
            node.into_value().map_err(|found| DomainError::InvalidOption {
                path: label(path).into(),
                key: key.clone(),
                reason: format!("{found} is not allowed here"),
            })?
        };
        options.insert(key, value);
    }
    Ok(options)
}

/// Replace inline transforms in a `pipeline` list with generated names.
fn pipeline_value(node: RawNode, path: &str, inline: &mut InlineSteps) -> Result<Value, DomainError> {
    let steps = match node {
        RawNode::List(steps) => steps,
        RawNode::Transform(plugin) => vec![RawNode::Transform(plugin)],
        // Plain data is checked when the pipeline is resolved.
        other => {
            return other.into_value().map_err(|found| DomainError::InvalidOption {
                path: label(path).into(),
                key: "pipeline".into(),
                reason: format!("found {found}"),
            });
        }
    };

    let mut names = Vec::with_capacity(steps.len());
    for step in steps {
        match step {
            RawNode::Transform(plugin) => {
                let name = format!("<inline:{}#{}>", label(path), inline.len());
                inline.insert(name.clone(), plugin);
                names.push(Value::String(name));
            }
            RawNode::Value(Value::String(name)) => names.push(Value::String(name)),
            other => {
                return Err(DomainError::InvalidOption {
                    path: label(path).into(),
                    key: "pipeline".into(),
                    reason: format!("step is {}", other.describe()),
                });
            }
        }
    }
    Ok(Value::Array(names))
}

fn label(path: &str) -> &str {
    if path.is_empty() { ROOT_LABEL } else { path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FnPlugin, RawMap};
    use serde_json::json;

    fn expand(value: Value) -> Result<ConfigTree, DomainError> {
        Expander::new().expand(value)
    }

    #[test]
    fn single_target_at_root() {
        let tree = expand(json!({"foo": {"src": "a.txt", "dest": "out", "cwd": "in"}})).unwrap();
        assert!(tree.scaffolds().is_empty());
        let target = &tree.targets()["foo"];
        assert_eq!(target.path(), "foo");
        assert_eq!(
            target.files(),
            [FileSet::new(vec!["a.txt".into()]).with_dest("out").with_cwd("in")]
        );
    }

    #[test]
    fn children_keep_declaration_order() {
        let tree = expand(json!({
            "zeta": {"src": "z", "dest": "d"},
            "site": {"css": {"src": "*.css", "dest": "css"}},
            "alpha": {"src": "a", "dest": "d"},
            "docs": {"md": {"src": "*.md", "dest": "docs"}},
        }))
        .unwrap();
        let targets: Vec<_> = tree.targets().keys().cloned().collect();
        let scaffolds: Vec<_> = tree.scaffolds().keys().cloned().collect();
        assert_eq!(targets, ["zeta", "alpha"]);
        assert_eq!(scaffolds, ["site", "docs"]);
    }

    #[test]
    fn nested_scaffolds_get_dotted_paths() {
        let tree = expand(json!({
            "site": {"assets": {"css": {"src": "*.css", "dest": "css"}}}
        }))
        .unwrap();
        let css = tree.find_target("site.assets.css").unwrap();
        assert_eq!(css.path(), "site.assets.css");
        assert_eq!(tree.target_count(), 1);
    }

    #[test]
    fn options_are_layered_most_specific_last() {
        let tree = expand(json!({
            "options": {"cwd": "root", "a": 1, "b": 1, "c": 1},
            "site": {
                "options": {"b": 2, "c": 2},
                "page": {"src": "*", "dest": "d", "options": {"c": 3}}
            }
        }))
        .unwrap();
        let page = tree.find_target("site.page").unwrap();
        assert_eq!(page.options()["a"], json!(1));
        assert_eq!(page.options()["b"], json!(2));
        assert_eq!(page.options()["c"], json!(3));
        assert_eq!(tree.scaffolds()["site"].options()["c"], json!(2));
        assert!(!tree.options().contains_key("pipeline"));
    }

    #[test]
    fn extra_target_keys_become_options() {
        let tree = expand(json!({
            "docs": {"src": "*.md", "dest": "d", "flatten": true, "options": {"ext": ".txt"}}
        }))
        .unwrap();
        let docs = &tree.targets()["docs"];
        assert_eq!(docs.own_options()["flatten"], json!(true));
        assert_eq!(docs.own_options()["ext"], json!(".txt"));
    }

    #[test]
    fn inherited_options_feed_the_root() {
        let inherited = json!({"dest": "fallback", "x": 1}).as_object().cloned().unwrap();
        let tree = Expander::new()
            .expand_with(json!({"options": {"x": 2}, "t": {"src": "a"}}), &inherited)
            .unwrap();
        assert_eq!(tree.options()["x"], json!(2));
        assert_eq!(tree.options()["dest"], json!("fallback"));
    }

    #[test]
    fn files_list_and_mapping_shapes() {
        let tree = expand(json!({
            "list": {"files": [{"src": "a/*", "dest": "x"}, {"src": ["b/*"], "dest": "y"}]},
            "map": {"files": {"out/one": "one/*", "out/two": ["two/*"]}, "cwd": "base"}
        }))
        .unwrap();
        assert_eq!(tree.targets()["list"].files().len(), 2);
        let map = &tree.targets()["map"];
        assert_eq!(map.files()[1].dest, Some(PathBuf::from("out/two")));
        assert_eq!(map.files()[1].cwd, Some(PathBuf::from("base")));
    }

    #[test]
    fn name_key_renames_the_root() {
        let tree = expand(json!({"name": "h5bp", "t": {"src": "a", "dest": "b"}})).unwrap();
        assert_eq!(tree.name(), "h5bp");
        assert_eq!(expand(json!({})).unwrap().name(), DEFAULT_ROOT_NAME);
    }

    #[test]
    fn scalar_child_is_a_schema_error() {
        let err = expand(json!({"foo": 42})).unwrap_err();
        assert!(matches!(err, DomainError::UnrecognizedShape { ref path, .. } if path == "foo"));
        assert!(err.is_schema());
    }

    #[test]
    fn empty_key_is_rejected_at_expansion() {
        let err = expand(json!({"": {"src": "a.txt", "dest": "out"}})).unwrap_err();
        assert!(matches!(err, DomainError::InvalidName { ref parent, .. } if parent == ROOT_LABEL));
        assert!(err.is_schema());
    }

    #[test]
    fn dotted_key_is_rejected_at_any_depth() {
        let err = expand(json!({
            "a": {"b": {"src": "x", "dest": "d"}},
            "a.b": {"src": "y", "dest": "d"}
        }))
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidName {
                parent: ROOT_LABEL.into(),
                name: "a.b".into(),
                reason: "contains '.'".into(),
            }
        );

        let err = expand(json!({"site": {"main.css": {"src": "*.css", "dest": "d"}}})).unwrap_err();
        assert!(matches!(err, DomainError::InvalidName { ref parent, .. } if parent == "site"));
    }

    #[test]
    fn empty_scaffold_is_rejected() {
        let err = expand(json!({"site": {"options": {"a": 1}}})).unwrap_err();
        assert_eq!(err, DomainError::EmptyNode { path: "site".into() });
    }

    #[test]
    fn target_without_dest_is_rejected() {
        let err = expand(json!({"t": {"src": "*.md"}})).unwrap_err();
        assert_eq!(err, DomainError::MissingDestination { path: "t".into() });
    }

    #[test]
    fn dest_may_come_from_options() {
        let tree = expand(json!({"options": {"dest": "out"}, "t": {"src": "*.md"}})).unwrap();
        assert_eq!(tree.targets()["t"].files()[0].dest, None);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn empty_src_is_rejected() {
        let err = expand(json!({"t": {"src": [], "dest": "d"}})).unwrap_err();
        assert_eq!(err, DomainError::MissingSource { path: "t".into() });
    }

    #[test]
    fn root_factory_receives_inherited_options() {
        let inherited = json!({"dest": "generated"}).as_object().cloned().unwrap();
        let raw = RawNode::factory(|opts| {
            let dest = opts["dest"].as_str().unwrap_or_default().to_string();
            RawNode::from(json!({"t": {"src": "*.md", "dest": format!("{dest}/docs")}}))
        });
        let tree = Expander::new().expand_with(raw, &inherited).unwrap();
        assert_eq!(
            tree.targets()["t"].files()[0].dest,
            Some(PathBuf::from("generated/docs"))
        );
    }

    #[test]
    fn nested_factory_sees_owner_options() {
        let raw = RawMap::new()
            .entry("options", json!({"cwd": "vendor"}))
            .entry(
                "site",
                RawNode::factory(|opts| {
                    let cwd = opts["cwd"].as_str().unwrap_or_default().to_string();
                    RawNode::from(json!({"css": {"src": "*.css", "dest": "css", "cwd": cwd}}))
                }),
            );
        let tree = Expander::new().expand(raw).unwrap();
        let css = tree.find_target("site.css").unwrap();
        assert_eq!(css.files()[0].cwd, Some(PathBuf::from("vendor")));
    }

    #[test]
    fn factory_returning_non_mapping_fails() {
        let err = Expander::new()
            .expand(RawNode::factory(|_| RawNode::from(json!("nope"))))
            .unwrap_err();
        assert!(matches!(err, DomainError::FactoryNotMapping { .. }));
    }

    #[test]
    fn inline_transforms_are_named_and_stored() {
        let raw = RawMap::new()
            .entry(
                "options",
                RawMap::new().entry(
                    "pipeline",
                    RawNode::List(vec![
                        RawNode::from("eol"),
                        RawNode::transform(FnPlugin::append("tail", "!")),
                    ]),
                ),
            )
            .entry("t", json!({"src": "*", "dest": "d"}));
        let tree = Expander::new().expand(raw).unwrap();
        assert_eq!(tree.inline_steps().len(), 1);
        let pipeline = tree.targets()["t"].options()["pipeline"].as_array().unwrap().clone();
        assert_eq!(pipeline[0], json!("eol"));
        let name = pipeline[1].as_str().unwrap();
        assert!(tree.inline_steps().get(name).is_some());
    }

    #[test]
    fn custom_classifier_is_used() {
        struct OnlyTargets;
        impl Classifier for OnlyTargets {
            fn classify(&self, value: &RawNode) -> Option<NodeKind> {
                value.is_mapping().then_some(NodeKind::Target)
            }
        }
        let err = Expander::with_classifier(OnlyTargets)
            .expand(json!({"site": {"css": {"src": "*.css"}}}))
            .unwrap_err();
        assert_eq!(err, DomainError::MissingSource { path: "site".into() });
    }
}
