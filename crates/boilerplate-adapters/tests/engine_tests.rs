//! End-to-end runs of the engine against the bundled adapters.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use boilerplate_adapters::{DryRunFileAccess, InMemoryRegistry, LocalFileAccess, MemoryFileAccess};
use boilerplate_core::{
    application::{BoilerplateService, StreamEvent},
    domain::{FnPlugin, OptionMap, RawMap, RawNode},
    error::ErrorKind,
};
use futures::StreamExt;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Registry with the built-ins plus `a`, `b` and `c`, which append
/// `aaa`, `bbb` and `ccc`.
fn registry() -> InMemoryRegistry {
    let registry = InMemoryRegistry::with_builtin().unwrap();
    for name in ["a", "b", "c"] {
        registry.register(FnPlugin::append(name, name.repeat(3))).unwrap();
    }
    registry
}

fn sources() -> MemoryFileAccess {
    MemoryFileAccess::new()
        .with_file("src/one.txt", "one\n")
        .with_file("src/two.txt", "two\n")
        .with_file("src/notes.md", "notes\n")
        .with_file("src/nested/three.txt", "three\n")
}

fn service(files: &MemoryFileAccess) -> BoilerplateService {
    BoilerplateService::new(Arc::new(files.clone()), Arc::new(registry()))
}

fn options(value: Value) -> OptionMap {
    value.as_object().cloned().unwrap()
}

// ── End-to-end properties ────────────────────────────────────────────────────

#[tokio::test]
async fn single_target_copies_file_unmodified() {
    let files = sources();
    let service = service(&files);
    let tree = service
        .expand(json!({"foo": {"src": "one.txt", "dest": "out", "cwd": "src"}}))
        .unwrap();

    let summary = service.run_series(&tree, &OptionMap::new()).await.unwrap();

    assert_eq!(files.written(), [PathBuf::from("out/one.txt")]);
    assert_eq!(files.read_string("out/one.txt").as_deref(), Some("one\n"));
    assert_eq!(summary.files[0].node, "foo");
}

#[tokio::test]
async fn pipeline_from_root_options_applies_in_order() {
    let files = sources();
    let service = service(&files);
    let tree = service
        .expand(json!({
            "options": {"pipeline": ["a", "c"]},
            "foo": {"src": "*.txt", "dest": "out", "cwd": "src"}
        }))
        .unwrap();

    service.run_series(&tree, &OptionMap::new()).await.unwrap();

    for path in ["out/one.txt", "out/two.txt"] {
        let text = files.read_string(path).unwrap();
        assert!(text.ends_with("aaaccc"), "{path}: {text}");
        assert!(!text.contains("bbb"));
    }
    assert!(files.read("out/nested/three.txt").is_none());
}

#[tokio::test]
async fn pipeline_ab_ends_with_ab() {
    let files = MemoryFileAccess::new().with_file("in/x", "");
    let registry = InMemoryRegistry::new();
    registry.register(FnPlugin::append("a", "A")).unwrap();
    registry.register(FnPlugin::append("b", "B")).unwrap();
    let service = BoilerplateService::new(Arc::new(files.clone()), Arc::new(registry));

    let tree = service
        .expand(json!({"t": {"src": "x", "dest": "out", "cwd": "in", "pipeline": ["a", "b"]}}))
        .unwrap();
    service.run_series(&tree, &OptionMap::new()).await.unwrap();
    assert!(files.read_string("out/x").unwrap().ends_with("AB"));
}

#[tokio::test]
async fn zero_matches_succeed_in_both_modes() {
    let files = sources();
    let service = service(&files);
    let tree = service
        .expand(json!({"none": {"src": "*.nothing", "dest": "out", "cwd": "src"}}))
        .unwrap();

    let summary = service.run_series(&tree, &OptionMap::new()).await.unwrap();
    assert!(summary.files.is_empty());

    let events = service.run_stream(&tree, &OptionMap::new()).collect_events().await;
    assert_eq!(events, vec![StreamEvent::End]);
    assert!(files.written().is_empty());
}

#[tokio::test]
async fn unknown_plugin_writes_nothing_for_the_node() {
    let files = sources();
    let service = service(&files);
    let tree = service
        .expand(json!({"bad": {"src": "*.txt", "dest": "out", "cwd": "src", "pipeline": ["zzz"]}}))
        .unwrap();

    let err = service.run_series(&tree, &OptionMap::new()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownPlugin);

    let err = service
        .run_stream(&tree, &OptionMap::new())
        .into_result()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownPlugin);
    assert!(files.written().is_empty());
}

#[tokio::test]
async fn series_and_stream_write_the_same_files() {
    let config = json!({
        "docs": {"src": "*.md", "dest": "docs", "cwd": "src"},
        "site": {
            "text": {"src": "**/*.txt", "dest": "text", "cwd": "src", "pipeline": ["b"]},
            "flat": {"src": "**/*.txt", "dest": "flat", "cwd": "src", "flatten": true}
        }
    });

    let series_files = sources();
    let series = service(&series_files);
    let tree = series.expand(config.clone()).unwrap();
    series.run_series(&tree, &OptionMap::new()).await.unwrap();

    let stream_files = sources();
    let stream = service(&stream_files);
    let tree = stream.expand(config).unwrap();
    let streamed = stream.run_stream(&tree, &OptionMap::new()).into_result().await.unwrap();

    let series_set: BTreeSet<_> = series_files.written().into_iter().collect();
    let stream_set: BTreeSet<_> = stream_files.written().into_iter().collect();
    assert_eq!(series_set, stream_set);
    assert_eq!(streamed.len(), series_set.len());
    for path in &series_set {
        assert_eq!(series_files.read(path), stream_files.read(path));
    }
}

#[tokio::test]
async fn stream_keeps_per_node_order_and_ends_last() {
    let files = sources();
    let service = service(&files);
    let tree = service
        .expand(json!({
            "a": {"src": "**/*.txt", "dest": "a", "cwd": "src"},
            "b": {"src": "**/*.txt", "dest": "b", "cwd": "src"}
        }))
        .unwrap();

    let mut stream = service.run_stream(&tree, &OptionMap::new());
    let mut per_node: std::collections::HashMap<String, Vec<PathBuf>> = Default::default();
    let mut last = None;
    while let Some(event) = stream.next().await {
        if let StreamEvent::Data(file) = &event {
            per_node.entry(file.node.clone()).or_default().push(file.source.clone());
        }
        last = Some(event);
    }

    assert_eq!(last, Some(StreamEvent::End));
    let expected = [
        PathBuf::from("src/nested/three.txt"),
        PathBuf::from("src/one.txt"),
        PathBuf::from("src/two.txt"),
    ];
    assert_eq!(per_node["a"], expected);
    assert_eq!(per_node["b"], expected);
}

#[tokio::test]
async fn stream_error_cancels_siblings_but_still_ends() {
    let mut files = MemoryFileAccess::new();
    for i in 0..50 {
        files = files.with_file(format!("src/{i:02}.txt"), "x");
    }
    let registry = registry();
    registry
        .register_fn("explode", |f, _| {
            Err(boilerplate_core::domain::DomainError::transform("explode", f.path().display().to_string(), "boom"))
        })
        .unwrap();
    let service = BoilerplateService::new(Arc::new(files.clone()), Arc::new(registry));
    let tree = service
        .expand(json!({
            "bad": {"src": "*.txt", "dest": "bad", "cwd": "src", "pipeline": ["explode"]},
            "good": {"src": "*.txt", "dest": "good", "cwd": "src"}
        }))
        .unwrap();

    let events = service.run_stream(&tree, &OptionMap::new()).collect_events().await;
    let errors = events.iter().filter(|e| matches!(e, StreamEvent::Error(_))).count();
    assert_eq!(errors, 1);
    assert_eq!(events.last(), Some(&StreamEvent::End));
    assert!(files.written().iter().all(|p| p.starts_with("good")));
}

// ── Options and destinations ─────────────────────────────────────────────────

#[tokio::test]
async fn caller_overrides_win_over_tree_options() {
    let files = sources();
    let service = service(&files);
    let tree = service
        .expand(json!({
            "options": {"banner": "// tree", "pipeline": ["banner"]},
            "t": {"src": "one.txt", "dest": "out", "cwd": "src"}
        }))
        .unwrap();

    service
        .run_series(&tree, &options(json!({"banner": "// caller"})))
        .await
        .unwrap();
    assert_eq!(files.read_string("out/one.txt").as_deref(), Some("// caller\none\n"));
}

#[tokio::test]
async fn dest_base_flatten_and_ext_shape_destinations() {
    let files = sources();
    let service = service(&files);
    let tree = service
        .expand(json!({
            "options": {"destBase": "public"},
            "t": {"src": "**/*.txt", "dest": "txt", "cwd": "src", "flatten": true, "ext": ".out"}
        }))
        .unwrap();

    service.run_series(&tree, &OptionMap::new()).await.unwrap();
    let written: BTreeSet<_> = files.written().into_iter().collect();
    let expected: BTreeSet<_> = ["public/txt/one.out", "public/txt/three.out", "public/txt/two.out"]
        .into_iter()
        .map(PathBuf::from)
        .collect();
    assert_eq!(written, expected);
}

#[tokio::test]
async fn disabled_steps_are_skipped() {
    let files = sources();
    let service = service(&files);
    let tree = service
        .expand(json!({"t": {"src": "one.txt", "dest": "out", "cwd": "src", "pipeline": ["a", "b"]}}))
        .unwrap();

    service
        .run_series(&tree, &options(json!({"disable": ["a"]})))
        .await
        .unwrap();
    assert_eq!(files.read_string("out/one.txt").as_deref(), Some("one\nbbb"));
}

#[tokio::test]
async fn inline_transforms_run_with_registered_steps() {
    let files = sources();
    let service = service(&files);
    let raw = RawMap::new().entry(
        "t",
        RawMap::new()
            .entry("src", "one.txt")
            .entry("dest", "out")
            .entry("cwd", "src")
            .entry(
                "pipeline",
                RawNode::List(vec![
                    RawNode::from("a"),
                    RawNode::transform(FnPlugin::append("shout", "!")),
                ]),
            ),
    );
    let tree = service.expand(raw).unwrap();
    service.run_series(&tree, &OptionMap::new()).await.unwrap();
    assert_eq!(files.read_string("out/one.txt").as_deref(), Some("one\naaa!"));
}

#[tokio::test]
async fn dropped_files_are_not_written() {
    let files = sources();
    let registry = registry();
    registry
        .register_fn("only-one", |f, _| {
            Ok((f.relative == Path::new("one.txt")).then_some(f))
        })
        .unwrap();
    let service = BoilerplateService::new(Arc::new(files.clone()), Arc::new(registry));
    let tree = service
        .expand(json!({"t": {"src": "*.txt", "dest": "out", "cwd": "src", "pipeline": ["only-one"]}}))
        .unwrap();

    let summary = service.run_series(&tree, &OptionMap::new()).await.unwrap();
    assert_eq!(summary.files.len(), 1);
    assert_eq!(files.written(), [PathBuf::from("out/one.txt")]);
}

#[tokio::test]
async fn dry_run_reads_but_never_writes() {
    let files = sources();
    let dry = DryRunFileAccess::new(Arc::new(files.clone()));
    let service = BoilerplateService::new(Arc::new(dry.clone()), Arc::new(registry()));
    let tree = service
        .expand(json!({"t": {"src": "*.txt", "dest": "out", "cwd": "src"}}))
        .unwrap();

    let summary = service.run_series(&tree, &OptionMap::new()).await.unwrap();
    assert_eq!(summary.files.len(), 2);
    assert_eq!(dry.planned().len(), 2);
    assert!(files.written().is_empty());
}

// ── Real filesystem ──────────────────────────────────────────────────────────

#[tokio::test]
async fn local_run_writes_into_temp_dir() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("tpl/css")).unwrap();
    std::fs::write(root.join("tpl/index.html"), "<html>\r\n").unwrap();
    std::fs::write(root.join("tpl/css/site.css"), "body {}  \n\n").unwrap();
    std::fs::write(root.join("tpl/.htaccess"), "deny").unwrap();

    let service = BoilerplateService::new(
        Arc::new(LocalFileAccess::with_root(root)),
        Arc::new(registry()),
    );
    let tree = service
        .expand(json!({
            "options": {"cwd": "tpl", "pipeline": ["eol", "trim"]},
            "html": {"src": "*", "dest": "out"},
            "assets": {"css": {"src": "css/*.css", "dest": "out"}}
        }))
        .unwrap();

    let summary = service.run_series(&tree, &OptionMap::new()).await.unwrap();
    assert_eq!(summary.targets, 2);

    assert_eq!(std::fs::read_to_string(root.join("out/index.html")).unwrap(), "<html>\n");
    assert_eq!(std::fs::read_to_string(root.join("out/css/site.css")).unwrap(), "body {}\n");
    assert!(!root.join("out/.htaccess").exists());
}

#[tokio::test]
async fn local_dot_option_includes_hidden_files() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("tpl")).unwrap();
    std::fs::write(root.join("tpl/.editorconfig"), "root = true").unwrap();

    let service = BoilerplateService::new(
        Arc::new(LocalFileAccess::with_root(root)),
        Arc::new(registry()),
    );
    let tree = service
        .expand(json!({"dot": {"src": "*", "dest": "out", "cwd": "tpl", "dot": true}}))
        .unwrap();

    service.run_series(&tree, &OptionMap::new()).await.unwrap();
    assert!(root.join("out/.editorconfig").exists());
}
