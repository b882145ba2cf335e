//! Edge case and error handling tests for graft


use graft::{
    ContentPhase, MigrationContext, MigrationError, PathInfo, StructurePhase, Task, TaskChain,
    default_chain,
};
use harness::{TestTree, run_graft};
use std::fs;
use std::os::unix::fs::symlink;

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn test_missing_namespace_fails_before_any_io() {
    let tree = TestTree::new();
    tree.add_file("a.txt", "a");
    let config = tree.config("");
    let err = ContentPhase::new(&config, default_chain(&config)).run().unwrap_err();
    assert!(matches!(err, MigrationError::Configuration(_)));
    assert!(!tree.target().exists());
}

#[test]
fn test_cli_reports_configuration_error() {
    let tree = TestTree::new();
    let (_stdout, stderr, success) = run_graft(tree.path(), &["content", "--source", "missing"]);
    assert!(!success);
    assert!(stderr.contains("graft: "), "{}", stderr);
    assert!(stderr.contains("source_dir"), "{}", stderr);
}

#[test]
fn test_cli_rejects_unknown_config_key() {
    let tree = TestTree::new();
    tree.add_outside("graft.toml", "namespace = \"scout\"\nsource = \"typo\"\n");
    let (_stdout, stderr, success) = run_graft(tree.path(), &["migrate", "--config", "graft.toml"]);
    assert!(!success);
    assert!(stderr.contains("graft.toml"), "{}", stderr);
}

// ============================================================================
// Task failures
// ============================================================================

struct Explode;

impl Task for Explode {
    fn name(&self) -> &str {
        "explode"
    }

    fn accept(&self, info: &PathInfo, _ctx: &MigrationContext<'_>) -> bool {
        info.file_name() == Some("bad.js")
    }

    fn process(&mut self, info: &PathInfo, _ctx: &mut MigrationContext<'_>) -> graft::Result<()> {
        Err(MigrationError::conflict(info.path(), info.path()))
    }
}

#[test]
fn test_fatal_task_error_aborts_before_writing() {
    let tree = TestTree::new();
    tree.add_file("a.js", "a");
    tree.add_file("bad.js", "b");
    let config = tree.config("scout");
    let err = ContentPhase::new(&config, TaskChain::new().task(Explode))
        .run()
        .unwrap_err();
    match err {
        MigrationError::Task { task, path, .. } => {
            assert_eq!(task, "explode");
            assert!(path.ends_with("bad.js"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(tree.target_files().is_empty());
}

#[test]
fn test_undecodable_js_is_copied_with_warning() {
    let tree = TestTree::new();
    let latin1 = b"scout.A = function() { return '\xe9t\xe9'; };\n";
    tree.add_bytes("src/main/js/scout/A.js", latin1);
    tree.add_file("src/main/js/scout/B.js", "scout.B = function() {\n};\n");
    let config = tree.config("scout");
    let report = ContentPhase::new(&config, default_chain(&config)).run().unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].message.contains("UTF-8"));
    assert_eq!(
        fs::read(tree.target().join("src/main/js/scout/A.js")).unwrap(),
        latin1.to_vec()
    );
    assert!(tree.target_exists("src/main/js/scout/B.js"));
}

// ============================================================================
// Structure phase conflicts and idempotence
// ============================================================================

#[test]
fn test_model_conflict_after_content_phase() {
    let tree = TestTree::new();
    tree.add_file("src/main/js/scout/Widget.json", "{objectType: 'Form'}");
    tree.add_file("src/main/js/scout/Widget-model.js", "export default {};");
    let config = tree.config("scout");
    ContentPhase::new(&config, default_chain(&config)).run().unwrap();
    let err = StructurePhase::new(&config).run().unwrap_err();
    assert!(matches!(err, MigrationError::Conflict { .. }));
    assert!(err.to_string().contains("Widget-model.js"));
}

#[test]
fn test_full_migration_is_repeatable() {
    let tree = TestTree::new();
    tree.add_file("src/main/js/scout/scout-module.js", "x");
    tree.add_file("src/main/js/scout/login-module.less", "y");
    tree.add_file("src/main/js/scout/form/Form.json", "{objectType: 'Form'}");
    tree.add_file("src/main/js/scout/util-macro.less", "z");
    tree.add_file("src/main/js/scout/_shared/foo-module.js", "s");
    let config = tree.config("scout");

    ContentPhase::new(&config, default_chain(&config)).run().unwrap();
    StructurePhase::new(&config).run().unwrap();
    let first = tree.target_files();
    assert_eq!(first, vec!["src/main/js/form/Form-model.js", "src/main/js/index.js"]);

    let again = StructurePhase::new(&config).run().unwrap();
    assert!(again.is_noop());
    assert_eq!(tree.target_files(), first);
}

#[test]
fn test_structure_only_on_existing_tree() {
    let tree = TestTree::new();
    fs::create_dir_all(tree.target().join("src/main/js/a/b")).unwrap();
    fs::write(tree.target().join("src/main/js/a/b/x-macro.js"), "").unwrap();
    fs::write(tree.target().join("src/main/js/keep.js"), "").unwrap();
    let config = tree.config("scout");
    let report = StructurePhase::new(&config).run().unwrap();
    assert_eq!(report.deleted, 1);
    assert_eq!(report.pruned, 2);
    assert_eq!(tree.target_files(), vec!["src/main/js/keep.js"]);
}

// ============================================================================
// Tree walking
// ============================================================================

#[test]
fn test_denied_directories_are_not_copied() {
    let tree = TestTree::new();
    tree.add_file("node_modules/dep/index.js", "dep");
    tree.add_file(".git/HEAD", "ref");
    tree.add_file("src/main/js/lib/vendored.js", "v");
    tree.add_file("src/main/js/scout/A.js", "a");
    let config = tree.config("scout");
    ContentPhase::new(&config, default_chain(&config)).run().unwrap();
    assert_eq!(tree.target_files(), vec!["src/main/js/scout/A.js"]);
}

#[test]
fn test_build_output_names_below_root_are_copied() {
    let tree = TestTree::new();
    tree.add_file("bin/Main.class", "c");
    tree.add_file("dist/app.js", "d");
    tree.add_file("src/main/resources/WebContent/res/bin/tool.sh", "#!/bin/sh\n");
    let config = tree.config("scout");
    ContentPhase::new(&config, TaskChain::new()).run().unwrap();
    assert_eq!(
        tree.target_files(),
        vec!["src/main/resources/WebContent/res/bin/tool.sh"]
    );
}

#[test]
fn test_symlinks_are_skipped() {
    let tree = TestTree::new();
    let real = tree.add_file("real.txt", "r");
    symlink(&real, tree.source().join("link.txt")).expect("Failed to create symlink");
    symlink(tree.source(), tree.source().join("loop")).expect("Failed to create dir symlink");
    let config = tree.config("scout");
    let report = ContentPhase::new(&config, TaskChain::new()).run().unwrap();
    assert_eq!(report.visited, 1);
    assert_eq!(tree.target_files(), vec!["real.txt"]);
}

#[test]
fn test_in_place_migration_keeps_tree() {
    let tree = TestTree::new();
    tree.add_file("src/main/js/scout/A.js", "scout.A = function() {\n};\n");
    let mut config = tree.config("scout");
    config.target_dir = tree.source();
    ContentPhase::new(&config, default_chain(&config)).run().unwrap();
    assert!(tree.source().join("src/main/js/scout/A.js").exists());
}

#[test]
fn test_target_containing_source_is_rejected() {
    let tree = TestTree::new();
    tree.add_file("src/main/js/scout/A.js", "a");
    let mut config = tree.config("scout");
    config.target_dir = tree.path().to_path_buf();
    let err = ContentPhase::new(&config, default_chain(&config)).run().unwrap_err();
    assert!(matches!(err, MigrationError::Configuration(_)));
    assert!(tree.source().join("src/main/js/scout/A.js").exists());
}

#[test]
fn test_target_inside_source_is_rejected() {
    let tree = TestTree::new();
    tree.add_file("a.js", "a");
    let mut config = tree.config("scout");
    config.target_dir = tree.source().join("out");
    let err = ContentPhase::new(&config, TaskChain::new()).run().unwrap_err();
    assert!(matches!(err, MigrationError::Configuration(_)));
    assert!(!tree.source().join("out").exists());
}

#[test]
fn test_empty_source_module() {
    let tree = TestTree::new();
    let config = tree.config("scout");
    let report = ContentPhase::new(&config, default_chain(&config)).run().unwrap();
    assert_eq!(report.visited, 0);
    assert!(tree.target().is_dir());
    let structure = StructurePhase::new(&config).run().unwrap();
    assert!(structure.is_noop());
}
