//! Unit tests for module-set contribution planning.

use super::*;
use crate::descriptor::ModuleSet;
use crate::project::project;
use crate::resolver::ResolvedDependency;
use crate::test_utils::RecordingArchiver;
use camino::{Utf8Path, Utf8PathBuf};
use mockall::mock;
use std::fs;
use tempfile::TempDir;

mock! {
    Resolver {}
    impl DependencyResolver for Resolver {
        fn resolve_dependency_sets(&self, project: &Project) -> crate::error::Result<Vec<ResolvedDependency>>;
    }
}

mock! {
    Builder {}
    impl ProjectBuilder for Builder {
        fn build_project(&self, base_dir: &camino::Utf8Path) -> crate::error::Result<Project>;
    }
}

struct TempTree {
    _temp: TempDir,
    path: Utf8PathBuf,
}

fn temp_tree() -> TempTree {
    let temp = TempDir::new().expect("failed to create temp dir");
    let path = Utf8PathBuf::try_from(temp.path().to_owned()).expect("non-UTF8 temp path");
    TempTree { _temp: temp, path }
}

fn write_file(dir: &Utf8Path, rel: &str, contents: &str) -> Utf8PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create parent dirs");
    }
    fs::write(&path, contents).expect("failed to write file");
    path
}

fn phase() -> ModuleSetPhase<MockResolver, MockBuilder> {
    ModuleSetPhase::new(MockResolver::new(), MockBuilder::new())
}

fn proxy(working_dir: &Utf8Path) -> ProxyArchiver<RecordingArchiver> {
    ProxyArchiver::new(
        RecordingArchiver::new(),
        String::new(),
        working_dir.to_owned(),
        Vec::new(),
    )
}

fn execution() -> ExecutionContext {
    ExecutionContext {
        final_name: "final-name".to_owned(),
        ..ExecutionContext::default()
    }
}

/// Binaries spec used by most planning tests; dependencies off so the
/// collaborator mocks stay untouched.
fn plain_binaries() -> ModuleBinaries {
    ModuleBinaries {
        output_directory: "out".to_owned(),
        output_file_name_mapping: "artifact".to_owned(),
        file_mode: Some("777".to_owned()),
        unpack: false,
        include_dependencies: false,
        attachment_classifier: None,
    }
}

fn built_project(tree: &TempTree, artifact_rel: &str) -> Project {
    let file = write_file(&tree.path, artifact_rel, "artifact bytes");
    let mut p = project("group", "artifact", "version", &tree.path);
    p.primary_artifact = Some(ArtifactRef {
        classifier: None,
        extension: "tar.gz".to_owned(),
        file: Some(file),
    });
    p
}

#[test]
fn execute_skips_when_no_module_sets_declared() {
    let tree = temp_tree();
    let mut arena = ProjectArena::new();
    let root = arena.push(project("group", "artifact", "version", &tree.path));
    let mut archiver = proxy(&tree.path.join("workdir"));

    let ctx = PhaseContext {
        arena: &arena,
        root,
        execution: &execution(),
    };
    phase()
        .execute(&AssemblyDescriptor::default(), &ctx, &mut archiver)
        .expect("empty descriptor succeeds");

    assert!(archiver.inner().files.is_empty());
    assert!(archiver.inner().file_sets.is_empty());
}

#[test]
fn execute_adds_one_module_set_with_one_module() {
    let tree = temp_tree();
    let mut arena = ProjectArena::new();
    let root = arena.push(project("group", "artifact", "version", &tree.path));
    let mut module = built_project(&tree, "module.tar.gz");
    module.artifact = "module".to_owned();
    module.parent = Some(root);
    arena.push(module);

    let descriptor = AssemblyDescriptor {
        module_sets: vec![ModuleSet {
            include_sub_modules: true,
            binaries: Some(plain_binaries()),
            ..ModuleSet::default()
        }],
        ..AssemblyDescriptor::default()
    };

    let mut archiver = proxy(&tree.path.join("workdir"));
    let ctx = PhaseContext {
        arena: &arena,
        root,
        execution: &execution(),
    };
    phase()
        .execute(&descriptor, &ctx, &mut archiver)
        .expect("execute succeeds");

    let files = &archiver.inner().files;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].1, "out/artifact");
    assert_eq!(files[0].2, 0o777);
}

#[test]
fn absent_binaries_spec_is_a_noop() {
    let tree = temp_tree();
    let mut arena = ProjectArena::new();
    let id = arena.push(project("group", "artifact", "version", &tree.path));
    let mut archiver = proxy(&tree.path.join("workdir"));
    let ctx = PhaseContext {
        arena: &arena,
        root: id,
        execution: &execution(),
    };

    phase()
        .add_module_binaries(None, &BTreeSet::from([id]), &ctx, &mut archiver)
        .expect("absent binaries succeed");

    assert!(archiver.inner().files.is_empty());
}

#[test]
fn aggregator_packaging_contributes_nothing() {
    let tree = temp_tree();
    let mut arena = ProjectArena::new();
    let mut p = project("group", "artifact", "version", &tree.path);
    p.packaging = "pom".to_owned();
    let id = arena.push(p);

    let mut archiver = proxy(&tree.path.join("workdir"));
    let ctx = PhaseContext {
        arena: &arena,
        root: id,
        execution: &execution(),
    };
    let binaries = plain_binaries();

    phase()
        .add_module_binaries(Some(&binaries), &BTreeSet::from([id]), &ctx, &mut archiver)
        .expect("aggregator project is skipped, not an error");

    assert!(archiver.inner().files.is_empty());
    assert!(archiver.inner().unpacked.is_empty());
}

#[test]
fn attachment_classifier_selects_the_attached_artifact() {
    let tree = temp_tree();
    let attached_file = write_file(&tree.path, "artifact-test.tar.gz", "attached bytes");
    let mut arena = ProjectArena::new();
    let mut p = project("group", "artifact", "version", &tree.path);
    p.attached_artifacts.push(ArtifactRef {
        classifier: Some("test".to_owned()),
        extension: "tar.gz".to_owned(),
        file: Some(attached_file.clone()),
    });
    let id = arena.push(p);

    let mut binaries = plain_binaries();
    binaries.attachment_classifier = Some("test".to_owned());

    let mut archiver = proxy(&tree.path.join("workdir"));
    let ctx = PhaseContext {
        arena: &arena,
        root: id,
        execution: &execution(),
    };
    phase()
        .add_module_binaries(Some(&binaries), &BTreeSet::from([id]), &ctx, &mut archiver)
        .expect("attachment contribution succeeds");

    let files = &archiver.inner().files;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].0, attached_file);
    assert_eq!(files[0].1, "out/artifact");
}

#[test]
fn unmatched_attachment_classifier_is_a_configuration_error() {
    let tree = temp_tree();
    let mut arena = ProjectArena::new();
    let mut p = built_project(&tree, "artifact.tar.gz");
    p.attached_artifacts.clear();
    let id = arena.push(p);

    let mut binaries = plain_binaries();
    binaries.attachment_classifier = Some("test".to_owned());

    let mut archiver = proxy(&tree.path.join("workdir"));
    let ctx = PhaseContext {
        arena: &arena,
        root: id,
        execution: &execution(),
    };
    let err = phase()
        .add_module_binaries(Some(&binaries), &BTreeSet::from([id]), &ctx, &mut archiver)
        .expect_err("missing attachment must fail");

    assert!(
        matches!(
            &err,
            AssemblyError::MissingAttachment { project, classifier }
                if project == "group:artifact" && classifier == "test"
        ),
        "unexpected error: {err:?}"
    );
    assert!(archiver.inner().files.is_empty());
}

#[test]
fn add_module_artifact_fails_without_backing_file() {
    let tree = temp_tree();
    let p = project("group", "artifact", "version", &tree.path);
    let artifact = ArtifactRef {
        classifier: None,
        extension: "tar.gz".to_owned(),
        file: None,
    };
    let mut archiver = proxy(&tree.path.join("workdir"));

    let err = phase()
        .add_module_artifact(&artifact, &p, &plain_binaries(), &execution(), &mut archiver)
        .expect_err("artifact without file must fail");

    assert!(matches!(err, AssemblyError::ArtifactFileMissing { .. }));
}

#[test]
fn add_module_artifact_adds_one_entry() {
    let tree = temp_tree();
    let p = built_project(&tree, "artifact.tar.gz");
    let artifact = p.primary_artifact.clone().expect("primary artifact set");
    let mut archiver = proxy(&tree.path.join("workdir"));

    phase()
        .add_module_artifact(&artifact, &p, &plain_binaries(), &execution(), &mut archiver)
        .expect("artifact contribution succeeds");

    let files = &archiver.inner().files;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].1, "out/artifact");
    assert_eq!(files[0].2, 0o777);
}

#[test]
fn unset_file_mode_falls_back_to_archiver_default() {
    let tree = temp_tree();
    let p = built_project(&tree, "artifact.tar.gz");
    let artifact = p.primary_artifact.clone().expect("primary artifact set");
    let mut archiver = ProxyArchiver::new(
        RecordingArchiver::with_override_modes(0o222, 0o222),
        String::new(),
        tree.path.join("workdir"),
        Vec::new(),
    );

    let mut binaries = plain_binaries();
    binaries.file_mode = None;
    phase()
        .add_module_artifact(&artifact, &p, &binaries, &execution(), &mut archiver)
        .expect("artifact contribution succeeds");

    assert_eq!(archiver.inner().files[0].2, 0o222);
}

#[test]
fn unpack_expands_the_artifact_instead_of_adding_it() {
    let tree = temp_tree();
    let p = built_project(&tree, "artifact.tar.gz");
    let artifact = p.primary_artifact.clone().expect("primary artifact set");
    let file = artifact.file.clone().expect("backing file set");
    let mut archiver = proxy(&tree.path.join("workdir"));

    let mut binaries = plain_binaries();
    binaries.unpack = true;
    phase()
        .add_module_artifact(&artifact, &p, &binaries, &execution(), &mut archiver)
        .expect("unpack contribution succeeds");

    assert!(archiver.inner().files.is_empty());
    assert_eq!(archiver.inner().unpacked, vec![(file, "out/".to_owned())]);
}

#[test]
fn include_dependencies_adds_resolved_artifacts() {
    let tree = temp_tree();
    let dep_file = write_file(&tree.path, "dep-2.0.tar.gz", "dependency bytes");
    let mut arena = ProjectArena::new();
    let p = built_project(&tree, "artifact.tar.gz");
    let fresh = p.clone();
    let id = arena.push(p);

    let mut resolver = MockResolver::new();
    let dependency = ResolvedDependency {
        group: "acme".to_owned(),
        artifact: "dep".to_owned(),
        version: "2.0".to_owned(),
        classifier: None,
        extension: "tar.gz".to_owned(),
        file: Some(dep_file.clone()),
    };
    resolver
        .expect_resolve_dependency_sets()
        .times(1)
        .returning(move |_| Ok(vec![dependency.clone()]));

    let mut builder = MockBuilder::new();
    builder
        .expect_build_project()
        .times(1)
        .returning(move |_| Ok(fresh.clone()));

    let mut binaries = plain_binaries();
    binaries.include_dependencies = true;
    binaries.output_file_name_mapping =
        crate::interpolate::DEFAULT_OUTPUT_FILE_NAME_MAPPING.to_owned();

    let mut archiver = proxy(&tree.path.join("workdir"));
    let ctx = PhaseContext {
        arena: &arena,
        root: id,
        execution: &execution(),
    };
    ModuleSetPhase::new(resolver, builder)
        .add_module_binaries(Some(&binaries), &BTreeSet::from([id]), &ctx, &mut archiver)
        .expect("binaries with dependencies succeed");

    let files = &archiver.inner().files;
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].1, "out/artifact-version.tar.gz");
    assert_eq!(files[1].0, dep_file);
    assert_eq!(files[1].1, "out/dep-2.0.tar.gz");
}

#[test]
fn dependency_resolution_failure_aborts_the_run() {
    let tree = temp_tree();
    let mut arena = ProjectArena::new();
    let p = built_project(&tree, "artifact.tar.gz");
    let fresh = p.clone();
    let id = arena.push(p);

    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve_dependency_sets()
        .times(1)
        .returning(|_| {
            Err(AssemblyError::DependencyResolution {
                project: "group:artifact".to_owned(),
                reason: "registry unreachable".to_owned(),
            })
        });
    let mut builder = MockBuilder::new();
    builder
        .expect_build_project()
        .times(1)
        .returning(move |_| Ok(fresh.clone()));

    let mut binaries = plain_binaries();
    binaries.include_dependencies = true;

    let mut archiver = proxy(&tree.path.join("workdir"));
    let ctx = PhaseContext {
        arena: &arena,
        root: id,
        execution: &execution(),
    };
    let err = ModuleSetPhase::new(resolver, builder)
        .add_module_binaries(Some(&binaries), &BTreeSet::from([id]), &ctx, &mut archiver)
        .expect_err("resolver failure must abort the run");

    assert!(
        matches!(
            &err,
            AssemblyError::DependencyResolution { project, reason }
                if project == "group:artifact" && reason == "registry unreachable"
        ),
        "unexpected error: {err:?}"
    );
    // Only the module's own artifact made it in before the abort.
    assert_eq!(archiver.inner().files.len(), 1);
    assert_eq!(archiver.inner().files[0].1, "out/artifact");
}

#[test]
fn absent_sources_spec_is_a_noop() {
    let tree = temp_tree();
    let mut arena = ProjectArena::new();
    let id = arena.push(project("group", "artifact", "version", &tree.path));
    let mut archiver = proxy(&tree.path.join("workdir"));
    let ctx = PhaseContext {
        arena: &arena,
        root: id,
        execution: &execution(),
    };

    phase()
        .add_module_source_file_sets(None, &BTreeSet::from([id]), &ctx, &mut archiver)
        .expect("absent sources succeed");

    assert!(archiver.inner().file_sets.is_empty());
}

#[test]
fn source_file_sets_are_delegated_per_project() {
    let tree = temp_tree();
    let mut arena = ProjectArena::new();
    let id = arena.push(project("group", "artifact", "version", &tree.path));

    let sources = ModuleSources {
        file_sets: vec![FileSetConfig {
            directory: "src".to_owned(),
            directory_mode: Some("777".to_owned()),
            file_mode: Some("777".to_owned()),
            ..FileSetConfig::default()
        }],
        ..ModuleSources::default()
    };

    let mut archiver = proxy(&tree.path.join("workdir"));
    let ctx = PhaseContext {
        arena: &arena,
        root: id,
        execution: &execution(),
    };
    phase()
        .add_module_source_file_sets(Some(&sources), &BTreeSet::from([id]), &ctx, &mut archiver)
        .expect("source contribution succeeds");

    let delegated = &archiver.inner().file_sets;
    assert_eq!(delegated.len(), 1);
    assert_eq!(delegated[0].file_set.directory, tree.path.join("src"));
    assert_eq!(delegated[0].file_set.dir_mode, 0o777);
    assert_eq!(delegated[0].file_set.file_mode, 0o777);
}

#[test]
fn deprecated_flat_layout_becomes_a_synthetic_file_set() {
    let tree = temp_tree();
    let mut arena = ProjectArena::new();
    let id = arena.push(project("group", "artifact", "version", &tree.path));

    let sources = ModuleSources {
        output_directory: Some("flat".to_owned()),
        includes: vec!["**/included.txt".to_owned()],
        ..ModuleSources::default()
    };

    let mut archiver = proxy(&tree.path.join("workdir"));
    let ctx = PhaseContext {
        arena: &arena,
        root: id,
        execution: &execution(),
    };
    phase()
        .add_module_source_file_sets(Some(&sources), &BTreeSet::from([id]), &ctx, &mut archiver)
        .expect("deprecated layout still contributes");

    let delegated = &archiver.inner().file_sets;
    assert_eq!(delegated.len(), 1);
    assert_eq!(delegated[0].file_set.prefix, "flat/");
    assert_eq!(
        delegated[0].file_set.includes,
        vec!["**/included.txt".to_owned()]
    );
    assert_eq!(delegated[0].file_set.directory, tree.path);
}

#[test]
fn create_file_set_uses_module_dir_only_when_output_dir_is_unset() {
    let tree = temp_tree();
    let p = project("group", "artifact", "version", &tree.path);
    let sources = ModuleSources {
        include_module_directory: true,
        ..ModuleSources::default()
    };

    let file_set = create_file_set(&FileSetConfig::default(), &sources, &p, &[], &execution())
        .expect("file set builds");

    assert_eq!(file_set.prefix, "artifact/");
}

#[test]
fn create_file_set_prepends_module_dir_to_output_dir() {
    let tree = temp_tree();
    let p = project("group", "artifact", "version", &tree.path);
    let sources = ModuleSources {
        include_module_directory: true,
        ..ModuleSources::default()
    };
    let config = FileSetConfig {
        output_directory: Some("out".to_owned()),
        ..FileSetConfig::default()
    };

    let file_set =
        create_file_set(&config, &sources, &p, &[], &execution()).expect("file set builds");

    assert_eq!(file_set.prefix, "artifact/out/");
}

#[test]
fn create_file_set_excludes_sub_module_directories() {
    let tree = temp_tree();
    let p = project("group", "artifact", "version", &tree.path);
    let sources = ModuleSources {
        exclude_sub_module_directories: true,
        ..ModuleSources::default()
    };

    let file_set = create_file_set(
        &FileSetConfig::default(),
        &sources,
        &p,
        &["submodule".to_owned()],
        &execution(),
    )
    .expect("file set builds");

    assert_eq!(file_set.excludes, vec!["submodule/**".to_owned()]);
}
