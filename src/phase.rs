//! Module-set contribution planning and orchestration.
//!
//! One execution pass walks the descriptor's module sets in order: resolve
//! the contributing projects, then plan and apply binary contributions,
//! then source contributions. All writes go through the
//! [`ProxyArchiver`]; all fatal conditions abort before the archive is
//! finalised.

use crate::archiver::{Archiver, FileSet};
use crate::descriptor::{AssemblyDescriptor, FileSetConfig, ModuleBinaries, ModuleSources};
use crate::error::{AssemblyError, Result};
use crate::interpolate::{
    ExecutionContext, InterpolationContext, ensure_trailing_slash, interpolate, output_directory,
};
use crate::modes::{UNSET_MODE, parse_mode};
use crate::module_graph::module_projects;
use crate::project::{ArtifactRef, Project, ProjectArena, ProjectId};
use crate::proxy::ProxyArchiver;
use crate::resolver::{DependencyResolver, ProjectBuilder};
use log::{debug, warn};
use std::collections::BTreeSet;

/// Read-only inputs shared by every step of one assembly run.
pub struct PhaseContext<'a> {
    /// The reactor project set.
    pub arena: &'a ProjectArena,
    /// The project the assembly is anchored to; only its strict
    /// descendants can contribute.
    pub root: ProjectId,
    /// Host-supplied execution configuration.
    pub execution: &'a ExecutionContext,
}

/// Plans and applies module-set contributions to the target archive.
pub struct ModuleSetPhase<R, B> {
    dependency_resolver: R,
    project_builder: B,
}

impl<R: DependencyResolver, B: ProjectBuilder> ModuleSetPhase<R, B> {
    /// Phase backed by the given external collaborators.
    #[must_use]
    pub fn new(dependency_resolver: R, project_builder: B) -> Self {
        Self {
            dependency_resolver,
            project_builder,
        }
    }

    /// Run the whole descriptor against the archiver.
    ///
    /// A descriptor with zero module sets succeeds trivially; a module
    /// set with neither binaries nor sources contributes nothing.
    ///
    /// # Errors
    ///
    /// Any fatal planning or writer error aborts the run immediately.
    pub fn execute<A: Archiver>(
        &self,
        descriptor: &AssemblyDescriptor,
        ctx: &PhaseContext<'_>,
        archiver: &mut ProxyArchiver<A>,
    ) -> Result<()> {
        if descriptor.module_sets.is_empty() {
            debug!("descriptor declares no module sets; nothing to assemble");
            return Ok(());
        }

        for module_set in &descriptor.module_sets {
            let projects = module_projects(module_set, ctx.arena, ctx.root);
            self.add_module_binaries(module_set.binaries.as_ref(), &projects, ctx, archiver)?;
            self.add_module_source_file_sets(
                module_set.sources.as_ref(),
                &projects,
                ctx,
                archiver,
            )?;
        }
        Ok(())
    }

    /// Contribute each selected project's built artifact.
    ///
    /// # Errors
    ///
    /// Fails on a missing attachment classifier match, a missing backing
    /// file, interpolation failures, or resolver/writer errors.
    pub fn add_module_binaries<A: Archiver>(
        &self,
        binaries: Option<&ModuleBinaries>,
        projects: &BTreeSet<ProjectId>,
        ctx: &PhaseContext<'_>,
        archiver: &mut ProxyArchiver<A>,
    ) -> Result<()> {
        let Some(binaries) = binaries else {
            return Ok(());
        };

        for &id in projects {
            let project = ctx.arena.get(id);
            if project.is_aggregator() {
                debug!(
                    "skipping binaries for {}: {} packaging contributes no artifact",
                    project.coordinates(),
                    project.packaging
                );
                continue;
            }

            let artifact = select_artifact(project, binaries)?;
            self.add_module_artifact(artifact, project, binaries, ctx.execution, archiver)?;

            if binaries.include_dependencies {
                self.add_dependency_set(project, binaries, ctx.execution, archiver)?;
            }
        }
        Ok(())
    }

    /// Contribute a single module artifact at its mapped path.
    ///
    /// # Errors
    ///
    /// Fails when the artifact has no backing file, or on interpolation
    /// and writer errors.
    pub fn add_module_artifact<A: Archiver>(
        &self,
        artifact: &ArtifactRef,
        project: &Project,
        binaries: &ModuleBinaries,
        execution: &ExecutionContext,
        archiver: &mut ProxyArchiver<A>,
    ) -> Result<()> {
        let Some(file) = &artifact.file else {
            return Err(AssemblyError::ArtifactFileMissing {
                project: project.coordinates(),
            });
        };

        let ictx = InterpolationContext::from_execution(execution).with_module(project, artifact);
        let out_dir = output_directory(&binaries.output_directory, &ictx)?;
        let mode = contribution_mode(binaries.file_mode.as_deref(), archiver.override_file_mode());

        if binaries.unpack {
            debug!("unpacking {} into {out_dir:?}", project.coordinates());
            archiver.add_archived_file_set(file, &out_dir)
        } else {
            let file_name = interpolate(&binaries.output_file_name_mapping, &ictx)?;
            archiver.add_file(file, &format!("{out_dir}{file_name}"), mode)
        }
    }

    /// Contribute each selected project's declared source file sets.
    ///
    /// # Errors
    ///
    /// Fails on interpolation or writer errors.
    pub fn add_module_source_file_sets<A: Archiver>(
        &self,
        sources: Option<&ModuleSources>,
        projects: &BTreeSet<ProjectId>,
        ctx: &PhaseContext<'_>,
        archiver: &mut ProxyArchiver<A>,
    ) -> Result<()> {
        let Some(sources) = sources else {
            return Ok(());
        };

        let mut file_sets = Vec::new();
        if sources.has_deprecated_layout() {
            warn!(
                "module sources use the deprecated flat layout; convert output-directory, \
                 includes and excludes to nested file-sets"
            );
            file_sets.push(FileSetConfig {
                directory: String::new(),
                output_directory: sources.output_directory.clone(),
                includes: sources.includes.clone(),
                excludes: sources.excludes.clone(),
                directory_mode: sources.directory_mode.clone(),
                file_mode: sources.file_mode.clone(),
            });
        }
        file_sets.extend(sources.file_sets.iter().cloned());

        for &id in projects {
            let project = ctx.arena.get(id);
            let sub_modules: Vec<String> = ctx
                .arena
                .children_of(id)
                .into_iter()
                .map(|child| ctx.arena.get(child).artifact.clone())
                .collect();

            for config in &file_sets {
                let file_set =
                    create_file_set(config, sources, project, &sub_modules, ctx.execution)?;
                archiver.add_file_set(&file_set)?;
            }
        }
        Ok(())
    }

    /// Contribute a project's transitive dependency artifacts.
    ///
    /// The project is re-derived from its on-disk definition first so the
    /// resolved set reflects the manifest rather than the reactor node.
    fn add_dependency_set<A: Archiver>(
        &self,
        project: &Project,
        binaries: &ModuleBinaries,
        execution: &ExecutionContext,
        archiver: &mut ProxyArchiver<A>,
    ) -> Result<()> {
        let fresh = self.project_builder.build_project(&project.base_dir)?;
        let dependencies = self.dependency_resolver.resolve_dependency_sets(&fresh)?;
        debug!(
            "adding {} dependency artifact(s) for {}",
            dependencies.len(),
            project.coordinates()
        );

        let mode = contribution_mode(binaries.file_mode.as_deref(), archiver.override_file_mode());
        for dependency in dependencies {
            let Some(file) = &dependency.file else {
                return Err(AssemblyError::ArtifactFileMissing {
                    project: format!("{}:{}", dependency.group, dependency.artifact),
                });
            };
            let ictx = InterpolationContext::from_execution(execution).with_artifact_tokens(
                &dependency.group,
                &dependency.artifact,
                &dependency.version,
                dependency.classifier.as_deref(),
                &dependency.extension,
            );
            let out_dir = output_directory(&binaries.output_directory, &ictx)?;
            let file_name = interpolate(&binaries.output_file_name_mapping, &ictx)?;
            archiver.add_file(file, &format!("{out_dir}{file_name}"), mode)?;
        }
        Ok(())
    }
}

/// Pick the artifact a binaries spec selects from a project.
fn select_artifact<'p>(
    project: &'p Project,
    binaries: &ModuleBinaries,
) -> Result<&'p ArtifactRef> {
    match &binaries.attachment_classifier {
        Some(classifier) => {
            project
                .attached_artifact(classifier)
                .ok_or_else(|| AssemblyError::MissingAttachment {
                    project: project.coordinates(),
                    classifier: classifier.clone(),
                })
        }
        None => project
            .primary_artifact
            .as_ref()
            .ok_or_else(|| AssemblyError::ArtifactFileMissing {
                project: project.coordinates(),
            }),
    }
}

/// Resolve a configured mode string, falling back to the archiver's
/// default.
fn contribution_mode(configured: Option<&str>, archiver_default: i32) -> i32 {
    let mode = parse_mode(configured);
    if mode == UNSET_MODE { archiver_default } else { mode }
}

/// Build the effective file set for one source contribution.
///
/// The module directory, when requested, is always the outermost path
/// component; sub-module exclusion appends one `<artifact>/**` pattern
/// per declared child so nested module sources are not double-included.
///
/// # Errors
///
/// Fails when the file set's output directory template cannot be
/// interpolated.
pub fn create_file_set(
    config: &FileSetConfig,
    sources: &ModuleSources,
    project: &Project,
    sub_modules: &[String],
    execution: &ExecutionContext,
) -> Result<FileSet> {
    let artifact = project
        .primary_artifact
        .clone()
        .unwrap_or_else(|| ArtifactRef {
            classifier: None,
            extension: project.packaging.clone(),
            file: None,
        });
    let ictx = InterpolationContext::from_execution(execution).with_module(project, &artifact);

    let configured = match &config.output_directory {
        Some(template) => output_directory(template, &ictx)?,
        None => String::new(),
    };
    let prefix = if sources.include_module_directory {
        format!("{}{configured}", ensure_trailing_slash(&project.artifact))
    } else {
        configured
    };

    let mut excludes = config.excludes.clone();
    if sources.exclude_sub_module_directories {
        excludes.extend(sub_modules.iter().map(|artifact| format!("{artifact}/**")));
    }

    let directory = if config.directory.is_empty() {
        project.base_dir.clone()
    } else {
        project.base_dir.join(&config.directory)
    };

    Ok(FileSet {
        directory,
        prefix,
        includes: config.includes.clone(),
        excludes,
        dir_mode: parse_mode(
            config
                .directory_mode
                .as_deref()
                .or(sources.directory_mode.as_deref()),
        ),
        file_mode: parse_mode(config.file_mode.as_deref().or(sources.file_mode.as_deref())),
    })
}

#[cfg(test)]
#[path = "phase_tests.rs"]
mod tests;
