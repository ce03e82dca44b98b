//! Module graph resolution.
//!
//! Selects the reactor projects a module set contributes from: the strict
//! descendants of the root project, narrowed by the set's include and
//! exclude patterns. Exclusion is transitive: an excluded project takes
//! its entire subtree with it, even when a descendant would otherwise
//! match an include rule.

use crate::descriptor::ModuleSet;
use crate::project::{ProjectArena, ProjectId};
use log::debug;
use std::collections::BTreeSet;

/// Resolve the projects a module set selects from the reactor.
///
/// Candidates are every project whose parent chain reaches `root` (the
/// root itself never qualifies); with `include_sub_modules` unset, only
/// the root's direct children do. Patterns match coordinates by exact
/// `group:artifact` comparison; a pattern without both parts never
/// matches anything.
#[must_use]
pub fn module_projects(
    module_set: &ModuleSet,
    arena: &ProjectArena,
    root: ProjectId,
) -> BTreeSet<ProjectId> {
    let mut selected: BTreeSet<ProjectId> = arena
        .iter()
        .filter(|&(id, project)| {
            if id == root {
                return false;
            }
            if module_set.include_sub_modules {
                arena.reaches(id, root)
            } else {
                project.parent == Some(root)
            }
        })
        .map(|(id, _)| id)
        .collect();

    if !module_set.excludes.is_empty() {
        let excluded = matching_projects(arena, &selected, &module_set.excludes);
        selected.retain(|&id| !in_or_under(arena, id, &excluded));
    }

    if !module_set.includes.is_empty() {
        let included = matching_projects(arena, &selected, &module_set.includes);
        selected.retain(|&id| in_or_under(arena, id, &included));
    }

    debug!(
        "module set selected {} of {} reactor project(s)",
        selected.len(),
        arena.len()
    );
    selected
}

/// Projects from `candidates` whose coordinates match any pattern.
fn matching_projects(
    arena: &ProjectArena,
    candidates: &BTreeSet<ProjectId>,
    patterns: &[String],
) -> BTreeSet<ProjectId> {
    candidates
        .iter()
        .copied()
        .filter(|&id| {
            let coordinates = arena.get(id).coordinates();
            patterns
                .iter()
                .any(|pattern| pattern_matches(pattern, &coordinates))
        })
        .collect()
}

/// Whether `id` is in `set` or has an ancestor in `set`.
fn in_or_under(arena: &ProjectArena, id: ProjectId, set: &BTreeSet<ProjectId>) -> bool {
    set.contains(&id) || arena.ancestors(id).any(|ancestor| set.contains(&ancestor))
}

/// Exact `group:artifact` comparison; malformed patterns never match.
fn pattern_matches(pattern: &str, coordinates: &str) -> bool {
    pattern.contains(':') && pattern == coordinates
}
