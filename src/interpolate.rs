//! Output-path template interpolation.
//!
//! Destination directories and filename mappings in the descriptor may
//! reference `${token}` placeholders resolved from the contributing
//! module's coordinates, the configured final name, and caller-supplied
//! properties. An unresolvable token is a formatting error and aborts the
//! run.

use crate::error::{AssemblyError, Result};
use crate::project::{ArtifactRef, Project};
use std::collections::BTreeMap;

/// Default filename mapping applied when a binaries spec leaves
/// `output_file_name_mapping` unset.
pub const DEFAULT_OUTPUT_FILE_NAME_MAPPING: &str =
    "${module.artifact}-${module.version}${dash-classifier}.${module.extension}";

/// Host-supplied configuration for one assembly run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Final name of the build (`"dist-1.0"`), resolved by the host.
    pub final_name: String,
    /// Extra `${name}` properties available to templates.
    pub properties: BTreeMap<String, String>,
}

/// Token values for one template expansion.
#[derive(Debug, Clone, Default)]
pub struct InterpolationContext {
    tokens: BTreeMap<String, String>,
}

impl InterpolationContext {
    /// Context with only the execution-level tokens (`final-name` and
    /// user properties).
    #[must_use]
    pub fn from_execution(ctx: &ExecutionContext) -> Self {
        let mut tokens = ctx.properties.clone();
        tokens.insert("final-name".to_owned(), ctx.final_name.clone());
        Self { tokens }
    }

    /// Extend the context with `module.*` tokens for a contributing
    /// project and the artifact selected from it.
    #[must_use]
    pub fn with_module(mut self, project: &Project, artifact: &ArtifactRef) -> Self {
        let classifier = artifact.classifier.clone().unwrap_or_default();
        let dash_classifier = if classifier.is_empty() {
            String::new()
        } else {
            format!("-{classifier}")
        };
        self.tokens
            .insert("module.group".to_owned(), project.group.clone());
        self.tokens
            .insert("module.artifact".to_owned(), project.artifact.clone());
        self.tokens
            .insert("module.version".to_owned(), project.version.clone());
        self.tokens
            .insert("module.extension".to_owned(), artifact.extension.clone());
        self.tokens.insert("module.classifier".to_owned(), classifier);
        self.tokens
            .insert("dash-classifier".to_owned(), dash_classifier);
        self
    }

    /// Extend the context with `artifact.*` tokens for a resolved
    /// dependency artifact.
    #[must_use]
    pub fn with_artifact_tokens(
        mut self,
        group: &str,
        artifact: &str,
        version: &str,
        classifier: Option<&str>,
        extension: &str,
    ) -> Self {
        let classifier = classifier.unwrap_or_default().to_owned();
        let dash_classifier = if classifier.is_empty() {
            String::new()
        } else {
            format!("-{classifier}")
        };
        self.tokens.insert("module.group".to_owned(), group.to_owned());
        self.tokens
            .insert("module.artifact".to_owned(), artifact.to_owned());
        self.tokens
            .insert("module.version".to_owned(), version.to_owned());
        self.tokens
            .insert("module.extension".to_owned(), extension.to_owned());
        self.tokens.insert("module.classifier".to_owned(), classifier);
        self.tokens
            .insert("dash-classifier".to_owned(), dash_classifier);
        self
    }
}

/// Expand every `${token}` in `template` from the context.
///
/// # Errors
///
/// Returns [`AssemblyError::Interpolation`] for a token the context does
/// not supply, or for an unterminated `${`.
pub fn interpolate(template: &str, ctx: &InterpolationContext) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(AssemblyError::Interpolation {
                template: template.to_owned(),
                token: after.to_owned(),
            });
        };
        let token = &after[..end];
        let Some(value) = ctx.tokens.get(token) else {
            return Err(AssemblyError::Interpolation {
                template: template.to_owned(),
                token: token.to_owned(),
            });
        };
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Interpolate an output-directory template and normalise it to either an
/// empty string or a `/`-terminated path.
///
/// # Errors
///
/// Propagates interpolation failures from [`interpolate`].
pub fn output_directory(template: &str, ctx: &InterpolationContext) -> Result<String> {
    let expanded = interpolate(template, ctx)?;
    Ok(ensure_trailing_slash(&expanded))
}

/// Append a trailing `/` unless the path is empty or already terminated.
#[must_use]
pub fn ensure_trailing_slash(path: &str) -> String {
    if path.is_empty() || path.ends_with('/') {
        path.to_owned()
    } else {
        format!("{path}/")
    }
}
