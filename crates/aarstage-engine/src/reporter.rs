//! Classified sync issues and how they are surfaced per evaluation mode.

use std::collections::HashSet;
use std::fmt;

use aarstage_config::settings::EvaluationMode;
use serde::Serialize;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    UnresolvedDependency,
    DependencyIsApk,
    DependencyIsApklib,
    NonJarLocalDep,
    NonJarPackageDep,
    NonJarProvidedDep,
    JarDependOnAar,
    MismatchDep,
    DependencyMavenAndroid,
    DependencyInternalConflict,
}

impl IssueKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::UnresolvedDependency => "UNRESOLVED_DEPENDENCY",
            Self::DependencyIsApk => "DEPENDENCY_IS_APK",
            Self::DependencyIsApklib => "DEPENDENCY_IS_APKLIB",
            Self::NonJarLocalDep => "NON_JAR_LOCAL_DEP",
            Self::NonJarPackageDep => "NON_JAR_PACKAGE_DEP",
            Self::NonJarProvidedDep => "NON_JAR_PROVIDED_DEP",
            Self::JarDependOnAar => "JAR_DEPEND_ON_AAR",
            Self::MismatchDep => "MISMATCH_DEP",
            Self::DependencyMavenAndroid => "DEPENDENCY_MAVEN_ANDROID",
            Self::DependencyInternalConflict => "DEPENDENCY_INTERNAL_CONFLICT",
        }
    }

    /// Dependency issues can be deferred until the build actually needs the
    /// dependencies.
    pub fn is_dependency_issue(self) -> bool {
        !matches!(
            self,
            Self::DependencyMavenAndroid | Self::DependencyInternalConflict
        )
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A structured problem report, surfaced to tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    /// The offending coordinate or path.
    pub data: String,
    pub message: String,
}

/// Collects sync issues for one invocation.
#[derive(Debug)]
pub struct ErrorReporter {
    mode: EvaluationMode,
    issues: Vec<SyncIssue>,
    keys: HashSet<(IssueKind, String)>,
}

impl ErrorReporter {
    pub fn new(mode: EvaluationMode) -> Self {
        Self {
            mode,
            issues: Vec::new(),
            keys: HashSet::new(),
        }
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    /// Report an issue.
    ///
    /// Warnings are always logged and recorded. Errors are recorded or turned
    /// into an immediate failure depending on the evaluation mode.
    ///
    /// # Errors
    /// Returns `EngineError::SyncIssue` when the issue cannot be deferred: a
    /// non-dependency error in standard mode, or anything but an unresolved
    /// dependency in IDE mode.
    pub fn handle_issue(
        &mut self,
        data: &str,
        kind: IssueKind,
        severity: Severity,
        message: &str,
    ) -> Result<(), EngineError> {
        if severity == Severity::Warning {
            tracing::warn!(kind = %kind, "{message}");
            self.record(data, kind, severity, message);
            return Ok(());
        }

        match self.mode {
            EvaluationMode::Standard => {
                if !kind.is_dependency_issue() {
                    return Err(EngineError::SyncIssue {
                        message: message.to_owned(),
                    });
                }
                tracing::warn!(kind = %kind, "{message}");
            }
            EvaluationMode::Ide => {
                if kind != IssueKind::UnresolvedDependency {
                    return Err(EngineError::SyncIssue {
                        message: message.to_owned(),
                    });
                }
            }
            EvaluationMode::IdeAdvanced => {}
        }
        self.record(data, kind, severity, message);
        Ok(())
    }

    fn record(&mut self, data: &str, kind: IssueKind, severity: Severity, message: &str) {
        if !self.keys.insert((kind, data.to_owned())) {
            return;
        }
        self.issues.push(SyncIssue {
            kind,
            severity,
            data: data.to_owned(),
            message: message.to_owned(),
        });
    }

    pub fn issues(&self) -> &[SyncIssue] {
        &self.issues
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Fail if any recorded issue is an error.
    ///
    /// # Errors
    /// Returns `EngineError::SyncIssues` listing every recorded error.
    pub fn check(&self) -> Result<(), EngineError> {
        let errors: Vec<&SyncIssue> = self
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .collect();
        if errors.is_empty() {
            return Ok(());
        }
        let summary = errors
            .iter()
            .map(|i| format!("  {}: {}", i.kind, i.message))
            .collect::<Vec<_>>()
            .join("\n");
        Err(EngineError::SyncIssues {
            count: errors.len(),
            summary,
        })
    }
}
