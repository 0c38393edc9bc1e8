//! Sequential build executor with progress reporting.
//!
//! Steps run one at a time in plan order. A step runs when it is stale or
//! when a step feeding it ran earlier in the same invocation; the first
//! missing input or failing tool stops the build.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::builder::errors::PipelineError;
use crate::builder::events::{report, BuildEvent, MessageFormat};
use crate::builder::freshness::{self, Freshness, StaleReason};
use crate::builder::plan::{BuildPlan, BuildStep};
use crate::core::Workspace;
use crate::util::fs::{ensure_dir, remove_file_if_exists};
use crate::util::process::{resolve_tool, ProcessBuilder};

/// What an invocation did.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Primary outputs of steps that ran (or would run, in a dry run)
    pub ran: Vec<PathBuf>,
    /// Primary outputs of steps that were up to date
    pub fresh: Vec<PathBuf>,
    /// Wall time of the whole invocation
    pub elapsed: Duration,
    pub dry_run: bool,
}

impl BuildReport {
    /// True when nothing had to be regenerated.
    pub fn is_noop(&self) -> bool {
        self.ran.is_empty()
    }
}

/// Build executor with progress tracking.
pub struct BuildExecutor<'a> {
    ws: &'a Workspace,
    plan: &'a BuildPlan,
    format: MessageFormat,
    verbose: bool,
    dry_run: bool,
}

impl<'a> BuildExecutor<'a> {
    /// Create a new build executor.
    pub fn new(ws: &'a Workspace, plan: &'a BuildPlan) -> Self {
        BuildExecutor {
            ws,
            plan,
            format: MessageFormat::Human,
            verbose: false,
            dry_run: false,
        }
    }

    /// Enable verbose output (no progress bar, commands echoed).
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Print commands instead of running them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Select human or JSON reporting.
    pub fn message_format(mut self, format: MessageFormat) -> Self {
        self.format = format;
        self
    }

    /// Bring `goals` up to date.
    pub fn execute(&self, goals: &[PathBuf]) -> Result<BuildReport> {
        let start = Instant::now();
        let selected = self.plan.steps_for(goals)?;

        report(
            self.format,
            &BuildEvent::BuildStarted {
                goals: goals.to_vec(),
                steps: selected.len() as u64,
                dry_run: self.dry_run,
            },
            None,
        );

        let pb = if self.format == MessageFormat::Human && !self.verbose && selected.len() > 1 {
            let pb = ProgressBar::new(selected.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut build_report = BuildReport {
            dry_run: self.dry_run,
            ..BuildReport::default()
        };
        let result = self.run_steps(&selected, pb.as_ref(), &mut build_report);

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        build_report.elapsed = start.elapsed();
        let duration_ms = build_report.elapsed.as_millis() as u64;

        match result {
            Ok(()) => {
                report(
                    self.format,
                    &BuildEvent::finished(true, duration_ms, build_report.ran.len() as u64),
                    None,
                );
                if self.format == MessageFormat::Human && !self.dry_run {
                    if build_report.is_noop() {
                        eprintln!("{:>12} nothing to do, all targets up to date", "Fresh");
                    } else {
                        eprintln!(
                            "{:>12} {} step(s) in {:.2}s",
                            "Finished",
                            build_report.ran.len(),
                            build_report.elapsed.as_secs_f64()
                        );
                    }
                }
                Ok(build_report)
            }
            Err(e) => {
                let exit_code = e
                    .chain()
                    .find_map(|c| c.downcast_ref::<PipelineError>())
                    .map(|p| p.exit_code());
                report(
                    self.format,
                    &BuildEvent::BuildFinished {
                        success: false,
                        duration_ms,
                        steps_run: build_report.ran.len() as u64,
                        exit_code,
                    },
                    None,
                );
                Err(e)
            }
        }
    }

    fn run_steps(
        &self,
        selected: &[usize],
        pb: Option<&ProgressBar>,
        build_report: &mut BuildReport,
    ) -> Result<()> {
        let root = self.ws.root();
        let mut scheduled: HashSet<usize> = HashSet::new();

        for &idx in selected {
            let step = &self.plan.steps[idx];
            let label = step.label();
            if let Some(pb) = pb {
                pb.set_message(label.clone());
            }

            self.check_inputs(step, &scheduled)?;

            let upstream_ran = self
                .plan
                .upstream(idx)
                .into_iter()
                .find(|u| scheduled.contains(u));
            let freshness = match upstream_ran {
                Some(u) => Freshness::Stale(StaleReason::UpstreamRebuilt(PathBuf::from(
                    self.plan.steps[u].label(),
                ))),
                None => freshness::check(root, step)?,
            };

            match freshness {
                Freshness::Fresh => {
                    tracing::debug!("fresh: {}", label);
                    report(
                        self.format,
                        &BuildEvent::StepFresh {
                            kind: step.kind,
                            outputs: step.output_paths().map(Path::to_path_buf).collect(),
                        },
                        None,
                    );
                    build_report.fresh.push(PathBuf::from(label));
                }
                Freshness::Stale(reason) => {
                    tracing::debug!("stale: {} ({})", label, reason);
                    self.run_step(step, &reason, pb)?;
                    scheduled.insert(idx);
                    build_report.ran.push(PathBuf::from(label));
                }
            }

            if let Some(pb) = pb {
                pb.inc(1);
            }
        }

        Ok(())
    }

    /// Every input must exist, unless (in a dry run) a step that would run
    /// earlier produces it.
    fn check_inputs(&self, step: &BuildStep, scheduled: &HashSet<usize>) -> Result<(), PipelineError> {
        for input in &step.inputs {
            if self.ws.path(input).exists() {
                continue;
            }
            let pending = self
                .plan
                .producer_of(input)
                .map(|p| self.dry_run && scheduled.contains(&p))
                .unwrap_or(false);
            if !pending {
                return Err(PipelineError::MissingInput {
                    path: input.clone(),
                    target: step.label(),
                });
            }
        }
        Ok(())
    }

    fn run_step(&self, step: &BuildStep, reason: &StaleReason, pb: Option<&ProgressBar>) -> Result<()> {
        let command_line = step.command.display();
        self.status(pb, step.kind.verb(), &step.label());
        if self.dry_run {
            self.echo(pb, &command_line);
        }

        if self.dry_run {
            report(
                self.format,
                &BuildEvent::StepFinished {
                    kind: step.kind,
                    outputs: step.output_paths().map(Path::to_path_buf).collect(),
                    command: command_line,
                    cause: reason.to_string(),
                    duration_ms: None,
                },
                None,
            );
            return Ok(());
        }

        for output in step.output_paths() {
            if let Some(parent) = self.ws.path(output).parent() {
                ensure_dir(parent)?;
            }
        }

        let program = resolve_tool(self.ws.root(), &step.command.program);
        if self.verbose {
            self.echo(pb, &command_line);
        }
        let started = Instant::now();

        let outcome = ProcessBuilder::new(&program)
            .args(&step.command.args)
            .cwd(self.ws.root())
            .exec_and_check();

        match outcome {
            Ok(output) => {
                // stdout is reserved for JSON events.
                for text in [&output.stdout, &output.stderr] {
                    if !text.trim().is_empty() {
                        self.echo(pb, text.trim_end());
                    }
                }
                report(
                    self.format,
                    &BuildEvent::StepFinished {
                        kind: step.kind,
                        outputs: step.output_paths().map(Path::to_path_buf).collect(),
                        command: command_line,
                        cause: reason.to_string(),
                        duration_ms: Some(started.elapsed().as_millis() as u64),
                    },
                    None,
                );
                Ok(())
            }
            Err(e) => {
                // Partial outputs of a failed step are never treated as valid.
                for output in step.output_paths() {
                    if let Err(rm) = remove_file_if_exists(&self.ws.path(output)) {
                        tracing::warn!("{:#}", rm);
                    }
                }
                Err(e.into())
            }
        }
    }

    fn status(&self, pb: Option<&ProgressBar>, verb: &str, message: &str) {
        if self.format != MessageFormat::Human {
            return;
        }
        match pb {
            Some(pb) => pb.suspend(|| eprintln!("{:>12} {}", verb, message)),
            None => eprintln!("{:>12} {}", verb, message),
        }
    }

    fn echo(&self, pb: Option<&ProgressBar>, text: &str) {
        match pb {
            Some(pb) => pb.suspend(|| eprintln!("{}", text)),
            None => eprintln!("{}", text),
        }
    }
}
