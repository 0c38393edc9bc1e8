//! Build plan generation.
//!
//! A BuildPlan describes every step of the pipeline: generate the binding
//! sources, compile each unit and the wrapper into position-independent
//! objects, and link them into one shared module. Steps form a DAG keyed by
//! the files they produce and consume.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};
use petgraph::Direction;
use serde::Serialize;

use crate::builder::toolchain::{
    CommandSpec, CompileInput, GccToolchain, GenerateInput, LinkInput, Swig, Toolchain,
};
use crate::core::Workspace;
use crate::util::diagnostic::suggestions;
use crate::util::fs::clean_relative;

/// What a step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Run the binding generator
    Generate,
    /// Compile a source into an object file
    Compile,
    /// Link objects into the shared module
    Link,
}

impl StepKind {
    /// Status verb shown while the step runs.
    pub fn verb(&self) -> &'static str {
        match self {
            StepKind::Generate => "Generating",
            StepKind::Compile => "Compiling",
            StepKind::Link => "Linking",
        }
    }
}

/// Whether a produced file is a deliverable or a by-product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactClass {
    /// Shared module and binding stub; removed only by `clean`
    Final,
    /// Objects and generated sources; removed by `tidy` and `clean`
    Intermediate,
}

/// A file produced by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub class: ArtifactClass,
}

/// A single build step.
#[derive(Debug, Clone, Serialize)]
pub struct BuildStep {
    pub kind: StepKind,
    /// Files this step produces (first one names the step)
    pub outputs: Vec<Artifact>,
    /// Prerequisites
    pub inputs: Vec<PathBuf>,
    pub command: CommandSpec,
}

impl BuildStep {
    /// Display name: the primary output.
    pub fn label(&self) -> String {
        self.outputs
            .first()
            .map(|a| a.path.display().to_string())
            .unwrap_or_default()
    }

    /// Output paths only.
    pub fn output_paths(&self) -> impl Iterator<Item = &Path> {
        self.outputs.iter().map(|a| a.path.as_path())
    }
}

/// A complete build plan.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    /// All steps, in a valid execution order
    pub steps: Vec<BuildStep>,

    #[serde(skip)]
    graph: DiGraph<(), ()>,

    #[serde(skip)]
    producers: HashMap<PathBuf, usize>,
}

impl BuildPlan {
    /// Derive the four-stage pipeline from a workspace manifest.
    pub fn from_workspace(ws: &Workspace) -> Result<Self> {
        let manifest = ws.manifest();
        let out_dir = clean_relative(&manifest.module.out_dir);
        let out = |name: String| clean_relative(&out_dir.join(name));

        let swig = Swig::new(&manifest.tools.swig);
        let toolchain = GccToolchain::from_tools(&manifest.tools);

        let interface = clean_relative(&manifest.module.interface);
        let wrapper_source = out(manifest.wrapper_source_name());
        let stub = out(manifest.stub_name());

        let mut steps = Vec::with_capacity(manifest.units.len() + 3);

        steps.push(BuildStep {
            kind: StepKind::Generate,
            outputs: vec![
                Artifact {
                    path: wrapper_source.clone(),
                    class: ArtifactClass::Intermediate,
                },
                Artifact {
                    path: stub,
                    class: ArtifactClass::Final,
                },
            ],
            inputs: vec![interface.clone()],
            command: swig.generate_command(&GenerateInput {
                interface,
                wrapper_source: wrapper_source.clone(),
                out_dir: if out_dir.as_os_str().is_empty() {
                    PathBuf::from(".")
                } else {
                    out_dir.clone()
                },
                language: manifest.binding.language,
            }),
        });

        let headers: Vec<PathBuf> = manifest
            .units
            .iter()
            .filter_map(|u| u.header.as_deref().map(clean_relative))
            .collect();

        let mut objects = Vec::new();
        for unit in &manifest.units {
            let source = clean_relative(&unit.source);
            let object = out(unit.object_name());

            let mut inputs = vec![source.clone()];
            if let Some(ref header) = unit.header {
                inputs.push(clean_relative(header));
            }

            steps.push(BuildStep {
                kind: StepKind::Compile,
                outputs: vec![Artifact {
                    path: object.clone(),
                    class: ArtifactClass::Intermediate,
                }],
                inputs,
                command: toolchain.compile_command(&CompileInput {
                    source,
                    output: object.clone(),
                    include_dirs: Vec::new(),
                }),
            });
            objects.push(object);
        }

        // The wrapper includes every unit header.
        let wrapper_object = out(manifest.wrapper_object_name());
        let mut wrapper_inputs = vec![wrapper_source.clone()];
        wrapper_inputs.extend(headers);
        steps.push(BuildStep {
            kind: StepKind::Compile,
            outputs: vec![Artifact {
                path: wrapper_object.clone(),
                class: ArtifactClass::Intermediate,
            }],
            inputs: wrapper_inputs,
            command: toolchain.compile_command(&CompileInput {
                source: wrapper_source,
                output: wrapper_object.clone(),
                include_dirs: manifest.binding.include_dirs.clone(),
            }),
        });
        objects.push(wrapper_object);

        let shared = out(manifest.shared_module_name());
        steps.push(BuildStep {
            kind: StepKind::Link,
            outputs: vec![Artifact {
                path: shared.clone(),
                class: ArtifactClass::Final,
            }],
            inputs: objects.clone(),
            command: toolchain.link_command(&LinkInput {
                objects,
                output: shared,
            }),
        });

        Self::from_steps(steps)
    }

    /// Build the dependency graph over arbitrary steps and order them.
    ///
    /// Fails if two steps produce the same file or the steps form a cycle.
    pub fn from_steps(steps: Vec<BuildStep>) -> Result<Self> {
        let mut producers = HashMap::new();
        for (idx, step) in steps.iter().enumerate() {
            for path in step.output_paths() {
                if let Some(prev) = producers.insert(path.to_path_buf(), idx) {
                    bail!(
                        "`{}` is produced by both `{}` and `{}`",
                        path.display(),
                        steps[prev].label(),
                        step.label()
                    );
                }
            }
        }

        let mut graph = DiGraph::<(), ()>::with_capacity(steps.len(), steps.len() * 2);
        for _ in &steps {
            graph.add_node(());
        }
        for (idx, step) in steps.iter().enumerate() {
            let upstream: BTreeSet<usize> = step
                .inputs
                .iter()
                .filter_map(|input| producers.get(input).copied())
                .collect();
            for producer in upstream {
                graph.add_edge(NodeIndex::new(producer), NodeIndex::new(idx), ());
            }
        }

        let order = stable_toposort(&graph)?;

        // Re-number steps so that `steps` is already in execution order.
        let mut remap = vec![0usize; steps.len()];
        for (new_idx, &old_idx) in order.iter().enumerate() {
            remap[old_idx] = new_idx;
        }
        let mut slots: Vec<Option<BuildStep>> = steps.into_iter().map(Some).collect();
        let steps: Vec<BuildStep> = order
            .iter()
            .filter_map(|&old| slots[old].take())
            .collect();

        let mut reordered = DiGraph::<(), ()>::with_capacity(steps.len(), graph.edge_count());
        for _ in &steps {
            reordered.add_node(());
        }
        for edge in graph.raw_edges() {
            reordered.add_edge(
                NodeIndex::new(remap[edge.source().index()]),
                NodeIndex::new(remap[edge.target().index()]),
                (),
            );
        }
        let producers = producers
            .into_iter()
            .map(|(path, idx)| (path, remap[idx]))
            .collect();

        Ok(BuildPlan {
            steps,
            graph: reordered,
            producers,
        })
    }

    /// Index of the step producing `path`, if any.
    pub fn producer_of(&self, path: &Path) -> Option<usize> {
        self.producers.get(path).copied()
    }

    /// Indices of the steps directly feeding step `idx`.
    pub fn upstream(&self, idx: usize) -> Vec<usize> {
        let mut deps: Vec<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(idx), Direction::Incoming)
            .map(|n| n.index())
            .collect();
        deps.sort_unstable();
        deps.dedup();
        deps
    }

    /// Every produced file of the given class, in plan order.
    pub fn artifacts(&self, class: ArtifactClass) -> Vec<&Path> {
        self.steps
            .iter()
            .flat_map(|s| s.outputs.iter())
            .filter(|a| a.class == class)
            .map(|a| a.path.as_path())
            .collect()
    }

    /// The default goal (`all`): every final artifact.
    pub fn default_goals(&self) -> Vec<PathBuf> {
        self.artifacts(ArtifactClass::Final)
            .into_iter()
            .map(Path::to_path_buf)
            .collect()
    }

    /// Resolve a user-supplied target name to a produced file.
    ///
    /// Accepts the root-relative path, or the bare file name when it is
    /// unambiguous.
    pub fn resolve_target(&self, name: &str) -> Result<PathBuf> {
        let wanted = clean_relative(Path::new(name));
        if self.producers.contains_key(&wanted) {
            return Ok(wanted);
        }

        let by_name: Vec<&PathBuf> = self
            .producers
            .keys()
            .filter(|p| p.file_name().map(|f| f == wanted.as_os_str()).unwrap_or(false))
            .collect();
        if by_name.len() == 1 {
            return Ok(by_name[0].clone());
        }

        let mut available: Vec<String> = self
            .steps
            .iter()
            .flat_map(|s| s.output_paths())
            .map(|p| p.display().to_string())
            .collect();
        available.sort();
        bail!(
            "no rule to make target `{}`\navailable targets: {}\n{}",
            name,
            available.join(", "),
            suggestions::TARGET_NOT_FOUND
        );
    }

    /// Steps needed to produce `goals`, in execution order.
    pub fn steps_for(&self, goals: &[PathBuf]) -> Result<Vec<usize>> {
        let mut needed = BTreeSet::new();
        let reversed = Reversed(&self.graph);

        for goal in goals {
            let Some(idx) = self.producer_of(goal) else {
                bail!("no rule to make target `{}`", goal.display());
            };
            let mut dfs = Dfs::new(reversed, NodeIndex::new(idx));
            while let Some(node) = dfs.next(reversed) {
                needed.insert(node.index());
            }
        }

        // Step indices are already topologically ordered.
        Ok(needed.into_iter().collect())
    }

    /// Serialize the plan as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Kahn's algorithm, always picking the lowest-numbered ready step so the
/// order follows declaration order wherever dependencies allow.
fn stable_toposort(graph: &DiGraph<(), ()>) -> Result<Vec<usize>> {
    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
        .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(in_degree.len());
    while let Some(Reverse(idx)) = ready.pop() {
        order.push(idx);
        for next in graph.neighbors_directed(NodeIndex::new(idx), Direction::Outgoing) {
            let d = &mut in_degree[next.index()];
            *d -= 1;
            if *d == 0 {
                ready.push(Reverse(next.index()));
            }
        }
    }

    if order.len() != in_degree.len() {
        bail!("dependency cycle detected between build steps");
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::{default_manifest, Manifest};

    fn plan() -> BuildPlan {
        let manifest = Manifest::parse(&default_manifest("SerialInterface")).unwrap();
        let ws = Workspace::from_manifest("/project", manifest);
        BuildPlan::from_workspace(&ws).unwrap()
    }

    fn step(kind: StepKind, outputs: &[&str], inputs: &[&str]) -> BuildStep {
        BuildStep {
            kind,
            outputs: outputs
                .iter()
                .map(|o| Artifact {
                    path: PathBuf::from(o),
                    class: ArtifactClass::Intermediate,
                })
                .collect(),
            inputs: inputs.iter().map(PathBuf::from).collect(),
            command: CommandSpec::new("true"),
        }
    }

    #[test]
    fn test_pipeline_shape_and_order() {
        let plan = plan();
        let labels: Vec<String> = plan.steps.iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            vec![
                "SerialInterface_wrap.cxx",
                "SerialInterface.o",
                "SerialCommands.o",
                "SerialInterface_wrap.o",
                "_SerialInterface.so",
            ]
        );
        assert_eq!(plan.steps[0].kind, StepKind::Generate);
        assert_eq!(plan.steps[4].kind, StepKind::Link);
    }

    #[test]
    fn test_artifact_classes() {
        let plan = plan();
        assert_eq!(
            plan.artifacts(ArtifactClass::Final),
            vec![Path::new("SerialInterface.py"), Path::new("_SerialInterface.so")]
        );
        assert_eq!(
            plan.artifacts(ArtifactClass::Intermediate),
            vec![
                Path::new("SerialInterface_wrap.cxx"),
                Path::new("SerialInterface.o"),
                Path::new("SerialCommands.o"),
                Path::new("SerialInterface_wrap.o"),
            ]
        );
    }

    #[test]
    fn test_wrapper_depends_on_headers() {
        let plan = plan();
        let wrapper = &plan.steps[3];
        assert!(wrapper.inputs.contains(&PathBuf::from("SerialInterface.h")));
        assert!(wrapper.inputs.contains(&PathBuf::from("SerialCommands.h")));
        assert_eq!(plan.upstream(3), vec![0]);
        assert_eq!(plan.upstream(4), vec![1, 2, 3]);
    }

    #[test]
    fn test_steps_for_single_object() {
        let plan = plan();
        let goal = plan.resolve_target("SerialCommands.o").unwrap();
        assert_eq!(plan.steps_for(&[goal]).unwrap(), vec![2]);
    }

    #[test]
    fn test_steps_for_default_goal_is_everything() {
        let plan = plan();
        let all = plan.steps_for(&plan.default_goals()).unwrap();
        assert_eq!(all, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_unknown_target() {
        let err = plan().resolve_target("nope.o").unwrap_err();
        assert!(err.to_string().contains("no rule to make target `nope.o`"));
    }

    #[test]
    fn test_out_dir_prefixes_generated_files() {
        let text = default_manifest("SerialInterface")
            .replace("interface = \"SerialInterface.i\"\n", "interface = \"SerialInterface.i\"\nout-dir = \"build\"\n");
        let manifest = Manifest::parse(&text).unwrap();
        let plan = BuildPlan::from_workspace(&Workspace::from_manifest("/p", manifest)).unwrap();

        assert_eq!(plan.steps[4].label(), "build/_SerialInterface.so");
        assert!(plan.steps[0].command.args.contains(&"build".to_string()));
        // Sources stay where they are.
        assert_eq!(plan.steps[1].inputs[0], PathBuf::from("SerialInterface.cpp"));
        assert_eq!(
            plan.resolve_target("SerialInterface.o").unwrap(),
            PathBuf::from("build/SerialInterface.o")
        );
    }

    #[test]
    fn test_duplicate_outputs_rejected() {
        let err = BuildPlan::from_steps(vec![
            step(StepKind::Compile, &["a.o"], &["a.cpp"]),
            step(StepKind::Compile, &["a.o"], &["b.cpp"]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("produced by both"));
    }

    #[test]
    fn test_cycle_rejected() {
        let err = BuildPlan::from_steps(vec![
            step(StepKind::Compile, &["a"], &["b"]),
            step(StepKind::Compile, &["b"], &["a"]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_from_steps_reorders_topologically() {
        let plan = BuildPlan::from_steps(vec![
            step(StepKind::Link, &["out.so"], &["a.o"]),
            step(StepKind::Compile, &["a.o"], &["a.cpp"]),
        ])
        .unwrap();
        assert_eq!(plan.steps[0].label(), "a.o");
        assert_eq!(plan.producer_of(Path::new("out.so")), Some(1));
        assert_eq!(plan.upstream(1), vec![0]);
    }

    #[test]
    fn test_plan_json_has_commands() {
        let json = plan().to_json().unwrap();
        assert!(json.contains("\"kind\": \"generate\""));
        assert!(json.contains("\"class\": \"final\""));
        assert!(json.contains("-fPIC"));
    }
}
