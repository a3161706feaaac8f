//! The write-once stack graph.

use std::collections::{BTreeSet, HashMap};

use crate::resource::{LogicalId, Resource};
use crate::{Context, Error, Result, Stack};

/// A stack together with the stacks it imports from.
#[derive(Debug, Clone)]
pub struct StackNode {
    pub stack: Stack,
    pub dependencies: BTreeSet<String>,
}

/// Ordered set of stacks with resolved cross-stack references.
///
/// Stacks can only be appended, and only once every reference they make
/// resolves: local references to declarations in the same stack, imports
/// to exports of stacks already in the graph. A stack is never handed
/// back mutably once added.
#[derive(Debug, Clone)]
pub struct StackGraph {
    ctx: Context,
    nodes: Vec<StackNode>,
    /// Export name -> exporting stack id.
    exports: HashMap<String, String>,
    /// Physical name -> `{stack}/{logical id}` claiming it.
    names: HashMap<String, String>,
}

impl StackGraph {
    pub fn new(ctx: &Context) -> Self {
        Self {
            ctx: ctx.clone(),
            nodes: Vec::new(),
            exports: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Validate `stack` against the graph so far and append it.
    ///
    /// On error the graph is left unchanged.
    pub fn add(&mut self, stack: Stack) -> Result<()> {
        if self.nodes.iter().any(|n| n.stack.id() == stack.id()) {
            return Err(Error::DuplicateStack(stack.id().to_string()));
        }

        let mut local_ids: HashMap<LogicalId, &Resource> = HashMap::new();
        for resource in stack.resources() {
            for id in resource.occupied_ids() {
                if let Some(first) = local_ids.insert(id.clone(), resource) {
                    return Err(Error::NamingCollision {
                        name: id.to_string(),
                        first: format!("{}/{}", stack.id(), first.kind()),
                        second: format!("{}/{}", stack.id(), resource.kind()),
                    });
                }
            }
        }
        for export in stack.exports() {
            if self.exports.contains_key(&export.name) {
                return Err(Error::NamingCollision {
                    name: export.name.clone(),
                    first: self.exports[&export.name].clone(),
                    second: stack.id().to_string(),
                });
            }
        }

        let export_values = stack.exports().iter().map(|e| &e.value);
        for logical_id in stack
            .resources()
            .iter()
            .flat_map(|r| r.local_refs())
            .chain(export_values.flat_map(|v| v.local_refs()))
        {
            if !local_ids.contains_key(logical_id) {
                return Err(Error::UnknownLogicalId {
                    stack: stack.id().to_string(),
                    logical_id: logical_id.to_string(),
                });
            }
        }

        let mut dependencies = BTreeSet::new();
        for import in stack.imports() {
            match self.exports.get(import) {
                Some(owner) => {
                    dependencies.insert(owner.clone());
                }
                None => {
                    return Err(Error::UnresolvedReference {
                        stack: stack.id().to_string(),
                        export: import.to_string(),
                    });
                }
            }
        }

        let mut claimed: Vec<(String, String)> = Vec::new();
        for resource in stack.resources() {
            let Some(name) = resource.physical_name() else {
                continue;
            };
            let owner = format!("{}/{}", stack.id(), resource.logical_id());
            let existing = self
                .names
                .get(name)
                .or_else(|| claimed.iter().find(|(n, _)| n == name).map(|(_, o)| o));
            if let Some(first) = existing {
                return Err(Error::NamingCollision {
                    name: name.to_string(),
                    first: first.clone(),
                    second: owner,
                });
            }
            claimed.push((name.to_string(), owner));
        }

        self.names.extend(claimed);
        for export in stack.exports() {
            self.exports
                .insert(export.name.clone(), stack.id().to_string());
        }
        self.nodes.push(StackNode {
            stack,
            dependencies,
        });
        Ok(())
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn nodes(&self) -> &[StackNode] {
        &self.nodes
    }

    /// Stacks in the order they were added.
    pub fn stacks(&self) -> impl Iterator<Item = &Stack> {
        self.nodes.iter().map(|n| &n.stack)
    }

    pub fn stack(&self, id: &str) -> Option<&Stack> {
        self.stacks().find(|s| s.id() == id)
    }

    pub fn dependencies(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.nodes
            .iter()
            .find(|n| n.stack.id() == id)
            .map(|n| &n.dependencies)
    }

    /// Every declaration with the id of the stack holding it.
    pub fn resources(&self) -> impl Iterator<Item = (&Stack, &Resource)> {
        self.stacks()
            .flat_map(|s| s.resources().iter().map(move |r| (s, r)))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
