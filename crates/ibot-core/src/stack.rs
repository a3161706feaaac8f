//! Stacks and cross-stack handles.

use crate::Synthesizer;
use crate::resource::{LogicalId, Resource, Value};

/// A value published by a stack for later stacks to import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// Logical id of the output inside the exporting stack.
    pub output_id: LogicalId,
    /// Account-wide export name, `{stack}:{output}`.
    pub name: String,
    pub value: Value,
}

/// Typed handle to another stack's export.
///
/// Returned by the stack that publishes the value; the only way a later
/// stack can refer to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportHandle {
    stack: String,
    export: String,
}

impl ImportHandle {
    pub fn stack(&self) -> &str {
        &self.stack
    }

    pub fn export_name(&self) -> &str {
        &self.export
    }

    pub fn value(&self) -> Value {
        Value::Import(self.export.clone())
    }
}

/// An independently deployable group of declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    id: String,
    description: Option<String>,
    synthesizer: Synthesizer,
    resources: Vec<Resource>,
    exports: Vec<Export>,
}

impl Stack {
    pub fn new(id: impl Into<String>, synthesizer: Synthesizer) -> Self {
        Self {
            id: id.into(),
            description: None,
            synthesizer,
            resources: Vec::new(),
            exports: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a declaration.
    pub fn declare(&mut self, resource: impl Into<Resource>) {
        self.resources.push(resource.into());
    }

    /// Publish `value` under `{stack}:{output}` and return the handle
    /// later stacks import it through.
    pub fn export(&mut self, output: &str, value: Value) -> ImportHandle {
        let name = format!("{}:{}", self.id, output);
        self.exports.push(Export {
            output_id: LogicalId::new(output),
            name: name.clone(),
            value,
        });
        ImportHandle {
            stack: self.id.clone(),
            export: name,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn synthesizer(&self) -> &Synthesizer {
        &self.synthesizer
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn exports(&self) -> &[Export] {
        &self.exports
    }

    pub fn resource(&self, logical_id: &LogicalId) -> Option<&Resource> {
        self.resources.iter().find(|r| r.logical_id() == logical_id)
    }

    /// Every export name imported by this stack's declarations.
    pub fn imports(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resources.iter().flat_map(|r| r.imports()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Params;

    #[test]
    fn test_export_returns_import_handle() {
        let synth = Synthesizer::from_params(&Params::new("q1", "bucket1", "repo1"));
        let mut stack = Stack::new("IbotDevNetworkStack", synth);
        let handle = stack.export("VpcId", Value::Ref(LogicalId::new("IbotDevVpc")));
        assert_eq!(handle.stack(), "IbotDevNetworkStack");
        assert_eq!(handle.export_name(), "IbotDevNetworkStack:VpcId");
        assert_eq!(handle.value(), Value::Import("IbotDevNetworkStack:VpcId".to_string()));
        assert_eq!(stack.exports().len(), 1);
    }
}
