use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use quill_llm::ToolDescriptor;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ToolError;
use crate::result::ToolResult;
use crate::schema::ParamSchema;
use crate::store::ToolContext;

/// A callable action the model can request
///
/// `Params` is the single source of the tool's argument shape: the
/// model-facing schema and the runtime validator are both derived from it.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    type Params: DeserializeOwned + JsonSchema + Send;

    /// Unique id, also the name the model calls the tool by
    const ID: &'static str;
    /// Display name
    const NAME: &'static str;
    /// Model-facing description
    const DESCRIPTION: &'static str;
    /// Whether callers must confirm with the user before executing
    const REQUIRES_APPROVAL: bool;

    /// Run against validated parameters
    ///
    /// Errors are reported to the model as a failed [`ToolResult`].
    async fn execute(&self, params: Self::Params, context: &ToolContext) -> anyhow::Result<ToolResult>;
}

#[async_trait]
trait ErasedTool: Send + Sync {
    async fn run(&self, params: Value, context: &ToolContext) -> anyhow::Result<ToolResult>;
}

#[async_trait]
impl<T: Tool> ErasedTool for T {
    async fn run(&self, params: Value, context: &ToolContext) -> anyhow::Result<ToolResult> {
        let params: T::Params = serde_json::from_value(params)?;
        self.execute(params, context).await
    }
}

/// Registered tool
pub struct ToolDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub requires_approval: bool,
    schema: ParamSchema,
    handler: Arc<dyn ErasedTool>,
}

impl ToolDefinition {
    /// JSON Schema of the arguments object
    pub const fn parameters(&self) -> &Value {
        self.schema.model()
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.id.to_owned(),
            description: self.description.to_owned(),
            parameters: self.parameters().clone(),
        }
    }
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("id", &self.id)
            .field("requires_approval", &self.requires_approval)
            .finish_non_exhaustive()
    }
}

/// Tool catalog and executor
///
/// Immutable once built. The executor validates and runs tools; it does not
/// enforce approval, callers gate on [`ToolRegistry::requires_approval`].
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: IndexMap<&'static str, ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the full built-in catalog
    pub fn with_builtin_tools() -> Result<Self, ToolError> {
        let mut registry = Self::new();
        crate::tools::register_builtin(&mut registry)?;

        tracing::debug!(tools = registry.len(), "tool registry initialized");

        Ok(registry)
    }

    /// Add a tool, generating its schemas
    pub fn register<T: Tool>(&mut self, tool: T) -> Result<&mut Self, ToolError> {
        if self.tools.contains_key(T::ID) {
            return Err(ToolError::DuplicateId { tool: T::ID });
        }

        let definition = ToolDefinition {
            id: T::ID,
            name: T::NAME,
            description: T::DESCRIPTION,
            requires_approval: T::REQUIRES_APPROVAL,
            schema: ParamSchema::for_type::<T::Params>(T::ID)?,
            handler: Arc::new(tool),
        };
        self.tools.insert(T::ID, definition);

        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&ToolDefinition> {
        self.tools.get(id)
    }

    /// Registered tools in registration order
    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    /// Descriptors to send with a completion request
    pub fn definitions_for_model(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(ToolDefinition::descriptor).collect()
    }

    /// Static approval flag; `None` for unknown ids
    pub fn requires_approval(&self, id: &str) -> Option<bool> {
        self.tools.get(id).map(|tool| tool.requires_approval)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate and run one tool call
    ///
    /// Never fails: unknown ids, invalid arguments and execution errors all
    /// come back as unsuccessful results. A `null` argument value is read as
    /// an empty object. Fields outside the schema are ignored.
    pub async fn execute(&self, id: &str, params: Value, context: &ToolContext) -> ToolResult {
        let Some(tool) = self.tools.get(id) else {
            tracing::warn!(tool = id, "unknown tool requested");
            return ToolResult::failure(format!("unknown tool: {id}"));
        };

        let params = if params.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            params
        };

        if let Err(reason) = tool.schema.validate(&params) {
            tracing::debug!(tool = id, %reason, "tool arguments rejected");
            return ToolResult::failure(format!("invalid arguments for {id}: {reason}"));
        }

        tracing::debug!(tool = id, "executing tool");

        match tool.handler.run(params, context).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = id, error = %e, "tool execution failed");
                ToolResult::failure(format!("{id} failed: {e:#}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::store::InMemoryStore;

    #[derive(Deserialize, JsonSchema)]
    struct EchoParams {
        text: String,
    }

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        type Params = EchoParams;

        const ID: &'static str = "echo";
        const NAME: &'static str = "Echo";
        const DESCRIPTION: &'static str = "Repeat the text";
        const REQUIRES_APPROVAL: bool = false;

        async fn execute(&self, params: EchoParams, _context: &ToolContext) -> anyhow::Result<ToolResult> {
            if params.text == "boom" {
                anyhow::bail!("exploded");
            }
            Ok(ToolResult::ok(params.text, json!({})))
        }
    }

    fn context() -> ToolContext {
        ToolContext::new(Arc::new(InMemoryStore::default()))
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo).unwrap();

        assert!(matches!(
            registry.register(Echo),
            Err(ToolError::DuplicateId { tool: "echo" })
        ));
    }

    #[tokio::test]
    async fn execute_reports_every_failure_as_result() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo).unwrap();
        let context = context();

        let unknown = registry.execute("shout", json!({}), &context).await;
        assert!(!unknown.success);
        assert!(unknown.message.contains("shout"));

        let invalid = registry.execute("echo", json!({"text": 3}), &context).await;
        assert!(!invalid.success);
        assert!(invalid.message.contains("text"), "{}", invalid.message);

        let failed = registry.execute("echo", json!({"text": "boom"}), &context).await;
        assert!(!failed.success);
        assert!(failed.message.contains("exploded"));

        let ok = registry.execute("echo", json!({"text": "hi", "extra": 1}), &context).await;
        assert!(ok.success);
        assert_eq!(ok.message, "hi");
    }

    #[test]
    fn descriptor_uses_id_as_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo).unwrap();

        let descriptors = registry.definitions_for_model();
        assert_eq!(descriptors[0].name, "echo");
        assert_eq!(descriptors[0].parameters["required"], json!(["text"]));
        assert_eq!(registry.requires_approval("echo"), Some(false));
        assert_eq!(registry.requires_approval("shout"), None);
    }
}
