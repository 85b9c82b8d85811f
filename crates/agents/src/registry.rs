//! Named capability registry backing each agent.
//!
//! Capabilities are resolved at registration time into a closed set per
//! agent role; an unknown-name lookup is a typed failure, and duplicate
//! registration is rejected to avoid silent capability shadowing.

use async_trait::async_trait;
use futures::future::BoxFuture;
use lantern_common::{LanternError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// A named external operation an agent can invoke through its registry.
///
/// A capability may suspend and may fail independently per call. The core
/// assumes no idempotence and never retries a capability automatically.
#[async_trait]
pub trait Capability: Send + Sync {
    fn name(&self) -> &str;
    async fn invoke(&self, args: Value) -> Result<Value>;
}

type BackingFn = Box<dyn Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Adapter exposing a plain function as a [`Capability`].
///
/// Both directly-computing closures and suspend-and-resume futures are
/// supported behind the same interface.
pub struct FnCapability {
    name: String,
    func: BackingFn,
}

impl FnCapability {
    /// Wrap a synchronous function.
    pub fn from_sync<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(move |args| {
                let output = func(args);
                Box::pin(async move { output })
            }),
        }
    }

    /// Wrap an asynchronous function.
    pub fn from_async<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(move |args| Box::pin(func(args))),
        }
    }
}

#[async_trait]
impl Capability for FnCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, args: Value) -> Result<Value> {
        (self.func)(args).await
    }
}

/// Per-agent mapping from capability name to implementation.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Capability>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability under its own name.
    ///
    /// Fails with [`LanternError::DuplicateCapability`] if the name is
    /// already taken; last-write-wins is deliberately disallowed.
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<()> {
        let name = capability.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(LanternError::DuplicateCapability(name));
        }
        self.tools.insert(name, capability);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Invoke a registered capability, awaiting its backing function and
    /// propagating its failure unchanged.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<Value> {
        let capability = self
            .tools
            .get(name)
            .ok_or_else(|| LanternError::UnknownCapability(name.to_string()))?;
        capability.invoke(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn sync_and_async_capabilities_invoke_uniformly() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(FnCapability::from_sync("double", |args| {
                let n = args["n"].as_i64().unwrap_or(0);
                Ok(json!(n * 2))
            })))
            .unwrap();
        registry
            .register(Arc::new(FnCapability::from_async("echo", |args| async move {
                Ok(args)
            })))
            .unwrap();

        assert_eq!(
            registry.invoke("double", json!({"n": 21})).await.unwrap(),
            json!(42)
        );
        assert_eq!(
            registry.invoke("echo", json!({"x": 1})).await.unwrap(),
            json!({"x": 1})
        );
    }

    #[tokio::test]
    async fn unknown_capability_is_typed_failure() {
        let registry = ToolRegistry::new();
        let err = registry.invoke("missing", json!({})).await.unwrap_err();
        assert!(matches!(err, LanternError::UnknownCapability(name) if name == "missing"));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(FnCapability::from_sync("web_search", |_| {
                Ok(json!([]))
            })))
            .unwrap();

        let err = registry
            .register(Arc::new(FnCapability::from_sync("web_search", |_| {
                Ok(json!(null))
            })))
            .unwrap_err();
        assert!(matches!(err, LanternError::DuplicateCapability(name) if name == "web_search"));

        // The original registration is still in place.
        assert!(registry.contains("web_search"));
    }

    #[tokio::test]
    async fn capability_failure_propagates_unchanged() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(FnCapability::from_sync("flaky", |_| {
                Err(LanternError::Capability("backend down".into()))
            })))
            .unwrap();

        let err = registry.invoke("flaky", json!({})).await.unwrap_err();
        assert!(matches!(err, LanternError::Capability(msg) if msg == "backend down"));
    }
}
