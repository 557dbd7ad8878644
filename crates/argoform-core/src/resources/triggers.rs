//! Tekton Triggers custom resources
//!
//! Only the subset of `triggers.tekton.dev/v1alpha1` needed to describe
//! webhook-driven EventListeners.

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Maps webhook payload fields to trigger parameters
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "triggers.tekton.dev",
    version = "v1alpha1",
    kind = "TriggerBinding",
    namespaced,
    schema = "disabled",
    derive = "PartialEq"
)]
pub struct TriggerBindingSpec {
    #[serde(default)]
    pub params: Vec<Param>,
}

/// A named parameter with a payload expression
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Receives webhook events and dispatches them to triggers
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "triggers.tekton.dev",
    version = "v1alpha1",
    kind = "EventListener",
    namespaced,
    schema = "disabled",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct EventListenerSpec {
    pub service_account_name: String,
    #[serde(default)]
    pub triggers: Vec<EventListenerTrigger>,
}

/// One trigger: interceptors gate the event, bindings extract parameters and
/// the template instantiates the pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventListenerTrigger {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interceptors: Vec<TriggerInterceptor>,
    #[serde(default)]
    pub bindings: Vec<EventListenerBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<EventListenerTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventListenerBinding {
    #[serde(rename = "ref")]
    pub reference: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventListenerTemplate {
    #[serde(rename = "ref")]
    pub reference: String,
}

/// Reference to a ClusterInterceptor with its parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerInterceptor {
    #[serde(rename = "ref")]
    pub reference: InterceptorRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<InterceptorParam>,
}

impl TriggerInterceptor {
    pub fn new(name: impl Into<String>, params: Vec<InterceptorParam>) -> Self {
        Self {
            reference: InterceptorRef { name: name.into() },
            params,
        }
    }

    /// Name of the referenced interceptor
    pub fn name(&self) -> &str {
        &self.reference.name
    }

    /// Value of a parameter by name
    pub fn param(&self, name: &str) -> Option<&serde_json::Value> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptorRef {
    pub name: String,
}

/// Interceptor parameter holding an arbitrary JSON value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterceptorParam {
    pub name: String,
    pub value: serde_json::Value,
}

impl InterceptorParam {
    pub fn new(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
