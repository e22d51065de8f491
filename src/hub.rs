pub mod public;

use std::future::Future;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

bitflags! {
    /// Groups of ImplementationRevision fields the Hub should populate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ImplementationRevisionFields: u8 {
        const ROOT = 1;
        const METADATA = 1 << 1;
        const SPEC = 1 << 2;
        const INTERFACES = 1 << 3;
        const SIGNATURE = 1 << 4;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationRevision {
    pub revision: SmolStr,
    #[serde(default)]
    pub metadata: ImplementationMetadata,
    // Only present when the corresponding fields were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Vec<InterfaceRevisionRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

impl ImplementationRevision {
    pub fn path(&self) -> &str {
        &self.metadata.path
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationMetadata {
    pub path: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub maintainers: Vec<Maintainer>,
    #[serde(
        rename = "documentationURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub documentation_url: Option<String>,
    #[serde(rename = "supportURL", default, skip_serializing_if = "Option::is_none")]
    pub support_url: Option<String>,
    #[serde(rename = "iconURL", default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    /// The Hub may return `null` entries, they are kept so that structured output stays faithful.
    #[serde(default)]
    pub attributes: Vec<Option<AttributeRevision>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maintainer {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRevision {
    #[serde(default)]
    pub metadata: Option<AttributeMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<SmolStr>,
}

impl AttributeRevision {
    /// Path of the referenced attribute, `None` when the metadata is unset or the path is empty.
    pub fn path(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.path.as_deref())
            .filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMetadata {
    #[serde(default)]
    pub path: Option<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(default)]
    pub name: Option<String>,
}

/// Interface revision implemented by an Implementation, only its identity is fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceRevisionRef {
    pub metadata: InterfaceMetadata,
    pub revision: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceMetadata {
    pub path: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub hub: String,
}

pub trait HubClient: Send + Sync {
    /// Returns every ImplementationRevision known to the Hub, or an error. Never a partial result.
    fn list_implementation_revisions(
        &self,
        fields: ImplementationRevisionFields,
    ) -> impl Future<Output = anyhow::Result<Vec<ImplementationRevision>>> + Send;
}
