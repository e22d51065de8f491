use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::{HubClient, ImplementationRevision, ImplementationRevisionFields};
use crate::HttpClient;

const GRAPHQL_PATH: &str = "graphql";

const ROOT_FIELDS: &str = "      revision\n";
const METADATA_FIELDS: &str = "      metadata {
        path
        prefix
        name
        displayName
        description
        maintainers {
          name
          email
          url
        }
        documentationURL
        supportURL
        iconURL
        license {
          name
        }
        attributes {
          revision
          metadata {
            path
          }
        }
      }
";
const SPEC_FIELDS: &str = "      spec {
        appVersion
        implements {
          path
          revision
        }
        requires {
          prefix
          oneOf {
            alias
            typeRef {
              path
              revision
            }
            valueRef
          }
          anyOf {
            alias
            typeRef {
              path
              revision
            }
            valueRef
          }
          allOf {
            alias
            typeRef {
              path
              revision
            }
            valueRef
          }
        }
        imports {
          interfaceGroupPath
          alias
          appVersion
          methods {
            name
            revision
          }
        }
        additionalInput {
          typeInstances {
            name
            typeRef {
              path
              revision
            }
            verbs
          }
          parameters {
            name
            typeRef {
              path
              revision
            }
          }
        }
        additionalOutput {
          typeInstances {
            name
            typeRef {
              path
              revision
            }
          }
        }
        outputTypeInstanceRelations {
          typeInstanceName
          uses
        }
        action {
          runnerInterface
          args
        }
      }
";
const INTERFACES_FIELDS: &str = "      interfaces {
        metadata {
          path
        }
        revision
      }
";
const SIGNATURE_FIELDS: &str = "      signature {
        hub
      }
";

/// Client for the public GraphQL API of a Hub server.
pub struct PublicHubClient {
    client: Arc<HttpClient>,
}

impl PublicHubClient {
    pub fn new(client: Arc<HttpClient>) -> Self {
        PublicHubClient { client }
    }
}

impl HubClient for PublicHubClient {
    async fn list_implementation_revisions(
        &self,
        fields: ImplementationRevisionFields,
    ) -> anyhow::Result<Vec<ImplementationRevision>> {
        let query = list_implementation_revisions_query(fields);
        log::debug!("Querying Hub {} with fields {:?}", self.client.server(), fields);

        let response: GraphQlResponse<ListImplementationsDto> = self
            .client
            .post(GRAPHQL_PATH)
            .json(&GraphQlRequest { query: &query })
            .send()
            .await
            .context("Failed to send request to the Hub")?
            .error_for_status()?
            .json()
            .await
            .context("Failed to decode the Hub response")?;

        flatten_revisions(response)
    }
}

pub fn list_implementation_revisions_query(fields: ImplementationRevisionFields) -> String {
    let fields = if fields.is_empty() {
        ImplementationRevisionFields::ROOT
    } else {
        fields
    };

    let mut selection = String::new();
    for (flag, part) in [
        (ImplementationRevisionFields::ROOT, ROOT_FIELDS),
        (ImplementationRevisionFields::METADATA, METADATA_FIELDS),
        (ImplementationRevisionFields::SPEC, SPEC_FIELDS),
        (ImplementationRevisionFields::INTERFACES, INTERFACES_FIELDS),
        (ImplementationRevisionFields::SIGNATURE, SIGNATURE_FIELDS),
    ] {
        if fields.contains(flag) {
            selection.push_str(part);
        }
    }

    format!(
        "query ListImplementationRevisions {{\n  implementations {{\n    revisions {{\n{selection}    }}\n  }}\n}}\n"
    )
}

fn flatten_revisions(
    response: GraphQlResponse<ListImplementationsDto>,
) -> anyhow::Result<Vec<ImplementationRevision>> {
    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        anyhow::bail!("Hub returned errors: {}", messages.join("; "));
    }

    let data = response
        .data
        .ok_or_else(|| anyhow::anyhow!("Hub response has no data"))?;

    Ok(data
        .implementations
        .into_iter()
        .flat_map(|i| i.revisions)
        .collect())
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ListImplementationsDto {
    #[serde(default)]
    implementations: Vec<ImplementationDto>,
}

#[derive(Debug, Deserialize)]
struct ImplementationDto {
    #[serde(default)]
    revisions: Vec<ImplementationRevision>,
}
