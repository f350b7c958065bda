// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cypher-over-HTTP tree store.
//!
//! Talks to a property-graph server's transactional Cypher endpoint. Each
//! trait call is a single transaction; insert-or-dedupe runs the sibling
//! scan and the conditional create in one statement, which keeps sibling
//! dedupe atomic under concurrent sessions.
//!
//! Node layout matches the persisted-state contract: label
//! `Collective_BP`, edge label `MACROSTEP` carrying `process_stepped =
//! "<name>[<ordinal>]"`, and the JSON-string properties `process_states`,
//! `instance_ids`, `collected_data`, `evaluation`.

use crate::store::{InsertOutcome, TreeError, TreeStore};
use async_trait::async_trait;
use ms_core::{AppName, CollectiveBreakpoint, MacrostepLabel, NodeId, NodeKind};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub struct CypherTreeStore {
    client: reqwest::Client,
    endpoint: String,
    user: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct CypherResponse {
    #[serde(default)]
    results: Vec<CypherResult>,
    #[serde(default)]
    errors: Vec<CypherError>,
}

#[derive(Debug, Deserialize)]
struct CypherResult {
    #[serde(default)]
    data: Vec<CypherRow>,
}

#[derive(Debug, Deserialize)]
struct CypherRow {
    #[serde(default)]
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CypherError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl CypherTreeStore {
    /// `host` is the server base URL (e.g. `http://graph:7474`); requests
    /// go to its transactional commit endpoint.
    pub fn new(host: &str, user: &str, password: &str, timeout: Duration) -> Result<Self, TreeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/db/neo4j/tx/commit", host.trim_end_matches('/')),
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    async fn run(&self, statement: &str, parameters: Value) -> Result<Vec<Vec<Value>>, TreeError> {
        let body = json!({
            "statements": [{ "statement": statement, "parameters": parameters }]
        });
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TreeError::Backend(format!("HTTP {}", response.status())));
        }
        let parsed: CypherResponse = response.json().await?;
        if let Some(err) = parsed.errors.first() {
            return Err(TreeError::Backend(format!("{}: {}", err.code, err.message)));
        }
        Ok(parsed
            .results
            .into_iter()
            .next()
            .map(|r| r.data.into_iter().map(|d| d.row).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl TreeStore for CypherTreeStore {
    async fn ping(&self) -> Result<(), TreeError> {
        self.run("RETURN 1", json!({})).await.map(|_| ())
    }

    async fn insert_root(&self, node: CollectiveBreakpoint) -> Result<InsertOutcome, TreeError> {
        let id = node.id.clone();
        let rows = self
            .run(
                "MERGE (n:Collective_BP {app_name: $app, node_type: 'root'}) \
                 ON CREATE SET n += $props \
                 RETURN n.coll_bp_id",
                json!({ "app": node.app_name.as_str(), "props": node_props(&node) }),
            )
            .await?;
        let stored = first_string(&rows)
            .ok_or_else(|| TreeError::Backend("root merge returned no id".into()))?;
        if stored == id.as_str() {
            Ok(InsertOutcome::Created(id))
        } else {
            Ok(InsertOutcome::Existing(NodeId::new(stored)))
        }
    }

    async fn insert_child(
        &self,
        node: CollectiveBreakpoint,
        label: MacrostepLabel,
    ) -> Result<InsertOutcome, TreeError> {
        let parent = node
            .parent
            .clone()
            .ok_or_else(|| TreeError::Integrity("child node without a parent".into()))?;
        let id = node.id.clone();
        let states = serde_json::to_string(&node.state)
            .map_err(|e| TreeError::Integrity(format!("unserializable state vector: {e}")))?;
        let rows = self
            .run(
                "MATCH (p:Collective_BP {app_name: $app, coll_bp_id: $parent}) \
                 OPTIONAL MATCH (p)-[:MACROSTEP]->(existing:Collective_BP {process_states: $states}) \
                 FOREACH (_ IN CASE WHEN existing IS NULL THEN [1] ELSE [] END | \
                   CREATE (p)-[:MACROSTEP {app_name: $app, process_stepped: $step}]\
                   ->(c:Collective_BP) SET c += $props) \
                 RETURN coalesce(existing.coll_bp_id, $id), existing IS NULL",
                json!({
                    "app": node.app_name.as_str(),
                    "parent": parent.as_str(),
                    "states": states,
                    "step": label.to_string(),
                    "props": node_props(&node),
                    "id": id.as_str(),
                }),
            )
            .await?;
        let Some(row) = rows.first() else {
            return Err(TreeError::UnknownNode(parent));
        };
        let stored = row.first().and_then(Value::as_str).unwrap_or(id.as_str());
        let created = row.get(1).and_then(Value::as_bool).unwrap_or(false);
        if created {
            Ok(InsertOutcome::Created(id))
        } else {
            Ok(InsertOutcome::Existing(NodeId::new(stored)))
        }
    }

    async fn node(
        &self,
        app: &AppName,
        id: &NodeId,
    ) -> Result<Option<CollectiveBreakpoint>, TreeError> {
        let rows = self
            .run(
                "MATCH (n:Collective_BP {app_name: $app, coll_bp_id: $id}) RETURN properties(n)",
                json!({ "app": app.as_str(), "id": id.as_str() }),
            )
            .await?;
        rows.first()
            .and_then(|r| r.first())
            .map(node_from_props)
            .transpose()
    }

    async fn update_node(&self, node: &CollectiveBreakpoint) -> Result<(), TreeError> {
        let rows = self
            .run(
                "MATCH (n:Collective_BP {app_name: $app, coll_bp_id: $id}) \
                 SET n += $props RETURN n.coll_bp_id",
                json!({
                    "app": node.app_name.as_str(),
                    "id": node.id.as_str(),
                    "props": node_props(node),
                }),
            )
            .await?;
        if rows.is_empty() {
            return Err(TreeError::UnknownNode(node.id.clone()));
        }
        Ok(())
    }

    async fn children(
        &self,
        app: &AppName,
        parent: &NodeId,
    ) -> Result<Vec<CollectiveBreakpoint>, TreeError> {
        let rows = self
            .run(
                "MATCH (:Collective_BP {app_name: $app, coll_bp_id: $parent})\
                 -[:MACROSTEP]->(c:Collective_BP) \
                 RETURN properties(c) ORDER BY c.coll_bp_id",
                json!({ "app": app.as_str(), "parent": parent.as_str() }),
            )
            .await?;
        rows.iter()
            .filter_map(|r| r.first())
            .map(node_from_props)
            .collect()
    }

    async fn find_root(&self, app: &AppName) -> Result<Option<CollectiveBreakpoint>, TreeError> {
        let rows = self
            .run(
                "MATCH (n:Collective_BP {app_name: $app, node_type: 'root'}) \
                 RETURN properties(n) LIMIT 1",
                json!({ "app": app.as_str() }),
            )
            .await?;
        rows.first()
            .and_then(|r| r.first())
            .map(node_from_props)
            .transpose()
    }

    async fn edge_label(
        &self,
        app: &AppName,
        child: &NodeId,
    ) -> Result<Option<MacrostepLabel>, TreeError> {
        let rows = self
            .run(
                "MATCH (:Collective_BP {app_name: $app})-[r:MACROSTEP]\
                 ->(:Collective_BP {app_name: $app, coll_bp_id: $child}) \
                 RETURN r.process_stepped LIMIT 1",
                json!({ "app": app.as_str(), "child": child.as_str() }),
            )
            .await?;
        Ok(first_string(&rows).as_deref().and_then(parse_label))
    }
}

fn first_string(rows: &[Vec<Value>]) -> Option<String> {
    rows.first()
        .and_then(|r| r.first())
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Flatten a node into graph properties. Structured attributes go in as
/// JSON strings; graph properties are scalars only.
fn node_props(node: &CollectiveBreakpoint) -> Value {
    json!({
        "app_name": node.app_name.as_str(),
        "coll_bp_id": node.id.as_str(),
        "node_type": node.kind.to_string(),
        "prev_coll_bp": node.parent.as_ref().map(NodeId::as_str).unwrap_or(""),
        "exhausted": node.exhausted,
        "process_states": serde_json::to_string(&node.state).unwrap_or_default(),
        "instance_ids": serde_json::to_string(&node.instance_ids).unwrap_or_default(),
        "collected_data": serde_json::to_string(&node.collected).unwrap_or_default(),
        "evaluation": serde_json::to_string(&node.evaluations).unwrap_or_default(),
    })
}

fn node_from_props(props: &Value) -> Result<CollectiveBreakpoint, TreeError> {
    let field = |name: &str| -> Result<&str, TreeError> {
        props
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| TreeError::Backend(format!("node property \"{name}\" missing")))
    };
    let kind = match field("node_type")? {
        "root" => NodeKind::Root,
        "deterministic" => NodeKind::Deterministic,
        "alternative" => NodeKind::Alternative,
        "final" => NodeKind::Final,
        other => return Err(TreeError::Backend(format!("unknown node_type \"{other}\""))),
    };
    let parent = match field("prev_coll_bp")? {
        "" => None,
        id => Some(NodeId::new(id)),
    };
    let from_json = |name: &str| -> Result<Value, TreeError> {
        serde_json::from_str(field(name)?)
            .map_err(|e| TreeError::Backend(format!("corrupt \"{name}\" property: {e}")))
    };
    Ok(CollectiveBreakpoint {
        id: NodeId::new(field("coll_bp_id")?),
        app_name: AppName::new(field("app_name")?),
        state: serde_json::from_value(from_json("process_states")?)
            .map_err(|e| TreeError::Backend(format!("corrupt state vector: {e}")))?,
        parent,
        kind,
        exhausted: props.get("exhausted").and_then(Value::as_bool).unwrap_or(false),
        instance_ids: serde_json::from_value(from_json("instance_ids")?)
            .map_err(|e| TreeError::Backend(format!("corrupt instance_ids: {e}")))?,
        collected: serde_json::from_value(from_json("collected_data")?)
            .map_err(|e| TreeError::Backend(format!("corrupt collected_data: {e}")))?,
        evaluations: serde_json::from_value(from_json("evaluation")?)
            .map_err(|e| TreeError::Backend(format!("corrupt evaluation: {e}")))?,
    })
}

/// Parse the wire form `name[ordinal]` back into a label (1-based on the
/// wire, 0-based in memory).
fn parse_label(raw: &str) -> Option<MacrostepLabel> {
    let (name, rest) = raw.split_once('[')?;
    let ordinal: usize = rest.strip_suffix(']')?.parse().ok()?;
    if name.is_empty() || ordinal == 0 {
        return None;
    }
    Some(MacrostepLabel { process_type: name.to_string(), ordinal: ordinal - 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_core::StateVector;

    fn sample_node() -> CollectiveBreakpoint {
        let state: StateVector =
            serde_json::from_value(json!({"a": [2], "b": [1]})).unwrap();
        let mut node = CollectiveBreakpoint::new(
            AppName::new("app"),
            state,
            Some(NodeId::new("parent")),
            NodeKind::Alternative,
        );
        node.instance_ids.push(ms_core::InstanceId::new("pk-1"));
        node
    }

    #[test]
    fn props_roundtrip_preserves_the_node() {
        let node = sample_node();
        let back = node_from_props(&node_props(&node)).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn root_props_use_empty_prev_pointer() {
        let root = CollectiveBreakpoint::new(
            AppName::new("app"),
            StateVector::default(),
            None,
            NodeKind::Root,
        );
        let props = node_props(&root);
        assert_eq!(props.get("prev_coll_bp"), Some(&json!("")));
        assert_eq!(node_from_props(&props).unwrap().parent, None);
    }

    #[test]
    fn label_wire_format_roundtrips() {
        let label = MacrostepLabel { process_type: "worker".into(), ordinal: 1 };
        assert_eq!(label.to_string(), "worker[2]");
        assert_eq!(parse_label("worker[2]"), Some(label));
        assert_eq!(parse_label("worker"), None);
        assert_eq!(parse_label("worker[0]"), None);
        assert_eq!(parse_label("[1]"), None);
    }
}
