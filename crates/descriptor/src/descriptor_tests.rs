// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

const FULL: &str = r#"
application_name: wordcount
orchestrator:
  type: occopus
  url: http://localhost:5000
  occopus:
    infra_file: infra_defs/infra-wordcount.yaml
exec-tree:
  type: neo4j
  mode: server
  auth:
    host: http://graph:7474
    user: neo4j
    password: debug
specification:
  worker:
    - variable:
        name: lines
        expected:
          less_than: 100
specification_global: "worker[1].lines is true"
"#;

fn write_descriptor(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_a_complete_descriptor() {
    let file = write_descriptor(FULL);
    let desc = AppDescriptor::load(file.path()).unwrap();
    assert_eq!(desc.application_name, "wordcount");
    assert_eq!(desc.orchestrator_kind().unwrap(), ms_core::OrchestratorKind::Occopus);
    assert_eq!(desc.tree_store_kind().unwrap(), TreeStoreKind::Neo4j);
    assert_eq!(
        desc.infra_descriptor().unwrap(),
        std::path::Path::new("infra_defs/infra-wordcount.yaml")
    );
    assert_eq!(desc.graph_auth().user, "neo4j");
    assert!(desc.specification.is_some());
    assert_eq!(desc.specification_global.as_deref(), Some("worker[1].lines is true"));
}

#[test]
fn missing_file_is_refused() {
    assert!(matches!(
        AppDescriptor::load(std::path::Path::new("/does/not/exist.yaml")),
        Err(DescriptorError::NotFound(_))
    ));
}

#[test]
fn malformed_yaml_is_refused() {
    let file = write_descriptor("application_name: [unclosed");
    assert!(matches!(AppDescriptor::load(file.path()), Err(DescriptorError::Yaml(_))));
}

#[test]
fn unknown_orchestrator_is_refused() {
    let file = write_descriptor(
        "application_name: a\norchestrator:\n  type: nomad\n  url: http://x\nexec-tree:\n  type: memory\n",
    );
    assert!(matches!(
        AppDescriptor::load(file.path()),
        Err(DescriptorError::UnknownOrchestrator(_))
    ));
}

#[test]
fn occopus_requires_its_section() {
    let file = write_descriptor(
        "application_name: a\norchestrator:\n  type: occopus\n  url: http://x\nexec-tree:\n  type: memory\n",
    );
    assert!(matches!(
        AppDescriptor::load(file.path()),
        Err(DescriptorError::MissingOrchestratorSection("occopus"))
    ));
}

#[test]
fn neo4j_requires_auth() {
    let file = write_descriptor(
        "application_name: a\norchestrator:\n  type: occopus\n  url: http://x\n  occopus:\n    infra_file: i.yaml\nexec-tree:\n  type: neo4j\n",
    );
    assert!(matches!(AppDescriptor::load(file.path()), Err(DescriptorError::MissingAuth(_))));
}

#[test]
fn memory_tree_needs_no_auth() {
    let file = write_descriptor(
        "application_name: a\norchestrator:\n  type: occopus\n  url: http://x\n  occopus:\n    infra_file: i.yaml\nexec-tree:\n  type: memory\n",
    );
    let desc = AppDescriptor::load(file.path()).unwrap();
    assert_eq!(desc.tree_store_kind().unwrap(), TreeStoreKind::Memory);
    assert_eq!(desc.graph_auth().host, "");
}
