// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specification evaluation at a collective breakpoint.
//!
//! For every variable the specification names, the verdict is computed
//! from the sample the visiting instance collected at the node; variables
//! missing from the collected data stay unevaluated (`None`). The global
//! expression then runs over those verdicts, but only when each of its
//! atoms names a process, ordinal, and variable the collected data
//! actually knows.

use ms_core::{CollectedSample, EvaluationRecord, InstanceId};
use ms_descriptor::{Atom, Expr, ExprError, Specification};
use std::collections::BTreeMap;

/// Evaluate the per-variable specification and global expression against
/// one instance's samples.
pub fn evaluate_node(
    spec: Option<&Specification>,
    global: Option<&str>,
    instance: &InstanceId,
    samples: &[CollectedSample],
) -> EvaluationRecord {
    let mut variables: BTreeMap<String, Vec<BTreeMap<String, Option<bool>>>> = BTreeMap::new();

    if let Some(spec) = spec {
        for (type_name, checks) in spec {
            let type_samples: Vec<&CollectedSample> =
                samples.iter().filter(|s| &s.process_name == type_name).collect();
            if type_samples.is_empty() {
                tracing::warn!(process = %type_name, "no collected data; specification not evaluated");
                continue;
            }
            let mut per_ordinal = vec![BTreeMap::new(); type_samples.len()];
            for entry in checks {
                let check = &entry.variable;
                for sample in &type_samples {
                    let verdict = sample
                        .user_data
                        .get(&check.name)
                        .map(|value| check.expected.evaluate(&value_as_string(value)));
                    if verdict.is_none() {
                        tracing::warn!(
                            process = %type_name,
                            ordinal = sample.ordinal + 1,
                            variable = %check.name,
                            "variable missing from collected data",
                        );
                    }
                    per_ordinal[sample.ordinal].insert(check.name.clone(), verdict);
                }
            }
            variables.insert(type_name.clone(), per_ordinal);
        }
    }

    let global = global.and_then(|raw| match evaluate_global(raw, &variables, samples) {
        Ok(verdict) => Some(verdict),
        Err(err) => {
            tracing::warn!(%err, "global specification not evaluated");
            None
        }
    });

    EvaluationRecord { instance_id: instance.clone(), variables, global }
}

fn evaluate_global(
    raw: &str,
    variables: &BTreeMap<String, Vec<BTreeMap<String, Option<bool>>>>,
    samples: &[CollectedSample],
) -> Result<bool, ExprError> {
    let expr = Expr::parse(raw)?;
    for atom in expr.atoms() {
        validate_atom(atom, samples)?;
    }
    let verdict = |atom: &Atom| -> bool {
        variables
            .get(&atom.process)
            .and_then(|per_ordinal| per_ordinal.get(atom.index()))
            .and_then(|vars| vars.get(&atom.variable).cloned().flatten())
            .unwrap_or(false)
    };
    Ok(expr.evaluate(&verdict))
}

/// Reject atoms naming unknown processes, ordinals, or variables.
fn validate_atom(atom: &Atom, samples: &[CollectedSample]) -> Result<(), ExprError> {
    let Some(sample) = samples
        .iter()
        .find(|s| s.process_name == atom.process && s.ordinal == atom.index())
    else {
        if samples.iter().any(|s| s.process_name == atom.process) {
            return Err(ExprError::UnknownAtom {
                what: "process ordinal",
                name: format!("{}[{}]", atom.process, atom.ordinal),
            });
        }
        return Err(ExprError::UnknownAtom { what: "process", name: atom.process.clone() });
    };
    if !sample.user_data.contains_key(&atom.variable) {
        return Err(ExprError::UnknownAtom { what: "variable", name: atom.variable.clone() });
    }
    Ok(())
}

fn value_as_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "evaluate_tests.rs"]
mod tests;
