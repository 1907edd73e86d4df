//! Dependency-safety checks shared by the HTTP submission surface (fatal
//! before scheduling) and the workflow engine (fatal during scheduling).

use std::collections::{HashMap, HashSet};

use crate::error::CoreError;
use crate::model::{Step, RESERVED_STEP_ID_STATE_SNAPSHOT};

/// Checks the core dependency invariants: no step uses the reserved snapshot
/// id, every `depends_on` entry names another step in the same submission,
/// the relation is acyclic, and no step id repeats.
pub fn validate_steps(steps: &[Step]) -> Result<(), CoreError> {
    let mut seen = HashSet::new();
    for step in steps {
        if step.id == RESERVED_STEP_ID_STATE_SNAPSHOT {
            return Err(CoreError::validation(format!(
                "step id '{}' is reserved for the engine's snapshot activity",
                step.id
            )));
        }
        if !seen.insert(step.id.as_str()) {
            return Err(CoreError::validation(format!(
                "duplicate step id: {}",
                step.id
            )));
        }
    }

    for step in steps {
        for dep in &step.depends_on {
            if !seen.contains(dep.as_str()) {
                return Err(CoreError::dependency(format!(
                    "step '{}' depends on undeclared step '{}'",
                    step.id, dep
                )));
            }
        }
    }

    detect_cycle(steps)
}

fn detect_cycle(steps: &[Step]) -> Result<(), CoreError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    let by_id: HashMap<&str, &Step> = steps.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut marks: HashMap<&str, Mark> = HashMap::new();

    fn visit<'a>(
        id: &'a str,
        by_id: &HashMap<&'a str, &'a Step>,
        marks: &mut HashMap<&'a str, Mark>,
    ) -> Result<(), CoreError> {
        match marks.get(id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                return Err(CoreError::dependency(format!(
                    "dependency cycle detected at step '{id}'"
                )))
            }
            None => {}
        }

        marks.insert(id, Mark::Visiting);
        if let Some(step) = by_id.get(id) {
            for dep in &step.depends_on {
                visit(dep.as_str(), by_id, marks)?;
            }
        }
        marks.insert(id, Mark::Done);
        Ok(())
    }

    for step in steps {
        visit(step.id.as_str(), &by_id, &mut marks)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Action;
    use std::collections::HashMap as Map;

    fn step(id: &str, depends_on: &[&str]) -> Step {
        Step {
            id: id.to_string(),
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
            executor: "terraform".to_string(),
            operation: "apply".to_string(),
            action: Action::Create,
            resource: String::new(),
            workspace: String::new(),
            provider: String::new(),
            provisioner: String::new(),
            project: String::new(),
            submitter: String::new(),
            customer: String::new(),
            resource_group: String::new(),
            file: String::new(),
            deployment_name: String::new(),
            activity: String::new(),
            variables: Map::new(),
            role_id: None,
            secret_id: None,
        }
    }

    #[test]
    fn linear_chain_is_valid() {
        let steps = vec![step("A", &[]), step("B", &["A"])];
        assert!(validate_steps(&steps).is_ok());
    }

    #[test]
    fn undeclared_dependency_is_rejected() {
        let steps = vec![step("A", &["ghost"])];
        assert!(matches!(
            validate_steps(&steps),
            Err(CoreError::Dependency(_))
        ));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let steps = vec![step("A", &[]), step("A", &[])];
        assert!(matches!(
            validate_steps(&steps),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn reserved_snapshot_id_is_rejected() {
        let steps = vec![step(crate::model::RESERVED_STEP_ID_STATE_SNAPSHOT, &[])];
        assert!(matches!(
            validate_steps(&steps),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn cycle_is_rejected() {
        let steps = vec![step("A", &["B"]), step("B", &["A"])];
        assert!(matches!(
            validate_steps(&steps),
            Err(CoreError::Dependency(_))
        ));
    }
}
