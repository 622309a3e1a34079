//! Property-based tests for the gating, store and cascade rules

#[cfg(test)]
mod tests {
    use crate::catalog::{StepCatalog, StepGroup, GROUP_ORDER};
    use crate::runbook::cascade::{self, CascadeDecision};
    use crate::runbook::execution::{ExecutionOutcome, StepExecution, StepStatus};
    use crate::runbook::gating::{self, Gate};
    use crate::runbook::store::ExecutionStore;
    use crate::testing::RunbookBuilder;
    use proptest::prelude::*;

    /// Four groups of `size` steps each with the given auto flags
    fn runbook(autos: &[bool], size: usize) -> StepCatalog {
        let mut builder = RunbookBuilder::new("prop");
        for (g, group) in GROUP_ORDER.into_iter().enumerate() {
            for i in 0..size {
                let auto = autos[(g * size + i) % autos.len()];
                builder = builder.step(group, &format!("{} {}", group, i), auto);
            }
        }
        builder.build_catalog()
    }

    fn finished(catalog: &StepCatalog, group: StepGroup, index: usize, ok: bool) -> StepExecution {
        let step = &catalog.steps(group)[index];
        let outcome = if ok {
            ExecutionOutcome::success("ok", Some(200))
        } else {
            ExecutionOutcome::failure("boom")
        };
        StepExecution::running(catalog.step_id(step), catalog.task_id(), step)
            .transition(outcome.into_state())
            .unwrap()
    }

    proptest! {
        // A failure blocks every later group and every later step of its own
        // group, whatever the auto flag of the blocked step.
        #[test]
        fn test_failure_blocks_everything_downstream(
            autos in prop::collection::vec(any::<bool>(), 1..12),
            size in 1usize..4,
            failed_group in 0usize..4,
            failed_index in 0usize..4,
        ) {
            let failed_index = failed_index % size;
            let catalog = runbook(&autos, size);
            let group = GROUP_ORDER[failed_group];
            let store = ExecutionStore::new().record(finished(&catalog, group, failed_index, false));
            let failed_id = catalog.step_id(&catalog.steps(group)[failed_index]);

            for step in catalog.iter() {
                let downstream = step.group.position() > failed_group
                    || (step.group == group && step.index > failed_index);
                let gate = gating::evaluate(&catalog, &store, step);
                if downstream {
                    prop_assert_eq!(gate, Gate::Blocked { cause: failed_id.clone() });
                } else if step.group == group && step.index == failed_index {
                    prop_assert_eq!(gate, Gate::Settled(StepStatus::Failed));
                } else {
                    prop_assert!(!gate.is_blocked());
                }
            }
        }

        // The store keeps exactly the last record written per step.
        #[test]
        fn test_store_is_last_write_wins(
            writes in prop::collection::vec((0usize..3, any::<bool>()), 1..30),
        ) {
            let catalog = runbook(&[true], 3);
            let mut store = ExecutionStore::new();
            for (index, ok) in &writes {
                store = store.record(finished(&catalog, StepGroup::Procedure, *index, *ok));
            }

            for index in 0..3 {
                let id = catalog.step_id(&catalog.steps(StepGroup::Procedure)[index]);
                let expected = writes
                    .iter()
                    .rev()
                    .find(|(i, _)| *i == index)
                    .map(|(_, ok)| if *ok { StepStatus::Completed } else { StepStatus::Failed })
                    .unwrap_or(StepStatus::Pending);
                prop_assert_eq!(store.status_of(&id), expected);
            }
            let distinct: std::collections::BTreeSet<usize> = writes.iter().map(|(i, _)| *i).collect();
            prop_assert_eq!(store.len(), distinct.len());
        }

        // A successful completion only ever submits the next step of the
        // same group, and only when that step is auto-executable.
        #[test]
        fn test_cascade_only_submits_the_immediate_successor(
            autos in prop::collection::vec(any::<bool>(), 1..12),
            size in 1usize..4,
            group in 0usize..4,
            index in 0usize..4,
        ) {
            let index = index % size;
            let catalog = runbook(&autos, size);
            let group = GROUP_ORDER[group];
            let store = ExecutionStore::new().record(finished(&catalog, group, index, true));

            let decision = cascade::advance(
                &catalog,
                &store,
                group,
                index,
                &ExecutionOutcome::success("ok", None),
            );
            match decision {
                CascadeDecision::Submit { group: g, index: i, .. } => {
                    prop_assert_eq!(g, group);
                    prop_assert_eq!(i, index + 1);
                    prop_assert!(catalog.steps(group)[i].auto_executable);
                }
                CascadeDecision::ParkForApproval { step_id } => {
                    let next = &catalog.steps(group)[index + 1];
                    prop_assert_eq!(step_id, catalog.step_id(next));
                    prop_assert!(!next.auto_executable);
                }
                CascadeDecision::Stop(_) => {
                    prop_assert!(index + 1 >= size);
                }
            }
        }
    }
}
