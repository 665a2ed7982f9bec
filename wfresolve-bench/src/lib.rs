//! Shared fixtures for wfresolve benchmarks.

use wfresolve_core::{StateRecord, TransitionRecord};

/// Tokens cycled across generated states.
const TOKENS: [&str; 3] = ["y", "n", "i"];

/// Generates `workflows` workflows, each a chain of `states` states where
/// every state has `fanout` outgoing transitions to the following states.
/// Every fourth transition is flagged as default.
pub fn synthetic_records(
    workflows: usize,
    states: usize,
    fanout: usize,
) -> (Vec<StateRecord>, Vec<TransitionRecord>) {
    let mut state_records = Vec::with_capacity(workflows * states);
    let mut transition_records = Vec::with_capacity(workflows * states * fanout);

    for wf in 1..=workflows {
        let wf_id = wf.to_string();
        for s in 1..=states {
            state_records.push(StateRecord::new(
                &wf_id,
                &s.to_string(),
                &((s * 7) % 13).to_string(),
                TOKENS[s % TOKENS.len()],
            ));
        }

        let mut next_id = 1;
        for s in 1..=states {
            for k in 1..=fanout {
                let to = (s + k - 1) % states + 1;
                let default = (next_id % 4 == 0).then_some("true");
                transition_records.push(TransitionRecord::new(
                    &wf_id,
                    &next_id.to_string(),
                    &s.to_string(),
                    &to.to_string(),
                    default,
                ));
                next_id += 1;
            }
        }
    }

    (state_records, transition_records)
}
