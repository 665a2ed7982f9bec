//! Command execution.

use crate::Commands;
use colored::Colorize;
use serde_json::{json, Value};
use wfresolve_core::resolver::Candidate;
use wfresolve_core::{
    AcceptTokens, Loaded, ResolverOptions, StateId, TransitionResolver, WorkflowId,
};

/// Everything a command needs besides its own arguments.
pub struct Context<'a> {
    pub loaded: &'a Loaded,
    pub options: ResolverOptions,
    /// Emit JSON instead of human-readable text.
    pub json: bool,
}

/// Formatted command output.
#[derive(Debug)]
pub struct Output {
    pub text: String,
    /// False makes the process exit non-zero after printing.
    pub success: bool,
}

impl Output {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
        }
    }
}

/// Executes a command against a loaded catalog.
pub fn execute(ctx: &Context<'_>, cmd: Commands) -> Result<Output, Box<dyn std::error::Error>> {
    let catalog = &ctx.loaded.catalog;

    match cmd {
        Commands::Resolve {
            workflow,
            from,
            accept,
            no_default,
            tie_break,
        } => {
            let mut options = ctx.options;
            if let Some(tb) = tie_break {
                options.tie_break = tb;
            }
            let fallback = options.use_default_fallback && !no_default;

            let resolver = TransitionResolver::with_options(catalog, options);
            let result =
                resolver.resolve(WorkflowId(workflow), StateId(from), &accept, fallback)?;

            if ctx.json {
                return Ok(Output::ok(format_json(&json!({
                    "workflow_id": workflow,
                    "from_state_id": from,
                    "accept": accept.to_string(),
                    "found": result.is_some(),
                    "resolution": result,
                }))));
            }

            Ok(Output::ok(match result {
                Some(r) => format!(
                    "{} transition {} -> state {} ({})",
                    "Resolved".green(),
                    r.transition_id.to_string().cyan(),
                    r.to_state_id.to_string().yellow(),
                    r.kind
                ),
                None => format!(
                    "{} from state {} in workflow {} [{}]",
                    "No transition".yellow(),
                    from,
                    workflow,
                    accept
                ),
            }))
        }

        Commands::Accepts {
            workflow,
            state,
            accept,
        } => {
            let accepted = TransitionResolver::new(catalog).is_acceptable_state(
                WorkflowId(workflow),
                StateId(state),
                &accept,
            )?;

            if ctx.json {
                return Ok(Output::ok(format_json(&json!({
                    "workflow_id": workflow,
                    "state_id": state,
                    "accept": accept.to_string(),
                    "acceptable": accepted,
                }))));
            }
            Ok(Output::ok(accepted.to_string()))
        }

        Commands::Explain {
            workflow,
            from,
            accept,
        } => explain(ctx, WorkflowId(workflow), StateId(from), &accept),

        Commands::Check => {
            let report = &ctx.loaded.report;
            let violations = catalog.integrity_violations();
            let success = report.is_clean();

            if ctx.json {
                return Ok(Output {
                    text: format_json(&json!({
                        "fingerprint": catalog.fingerprint(),
                        "workflows": catalog.len(),
                        "report": report,
                        "violations": violations,
                    })),
                    success,
                });
            }

            let mut output = format!(
                "{}\n  Fingerprint: {}\n  Workflows: {}\n  States: {}\n  Transitions: {}",
                "Catalog".bold(),
                catalog.fingerprint(),
                catalog.len(),
                report.states_loaded,
                report.transitions_loaded
            );
            for skipped in &report.skipped {
                output.push_str(&format!(
                    "\n  {} {} record #{}: {}",
                    "Skipped".yellow(),
                    skipped.kind,
                    skipped.index,
                    skipped.reason
                ));
            }
            for v in &violations {
                output.push_str(&format!("\n  {} {}", "Dangling".red(), v));
            }
            if success {
                output.push_str(&format!("\n{}", "OK".green()));
            }
            Ok(Output {
                text: output,
                success,
            })
        }

        Commands::List => {
            if ctx.json {
                let items: Vec<Value> = catalog
                    .workflows()
                    .into_iter()
                    .map(|w| {
                        json!({
                            "workflow_id": w.id(),
                            "states": w.states().len(),
                            "transitions": w.transitions().len(),
                            "defaults": w.transitions().iter().filter(|t| t.is_default).count(),
                        })
                    })
                    .collect();
                return Ok(Output::ok(format_json(&json!({ "items": items }))));
            }

            if catalog.is_empty() {
                return Ok(Output::ok("No workflows loaded".yellow().to_string()));
            }

            let mut output = String::new();
            for w in catalog.workflows() {
                output.push_str(&format!(
                    "  workflow {} [states: {}, transitions: {}]\n",
                    w.id().to_string().cyan(),
                    w.states().len(),
                    w.transitions().len()
                ));
            }
            Ok(Output::ok(output.trim_end().to_string()))
        }
    }
}

fn explain(
    ctx: &Context<'_>,
    workflow: WorkflowId,
    from: StateId,
    accept: &AcceptTokens,
) -> Result<Output, Box<dyn std::error::Error>> {
    let resolver = TransitionResolver::with_options(&ctx.loaded.catalog, ctx.options);
    let candidates = resolver.candidates(workflow, from, accept)?;
    let result = resolver.resolve_with(workflow, from, accept)?;

    if ctx.json {
        let list = |cs: &[Candidate<'_>]| -> Vec<Value> {
            cs.iter()
                .map(|c| {
                    json!({
                        "transition_id": c.transition.transition_id,
                        "to_state_id": c.transition.to_state_id,
                        "is_default": c.transition.is_default,
                        "sort_order": c.destination.map(|s| s.sort_order),
                        "validity_token": c.destination.map(|s| s.validity_token.to_string()),
                    })
                })
                .collect()
        };
        return Ok(Output::ok(format_json(&json!({
            "workflow_id": workflow,
            "from_state_id": from,
            "accept": accept.to_string(),
            "tie_break": resolver.options().tie_break,
            "use_default_fallback": resolver.options().use_default_fallback,
            "direct": list(&candidates.direct),
            "defaults": list(&candidates.defaults),
            "rejected": list(&candidates.rejected),
            "resolution": result,
        }))));
    }

    let mut output = format!(
        "{} workflow {} state {} [{}] (tie-break: {}, fallback: {})",
        "Explain".bold(),
        workflow,
        from,
        accept,
        resolver.options().tie_break,
        resolver.options().use_default_fallback
    );
    for (label, group) in [
        ("direct", &candidates.direct),
        ("default", &candidates.defaults),
        ("rejected", &candidates.rejected),
    ] {
        output.push_str(&format!("\n  {}:", label));
        if group.is_empty() {
            output.push_str(&format!(" {}", "none".dimmed()));
        }
        for c in group {
            output.push_str(&format!("\n    {}", describe(c)));
        }
    }
    match result {
        Some(r) => output.push_str(&format!(
            "\n{} transition {} ({})",
            "Selected".green(),
            r.transition_id.to_string().cyan(),
            r.kind
        )),
        None => output.push_str(&format!("\n{}", "No transition".yellow())),
    }
    Ok(Output::ok(output))
}

fn describe(c: &Candidate<'_>) -> String {
    let dest = match c.destination {
        Some(s) => format!(
            "state {} (token '{}', sort {})",
            s.state_id, s.validity_token, s.sort_order
        ),
        None => format!("state {} (unknown)", c.transition.to_state_id),
    };
    let flag = if c.transition.is_default {
        " [default]"
    } else {
        ""
    };
    format!("{} -> {}{}", c.transition.transition_id, dest, flag)
}

/// Formats JSON for display.
fn format_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfresolve_core::{load_catalog, LoadOptions, StateRecord, TieBreak, TransitionRecord};

    fn sample_loaded() -> Loaded {
        let states = vec![
            StateRecord::new("1", "10", "5", "n"),
            StateRecord::new("1", "20", "2", "y"),
            StateRecord::new("1", "30", "1", "y"),
        ];
        let transitions = vec![
            TransitionRecord::new("1", "100", "10", "20", None),
            TransitionRecord::new("1", "101", "10", "30", None),
            TransitionRecord::new("1", "102", "10", "20", Some("true")),
        ];
        load_catalog(&states, &transitions, &LoadOptions::default()).unwrap()
    }

    fn run_json(loaded: &Loaded, cmd: Commands) -> (Value, bool) {
        let ctx = Context {
            loaded,
            options: ResolverOptions::default(),
            json: true,
        };
        let output = execute(&ctx, cmd).unwrap();
        (serde_json::from_str(&output.text).unwrap(), output.success)
    }

    fn resolve_cmd(from: i64, accept: &str, no_default: bool) -> Commands {
        Commands::Resolve {
            workflow: 1,
            from,
            accept: accept.parse().unwrap(),
            no_default,
            tie_break: None,
        }
    }

    #[test]
    fn test_resolve_json() {
        let loaded = sample_loaded();

        let (out, _) = run_json(&loaded, resolve_cmd(10, "y", false));
        assert_eq!(out["found"], true);
        assert_eq!(out["resolution"]["transition_id"], 101);
        assert_eq!(out["resolution"]["kind"], "direct");

        let (out, _) = run_json(&loaded, resolve_cmd(10, "x", false));
        assert_eq!(out["resolution"]["transition_id"], 102);
        assert_eq!(out["resolution"]["kind"], "default");

        let (out, success) = run_json(&loaded, resolve_cmd(10, "x", true));
        assert_eq!(out["found"], false);
        assert!(out["resolution"].is_null());
        assert!(success);
    }

    #[test]
    fn test_resolve_text() {
        let loaded = sample_loaded();
        let ctx = Context {
            loaded: &loaded,
            options: ResolverOptions {
                tie_break: TieBreak::LowestStateId,
                use_default_fallback: false,
            },
            json: false,
        };

        let output = execute(&ctx, resolve_cmd(10, "y", false)).unwrap();
        assert!(output.text.contains("101"));

        // Fallback disabled by config
        let output = execute(&ctx, resolve_cmd(10, "x", false)).unwrap();
        assert!(output.text.contains("No transition"));
    }

    #[test]
    fn test_resolve_rejects_bad_ids() {
        let loaded = sample_loaded();
        let ctx = Context {
            loaded: &loaded,
            options: ResolverOptions::default(),
            json: false,
        };
        let cmd = Commands::Resolve {
            workflow: 0,
            from: 10,
            accept: "y".parse().unwrap(),
            no_default: false,
            tie_break: None,
        };
        assert!(execute(&ctx, cmd).is_err());
    }

    #[test]
    fn test_accepts() {
        let loaded = sample_loaded();
        let (out, _) = run_json(
            &loaded,
            Commands::Accepts {
                workflow: 1,
                state: 20,
                accept: "y, i".parse().unwrap(),
            },
        );
        assert_eq!(out["acceptable"], true);

        let (out, _) = run_json(
            &loaded,
            Commands::Accepts {
                workflow: 1,
                state: 999,
                accept: "y".parse().unwrap(),
            },
        );
        assert_eq!(out["acceptable"], false);
    }

    #[test]
    fn test_explain() {
        let loaded = sample_loaded();
        let (out, _) = run_json(
            &loaded,
            Commands::Explain {
                workflow: 1,
                from: 10,
                accept: "y".parse().unwrap(),
            },
        );
        assert_eq!(out["direct"].as_array().unwrap().len(), 3);
        assert!(out["defaults"].as_array().unwrap().is_empty());
        assert_eq!(out["resolution"]["transition_id"], 101);

        let ctx = Context {
            loaded: &loaded,
            options: ResolverOptions::default(),
            json: false,
        };
        let output = execute(
            &ctx,
            Commands::Explain {
                workflow: 1,
                from: 10,
                accept: "x".parse().unwrap(),
            },
        )
        .unwrap();
        assert!(output.text.contains("[default]"));
        assert!(output.text.contains("102"));
    }

    #[test]
    fn test_check_and_list() {
        let loaded = sample_loaded();
        let (out, success) = run_json(&loaded, Commands::Check);
        assert!(success);
        assert_eq!(out["workflows"], 1);
        assert_eq!(out["report"]["transitions_loaded"], 3);

        let (out, _) = run_json(&loaded, Commands::List);
        assert_eq!(out["items"][0]["workflow_id"], 1);
        assert_eq!(out["items"][0]["defaults"], 1);
    }

    #[test]
    fn test_check_fails_on_dirty_catalog() {
        let states = vec![StateRecord::new("1", "10", "5", "n")];
        let transitions = vec![TransitionRecord::new("1", "100", "10", "77", None)];
        let loaded = load_catalog(&states, &transitions, &LoadOptions::default()).unwrap();

        let (out, success) = run_json(&loaded, Commands::Check);
        assert!(!success);
        assert_eq!(out["violations"][0]["missing_state"], 77);
        assert_eq!(out["violations"][0]["endpoint"], "to");
    }
}
