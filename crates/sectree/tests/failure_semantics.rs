//! How failed assertions, panics and changing section trees affect a scenario.

mod common;

use std::panic::{self, AssertUnwindSafe};

use common::Recorder;
use rstest::rstest;
use sectree::reporting::{RunStatus, ScenarioStatus};
use sectree::{
    Scenario, ScenarioError, ScenarioReport, TrackerError, check, check_eq, check_false,
    check_nofail, fail, require, require_eq, section,
};

fn statuses(report: &ScenarioReport) -> Vec<&'static str> {
    report
        .runs()
        .iter()
        .map(|run| run.status().label())
        .collect()
}

fn run_paths(report: &ScenarioReport) -> Vec<String> {
    report.run_paths().iter().map(ToString::to_string).collect()
}

#[test]
fn failed_checks_let_the_run_continue() -> Result<(), ScenarioError> {
    let mut reached_end = false;
    let report = Scenario::new("checks", file!(), line!()).run(|ctx| {
        section!(ctx, "compare", {
            assert!(!check!(ctx, 1 + 1 == 3));
            assert!(check_false!(ctx, 1 + 1 == 3));
            assert!(!check_eq!(ctx, "left", "right"));
            reached_end = true;
        });
    })?;

    assert!(reached_end);
    assert_eq!(statuses(&report), ["failed"]);
    assert_eq!(report.failures().count(), 2);
    let messages: Vec<Option<&str>> = report.failures().map(|record| record.message()).collect();
    assert_eq!(messages, [None, Some("left: \"left\", right: \"right\"")]);
    Ok(())
}

#[test]
fn failed_requirement_ends_the_run() -> Result<(), ScenarioError> {
    let mut after_require = 0;
    let report = Scenario::new("requires", file!(), line!()).run(|ctx| {
        section!(ctx, "stops", {
            require_eq!(ctx, 2 * 2, 5);
            after_require += 1;
        });
        section!(ctx, "continues", {
            require!(ctx, true);
        });
    })?;

    assert_eq!(after_require, 0);
    assert_eq!(statuses(&report), ["aborted", "passed"]);
    let Some(first) = report.runs().first() else {
        panic!("two runs expected");
    };
    let RunStatus::Aborted { reason } = first.status() else {
        panic!("the failed requirement aborts its run");
    };
    assert!(reason.starts_with("require_eq(2 * 2 == 5) failed at"));
    assert!(reason.ends_with("left: 4, right: 5"));
    assert_eq!(report.status(), &ScenarioStatus::Failed { failed_runs: 1 });
    Ok(())
}

#[test]
fn nofail_checks_never_fail_the_scenario() -> Result<(), ScenarioError> {
    let report = Scenario::new("nofail", file!(), line!()).run(|ctx| {
        section!(ctx, "optional", {
            assert!(!check_nofail!(ctx, Vec::<u8>::new().pop().is_some()));
        });
    })?;

    assert!(report.passed());
    assert_eq!(statuses(&report), ["passed"]);
    let recorded: Vec<bool> = report
        .runs()
        .iter()
        .flat_map(|run| run.assertions().iter().map(|record| record.passed()))
        .collect();
    assert_eq!(recorded, [false]);
    Ok(())
}

#[test]
fn siblings_of_a_failed_section_still_run() -> Result<(), ScenarioError> {
    let recorder = Recorder::default();
    let report = Scenario::new("siblings", file!(), line!())
        .with_reporter(recorder.clone())
        .run(|ctx| {
            section!(ctx, "outer", {
                section!(ctx, "first", {
                    require!(ctx, false);
                });
                section!(ctx, "second", {});
                section!(ctx, "third", {});
            });
        })?;

    assert_eq!(
        run_paths(&report),
        ["outer / first", "outer / second", "outer / third"]
    );
    assert_eq!(statuses(&report), ["aborted", "passed", "passed"]);
    assert_eq!(
        recorder.events().get(..7),
        Some(
            &[
                "scenario siblings",
                "run 1",
                "enter outer",
                "enter outer / first",
                "require failed",
                "fail outer / first",
                "fail outer",
            ]
            .map(String::from)[..]
        )
    );
    assert_eq!(
        recorder.entered(),
        [
            "outer",
            "outer / first",
            "outer",
            "outer / second",
            "outer",
            "outer / third"
        ]
    );
    Ok(())
}

#[test]
fn failure_outside_sections_stops_exploration() -> Result<(), ScenarioError> {
    let mut runs = 0;
    let report = Scenario::new("top level failure", file!(), line!()).run(|ctx| {
        runs += 1;
        section!(ctx, "before", {});
        fail!(ctx, "setup is broken");
        section!(ctx, "after", {});
    })?;

    assert_eq!(runs, 1);
    assert_eq!(statuses(&report), ["aborted"]);
    let Some(failure) = report.failures().next() else {
        panic!("fail! records a failure");
    };
    assert_eq!(failure.message(), Some("setup is broken"));
    assert!(failure.section().is_empty());
    Ok(())
}

#[test]
fn panics_inside_sections_are_contained() -> Result<(), ScenarioError> {
    let report = Scenario::new("panics", file!(), line!()).run(|ctx| {
        section!(ctx, "indexing", {
            panic!("index out of range");
        });
        section!(ctx, "fine", {});
    })?;

    assert_eq!(statuses(&report), ["aborted", "passed"]);
    let Some(failure) = report.failures().next() else {
        panic!("the panic is recorded");
    };
    assert_eq!(failure.macro_name(), "unexpected panic");
    assert_eq!(failure.message(), Some("index out of range"));
    assert_eq!(failure.section().to_string(), "indexing");
    Ok(())
}

#[test]
fn renamed_section_is_an_unstable_tree() {
    let mut run = 0;
    let outcome = Scenario::new("renamed", file!(), line!()).run(|ctx| {
        run += 1;
        section!(ctx, "stable", {});
        section!(ctx, format!("moving {run}"), {});
    });

    let Err(ScenarioError::Tracker {
        runs,
        source:
            TrackerError::UnstableTree {
                parent,
                expected,
                found,
            },
        ..
    }) = &outcome
    else {
        panic!("a renamed section must stop the scenario, got {outcome:?}");
    };
    assert_eq!(*runs, 2);
    assert!(parent.is_empty());
    assert_eq!(expected.name(), "moving 1");
    assert_eq!(found.as_ref().map(|key| key.name()), Some("moving 2"));
}

#[rstest]
#[case::caught_by_the_body(true)]
#[case::left_to_unwind(false)]
fn vanished_section_is_an_unstable_tree(#[case] catch: bool) {
    let mut run = 0;
    let outcome = Scenario::new("vanished", file!(), line!()).run(|ctx| {
        run += 1;
        let body = || {
            section!(ctx, "always", {});
            if run == 1 {
                section!(ctx, "only once", {});
            }
            section!(ctx, format!("late {run}"), {});
        };
        if catch {
            let _ = panic::catch_unwind(AssertUnwindSafe(body));
        } else {
            body();
        }
    });

    let Err(ScenarioError::Tracker { source, .. }) = &outcome else {
        panic!("a vanished section must stop the scenario, got {outcome:?}");
    };
    let TrackerError::UnstableTree {
        expected, found, ..
    } = source
    else {
        panic!("unexpected tracker error {source}");
    };
    assert_eq!(expected.name(), "only once");
    assert_eq!(found.as_ref().map(|key| key.name()), Some("late 2"));
}

#[test]
fn errors_render_with_the_scenario_name() {
    let outcome = Scenario::new("render", file!(), line!())
        .run(|ctx| {
            section!(ctx, "a", {
                require!(ctx, 1 > 2);
            });
        })
        .and_then(ScenarioReport::ensure_passed);

    let Err(error) = outcome else {
        panic!("the failed requirement must surface");
    };
    let rendered = error.to_string();
    assert!(rendered.starts_with("scenario 'render' failed in 1 run(s):\nrun 1 at 'a':"));
    assert!(rendered.contains("  require(1 > 2) failed at"));
}
