//! Declarative macros for sections, scenarios and assertions.
//!
//! Every macro takes the scenario context as its first argument, usually the
//! `ctx` parameter of the scenario body, and captures `file!()`/`line!()` of
//! the invocation as the source location.

/// Declare a scenario as a `#[test]` function and register it.
///
/// The generated test runs the body once per leaf path and panics with a
/// summary when any run failed.
///
/// # Examples
///
/// ```
/// use sectree::{given, require, scenario, then};
///
/// scenario!(fn counts_up, "counting", "[docs]", |ctx| {
///     given!(ctx, "a counter", {
///         let mut n = 0;
///         then!(ctx, "it increments", {
///             n += 1;
///             require!(ctx, n == 1);
///         });
///     });
/// });
/// # fn main() {}
/// ```
#[macro_export]
macro_rules! scenario {
    (
        $(#[$meta:meta])*
        fn $test:ident, $name:literal, $tags:literal,
        fixture = $init:expr, |$ctx:ident, $fixture:ident| $body:block
    ) => {
        $crate::register_scenario!($name, $tags, file!(), line!());

        $(#[$meta])*
        #[test]
        fn $test() {
            $crate::scenario::run_declared_with_fixture(
                $name,
                $tags,
                file!(),
                line!(),
                $init,
                |$ctx: &$crate::ScenarioContext, $fixture: &mut _| $body,
            );
        }
    };
    (
        $(#[$meta:meta])*
        fn $test:ident, $name:literal, $tags:literal, |$ctx:ident| $body:block
    ) => {
        $crate::register_scenario!($name, $tags, file!(), line!());

        $(#[$meta])*
        #[test]
        fn $test() {
            $crate::scenario::run_declared(
                $name,
                $tags,
                file!(),
                line!(),
                |$ctx: &$crate::ScenarioContext| $body,
            );
        }
    };
    (
        $(#[$meta:meta])*
        fn $test:ident, $name:literal, |$ctx:ident| $body:block
    ) => {
        $crate::scenario!($(#[$meta])* fn $test, $name, "", |$ctx| $body);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __sectree_section {
    ($ctx:expr, $kind:ident, $name:expr, $body:block) => {
        if let ::core::option::Option::Some(_sectree_guard) = $ctx.section(
            $crate::SectionKind::$kind,
            ::core::convert::AsRef::<str>::as_ref(&$name),
            $crate::SectionLocation::new(file!(), line!()),
        ) {
            $body
        }
    };
}

/// Run `body` as a plain named section.
///
/// # Examples
///
/// ```
/// use sectree::{section, Scenario};
///
/// let mut seen = Vec::new();
/// Scenario::new("plain sections", file!(), line!()).run(|ctx| {
///     section!(ctx, "first", { seen.push(1) });
///     section!(ctx, "second", { seen.push(2) });
/// })?;
/// assert_eq!(seen, [1, 2]);
/// # Ok::<(), sectree::ScenarioError>(())
/// ```
#[macro_export]
macro_rules! section {
    ($ctx:expr, $name:expr, $body:block) => {
        $crate::__sectree_section!($ctx, Section, $name, $body)
    };
}

/// Run `body` as a `Given` section.
#[macro_export]
macro_rules! given {
    ($ctx:expr, $name:expr, $body:block) => {
        $crate::__sectree_section!($ctx, Given, $name, $body)
    };
}

/// Run `body` as an `And given` section, nested in a `Given`.
#[macro_export]
macro_rules! and_given {
    ($ctx:expr, $name:expr, $body:block) => {
        $crate::__sectree_section!($ctx, AndGiven, $name, $body)
    };
}

/// Run `body` as a `When` section.
#[macro_export]
macro_rules! when {
    ($ctx:expr, $name:expr, $body:block) => {
        $crate::__sectree_section!($ctx, When, $name, $body)
    };
}

/// Run `body` as an `And when` section, nested in a `When`.
#[macro_export]
macro_rules! and_when {
    ($ctx:expr, $name:expr, $body:block) => {
        $crate::__sectree_section!($ctx, AndWhen, $name, $body)
    };
}

/// Run `body` as a `Then` section.
#[macro_export]
macro_rules! then {
    ($ctx:expr, $name:expr, $body:block) => {
        $crate::__sectree_section!($ctx, Then, $name, $body)
    };
}

/// Run `body` as an `And` section following a `Then`.
#[macro_export]
macro_rules! and_then {
    ($ctx:expr, $name:expr, $body:block) => {
        $crate::__sectree_section!($ctx, AndThen, $name, $body)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __sectree_combinator {
    ($ctx:expr, $kind:ident, $name:expr, $assertion:ident, $($args:tt)+) => {
        $crate::__sectree_section!($ctx, $kind, $name, {
            $crate::$assertion!($ctx, $($args)+);
        })
    };
}

/// A `Then` section holding a single [`require!`](crate::require!).
///
/// The other `then_*` and `and_*` macros follow the same shape: a section
/// named `$name` wrapping the assertion of the same suffix.
///
/// # Examples
///
/// ```
/// use sectree::{given, then_require, Scenario};
///
/// let report = Scenario::new("combinators", file!(), line!()).run(|ctx| {
///     given!(ctx, "an empty vector", {
///         let v: Vec<u8> = Vec::new();
///         then_require!(ctx, "it is empty", v.is_empty());
///     });
/// })?;
/// assert!(report.passed());
/// # Ok::<(), sectree::ScenarioError>(())
/// ```
#[macro_export]
macro_rules! then_require {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, Then, $name, require, $($args)+)
    };
}

/// A `Then` section holding a single [`require_false!`](crate::require_false!).
#[macro_export]
macro_rules! then_require_false {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, Then, $name, require_false, $($args)+)
    };
}

/// A `Then` section holding a single [`require_panics!`](crate::require_panics!).
#[macro_export]
macro_rules! then_require_panics {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, Then, $name, require_panics, $($args)+)
    };
}

/// A `Then` section holding a single [`require_panics_as!`](crate::require_panics_as!).
#[macro_export]
macro_rules! then_require_panics_as {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, Then, $name, require_panics_as, $($args)+)
    };
}

/// A `Then` section holding a single [`require_no_panic!`](crate::require_no_panic!).
#[macro_export]
macro_rules! then_require_no_panic {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, Then, $name, require_no_panic, $($args)+)
    };
}

/// A `Then` section holding a single [`static_require!`](crate::static_require!).
#[macro_export]
macro_rules! then_static_require {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, Then, $name, static_require, $($args)+)
    };
}

/// A `Then` section holding a single [`static_require_false!`](crate::static_require_false!).
#[macro_export]
macro_rules! then_static_require_false {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, Then, $name, static_require_false, $($args)+)
    };
}

/// A `Then` section holding a single [`check!`](crate::check!).
#[macro_export]
macro_rules! then_check {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, Then, $name, check, $($args)+)
    };
}

/// A `Then` section holding a single [`check_false!`](crate::check_false!).
#[macro_export]
macro_rules! then_check_false {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, Then, $name, check_false, $($args)+)
    };
}

/// A `Then` section holding a single [`check_nofail!`](crate::check_nofail!).
#[macro_export]
macro_rules! then_check_nofail {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, Then, $name, check_nofail, $($args)+)
    };
}

/// A `Then` section holding a single [`check_panics!`](crate::check_panics!).
#[macro_export]
macro_rules! then_check_panics {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, Then, $name, check_panics, $($args)+)
    };
}

/// A `Then` section holding a single [`check_panics_as!`](crate::check_panics_as!).
#[macro_export]
macro_rules! then_check_panics_as {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, Then, $name, check_panics_as, $($args)+)
    };
}

/// A `Then` section holding a single [`check_no_panic!`](crate::check_no_panic!).
#[macro_export]
macro_rules! then_check_no_panic {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, Then, $name, check_no_panic, $($args)+)
    };
}

/// An `And` section holding a single [`require!`](crate::require!).
#[macro_export]
macro_rules! and_require {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, AndThen, $name, require, $($args)+)
    };
}

/// An `And` section holding a single [`require_false!`](crate::require_false!).
#[macro_export]
macro_rules! and_require_false {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, AndThen, $name, require_false, $($args)+)
    };
}

/// An `And` section holding a single [`require_panics!`](crate::require_panics!).
#[macro_export]
macro_rules! and_require_panics {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, AndThen, $name, require_panics, $($args)+)
    };
}

/// An `And` section holding a single [`require_panics_as!`](crate::require_panics_as!).
#[macro_export]
macro_rules! and_require_panics_as {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, AndThen, $name, require_panics_as, $($args)+)
    };
}

/// An `And` section holding a single [`require_no_panic!`](crate::require_no_panic!).
#[macro_export]
macro_rules! and_require_no_panic {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, AndThen, $name, require_no_panic, $($args)+)
    };
}

/// An `And` section holding a single [`static_require!`](crate::static_require!).
#[macro_export]
macro_rules! and_static_require {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, AndThen, $name, static_require, $($args)+)
    };
}

/// An `And` section holding a single [`static_require_false!`](crate::static_require_false!).
#[macro_export]
macro_rules! and_static_require_false {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, AndThen, $name, static_require_false, $($args)+)
    };
}

/// An `And` section holding a single [`check!`](crate::check!).
#[macro_export]
macro_rules! and_check {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, AndThen, $name, check, $($args)+)
    };
}

/// An `And` section holding a single [`check_false!`](crate::check_false!).
#[macro_export]
macro_rules! and_check_false {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, AndThen, $name, check_false, $($args)+)
    };
}

/// An `And` section holding a single [`check_nofail!`](crate::check_nofail!).
#[macro_export]
macro_rules! and_check_nofail {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, AndThen, $name, check_nofail, $($args)+)
    };
}

/// An `And` section holding a single [`check_panics!`](crate::check_panics!).
#[macro_export]
macro_rules! and_check_panics {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, AndThen, $name, check_panics, $($args)+)
    };
}

/// An `And` section holding a single [`check_panics_as!`](crate::check_panics_as!).
#[macro_export]
macro_rules! and_check_panics_as {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, AndThen, $name, check_panics_as, $($args)+)
    };
}

/// An `And` section holding a single [`check_no_panic!`](crate::check_no_panic!).
#[macro_export]
macro_rules! and_check_no_panic {
    ($ctx:expr, $name:expr, $($args:tt)+) => {
        $crate::__sectree_combinator!($ctx, AndThen, $name, check_no_panic, $($args)+)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __sectree_assert {
    ($ctx:expr, $macro_name:literal, $severity:ident, $verdict:expr, $expression:expr) => {
        $ctx.record($crate::assertion::Verdict::into_record(
            $verdict,
            $macro_name,
            $crate::reporting::Severity::$severity,
            $expression,
            $crate::SectionLocation::new(file!(), line!()),
        ))
    };
}

/// Require `cond` to hold; a failure ends the current run.
#[macro_export]
macro_rules! require {
    ($ctx:expr, $cond:expr $(,)?) => {{
        $crate::__sectree_assert!(
            $ctx,
            "require",
            Require,
            $crate::assertion::Verdict::from_bool($cond),
            stringify!($cond)
        );
    }};
}

/// Require `cond` to be false; a failure ends the current run.
#[macro_export]
macro_rules! require_false {
    ($ctx:expr, $cond:expr $(,)?) => {{
        $crate::__sectree_assert!(
            $ctx,
            "require_false",
            Require,
            $crate::assertion::Verdict::from_bool(!($cond)),
            stringify!($cond)
        );
    }};
}

/// Require two values to be equal, reporting both on failure.
#[macro_export]
macro_rules! require_eq {
    ($ctx:expr, $left:expr, $right:expr $(,)?) => {{
        $crate::__sectree_assert!(
            $ctx,
            "require_eq",
            Require,
            $crate::__sectree_eq_verdict!($left, $right),
            concat!(stringify!($left), " == ", stringify!($right))
        );
    }};
}

/// Check `cond`; a failure is recorded and the run continues.
///
/// Evaluates to `true` when the condition held.
#[macro_export]
macro_rules! check {
    ($ctx:expr, $cond:expr $(,)?) => {
        $crate::__sectree_assert!(
            $ctx,
            "check",
            Check,
            $crate::assertion::Verdict::from_bool($cond),
            stringify!($cond)
        )
    };
}

/// Check that `cond` is false; the run continues on failure.
#[macro_export]
macro_rules! check_false {
    ($ctx:expr, $cond:expr $(,)?) => {
        $crate::__sectree_assert!(
            $ctx,
            "check_false",
            Check,
            $crate::assertion::Verdict::from_bool(!($cond)),
            stringify!($cond)
        )
    };
}

/// Check two values for equality; the run continues on failure.
#[macro_export]
macro_rules! check_eq {
    ($ctx:expr, $left:expr, $right:expr $(,)?) => {
        $crate::__sectree_assert!(
            $ctx,
            "check_eq",
            Check,
            $crate::__sectree_eq_verdict!($left, $right),
            concat!(stringify!($left), " == ", stringify!($right))
        )
    };
}

/// Check `cond` without ever failing the scenario.
#[macro_export]
macro_rules! check_nofail {
    ($ctx:expr, $cond:expr $(,)?) => {
        $crate::__sectree_assert!(
            $ctx,
            "check_nofail",
            NoFail,
            $crate::assertion::Verdict::from_bool($cond),
            stringify!($cond)
        )
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __sectree_eq_verdict {
    ($left:expr, $right:expr) => {
        match (&$left, &$right) {
            (left, right) if *left == *right => $crate::assertion::Verdict::pass(),
            (left, right) => {
                $crate::assertion::Verdict::fail(format!("left: {:?}, right: {:?}", left, right))
            }
        }
    };
}

/// Require `expr` to panic.
///
/// # Examples
///
/// ```
/// use sectree::{require_panics, Scenario};
///
/// let report = Scenario::new("out of bounds", file!(), line!()).run(|ctx| {
///     let v: Vec<u8> = Vec::new();
///     require_panics!(ctx, v[3]);
/// })?;
/// assert!(report.passed());
/// # Ok::<(), sectree::ScenarioError>(())
/// ```
#[macro_export]
macro_rules! require_panics {
    ($ctx:expr, $expr:expr $(,)?) => {{
        $crate::__sectree_assert!(
            $ctx,
            "require_panics",
            Require,
            $crate::assertion::panics(|| {
                let _ = $expr;
            }),
            stringify!($expr)
        );
    }};
}

/// Require `expr` to panic with a payload of type `$ty`.
#[macro_export]
macro_rules! require_panics_as {
    ($ctx:expr, $expr:expr, $ty:ty $(,)?) => {{
        $crate::__sectree_assert!(
            $ctx,
            "require_panics_as",
            Require,
            $crate::assertion::panics_as::<$ty, _>(|| {
                let _ = $expr;
            }),
            stringify!($expr)
        );
    }};
}

/// Require `expr` to complete without panicking.
#[macro_export]
macro_rules! require_no_panic {
    ($ctx:expr, $expr:expr $(,)?) => {{
        $crate::__sectree_assert!(
            $ctx,
            "require_no_panic",
            Require,
            $crate::assertion::no_panic(|| {
                let _ = $expr;
            }),
            stringify!($expr)
        );
    }};
}

/// Check that `expr` panics; the run continues on failure.
#[macro_export]
macro_rules! check_panics {
    ($ctx:expr, $expr:expr $(,)?) => {
        $crate::__sectree_assert!(
            $ctx,
            "check_panics",
            Check,
            $crate::assertion::panics(|| {
                let _ = $expr;
            }),
            stringify!($expr)
        )
    };
}

/// Check that `expr` panics with a payload of type `$ty`.
#[macro_export]
macro_rules! check_panics_as {
    ($ctx:expr, $expr:expr, $ty:ty $(,)?) => {
        $crate::__sectree_assert!(
            $ctx,
            "check_panics_as",
            Check,
            $crate::assertion::panics_as::<$ty, _>(|| {
                let _ = $expr;
            }),
            stringify!($expr)
        )
    };
}

/// Check that `expr` completes without panicking.
#[macro_export]
macro_rules! check_no_panic {
    ($ctx:expr, $expr:expr $(,)?) => {
        $crate::__sectree_assert!(
            $ctx,
            "check_no_panic",
            Check,
            $crate::assertion::no_panic(|| {
                let _ = $expr;
            }),
            stringify!($expr)
        )
    };
}

/// Assert `cond` at compile time and record a passing requirement.
///
/// ```compile_fail
/// use sectree::{static_require, Scenario};
///
/// let _ = Scenario::new("sizes", file!(), line!()).run(|ctx| {
///     static_require!(ctx, size_of::<u8>() == 2);
/// });
/// ```
#[macro_export]
macro_rules! static_require {
    ($ctx:expr, $cond:expr $(,)?) => {{
        const {
            ::core::assert!($cond, "static_require failed");
        }
        $crate::__sectree_assert!(
            $ctx,
            "static_require",
            Require,
            $crate::assertion::Verdict::pass(),
            stringify!($cond)
        );
    }};
}

/// Assert at compile time that `cond` is false.
#[macro_export]
macro_rules! static_require_false {
    ($ctx:expr, $cond:expr $(,)?) => {{
        const {
            ::core::assert!(!($cond), "static_require_false failed");
        }
        $crate::__sectree_assert!(
            $ctx,
            "static_require_false",
            Require,
            $crate::assertion::Verdict::pass(),
            stringify!($cond)
        );
    }};
}

/// Record an unconditional success with a message.
#[macro_export]
macro_rules! succeed {
    ($ctx:expr, $message:expr $(,)?) => {{
        $crate::__sectree_assert!(
            $ctx,
            "succeed",
            Require,
            $crate::assertion::Verdict::pass().with_message($message),
            ""
        );
    }};
}

/// Fail the current run unconditionally.
#[macro_export]
macro_rules! fail {
    ($ctx:expr, $message:expr $(,)?) => {{
        $crate::__sectree_assert!(
            $ctx,
            "fail",
            Require,
            $crate::assertion::Verdict::fail($message),
            ""
        );
    }};
}
