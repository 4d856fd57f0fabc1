//! Helpers for rendering panic payloads.

use std::any::Any;

use crate::assertion::RequireFailure;
use crate::tracker::TrackerAbort;

/// Extracts a panic payload into a human-readable message.
///
/// Attempts to downcast common primitives and the crate's own unwind payloads
/// before falling back to an opaque description that includes the payload
/// [`TypeId`](std::any::TypeId).
///
/// # Examples
/// ```
/// use sectree::panic_message;
///
/// let Err(err) = std::panic::catch_unwind(|| panic!("boom")) else {
///     unreachable!("the closure panics");
/// };
/// assert_eq!(panic_message(err.as_ref()), "boom");
/// ```
#[must_use]
pub fn panic_message(e: &(dyn Any + Send)) -> String {
    macro_rules! try_downcast {
        ($($ty:ty),* $(,)?) => {
            $(
                if let Some(val) = e.downcast_ref::<$ty>() {
                    return val.to_string();
                }
            )*
        };
    }

    try_downcast!(&str, String, i32, u32, i64, u64, isize, usize, f32, f64);
    if let Some(failure) = e.downcast_ref::<RequireFailure>() {
        return failure.to_string();
    }
    if let Some(TrackerAbort(error)) = e.downcast_ref::<TrackerAbort>() {
        return error.to_string();
    }
    format!(
        "erased `Any` payload (TypeId({:?}); panic with Display/Debug data for detail)",
        e.type_id()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Box::new("literal"), "literal")]
    #[case(Box::new(String::from("owned")), "owned")]
    #[case(Box::new(42_u32), "42")]
    fn primitive_payloads_are_rendered(
        #[case] payload: Box<dyn Any + Send>,
        #[case] expected: &str,
    ) {
        assert_eq!(panic_message(payload.as_ref()), expected);
    }

    #[test]
    fn opaque_payloads_mention_type_id() {
        struct Opaque;
        let payload: Box<dyn Any + Send> = Box::new(Opaque);
        assert!(panic_message(payload.as_ref()).starts_with("erased `Any` payload"));
    }
}
