//! Boundary logging macros
//!
//! Each tracked mutation logs a `start` event, then exactly one of `end` or
//! `end_error`. Extra fields (model, document id, revision) pass through as
//! tracing field syntax. Callers need no direct dependency on `tracing` or
//! `revtrail-core-types`.

/// Log the start of a tracked operation
///
/// # Example
///
/// ```
/// # use revtrail_core::log_op_start;
/// log_op_start!("tracked_update");
/// log_op_start!("tracked_update", model = "User", document_id = "7");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__log_schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__log_schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of a tracked operation
///
/// # Example
///
/// ```
/// # use revtrail_core::log_op_end;
/// log_op_end!("tracked_update", duration_ms = 3u64, revision = 4i64);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__log_schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__log_schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log a failed tracked operation
///
/// Takes anything convertible into `ExError`. The error's model, document id
/// and revision context are logged as `err_model`, `err_document_id` and
/// `err_revision` when present.
///
/// # Example
///
/// ```
/// # use revtrail_core::{log_op_error, TrailError};
/// let err = TrailError::MissingActor {
///     model: "User".to_string(),
///     document_id: "7".to_string(),
/// };
/// log_op_error!("tracked_update", err, duration_ms = 1u64);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {
        $crate::log_op_error!($op, $err, duration_ms = $duration,)
    };
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::__log_schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_model = ex_err.model(),
            err_document_id = ex_err.document_id(),
            err_revision = ex_err.revision(),
            $($field)*
        );
    }};
}
