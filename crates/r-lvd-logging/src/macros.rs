//! ---
//! lvd_section: "03-logging"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Structured logging adapters and sinks."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
//! Context-enriched logging macros.

/// Emit an event at `$level` enriched with a [`LogContext`](crate::LogContext).
#[doc(hidden)]
#[macro_export]
macro_rules! __lvd_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx: &$crate::LogContext = $ctx;
        $crate::__tracing::event!(
            $level,
            origin = ctx.origin.unwrap_or(""),
            destination = ctx.destination.unwrap_or(""),
            table = ctx.table.unwrap_or(""),
            policy = ctx.policy.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with circuit context.
#[macro_export]
macro_rules! lvd_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__lvd_event!($crate::__tracing::Level::INFO, &$ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__lvd_event!($crate::__tracing::Level::INFO, &$crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with circuit context.
#[macro_export]
macro_rules! lvd_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__lvd_event!($crate::__tracing::Level::DEBUG, &$ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__lvd_event!($crate::__tracing::Level::DEBUG, &$crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning enriched with circuit context.
#[macro_export]
macro_rules! lvd_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__lvd_event!($crate::__tracing::Level::WARN, &$ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__lvd_event!($crate::__tracing::Level::WARN, &$crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with circuit context.
#[macro_export]
macro_rules! lvd_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__lvd_event!($crate::__tracing::Level::ERROR, &$ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__lvd_event!($crate::__tracing::Level::ERROR, &$crate::LogContext::default(), $($arg)+)
    };
}
