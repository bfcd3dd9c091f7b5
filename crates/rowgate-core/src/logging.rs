//! Internal logging helpers for structured Rowgate events.

/// Single logging target for Rowgate.
pub(crate) const LOG_TARGET: &str = "rowgate";

macro_rules! rowgate_log {
    ($level:expr, $event:expr, $fmt:expr $(, $args:expr)* $(,)?) => {{
        if log::log_enabled!(target: crate::logging::LOG_TARGET, $level) {
            log::log!(
                target: crate::logging::LOG_TARGET,
                $level,
                "event={} {}",
                $event,
                format_args!($fmt $(, $args)*)
            );
        }
    }};
}
