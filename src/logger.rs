use tracing::info;

/// Receives lifecycle events of components: `building`, `initialized` and `done`,
/// plus failures of done hooks, which are never propagated.
pub trait Logger: Send + Sync {
    fn log(&self, component: &str, message: &str);
}

/// Discards every event. Used when no logger is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    #[inline]
    fn log(&self, _component: &str, _message: &str) {}
}

/// Forwards events to [`tracing`] at `INFO` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    #[inline]
    fn log(&self, component: &str, message: &str) {
        info!(component, "{message}");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{Logger, TracingLogger};

    use parking_lot::Mutex;
    use tracing_test::traced_test;

    /// Keeps every event as `"<component>: <message>"`.
    #[derive(Default)]
    pub(crate) struct RecordingLogger {
        pub(crate) events: Mutex<Vec<String>>,
    }

    impl RecordingLogger {
        pub(crate) fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    impl Logger for RecordingLogger {
        fn log(&self, component: &str, message: &str) {
            self.events.lock().push(format!("{component}: {message}"));
        }
    }

    #[test]
    fn test_recording() {
        let logger = RecordingLogger::default();
        logger.log("Events", "building");
        logger.log("Events", "initialized");

        assert_eq!(logger.events(), ["Events: building".to_string(), "Events: initialized".to_string()]);
    }

    #[test]
    #[traced_test]
    fn test_tracing_logger() {
        TracingLogger.log("Events", "initialized");

        assert!(logs_contain("initialized"));
        assert!(logs_contain("Events"));
    }
}
