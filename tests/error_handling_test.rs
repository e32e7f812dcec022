#[cfg(test)]
mod tests {
    use crate::error::{ErrorKind, PlanError, ValidationError};

    #[test]
    fn test_error_creation() {
        let error = PlanError::stage_failed("Test error", "test_stage");
        assert_eq!(error.message, "Test error");
        assert_eq!(error.stage, "test_stage");
        assert_eq!(error.kind, ErrorKind::PipelineStage);
    }

    #[test]
    fn test_error_with_context() {
        let error = PlanError::persistence("Test error")
            .with_context("Additional context");
        assert!(error.context.is_some());
        assert_eq!(error.context.unwrap(), "Additional context");
    }

    #[test]
    fn test_error_with_stage() {
        let error = PlanError::upstream("Test error").with_stage("taskGenerator");
        assert_eq!(error.stage, "taskGenerator");
        assert_eq!(error.kind, ErrorKind::UpstreamContent);
    }

    #[test]
    fn test_error_display() {
        let error = PlanError::validation("Test error")
            .with_context("context")
            .with_source("source");
        let display = format!("{}", error);
        assert!(display.contains("validation"));
        assert!(display.contains("Test error"));
        assert!(display.contains("context"));
    }

    #[test]
    fn test_validation_error_conversion() {
        let error: PlanError = ValidationError::Energy(9).into();
        assert_eq!(error.kind, ErrorKind::Validation);
        assert!(error.message.contains("energy 9"));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(PlanError::persistence("disk").is_retryable());
        assert!(PlanError::upstream("down").is_retryable());
        assert!(!PlanError::not_found("gone").is_retryable());
        assert!(!PlanError::stage_failed("bad", "planner").is_retryable());
    }

    #[test]
    fn test_io_error_is_persistence() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let error: PlanError = io.into();
        assert_eq!(error.kind, ErrorKind::Persistence);
        assert_eq!(error.source.as_deref(), Some("std::io"));
    }

    #[test]
    fn test_error_serializes_kind() {
        let error = PlanError::not_found("job 'x' not found");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["kind"], "not_found");
    }
}
