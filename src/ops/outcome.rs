use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result envelope returned by every helper operation.
///
/// `success == false` always comes with either `error` or `guard`; `success == true` never
/// carries an `error`. Errors leaving an operation end with `": <selector>"` exactly once
/// when the operation was addressed by a query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Outcome {
    /// Whether the operation (or check) succeeded
    pub success: bool,

    /// Failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Operation payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Description of the check, reported when it does not hold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,

    #[serde(skip)]
    annotated: bool,
}

impl Outcome {
    /// Plain success
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            result: None,
            guard: None,
            annotated: false,
        }
    }

    /// Success carrying a payload
    pub fn value(result: Value) -> Self {
        Self {
            result: Some(result),
            ..Self::ok()
        }
    }

    /// Failure with a message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Self::ok()
        }
    }

    /// Outcome of a check. `None` collapses to plain success; otherwise the flag is
    /// carried along with the guard description.
    pub fn flag(passed: Option<bool>, guard: impl Into<String>) -> Self {
        match passed {
            None => Self::ok(),
            Some(passed) => Self {
                success: passed,
                guard: Some(guard.into()),
                ..Self::ok()
            },
        }
    }

    pub fn check(passed: bool, guard: impl Into<String>) -> Self {
        Self::flag(Some(passed), guard)
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Failure message: the error, or the guard of a failed check
    pub fn failure(&self) -> Option<&str> {
        if self.success {
            return None;
        }
        self.error.as_deref().or(self.guard.as_deref())
    }

    /// Payload, with `null` standing in for a missing one
    pub fn result_or_null(&self) -> Value {
        self.result.clone().unwrap_or(Value::Null)
    }

    /// A failed check turned into an error carrying the guard text
    pub(crate) fn into_error(self) -> Self {
        if self.error.is_some() {
            return self;
        }
        Self {
            annotated: self.annotated,
            ..Self::error(self.guard.unwrap_or_default())
        }
    }

    /// Append `": <selector>"` to the error, once. Node selectors pass `None` and leave the
    /// error for the outermost string selector to annotate.
    pub(crate) fn annotate(mut self, selector: Option<&str>) -> Self {
        if self.annotated {
            return self;
        }
        if let (Some(error), Some(selector)) = (self.error.as_mut(), selector) {
            error.push_str(": ");
            error.push_str(selector);
            self.annotated = true;
        }
        self
    }

    /// Mark an error as final so no selector is appended to it
    pub(crate) fn sealed(mut self) -> Self {
        self.annotated = true;
        self
    }
}

impl From<crate::ProbeError> for Outcome {
    fn from(err: crate::ProbeError) -> Self {
        log::debug!("operation failed: {}", err.detail());
        Outcome::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialization_omits_absent_fields() {
        assert_eq!(serde_json::to_value(Outcome::ok()).unwrap(), json!({"success": true}));
        assert_eq!(
            serde_json::to_value(Outcome::value(json!(3))).unwrap(),
            json!({"success": true, "result": 3})
        );
        assert_eq!(
            serde_json::to_value(Outcome::check(false, "DOM element is not visible")).unwrap(),
            json!({"success": false, "guard": "DOM element is not visible"})
        );
    }

    #[test]
    fn test_flag_none_collapses_to_success() {
        let outcome = Outcome::flag(None, "ignored");
        assert!(outcome.success);
        assert_eq!(outcome.guard, None);
    }

    #[test]
    fn test_annotate_once() {
        let outcome = Outcome::error("boom").annotate(Some("#a")).annotate(Some("#b"));
        assert_eq!(outcome.error.as_deref(), Some("boom: #a"));
    }

    #[test]
    fn test_node_selectors_leave_annotation_to_outer_call() {
        let outcome = Outcome::error("boom").annotate(None).annotate(Some(".outer"));
        assert_eq!(outcome.error.as_deref(), Some("boom: .outer"));
    }

    #[test]
    fn test_success_is_never_annotated() {
        let outcome = Outcome::ok().annotate(Some("#a"));
        assert_eq!(outcome, Outcome::ok());
    }

    #[test]
    fn test_into_error_uses_guard() {
        let outcome = Outcome::check(false, "DOM element is not enabled").into_error();
        assert_eq!(outcome.failure(), Some("DOM element is not enabled"));
        assert!(outcome.error.is_some());
    }

    #[test]
    fn test_sealed_errors_are_not_annotated() {
        let outcome = Outcome::error("'//[' is not a valid XPath expression")
            .sealed()
            .annotate(Some("//["));
        assert_eq!(outcome.error.as_deref(), Some("'//[' is not a valid XPath expression"));
    }
}
