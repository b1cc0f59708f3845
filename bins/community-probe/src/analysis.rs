//! Runtime shape inspection of message payloads

use crate::diagnostic::DiagnosticSink;
use serde_json::Value;

/// Field whose shape gets reported
pub const SENDER_FIELD: &str = "sender";

/// Classified shape of a message's sender field
#[derive(Debug, Clone, PartialEq)]
pub enum SenderShape<'a> {
    /// Nested structure (object, or array)
    Object(&'a Value),
    /// Anything else, including an absent field
    Primitive {
        /// Runtime type name
        type_name: &'static str,
        /// Value as it would be printed
        rendered: String,
    },
}

impl<'a> SenderShape<'a> {
    /// Classify the sender field of `message`
    pub fn of_message(message: &'a Value) -> Self {
        Self::classify(message.get(SENDER_FIELD))
    }

    /// Classify a possibly-absent field value
    pub fn classify(field: Option<&'a Value>) -> Self {
        match field {
            Some(v @ (Value::Object(_) | Value::Array(_))) => Self::Object(v),
            other => Self::Primitive {
                type_name: type_name(other),
                rendered: render(other),
            },
        }
    }

    /// The single-line verdict written to the log
    pub fn verdict(&self) -> String {
        match self {
            Self::Object(_) => "Sender is OBJECT.".to_string(),
            Self::Primitive {
                type_name,
                rendered,
            } => format!("Sender is PRIMITIVE: {type_name} = {rendered}"),
        }
    }
}

/// Runtime type name of a JSON value, as JavaScript's `typeof` reports it
///
/// `null` and arrays both report `object`.
pub fn type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Null | Value::Array(_) | Value::Object(_)) => "object",
    }
}

/// Render a value for a log line
///
/// Strings are printed bare, `null` as `null`, structures as compact JSON,
/// and an absent value as `undefined`.
pub fn render(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Indented JSON dump
pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Log the last message of a room and the shape of its sender
pub fn analyze_last_message<S: DiagnosticSink>(log: &mut S, messages: &[Value]) {
    let Some(last) = messages.last() else {
        log.line("No messages in this room to analyze.");
        return;
    };

    log.line("\n--- SAMPLE MESSAGE JSON ---");
    log.line(&pretty(last));

    log.line("\n--- SENDER TYPE ANALYSIS ---");
    let shape = SenderShape::of_message(last);
    log.line(&shape.verdict());
    if let SenderShape::Object(sender) = shape {
        log.line(&sender.to_string());
    }
}
