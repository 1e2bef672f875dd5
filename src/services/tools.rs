use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::errors::ToolError;
use crate::models::ConversationContext;
use crate::services::booking::BookingBackend;

/// Tool result used when a tool fails unexpectedly.
pub const TOOL_FAILURE_REPLY: &str =
    "Sorry, I encountered an unexpected error while handling that request.";

/// Every tool the assistant may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    GetAvailableSlots,
    BookAppointment,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::GetAvailableSlots, Tool::BookAppointment];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::GetAvailableSlots => "get_available_slots",
            Tool::BookAppointment => "book_appointment",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn definition(&self) -> ToolDefinition {
        match self {
            Tool::GetAvailableSlots => ToolDefinition {
                name: self.name(),
                description: "Get a list of available appointment time slots for a specific service, staff member, and date.",
                parameters: vec![
                    ParameterSpec::string("service_name", "The name of the service, e.g., 'Men's Haircut'"),
                    ParameterSpec::string("staff_name", "The name of the staff member, e.g., 'Sarah'"),
                    ParameterSpec::string(
                        "date_str",
                        "The desired date for the appointment, e.g., 'this Friday' or '2025-08-29'",
                    ),
                ],
            },
            Tool::BookAppointment => ToolDefinition {
                name: self.name(),
                description: "Book an appointment for a customer.",
                parameters: vec![
                    ParameterSpec::string("customer_phone", "The customer's phone number."),
                    ParameterSpec::string("service_name", "The name of the service to book."),
                    ParameterSpec::string(
                        "staff_name",
                        "The name of the staff member for the appointment.",
                    ),
                    ParameterSpec::string(
                        "appointment_time_str",
                        "The specific time for the appointment, e.g., '3:00 PM'",
                    ),
                ],
            },
        }
    }

    /// Parses the model's argument text into typed arguments.
    ///
    /// `book_appointment` always acts for the caller: whatever the model put
    /// under `customer_phone` is replaced with the conversation id.
    pub fn parse_arguments(
        &self,
        raw: &str,
        ctx: &ConversationContext,
    ) -> Result<ToolInvocation, ToolError> {
        let mut args: Map<String, Value> =
            serde_json::from_str(raw).map_err(|source| self.invalid(source))?;

        match self {
            Tool::GetAvailableSlots => self
                .typed(args)
                .map(ToolInvocation::GetAvailableSlots),
            Tool::BookAppointment => {
                args.insert(
                    "customer_phone".to_string(),
                    Value::String(ctx.conversation_id.clone()),
                );
                self.typed(args).map(ToolInvocation::BookAppointment)
            }
        }
    }

    fn typed<T: DeserializeOwned>(&self, args: Map<String, Value>) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(args)).map_err(|source| self.invalid(source))
    }

    fn invalid(&self, source: serde_json::Error) -> ToolError {
        ToolError::InvalidArguments {
            tool: self.name(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: &'static str,
    pub description: &'static str,
    pub required: bool,
}

impl ParameterSpec {
    fn string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: "string",
            description,
            required: true,
        }
    }
}

/// Schema of one tool as offered to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParameterSpec>,
}

impl ToolDefinition {
    /// The chat-completions `tools[]` entry.
    pub fn to_json(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.to_string(),
                    json!({ "type": p.kind, "description": p.description }),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                },
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetAvailableSlotsArgs {
    pub service_name: String,
    pub staff_name: String,
    pub date_str: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookAppointmentArgs {
    pub customer_phone: String,
    pub service_name: String,
    pub staff_name: String,
    pub appointment_time_str: String,
}

/// A resolved tool together with its validated arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    GetAvailableSlots(GetAvailableSlotsArgs),
    BookAppointment(BookAppointmentArgs),
}

impl ToolInvocation {
    pub async fn execute(&self, backend: &dyn BookingBackend) -> anyhow::Result<String> {
        match self {
            ToolInvocation::GetAvailableSlots(args) => {
                let slots = backend.get_available_slots(args).await?;
                Ok(serde_json::to_string(&slots)?)
            }
            ToolInvocation::BookAppointment(args) => backend.book_appointment(args).await,
        }
    }
}

/// Fixed set of tool definitions, built once at startup.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            definitions: Tool::ALL.iter().map(Tool::definition).collect(),
        }
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn resolve(&self, name: &str) -> Result<Tool, ToolError> {
        Tool::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ConversationContext {
        ConversationContext::new("15551234567")
    }

    #[test]
    fn test_resolve_known_and_unknown() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.resolve("book_appointment").unwrap(), Tool::BookAppointment);
        assert_eq!(
            registry.resolve("get_available_slots").unwrap(),
            Tool::GetAvailableSlots
        );
        assert!(matches!(
            registry.resolve("cancel_appointment"),
            Err(ToolError::UnknownTool(name)) if name == "cancel_appointment"
        ));
    }

    #[test]
    fn test_definitions_json_shape() {
        let registry = ToolRegistry::new();
        let defs: Vec<Value> = registry.definitions().iter().map(|d| d.to_json()).collect();
        assert_eq!(defs.len(), 2);

        let book = &defs[1];
        assert_eq!(book["type"], "function");
        assert_eq!(book["function"]["name"], "book_appointment");
        assert_eq!(book["function"]["parameters"]["type"], "object");
        assert_eq!(
            book["function"]["parameters"]["properties"]["appointment_time_str"]["type"],
            "string"
        );
        assert_eq!(
            book["function"]["parameters"]["required"],
            json!(["customer_phone", "service_name", "staff_name", "appointment_time_str"])
        );
    }

    #[test]
    fn test_book_appointment_injects_caller_phone() {
        let raw = r#"{"service_name":"Men's Haircut","staff_name":"Sarah","appointment_time_str":"3:00 PM"}"#;
        let invocation = Tool::BookAppointment.parse_arguments(raw, &ctx()).unwrap();
        match invocation {
            ToolInvocation::BookAppointment(args) => {
                assert_eq!(args.customer_phone, "15551234567");
                assert_eq!(args.service_name, "Men's Haircut");
                assert_eq!(args.appointment_time_str, "3:00 PM");
            }
            other => panic!("unexpected invocation: {other:?}"),
        }
    }

    #[test]
    fn test_book_appointment_overrides_model_phone() {
        let raw = r#"{"customer_phone":"19998887777","service_name":"Men's Haircut","staff_name":"Sarah","appointment_time_str":"3:00 PM"}"#;
        let invocation = Tool::BookAppointment.parse_arguments(raw, &ctx()).unwrap();
        let ToolInvocation::BookAppointment(args) = invocation else {
            panic!("expected book_appointment");
        };
        assert_eq!(args.customer_phone, "15551234567");
    }

    #[test]
    fn test_get_available_slots_args() {
        let raw = r#"{"service_name":"Men's Haircut","staff_name":"Sarah","date_str":"2025-08-29"}"#;
        let invocation = Tool::GetAvailableSlots.parse_arguments(raw, &ctx()).unwrap();
        assert_eq!(
            invocation,
            ToolInvocation::GetAvailableSlots(GetAvailableSlotsArgs {
                service_name: "Men's Haircut".to_string(),
                staff_name: "Sarah".to_string(),
                date_str: "2025-08-29".to_string(),
            })
        );
    }

    #[test]
    fn test_malformed_arguments() {
        let err = Tool::GetAvailableSlots
            .parse_arguments("{not json", &ctx())
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { tool: "get_available_slots", .. }));

        // Valid JSON but missing a required field
        let err = Tool::BookAppointment
            .parse_arguments(r#"{"service_name":"Men's Haircut"}"#, &ctx())
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { tool: "book_appointment", .. }));

        // Not an object
        assert!(Tool::BookAppointment.parse_arguments("[]", &ctx()).is_err());
    }
}
