// Chat message payload, edited in place as a request progresses
use chrono::{DateTime, Utc};

pub const PLACEHOLDER_TITLE: &str = "Directions";
pub const PLACEHOLDER_DESCRIPTION: &str = "Fetching directions from server (may take up to 30 sec.)";
pub const FOOTER: &str = "Powered by MapKit";

pub const ORIGIN_FIELD: &str = "Origin";
pub const DESTINATION_FIELD: &str = "Destination";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadColor {
    Default,
    Red,
}

impl PayloadColor {
    pub fn rgb(&self) -> Option<u32> {
        match self {
            PayloadColor::Default => None,
            PayloadColor::Red => Some(0xED_42_45),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayloadField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayPayload {
    pub title: String,
    pub description: String,
    pub color: PayloadColor,
    pub fields: Vec<PayloadField>,
    pub image_url: Option<String>,
    pub footer: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl DisplayPayload {
    /// The reply posted before any provider call is made.
    pub fn placeholder(origin: &str, destination: &str) -> Self {
        let mut payload = Self {
            title: PLACEHOLDER_TITLE.to_string(),
            description: PLACEHOLDER_DESCRIPTION.to_string(),
            color: PayloadColor::Default,
            fields: Vec::new(),
            image_url: None,
            footer: None,
            timestamp: None,
        };
        payload.add_field(ORIGIN_FIELD, title_case(origin), false);
        payload.add_field(DESTINATION_FIELD, title_case(destination), false);
        payload
    }

    pub fn add_field(&mut self, name: &str, value: impl Into<String>, inline: bool) {
        self.fields.push(PayloadField {
            name: name.to_string(),
            value: value.into(),
            inline,
        });
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Switch to the error state; `message` must already be redacted.
    pub fn set_error(&mut self, message: &str) {
        self.description = format!("Error occured! {}", message);
        self.color = PayloadColor::Red;
    }
}

/// "new YORK city" -> "New York City"
pub fn title_case(text: &str) -> String {
    text.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
