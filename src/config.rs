use std::env;

use chrono::NaiveDate;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly and helpful salon booking assistant named 'Glossy'. \
The current date is August 27, 2025. The salon's available services are: Men's Haircut. \
The only available staff member is Sarah.";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub verify_token: String,
    pub meta_access_token: String,
    pub phone_number_id: String,
    pub whatsapp_api_version: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub completion_timeout_secs: u64,
    /// Every booking lands on this date; the model only supplies a time of day.
    pub booking_date: NaiveDate,
    pub system_prompt: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "glossy.db".to_string()),
            verify_token: env::var("META_VERIFY_TOKEN").unwrap_or_default(),
            meta_access_token: env::var("META_ACCESS_TOKEN").unwrap_or_default(),
            phone_number_id: env::var("PHONE_NUMBER_ID").unwrap_or_default(),
            whatsapp_api_version: env::var("WHATSAPP_API_VERSION")
                .unwrap_or_else(|_| "v19.0".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            completion_timeout_secs: env::var("COMPLETION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            booking_date: env::var("BOOKING_DATE")
                .ok()
                .and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok())
                .unwrap_or_else(default_booking_date),
            system_prompt: env::var("SYSTEM_PROMPT")
                .unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}

pub fn default_booking_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 29).unwrap_or_default()
}
