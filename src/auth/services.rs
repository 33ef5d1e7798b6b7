use base64ct::{Base64Url, Encoding};
use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use time::{macros::format_description, Date};

use crate::auth::dto::OnboardingRequest;
use crate::auth::repo_types::Onboarding;

const GENDERS: &[&str] = &["male", "female", "other"];
const HEALTH_GOALS: &[&str] = &[
    "weight_loss",
    "muscle_gain",
    "improve_fitness",
    "stress_management",
    "improve_nutrition",
];
const MEDICAL_CONDITIONS: &[&str] = &[
    "hypertension",
    "diabetes",
    "high_cholesterol",
    "asthma",
    "none",
    "kidney_disease",
    "cardiovascular_disease",
];
pub const NUTRITION_PREFERENCES: &[&str] = &[
    "vegetarian",
    "vegan",
    "pescatarian",
    "gluten_free",
    "dairy_free",
    "none",
];

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// 32 random bytes, URL-safe base64.
pub fn generate_verification_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    Base64Url::encode_string(&bytes)
}

pub fn validate_onboarding(req: OnboardingRequest) -> Result<Onboarding, String> {
    let gender = req.gender.trim().to_lowercase();
    if !GENDERS.contains(&gender.as_str()) {
        return Err(format!("invalid gender: {}", req.gender));
    }

    let birthdate = req.birthdate.trim();
    Date::parse(birthdate, format_description!("[year]-[month]-[day]"))
        .map_err(|_| format!("birthdate must be YYYY-MM-DD: {}", req.birthdate))?;

    if let Some(goal) = req.health_goals.iter().find(|g| !HEALTH_GOALS.contains(&g.as_str())) {
        return Err(format!("invalid health goal: {goal}"));
    }
    if let Some(condition) = req
        .medical_conditions
        .iter()
        .find(|c| !MEDICAL_CONDITIONS.contains(&c.as_str()))
    {
        return Err(format!("invalid medical condition: {condition}"));
    }
    if !NUTRITION_PREFERENCES.contains(&req.nutrition_preference.as_str()) {
        return Err(format!(
            "invalid nutrition preference: {}",
            req.nutrition_preference
        ));
    }

    Ok(Onboarding {
        gender,
        birthdate: birthdate.to_string(),
        health_goals: req.health_goals,
        medical_conditions: req.medical_conditions,
        nutrition_preference: req.nutrition_preference,
    })
}
