use crate::diet::model::{ActivityLevel, BiometricProfile, Gender};

impl ActivityLevel {
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Low => 1.375,
            ActivityLevel::Medium => 1.55,
            ActivityLevel::High => 1.725,
            ActivityLevel::Other(_) => 1.9,
        }
    }
}

/// Mifflin-St Jeor basal metabolic rate.
pub fn basal_metabolic_rate(gender: &Gender, age_years: i32, weight_kg: f64, height_cm: i32) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * f64::from(height_cm) - 5.0 * f64::from(age_years);
    match gender {
        Gender::Male => base + 5.0,
        _ => base - 161.0,
    }
}

/// Daily caloric target, rounded half-to-even.
pub fn estimate(
    gender: &Gender,
    age_years: i32,
    weight_kg: f64,
    height_cm: i32,
    activity: &ActivityLevel,
) -> i32 {
    let bmr = basal_metabolic_rate(gender, age_years, weight_kg, height_cm);
    (bmr * activity.multiplier()).round_ties_even() as i32
}

pub fn estimate_for(profile: &BiometricProfile) -> i32 {
    estimate(
        &profile.gender,
        profile.age,
        profile.weight,
        profile.height,
        &profile.activity_level,
    )
}
