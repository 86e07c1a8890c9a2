//! BMI and daily calorie-needs arithmetic.
//!
//! Stateless helpers over a body profile. The calorie estimate uses the
//! Mifflin-St Jeor equation with standard activity multipliers and a flat
//! 300 kcal adjustment toward the weight goal.

use nutrilog_core::{BmiCategory, BmiReport, Gender, UserProfile};

/// Calorie needs assumed when no profile has been saved.
pub const DEFAULT_DAILY_CALORIES: f64 = 2000.0;

/// Body mass index, one decimal place.
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round1(weight_kg / (height_m * height_m))
}

pub fn bmi_category(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

/// Weight band (kg) spanning the normal BMI range at this height.
pub fn ideal_weight_range(height_cm: f64) -> (f64, f64) {
    let height_m = height_cm / 100.0;
    (
        round1(18.5 * height_m * height_m),
        round1(24.9 * height_m * height_m),
    )
}

/// Mifflin-St Jeor daily calorie needs, adjusted for the weight goal.
pub fn daily_calorie_needs(profile: Option<&UserProfile>) -> f64 {
    let Some(profile) = profile else {
        return DEFAULT_DAILY_CALORIES;
    };

    let bmr = match profile.gender {
        Gender::Male => {
            10.0 * profile.current_weight_kg + 6.25 * profile.height_cm
                - 5.0 * f64::from(profile.age)
                + 5.0
        }
        Gender::Female => {
            10.0 * profile.current_weight_kg + 6.25 * profile.height_cm
                - 5.0 * f64::from(profile.age)
                - 161.0
        }
    };

    let mut daily = (bmr * profile.activity_level.multiplier()).round();

    if profile.target_weight_kg > profile.current_weight_kg {
        daily += 300.0;
    } else if profile.target_weight_kg < profile.current_weight_kg {
        daily -= 300.0;
    }

    daily
}

/// Full derived report for one profile.
pub fn bmi_report(profile: &UserProfile) -> BmiReport {
    let bmi = bmi(profile.current_weight_kg, profile.height_cm);
    BmiReport {
        bmi,
        category: bmi_category(bmi),
        ideal_weight_range: ideal_weight_range(profile.height_cm),
        daily_calorie_needs: daily_calorie_needs(Some(profile)),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nutrilog_core::ActivityLevel;

    fn profile() -> UserProfile {
        UserProfile {
            username: "budi".into(),
            height_cm: 175.0,
            current_weight_kg: 70.0,
            target_weight_kg: 70.0,
            age: 30,
            gender: Gender::Male,
            activity_level: ActivityLevel::Moderate,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_bmi_one_decimal() {
        assert_eq!(bmi(70.0, 175.0), 22.9);
    }

    #[test]
    fn test_category_edges() {
        assert_eq!(bmi_category(18.4), BmiCategory::Underweight);
        assert_eq!(bmi_category(18.5), BmiCategory::Normal);
        assert_eq!(bmi_category(24.9), BmiCategory::Normal);
        assert_eq!(bmi_category(25.0), BmiCategory::Overweight);
        assert_eq!(bmi_category(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_ideal_weight_range() {
        assert_eq!(ideal_weight_range(175.0), (56.7, 76.3));
    }

    #[test]
    fn test_daily_needs_no_profile() {
        assert_eq!(daily_calorie_needs(None), DEFAULT_DAILY_CALORIES);
    }

    #[test]
    fn test_daily_needs_moderate_male() {
        // BMR = 700 + 1093.75 - 150 + 5 = 1648.75; x1.55 = 2555.5625
        assert_eq!(daily_calorie_needs(Some(&profile())), 2556.0);
    }

    #[test]
    fn test_goal_adjustment() {
        let mut p = profile();
        p.target_weight_kg = 65.0;
        assert_eq!(daily_calorie_needs(Some(&p)), 2256.0);

        p.target_weight_kg = 75.0;
        assert_eq!(daily_calorie_needs(Some(&p)), 2856.0);
    }

    #[test]
    fn test_report_is_consistent() {
        let report = bmi_report(&profile());
        assert_eq!(report.bmi, 22.9);
        assert_eq!(report.category, BmiCategory::Normal);
    }
}
