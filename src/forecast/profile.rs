//! User profile and budget inference from category histories.
//!
//! Used when a batch request asks for detection instead of supplying a budget
//! and profile. The rules key on average monthly spend and on how much of it
//! goes to food and rent.

use std::collections::BTreeMap;

use crate::domain::UserProfile;

/// Profile and budget assumed when there is no spending at all.
const DEFAULT_PROFILE: (UserProfile, f64) = (UserProfile::YoungProfessional, 8_000.0);

const FOOD_CATEGORIES: [&str; 2] = ["food and drink", "food & drink"];
const RENT_CATEGORY: &str = "rent";

/// Infer `(profile, monthly budget)` from per-category monthly histories.
///
/// The average runs over months with any spending; all-zero months (gaps in
/// an export) do not dilute it.
pub fn detect_profile(categories: &BTreeMap<String, Vec<f64>>) -> (UserProfile, f64) {
    let span = categories.values().map(Vec::len).max().unwrap_or(0);
    let months = (0..span)
        .filter(|&i| categories.values().filter_map(|v| v.get(i)).sum::<f64>() > 0.0)
        .count();
    let total: f64 = categories.values().flatten().sum();
    if months == 0 || total <= 0.0 {
        return DEFAULT_PROFILE;
    }

    let share = |pred: &dyn Fn(&str) -> bool| -> f64 {
        categories
            .iter()
            .filter(|(name, _)| pred(name.trim().to_lowercase().as_str()))
            .map(|(_, v)| v.iter().sum::<f64>())
            .sum::<f64>()
            / total
    };
    let food_pct = share(&|name| FOOD_CATEGORIES.contains(&name));
    let rent_pct = share(&|name| name == RENT_CATEGORY);
    let avg = total / months as f64;

    if avg < 5_000.0 {
        if food_pct > 0.35 {
            (UserProfile::CollegeStudent, avg.min(3_000.0))
        } else {
            (UserProfile::YoungProfessional, avg.min(8_000.0))
        }
    } else if avg < 12_000.0 {
        (UserProfile::YoungProfessional, avg)
    } else if avg < 25_000.0 {
        if rent_pct < 0.1 {
            (UserProfile::SeniorRetired, avg)
        } else {
            (UserProfile::FamilyModerate, avg)
        }
    } else if avg < 45_000.0 {
        (UserProfile::FamilyHigh, avg)
    } else {
        (UserProfile::LuxuryLifestyle, avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cats(entries: &[(&str, &[f64])]) -> BTreeMap<String, Vec<f64>> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_vec()))
            .collect()
    }

    #[test]
    fn no_spending_uses_default() {
        assert_eq!(detect_profile(&BTreeMap::new()), DEFAULT_PROFILE);
        assert_eq!(detect_profile(&cats(&[("Rent", &[0.0, 0.0])])), DEFAULT_PROFILE);
    }

    #[test]
    fn food_heavy_low_spender_is_a_student() {
        let c = cats(&[("Food and Drink", &[2000.0, 2000.0]), ("Travel", &[1000.0, 1000.0])]);
        assert_eq!(detect_profile(&c), (UserProfile::CollegeStudent, 3000.0));
    }

    #[test]
    fn only_food_and_drink_names_count_as_food() {
        let c = cats(&[("Food", &[2000.0, 2000.0]), ("Travel", &[1000.0, 1000.0])]);
        assert_eq!(detect_profile(&c), (UserProfile::YoungProfessional, 3000.0));

        let c = cats(&[("food & drink", &[2000.0]), ("Travel", &[1000.0])]);
        assert_eq!(detect_profile(&c).0, UserProfile::CollegeStudent);
    }

    #[test]
    fn gap_months_do_not_dilute_the_average() {
        let c = cats(&[("Rent", &[14_000.0, 0.0, 14_000.0])]);
        assert_eq!(detect_profile(&c), (UserProfile::FamilyModerate, 14_000.0));

        let c = cats(&[("Rent", &[6_000.0, 0.0]), ("Travel", &[0.0, 0.0, 6_000.0])]);
        assert_eq!(detect_profile(&c), (UserProfile::YoungProfessional, 6_000.0));
    }

    #[test]
    fn low_spender_without_food_focus_is_young_professional() {
        let c = cats(&[("Travel", &[2000.0, 2000.0])]);
        assert_eq!(detect_profile(&c), (UserProfile::YoungProfessional, 2000.0));
    }

    #[test]
    fn rent_share_splits_mid_range() {
        let retired = cats(&[("Health", &[15_000.0]), ("Rent", &[1_000.0])]);
        assert_eq!(detect_profile(&retired).0, UserProfile::SeniorRetired);

        let family = cats(&[("Groceries", &[10_000.0]), ("Rent", &[6_000.0])]);
        assert_eq!(detect_profile(&family), (UserProfile::FamilyModerate, 16_000.0));
    }

    #[test]
    fn high_spenders() {
        assert_eq!(detect_profile(&cats(&[("Rent", &[30_000.0])])).0, UserProfile::FamilyHigh);
        assert_eq!(detect_profile(&cats(&[("Rent", &[50_000.0])])).0, UserProfile::LuxuryLifestyle);
        assert_eq!(detect_profile(&cats(&[("Rent", &[9_000.0])])).0, UserProfile::YoungProfessional);
    }
}
