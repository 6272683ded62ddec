use crate::normalize::{slugify, slugify_company};

/// Salary component used when a posting has no salary.
const NO_SALARY: &str = "not-disclosed";

/// Derive the identity key of a posting.
///
/// Format:
///     <company>-<location>-<salary>
///
/// Example:
/// - ("Acme Corp", "Pune, India", None) -> "acmecorp-pune-india-not-disclosed"
///
/// IMPORTANT:
/// - Built only from company, location and salary. Raw links carry
///   per-visit tracking parameters and many sources expose no stable
///   id, so neither link nor title takes part.
/// - Two distinct postings sharing company, location and salary
///   collide; the second one is stored as a duplicate. Changing the
///   inputs would change observed dedup counts for existing data.
///
pub fn derive_key(company: &str, location: &str, salary: Option<&str>) -> String {
    format!(
        "{}-{}-{}",
        slugify_company(company),
        slugify(location),
        slugify(salary.unwrap_or(NO_SALARY))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_deterministic() {
        let a = derive_key("Acme Corp", "Pune, India", Some("₹3,00,000 - ₹5,00,000"));
        let b = derive_key("Acme Corp", "Pune, India", Some("₹3,00,000 - ₹5,00,000"));
        assert_eq!(a, b);
        assert_eq!(a, "acmecorp-pune-india-300000---500000");
    }

    #[test]
    fn missing_salary_matches_not_disclosed_text() {
        assert_eq!(
            derive_key("Acme", "Pune", None),
            derive_key("Acme", "Pune", Some("Not disclosed"))
        );
        assert_eq!(derive_key("Acme", "", None), "acme--not-disclosed");
    }

    #[test]
    fn title_and_link_do_not_take_part() {
        // same company / location / salary => same key, whatever the listing
        let first = derive_key("Acme", "Remote", None);
        let second = derive_key(" acme ", "  remote ", None);
        assert_eq!(first, second);
    }
}
