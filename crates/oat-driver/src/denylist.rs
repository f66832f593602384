//! The initialization denylist (§4.1 stage 4, §4.5): classes
//! known to trigger side effects unsafe before the runtime is live — native
//! library loads, property reads, random seeds, date/time, regex
//! compilation, locale construction.
//!
//! Kept as a sorted, deduplicated compile-time slice so membership is a
//! binary search rather than a hash lookup — there's no mutation, so a
//! `Vec`/hash set would just be paying allocation for nothing.

/// Sorted, deduplicated. The source list has some duplicate entries (e.g.
/// `Landroid/util/Patterns;` twice) — we keep exactly one copy of each.
const DENYLIST: &[&str] = &[
    "Landroid/icu/text/NumberFormat;",
    "Landroid/icu/util/Calendar;",
    "Landroid/icu/util/TimeZone;",
    "Landroid/icu/util/ULocale;",
    "Landroid/os/SystemProperties;",
    "Landroid/util/Patterns;",
    "Ljava/lang/ProcessEnvironment;",
    "Ljava/lang/Runtime;",
    "Ljava/lang/System;",
    "Ljava/security/SecureRandom;",
    "Ljava/text/DateFormat;",
    "Ljava/text/SimpleDateFormat;",
    "Ljava/util/Calendar;",
    "Ljava/util/Date;",
    "Ljava/util/Locale;",
    "Ljava/util/Random;",
    "Ljava/util/TimeZone;",
    "Ljava/util/regex/Pattern;",
];

/// Is `descriptor` on the initialization denylist?
pub fn is_denylisted(descriptor: &str) -> bool {
    DENYLIST.binary_search(&descriptor).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_sorted_and_deduplicated() {
        let mut sorted = DENYLIST.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), DENYLIST.len(), "DENYLIST must be sorted with no duplicates");
        assert_eq!(sorted, DENYLIST);
    }

    #[test]
    fn known_entries_match() {
        assert!(is_denylisted("Ljava/util/Locale;"));
        assert!(is_denylisted("Landroid/util/Patterns;"));
    }

    #[test]
    fn unlisted_descriptor_does_not_match() {
        assert!(!is_denylisted("Lcom/example/MyClass;"));
    }
}
