#![forbid(unsafe_code)]

//! Property tests for the host-side helpers around the bridge.
//!
//! # Invariants
//!
//! 1. **Locale closure**: `resolve` always answers with a supported locale,
//!    and repeating a change never asks for a second remount.
//! 2. **Path-only navigation**: query strings and fragments never count as
//!    a navigation.
//! 3. **Trailing edge**: a debouncer fires exactly once, no earlier than
//!    `delay` after the last trigger.
//!
//! Run:
//!   cargo test -p envelope-host --test proptest_host_invariants

use std::time::Duration;

use envelope_host::{Debouncer, LocaleChange, LocaleNegotiator, NavigationWatcher};
use proptest::prelude::*;
use web_time::Instant;

const SUPPORTED: [&str; 5] = ["en", "pt", "ja", "zh-CN", "de"];

fn tag() -> impl Strategy<Value = String> {
    "[a-z]{2}([-_][A-Za-z]{2})?"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn resolve_stays_within_supported(requested in tag()) {
        let negotiator = LocaleNegotiator::new("en", SUPPORTED);
        let resolved = negotiator.resolve(&requested);
        prop_assert!(SUPPORTED.iter().any(|l| l.eq_ignore_ascii_case(resolved)));
    }

    #[test]
    fn repeated_change_is_unchanged(requests in proptest::collection::vec(tag(), 1..10)) {
        let mut negotiator = LocaleNegotiator::new("en", SUPPORTED);
        for requested in &requests {
            negotiator.change(requested);
            prop_assert_eq!(negotiator.change(requested), LocaleChange::Unchanged);
        }
    }

    #[test]
    fn query_and_fragment_are_not_navigation(
        path in "(/[a-z]{1,6}){1,4}",
        query in "[a-z]{1,4}=[0-9]{1,3}",
        fragment in "[a-z]{0,6}",
        absolute in any::<bool>(),
    ) {
        let base = if absolute {
            format!("https://host.test{path}")
        } else {
            path.clone()
        };
        let mut watcher = NavigationWatcher::new();
        prop_assert!(watcher.observe(&base).is_some());
        let with_query = format!("{base}?{query}");
        prop_assert!(watcher.observe(&with_query).is_none());
        let with_fragment = format!("{base}#{fragment}");
        prop_assert!(watcher.observe(&with_fragment).is_none());
        prop_assert_eq!(watcher.last_path(), Some(path.as_str()));
    }

    #[test]
    fn debouncer_fires_once_after_last_trigger(
        delay_ms in 1u64..500,
        gaps in proptest::collection::vec(0u64..600, 1..8),
    ) {
        let delay = Duration::from_millis(delay_ms);
        let mut debouncer = Debouncer::new(delay);
        let start = Instant::now();
        let mut now = start;
        let mut fired = 0;
        for gap in gaps {
            now += Duration::from_millis(gap);
            if debouncer.fire(now) {
                fired += 1;
            }
            debouncer.trigger(now);
        }
        let last = now;
        prop_assert!(!debouncer.fire(last + delay - Duration::from_millis(1)));
        prop_assert!(debouncer.fire(last + delay));
        prop_assert!(!debouncer.fire(last + delay * 2));
        prop_assert!(!debouncer.is_pending());
        prop_assert!(fired < 8);
    }
}
