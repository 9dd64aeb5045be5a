//! Finite-lifetime capability shared by credentials.

use super::Timestamp;

/// Seconds subtracted from a nominal lifetime so a credential is refreshed
/// before it can lapse mid-request.
pub const SAFETY_MARGIN_SECS: i64 = 30;

/// An entity that is valid for `expires_in` seconds from `created_date`.
///
/// Implementors only provide the two accessors; the expiry formula lives in
/// the provided methods and must not be re-implemented.
pub trait Expirable {
    /// Lifetime in seconds, measured from [`Expirable::created_date`].
    fn expires_in(&self) -> i64;

    /// Start of the validity window.
    fn created_date(&self) -> Timestamp;

    /// Expired iff `elapsed + SAFETY_MARGIN_SECS >= expires_in`, where
    /// `elapsed` is the whole seconds between creation and `now`.
    fn is_expired_at(&self, now: &Timestamp) -> bool {
        let elapsed = now.whole_seconds_since(&self.created_date());
        elapsed + SAFETY_MARGIN_SECS >= self.expires_in()
    }

    /// [`Expirable::is_expired_at`] evaluated against the current time.
    fn is_expired(&self) -> bool {
        self.is_expired_at(&Timestamp::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Lease {
        expires_in: i64,
        created: Timestamp,
    }

    impl Expirable for Lease {
        fn expires_in(&self) -> i64 {
            self.expires_in
        }

        fn created_date(&self) -> Timestamp {
            self.created
        }
    }

    #[test]
    fn fresh_lease_is_not_expired() {
        let lease = Lease { expires_in: 600, created: Timestamp::now() };
        assert!(!lease.is_expired());
    }

    #[test]
    fn lease_inside_margin_is_expired() {
        let created = Timestamp::now();
        let lease = Lease { expires_in: 600, created };
        assert!(lease.is_expired_at(&created.plus_secs(570)));
        assert!(!lease.is_expired_at(&created.plus_secs(569)));
    }

    #[test]
    fn lease_shorter_than_margin_is_always_expired() {
        let lease = Lease { expires_in: 30, created: Timestamp::now() };
        assert!(lease.is_expired());
    }

    proptest! {
        #[test]
        fn expiry_matches_formula(elapsed in 0i64..100_000, expires_in in 1i64..100_000) {
            let created = Timestamp::now();
            let lease = Lease { expires_in, created };
            let now = created.plus_secs(elapsed);
            prop_assert_eq!(lease.is_expired_at(&now), elapsed + 30 >= expires_in);
        }
    }
}
