use rand::Rng;

use super::value_objects::AccountNumber;

// ============================================================================
// Account Number Generation
// ============================================================================
//
// Numbers are drawn from [BASE, BASE + SPAN), always 10 digits. Uniqueness is
// checked by the service against the account store, not here.
//
// ============================================================================

pub const ACCOUNT_NUMBER_BASE: i64 = 1_000_000_000;
pub const ACCOUNT_NUMBER_SPAN: i64 = 900_000_000;

/// Source of candidate account numbers, injected into the service
pub trait AccountNumberGenerator: Send + Sync {
    fn next_account_number(&self) -> AccountNumber;
}

/// Uniform random draw over the 10-digit range
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomAccountNumberGenerator;

impl AccountNumberGenerator for RandomAccountNumberGenerator {
    fn next_account_number(&self) -> AccountNumber {
        let offset = rand::thread_rng().gen_range(0..ACCOUNT_NUMBER_SPAN);
        AccountNumber::new(ACCOUNT_NUMBER_BASE + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_numbers_stay_in_range() {
        let generator = RandomAccountNumberGenerator;
        for _ in 0..1_000 {
            let number = generator.next_account_number();
            assert!(number.is_ten_digit());
            assert!(number.value() >= ACCOUNT_NUMBER_BASE);
            assert!(number.value() < ACCOUNT_NUMBER_BASE + ACCOUNT_NUMBER_SPAN);
        }
    }
}
