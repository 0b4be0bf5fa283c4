//! Data models for the lending server

pub mod book;
pub mod item;
pub mod loan;
pub mod reservation;
pub mod user;

use rand::{distributions::Alphanumeric, Rng};

// Re-export commonly used types
pub use book::BookShort;
pub use item::{Item, ItemStatus};
pub use loan::{Loan, LoanDetails, LoanStatus, NewLoan, ReturnedLoan};
pub use reservation::{NewReservation, Reservation, ReservationDetails, ReservationState};
pub use user::{Role, User, UserClaims};

/// Human-readable ledger code, e.g. `LN-7K2Q9XBD`
pub fn generate_code(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("{}-{}", prefix, suffix)
}
