pub mod error;
pub mod route;
pub mod booking;
pub mod payment;
pub mod user;
pub mod search;
pub mod repository;
pub mod pii;

pub use error::{BookingError, BookingResult, AccountError};
pub use route::Route;
pub use booking::{Booking, BookingStatus, BookingDetails, PassengerDetail, CreateBookingRequest};
pub use payment::{Payment, PaymentStatus, PaymentMethod, PaymentDetails};
pub use user::{User, NewUser, SessionContext};
pub use search::{RouteQuery, RouteSearchResult, PageRequest, Paginated};
pub use repository::{discard, StoreError, UnitOfWork, StoreTransaction, RouteRepository, BookingRepository, UserRepository};
