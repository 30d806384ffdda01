//! Geolocation lookups for trace hops.

pub mod credentials;
pub mod error;
pub mod ipinfo;

pub use credentials::Credentials;
pub use error::{CredentialError, GeoError};
pub use ipinfo::{IpInfoLocator, IpInfoResponse};

use geotrace_model::LocationResult;

/// Resolves an address to a best-effort location.
///
/// Implementations never fail: any lookup problem is reported as
/// `LocationResult::unavailable()`.
pub trait GeoLocator {
    fn locate(&self, address: &str) -> LocationResult;
}

impl<T: GeoLocator + ?Sized> GeoLocator for &T {
    fn locate(&self, address: &str) -> LocationResult {
        (**self).locate(address)
    }
}

impl<T: GeoLocator + ?Sized> GeoLocator for Box<T> {
    fn locate(&self, address: &str) -> LocationResult {
        (**self).locate(address)
    }
}
