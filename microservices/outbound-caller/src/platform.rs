//! Mapping between Twilio SDK types and service domain types

use voxpool_core::{NumberDetails, VoxpoolError};
use voxpool_twilio_sdk::{PhoneNumberInfo, TwilioError};

pub fn number_details(info: PhoneNumberInfo) -> NumberDetails {
    NumberDetails {
        phone_number: info.phone_number,
        country_code: info.country_code.filter(|code| !code.trim().is_empty()),
        national_format: info.national_format,
    }
}

/// A destination the Lookup API rejects is the caller's problem; a Lookup
/// API we cannot reach is ours.
pub fn lookup_error(err: TwilioError) -> VoxpoolError {
    if err.is_transport() {
        VoxpoolError::Network(format!("Error trying to access LookUp API: {}", err))
    } else {
        VoxpoolError::Validation(format!(
            "Error trying to access LookUp API: {}",
            err.details_or_message()
        ))
    }
}

pub fn execution_error(context: &str, err: TwilioError) -> VoxpoolError {
    if err.is_transport() {
        VoxpoolError::Network(format!("{}: {}", context, err))
    } else {
        VoxpoolError::Execution(format!("{}: {}", context, err.details_or_message()))
    }
}
