use std::str::FromStr;
use std::time::Duration;

use crate::error::{FbictlError, ValidationError};
use crate::Result;

pub fn parse_duration(duration_str: &str) -> Result<Duration> {
    humantime::Duration::from_str(duration_str)
        .map(|d| d.into())
        .map_err(|_| FbictlError::Validation(ValidationError::InvalidDuration {
            duration: duration_str.to_string(),
        }))
}

/// Converts a duration into the whole seconds the viewer understands.
pub fn whole_seconds(duration: Duration) -> Result<i64> {
    if duration.subsec_nanos() != 0 {
        return Err(FbictlError::Validation(ValidationError::InvalidDuration {
            duration: humantime::format_duration(duration).to_string(),
        }));
    }

    i64::try_from(duration.as_secs()).map_err(|_| {
        FbictlError::Validation(ValidationError::InvalidDuration {
            duration: humantime::format_duration(duration).to_string(),
        })
    })
}
