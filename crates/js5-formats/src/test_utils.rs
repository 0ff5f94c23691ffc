//! Shared helpers for format round-trip tests

use crate::Js5Format;
use std::fmt::Debug;

/// Build `original`, parse the bytes back and require equality
pub fn test_round_trip<T>(original: &T) -> Result<(), Box<dyn std::error::Error>>
where
    T: Js5Format + PartialEq + Debug,
{
    let data = original.build()?;
    let parsed = T::parse(&data)?;

    if original != &parsed {
        return Err(format!(
            "Round-trip verification failed:\nOriginal: {:?}\nParsed: {:?}",
            original, parsed
        )
        .into());
    }

    Ok(())
}

/// Require that `invalid_data` fails to parse
pub fn test_invalid_data_rejected<T>(invalid_data: &[u8]) -> Result<(), Box<dyn std::error::Error>>
where
    T: Js5Format,
{
    match T::parse(invalid_data) {
        Ok(_) => Err("Expected parsing to fail for invalid data, but it succeeded".into()),
        Err(_) => Ok(()),
    }
}
