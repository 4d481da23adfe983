//! Response decoding shared by the transport layer.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;

/// Decodes a response value, logging fields the target type does not model and the
/// path of the first field that fails to decode.
#[cfg(feature = "tracing")]
pub(crate) fn deserialize_with_warnings<T: DeserializeOwned>(value: Value) -> Result<T> {
    let mut unknown = Vec::new();
    let mut record = |path: serde_ignored::Path<'_>| unknown.push(path.to_string());
    let deserializer = serde_ignored::Deserializer::new(value, &mut record);

    match serde_path_to_error::deserialize::<_, T>(deserializer) {
        Ok(decoded) => {
            if !unknown.is_empty() {
                tracing::warn!(
                    type_name = std::any::type_name::<T>(),
                    fields = ?unknown,
                    "response carried fields this client does not model"
                );
            }
            Ok(decoded)
        }
        Err(e) => {
            tracing::warn!(
                type_name = std::any::type_name::<T>(),
                path = %e.path(),
                error = %e.inner(),
                "failed to decode response"
            );
            Err(e.into_inner().into())
        }
    }
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn deserialize_with_warnings<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}
