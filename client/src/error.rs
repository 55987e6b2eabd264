use thiserror::Error;

use pinmap_shared::RegistryError;

/// Reasons the map refuses to start. Reported once to the console; nothing is mounted.
#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error("no browser window or document available")]
    NoDocument,
    #[error("missing DOM element #{0}")]
    MissingElement(&'static str),
    #[error("invalid location registry: {0}")]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(
            StartupError::MissingElement("popup-content").to_string(),
            "missing DOM element #popup-content"
        );
        let err: StartupError = RegistryError::Empty.into();
        assert_eq!(err.to_string(), "invalid location registry: location registry is empty");
    }
}
