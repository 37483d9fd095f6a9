//! Error taxonomy for loading and indexing a product-model tree.
//!
//! Storage failures are not represented: the session store recovers from
//! them locally.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
    /// No row with a null `parent` exists in the dataset.
    #[error("Root product model not found in data")]
    RootNotFound,

    /// The request to the remote data source could not be completed.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote data source answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("reading dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("decoding product rows: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TreeError {
    /// Whether this error came from fetching the rows rather than from the
    /// rows themselves.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            TreeError::Transport { .. } | TreeError::Http { .. } | TreeError::Io { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_not_found_message() {
        assert_eq!(
            TreeError::RootNotFound.to_string(),
            "Root product model not found in data"
        );
        assert!(!TreeError::RootNotFound.is_transport());
    }

    #[test]
    fn test_http_error_is_transport() {
        let err = TreeError::Http {
            url: "http://localhost/tree".to_string(),
            status: 503,
        };
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "HTTP 503 from http://localhost/tree");
    }

    #[test]
    fn test_decode_error_from_serde() {
        let err: TreeError = serde_json::from_str::<Vec<u8>>("not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, TreeError::Decode(_)));
        assert!(!err.is_transport());
    }
}
