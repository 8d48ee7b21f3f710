use thiserror::Error;

/// Why a document could not be turned into a record instance
///
/// Every variant names the field path where decoding stopped (`Appointment`
/// for the root, `Appointment.participant[0].status` below it).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{path}: no schema is registered for record type '{type_name}'")]
    UnknownType { type_name: String, path: String },

    #[error("{path}: the document carries no type tag")]
    MissingTypeTag { path: String },

    #[error("{path}: expected {expected}, found {found}")]
    ShapeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("{path}: {source}")]
    MalformedPrimitive {
        path: String,
        #[source]
        source: tessera_models::PrimitiveError,
    },

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DecodeError {
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::UnknownType { path, .. }
            | Self::MissingTypeTag { path }
            | Self::ShapeMismatch { path, .. }
            | Self::MalformedPrimitive { path, .. } => Some(path),
            Self::Xml(_) | Self::Json(_) => None,
        }
    }

    pub(crate) fn shape(
        path: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::ShapeMismatch {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Encoding never looks at validity; it only fails when the record's type is
/// unknown or the output cannot be written.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("no schema is registered for record type '{0}'")]
    UnknownType(String),

    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("JSON write error: {0}")]
    Json(#[from] serde_json::Error),
}
