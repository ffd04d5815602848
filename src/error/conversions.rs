use super::AudifyError;

impl From<reqwest::Error> for AudifyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::ParseError(e.to_string())
        } else {
            Self::HttpError(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AudifyError {
    fn from(e: serde_json::Error) -> Self {
        Self::ParseError(e.to_string())
    }
}

impl From<std::io::Error> for AudifyError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}
