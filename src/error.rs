use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum SourceError {
    #[display("failed to build client for {source_name}")]
    Connection { source_name: String },
    #[display("request to {source_name} failed")]
    Request { source_name: String },
    #[display("failed to parse response from {source_name}")]
    ResponseParse { source_name: String },
    #[display("asset not found: {id}")]
    NotFound { id: String },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("insufficient data: need {required}, got {available}")]
    InsufficientData { required: usize, available: usize },
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error)]
pub enum AnalysisError {
    #[display("invalid price sample at index {index}: {value:?}")]
    InvalidSample { index: usize, value: String },
    #[display("indicator calculation failed")]
    Indicator,
}
