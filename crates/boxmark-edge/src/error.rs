/// Reasons a single edge cannot be localized.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EdgeError {
    #[error("profile too short ({len} samples, need at least {min})")]
    TooShort { len: usize, min: usize },
    #[error("profile has no gradient above the noise threshold")]
    Flat,
    #[error("profile contrast {range:.2} below {min:.2}")]
    LowContrast { range: f64, min: f64 },
    #[error("measurement region lies outside the image")]
    EmptyRoi,
}
