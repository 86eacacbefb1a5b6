use boxmark_core::Axis;

/// The coarse template could not be built or could not be matched.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TemplateMismatch {
    #[error("coarse locator is not initialized")]
    NotInitialized,
    #[error("template region is empty")]
    EmptyTemplate,
    #[error("template has no intensity variation")]
    FlatTemplate,
    #[error("search extent {search} px along {axis:?} is smaller than the template ({template} px)")]
    SearchAreaTooSmall {
        axis: Axis,
        search: usize,
        template: usize,
    },
    #[error("best correlation {score:.3} is below the accepted minimum {min:.3}")]
    WeakCorrelation { score: f64, min: f64 },
    #[error("found {found} of 4 gradient peaks along {axis:?}")]
    PeaksNotFound { axis: Axis, found: usize },
}

/// Failure of the coarse stage.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoarseError {
    #[error("detector returned {found} boxes, need an outer and an inner box")]
    InsufficientDetections { found: usize },
    #[error(transparent)]
    TemplateMismatch(#[from] TemplateMismatch),
}
