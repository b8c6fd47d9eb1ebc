mod vec_helpers;

pub use vec_helpers::try_with_capacity;

pub mod tracing_wrappers {
    pub use tracing::{debug, error, info, trace, warn};
}
