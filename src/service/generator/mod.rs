pub mod title_card;

use std::{ops::Deref, sync::Arc};

use image::DynamicImage;

use crate::base::types::Res;

// Traits.

/// Generic image generator trait that generators must implement.
///
/// Generation is synchronous and CPU bound; callers on the async runtime are
/// expected to move it onto the blocking pool.
pub trait GenericImageGenerator: Send + Sync + 'static {
    /// Render an image for the given text.
    ///
    /// Returns an error when the text cannot be rendered (empty, unsupported
    /// characters, too long, etc.).
    fn generate(&self, text: &str) -> Res<DynamicImage>;
}

// Structs.

/// Image generator for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ImageGenerator {
    inner: Arc<dyn GenericImageGenerator>,
}

impl Deref for ImageGenerator {
    type Target = dyn GenericImageGenerator;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ImageGenerator {
    pub fn new(inner: Arc<dyn GenericImageGenerator>) -> Self {
        Self { inner }
    }
}
