mod align;
mod element;
mod mockup;

pub use align::align_elements;
pub use element::{
    Element, ElementKind, IconElement, ImageElement, ImageKind, TextColors, TextElement,
};
pub use mockup::{Layers, Mockup, SceneMeta, Stage};

#[cfg(test)]
pub(crate) mod testing {
    use anyhow::Result;
    use image::RgbaImage;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use wire_vision::TextRecognizer;

    /// Hands out queued strings in call order, then empty strings.
    #[derive(Default)]
    pub struct FixedRecognizer {
        queue: RefCell<VecDeque<String>>,
    }

    impl FixedRecognizer {
        pub fn new(texts: &[&str]) -> Self {
            Self {
                queue: RefCell::new(texts.iter().map(|s| s.to_string()).collect()),
            }
        }
    }

    impl TextRecognizer for FixedRecognizer {
        fn recognize(&self, _region: &RgbaImage) -> Result<String> {
            Ok(self.queue.borrow_mut().pop_front().unwrap_or_default())
        }
    }
}
