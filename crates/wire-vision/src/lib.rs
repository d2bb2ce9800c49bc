pub mod border;
pub mod color;
pub mod ocr;
pub mod projection;

pub use border::{crop_to_content, detect_border, pad, remove_borders, Content};
pub use color::{
    corner_majority, differentiate, dominant_color, liken, perceptual_distance,
    sample_background, text_ink_color, HexColor,
};
pub use ocr::{DisabledRecognizer, TesseractRecognizer, TextRecognizer};
pub use projection::{count_text_lines, ink_mask, locate_ink_bbox};
